use crate::apu::registers::*;
use crate::apu::SoundEngine;
use crate::backend::AudioBackend;

/// Raw sound register storage the engine can reload from.
pub trait RegisterBank {
    /// Stored byte for `address` in 0xFF10..=0xFF3F.
    fn read_register(&self, address: u16) -> u8;
}

impl RegisterBank for [u8; SOUND_LEN] {
    fn read_register(&self, address: u16) -> u8 {
        match address {
            SOUND_START..=SOUND_END => self[(address - SOUND_START) as usize],
            _ => 0,
        }
    }
}

// OR masks for reads: unused/write-only bits read as 1
// Indexed by (address - 0xFF10)
const OR_MASKS: [u8; 23] = [
    0x80, // 0xFF10 NR10
    0x3F, // 0xFF11 NR11
    0x00, // 0xFF12 NR12
    0xFF, // 0xFF13 NR13 (write-only)
    0xBF, // 0xFF14 NR14
    0xFF, // 0xFF15 unused
    0x3F, // 0xFF16 NR21
    0x00, // 0xFF17 NR22
    0xFF, // 0xFF18 NR23 (write-only)
    0xBF, // 0xFF19 NR24
    0x7F, // 0xFF1A NR30
    0xFF, // 0xFF1B NR31 (write-only)
    0x9F, // 0xFF1C NR32
    0xFF, // 0xFF1D NR33 (write-only)
    0xBF, // 0xFF1E NR34
    0xFF, // 0xFF1F unused
    0xFF, // 0xFF20 NR41 (write-only)
    0x00, // 0xFF21 NR42
    0x00, // 0xFF22 NR43
    0xBF, // 0xFF23 NR44
    0x00, // 0xFF24 NR50
    0x00, // 0xFF25 NR51
    0x70, // 0xFF26 NR52
];

/// Memory-mapped sound block: owns the register bytes and forwards accepted
/// writes to the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SoundIo {
    regs: [u8; SOUND_LEN],
    engine: SoundEngine,
}

impl SoundIo {
    pub fn new(clock_rate: u32) -> Self {
        SoundIo {
            regs: [0; SOUND_LEN],
            engine: SoundEngine::new(clock_rate),
        }
    }

    pub fn engine(&self) -> &SoundEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut SoundEngine {
        &mut self.engine
    }

    /// Register bytes as stored, with NR52 carrying the live status bits.
    pub fn registers(&self) -> [u8; SOUND_LEN] {
        let mut regs = self.regs;
        regs[(NR52 - SOUND_START) as usize] = self.nr52();
        regs
    }

    fn nr52(&self) -> u8 {
        let master = if self.engine.master_enabled() { MASTER_ENABLE } else { 0 };
        master | self.engine.status_bits()
    }

    pub fn read(&self, address: u16) -> u8 {
        match address {
            NR52 => self.nr52() | OR_MASKS[(NR52 - SOUND_START) as usize],
            NR10..=NR52 => {
                let index = (address - SOUND_START) as usize;
                self.regs[index] | OR_MASKS[index]
            }
            WAVE_RAM_START..=WAVE_RAM_END => self.regs[(address - SOUND_START) as usize],
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, address: u16, val: u8, backend: &mut dyn AudioBackend) {
        match address {
            // Wave RAM is always writable and only read by synthesis
            WAVE_RAM_START..=WAVE_RAM_END => {
                self.regs[(address - SOUND_START) as usize] = val;
            }
            // NR52 is always writable
            NR52 => {
                let was_on = self.engine.master_enabled();
                let on = val & MASTER_ENABLE != 0;
                if was_on && !on {
                    let end = (NR51 - SOUND_START) as usize;
                    self.regs[..=end].fill(0);
                }
                self.regs[(NR52 - SOUND_START) as usize] = val & MASTER_ENABLE;
                self.engine.write_register(address, val, backend);
            }
            NR10..=NR51 if !self.engine.master_enabled() => {
                log::trace!("sound off, ignored write {:#06X} = {:#04X}", address, val);
            }
            NR10..=NR51 => {
                self.regs[(address - SOUND_START) as usize] = val;
                self.engine.write_register(address, val, backend);
            }
            _ => {}
        }
    }

    pub fn advance(&mut self, cycles: u32, backend: &mut dyn AudioBackend) {
        self.engine.advance(cycles, backend);
    }

    pub fn advance_cpu_cycles(&mut self, cycles: u32, double_speed: bool, backend: &mut dyn AudioBackend) {
        self.engine.advance_cpu_cycles(cycles, double_speed, backend);
    }

    /// Rebuild the engine from the stored register bytes and the live
    /// NR52 status.
    pub fn reload(&mut self, backend: &mut dyn AudioBackend) {
        let bank = self.registers();
        self.engine.reload(&bank, backend);
    }

    /// Replace the register bytes (e.g. from a snapshot) and reload. The NR52
    /// status bits in `bytes` pick the channels that come back on.
    pub fn restore(&mut self, bytes: &[u8], backend: &mut dyn AudioBackend) -> Result<(), String> {
        let bank = self.restore_registers(bytes)?;
        self.engine.reload(&bank, backend);
        Ok(())
    }

    /// Store `bytes` and hand them back unmasked for the reload.
    pub(crate) fn restore_registers(&mut self, bytes: &[u8]) -> Result<[u8; SOUND_LEN], String> {
        let bank: [u8; SOUND_LEN] = bytes.try_into().map_err(|_| {
            format!("Expected {} sound register bytes, got {}", SOUND_LEN, bytes.len())
        })?;
        self.regs = bank;
        // Status bits are live state, not storage.
        self.regs[(NR52 - SOUND_START) as usize] &= MASTER_ENABLE;
        Ok(bank)
    }
}

impl RegisterBank for SoundIo {
    fn read_register(&self, address: u16) -> u8 {
        match address {
            NR52 => self.nr52(),
            _ => self.regs.read_register(address),
        }
    }
}

impl Default for SoundIo {
    fn default() -> Self {
        SoundIo::new(crate::apu::DMG_CLOCK_RATE)
    }
}
