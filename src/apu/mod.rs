pub mod channel1;
pub mod channel2;
pub mod channel3;
pub mod channel4;
pub mod registers;
pub mod units;

use channel1::Channel1;
use channel2::Channel2;
use channel3::Channel3;
use channel4::Channel4;
use registers::*;

use crate::backend::{AudioBackend, ChannelEvent, ChannelId};
use crate::io::RegisterBank;

/// DMG master clock, in cycles per second.
pub const DMG_CLOCK_RATE: u32 = 4_194_304;

/// Control signals a synthesis stage needs for one channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelControl {
    pub enabled: bool,
    /// 11-bit period value; the clock shift for the noise channel.
    pub frequency: u16,
    /// 0..=15
    pub volume: u8,
    pub to_left: bool,
    pub to_right: bool,
}

/// Channel control engine: register decoding and timer upkeep for all four
/// channels. It produces no samples, only state and on/off notifications.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SoundEngine {
    pub channel1: Channel1,
    pub channel2: Channel2,
    pub channel3: Channel3,
    pub channel4: Channel4,

    master_enabled: bool,
    left_volume: u8,
    right_volume: u8,
    to_left: [bool; 4],
    to_right: [bool; 4],

    clock_rate: u32,
}

impl SoundEngine {
    pub fn new(clock_rate: u32) -> Self {
        SoundEngine {
            channel1: Channel1::default(),
            channel2: Channel2::default(),
            channel3: Channel3::default(),
            channel4: Channel4::default(),
            master_enabled: false,
            left_volume: 0,
            right_volume: 0,
            to_left: [false; 4],
            to_right: [false; 4],
            clock_rate: clock_rate.max(1),
        }
    }

    pub fn clock_rate(&self) -> u32 { self.clock_rate }
    pub fn master_enabled(&self) -> bool { self.master_enabled }
    pub fn left_volume(&self) -> u8 { self.left_volume }
    pub fn right_volume(&self) -> u8 { self.right_volume }

    pub fn is_enabled(&self, channel: ChannelId) -> bool {
        match channel {
            ChannelId::Pulse1 => self.channel1.enabled,
            ChannelId::Pulse2 => self.channel2.enabled,
            ChannelId::Wave => self.channel3.enabled,
            ChannelId::Noise => self.channel4.enabled,
        }
    }

    /// NR52 low nibble: bit N set while channel N+1 is on.
    pub fn status_bits(&self) -> u8 {
        ChannelId::ALL
            .iter()
            .filter(|&&c| self.is_enabled(c))
            .fold(0, |bits, c| bits | 1 << c.index())
    }

    pub fn control(&self, channel: ChannelId) -> ChannelControl {
        let (frequency, volume) = match channel {
            ChannelId::Pulse1 => (self.channel1.frequency(), self.channel1.volume()),
            ChannelId::Pulse2 => (self.channel2.frequency(), self.channel2.volume()),
            ChannelId::Wave => (self.channel3.frequency(), self.channel3.volume()),
            ChannelId::Noise => (self.channel4.clock_shift() as u16, self.channel4.volume()),
        };
        ChannelControl {
            enabled: self.is_enabled(channel),
            frequency,
            volume,
            to_left: self.to_left[channel.index()],
            to_right: self.to_right[channel.index()],
        }
    }

    // --- Register writes ---

    /// Decode one write to the sound register block. Unmapped addresses and
    /// writes made while the master switch is off leave the state untouched.
    pub fn write_register(&mut self, address: u16, val: u8, backend: &mut dyn AudioBackend) {
        if address == NR52 {
            self.write_nr52(val, backend);
            return;
        }
        if !self.master_enabled {
            log::trace!("sound off, dropped write {:#06X} = {:#04X}", address, val);
            return;
        }

        let clock_rate = self.clock_rate;
        match address {
            // Channel 1
            NR10 => self.channel1.write_nr10(val, clock_rate),
            NR11 => self.channel1.write_nr11(val, clock_rate),
            NR12 => self.channel1.write_nr12(val),
            NR13 => self.channel1.write_nr13(val),
            NR14 => {
                if self.channel1.write_nr14(val, clock_rate) {
                    self.announce_on(ChannelId::Pulse1, backend);
                }
            }

            // Channel 2
            NR21 => self.channel2.write_nr21(val, clock_rate),
            NR22 => self.channel2.write_nr22(val),
            NR23 => self.channel2.write_nr23(val),
            NR24 => {
                if self.channel2.write_nr24(val, clock_rate) {
                    self.announce_on(ChannelId::Pulse2, backend);
                }
            }

            // Channel 3
            NR30 => {
                if self.channel3.write_nr30(val) {
                    self.announce_off(ChannelId::Wave, backend);
                }
            }
            NR31 => self.channel3.write_nr31(val),
            NR32 => self.channel3.write_nr32(val),
            NR33 => self.channel3.write_nr33(val),
            NR34 => {
                if self.channel3.write_nr34(val, clock_rate) {
                    self.announce_on(ChannelId::Wave, backend);
                }
            }

            // Channel 4
            NR41 => self.channel4.write_nr41(val),
            NR42 => self.channel4.write_nr42(val),
            NR43 => self.channel4.write_nr43(val),
            NR44 => {
                if self.channel4.write_nr44(val, clock_rate) {
                    self.announce_on(ChannelId::Noise, backend);
                }
            }

            // Control
            NR50 => {
                self.right_volume = val & RIGHT_VOLUME_MASK;
                self.left_volume = field(val, LEFT_VOLUME_SHIFT, LEFT_VOLUME_MASK);
            }
            NR51 => {
                for i in 0..4 {
                    self.to_right[i] = val & (1 << i) != 0;
                    self.to_left[i] = val & (1 << (i as u8 + ROUTE_LEFT_SHIFT)) != 0;
                }
            }

            _ => log::trace!("ignored sound write {:#06X} = {:#04X}", address, val),
        }
    }

    /// Same as `write_register`, addressed by the low byte of the I/O map.
    pub fn write_io(&mut self, reg: u8, val: u8, backend: &mut dyn AudioBackend) {
        self.write_register(0xFF00 | reg as u16, val, backend);
    }

    fn write_nr52(&mut self, val: u8, backend: &mut dyn AudioBackend) {
        if val & MASTER_ENABLE != 0 {
            self.master_enabled = true;
            return;
        }
        for channel in ChannelId::ALL {
            if self.is_enabled(channel) {
                self.announce_off(channel, backend);
            }
        }
        *self = SoundEngine::new(self.clock_rate);
    }

    // --- Clocking ---

    /// Advance every running timer by `cycles`, already scaled for double speed.
    pub fn advance(&mut self, cycles: u32, backend: &mut dyn AudioBackend) {
        if !self.master_enabled || cycles == 0 {
            return;
        }
        let clock_rate = self.clock_rate;
        if self.channel1.advance(cycles, clock_rate) {
            self.announce_off(ChannelId::Pulse1, backend);
        }
        if self.channel2.advance(cycles, clock_rate) {
            self.announce_off(ChannelId::Pulse2, backend);
        }
        if self.channel3.advance(cycles) {
            self.announce_off(ChannelId::Wave, backend);
        }
        if self.channel4.advance(cycles, clock_rate) {
            self.announce_off(ChannelId::Noise, backend);
        }
    }

    /// Advance by CPU cycles; double-speed mode runs the CPU at twice the
    /// sound clock, so the count is halved first.
    pub fn advance_cpu_cycles(&mut self, cycles: u32, double_speed: bool, backend: &mut dyn AudioBackend) {
        let cycles = if double_speed { cycles / 2 } else { cycles };
        self.advance(cycles, backend);
    }

    // --- Reload ---

    /// Rebuild the whole state from the register bank.
    ///
    /// NR52 goes first since it gates every other write. The remaining
    /// registers are replayed in address order with trigger bits masked, then
    /// every channel whose NR52 status bit is set in the bank is triggered
    /// again. A stored trigger bit alone restarts nothing: it stays set after
    /// the channel stops. The backend only hears about channels whose on/off
    /// state actually changed.
    pub fn reload(&mut self, bank: &dyn RegisterBank, backend: &mut dyn AudioBackend) {
        let before = self.status_bits();
        let mut rebuilt = SoundEngine::new(self.clock_rate);
        let mut replayed: Vec<ChannelEvent> = Vec::new();

        let nr52 = bank.read_register(NR52);
        rebuilt.write_register(NR52, nr52, &mut replayed);
        for address in SOUND_START..=SOUND_END {
            let mut val = bank.read_register(address);
            if TRIGGER_REGISTERS.contains(&address) {
                val &= !TRIGGER;
            }
            rebuilt.write_register(address, val, &mut replayed);
        }
        for channel in ChannelId::ALL {
            if nr52 & (1 << channel.index()) != 0 {
                let address = TRIGGER_REGISTERS[channel.index()];
                rebuilt.write_register(address, bank.read_register(address) | TRIGGER, &mut replayed);
            }
        }

        *self = rebuilt;
        log::debug!("sound state reloaded, status {:#03X} -> {:#03X}", before, self.status_bits());
        self.announce_changes(before, backend);
    }

    /// Report the difference between `before` (NR52 status bits) and now.
    pub fn announce_changes(&self, before: u8, backend: &mut dyn AudioBackend) {
        for channel in ChannelId::ALL {
            let was_on = before & (1 << channel.index()) != 0;
            match (was_on, self.is_enabled(channel)) {
                (false, true) => backend.channel_on(channel),
                (true, false) => backend.channel_off(channel),
                _ => {}
            }
        }
    }

    fn announce_on(&self, channel: ChannelId, backend: &mut dyn AudioBackend) {
        log::debug!("{} triggered", channel);
        backend.channel_on(channel);
    }

    fn announce_off(&self, channel: ChannelId, backend: &mut dyn AudioBackend) {
        log::debug!("{} stopped", channel);
        backend.channel_off(channel);
    }

    // --- Savestate ---

    pub fn save_state(&self, buf: &mut Vec<u8>) {
        use crate::savestate::*;
        write_u32_le(buf, self.clock_rate);
        write_bool(buf, self.master_enabled);
        write_u8(buf, self.left_volume);
        write_u8(buf, self.right_volume);
        write_u8(buf, routing_byte(&self.to_left, &self.to_right));
        self.channel1.save_state(buf);
        self.channel2.save_state(buf);
        self.channel3.save_state(buf);
        self.channel4.save_state(buf);
    }

    pub fn load_state(&mut self, data: &[u8], cursor: &mut usize) -> Result<(), String> {
        use crate::savestate::*;
        let clock_rate = read_u32_le(data, cursor)?;
        if clock_rate != self.clock_rate {
            return Err(format!(
                "Clock rate mismatch: snapshot {} Hz, engine {} Hz",
                clock_rate, self.clock_rate
            ));
        }
        let mut loaded = SoundEngine::new(clock_rate);
        loaded.master_enabled = read_bool(data, cursor)?;
        loaded.left_volume = read_u8(data, cursor)? & LEFT_VOLUME_MASK;
        loaded.right_volume = read_u8(data, cursor)? & RIGHT_VOLUME_MASK;
        let routing = read_u8(data, cursor)?;
        for i in 0..4 {
            loaded.to_right[i] = routing & (1 << i) != 0;
            loaded.to_left[i] = routing & (1 << (i as u8 + ROUTE_LEFT_SHIFT)) != 0;
        }
        loaded.channel1.load_state(data, cursor)?;
        loaded.channel2.load_state(data, cursor)?;
        loaded.channel3.load_state(data, cursor)?;
        loaded.channel4.load_state(data, cursor)?;
        *self = loaded;
        Ok(())
    }
}

impl Default for SoundEngine {
    fn default() -> Self {
        SoundEngine::new(DMG_CLOCK_RATE)
    }
}

fn routing_byte(to_left: &[bool; 4], to_right: &[bool; 4]) -> u8 {
    let mut val = 0;
    for i in 0..4 {
        if to_right[i] { val |= 1 << i; }
        if to_left[i] { val |= 1 << (i as u8 + ROUTE_LEFT_SHIFT); }
    }
    val
}
