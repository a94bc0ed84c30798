use super::registers::*;
use super::units::LengthCounter;
use crate::savestate::*;

/// Custom waveform channel. Wave RAM contents belong to synthesis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Channel3 {
    pub enabled: bool,
    pub dac_enabled: bool,
    frequency: u16,
    /// NR32 level code minus one: -1 mutes, 0..=2 is the sample right shift.
    output_level: i8,
    pub length: LengthCounter,
}

impl Channel3 {
    pub fn frequency(&self) -> u16 { self.frequency }
    pub fn output_level(&self) -> i8 { self.output_level }

    /// Output level expressed on the 0..=15 scale of the other channels.
    pub fn volume(&self) -> u8 {
        if self.output_level < 0 {
            0
        } else {
            0x0F >> self.output_level
        }
    }

    // --- Register writes ---

    /// Returns true when the write switched a sounding channel off.
    pub fn write_nr30(&mut self, val: u8) -> bool {
        self.dac_enabled = val & WAVE_DAC_ON != 0;
        if self.dac_enabled {
            return false;
        }
        let was_enabled = self.enabled;
        self.enabled = false;
        was_enabled
    }

    pub fn write_nr31(&mut self, val: u8) {
        self.length.raw = val;
    }

    pub fn write_nr32(&mut self, val: u8) {
        self.output_level = field(val, WAVE_LEVEL_SHIFT, WAVE_LEVEL_MASK) as i8 - 1;
    }

    pub fn write_nr33(&mut self, val: u8) {
        self.frequency = (self.frequency & 0x700) | val as u16;
    }

    /// Returns true when the write triggered the channel.
    pub fn write_nr34(&mut self, val: u8, clock_rate: u32) -> bool {
        self.frequency = (self.frequency & 0xFF) | ((val & FREQUENCY_HIGH_MASK) as u16) << 8;
        let triggering = val & TRIGGER != 0 && self.dac_enabled;
        if triggering {
            self.enabled = true;
            self.length.reload(256, clock_rate);
        }
        self.length.use_length = val & LENGTH_ENABLE != 0;
        triggering
    }

    // --- Clocking ---

    pub fn advance(&mut self, cycles: u32) -> bool {
        if self.enabled && self.length.clock(cycles) {
            log::trace!("channel 3 length expired");
            self.enabled = false;
            return true;
        }
        false
    }

    // --- Savestate ---

    pub fn save_state(&self, buf: &mut Vec<u8>) {
        write_bool(buf, self.enabled);
        write_bool(buf, self.dac_enabled);
        write_u16_le(buf, self.frequency);
        write_u8(buf, self.output_level as u8);
        self.length.save_state(buf);
    }

    pub fn load_state(&mut self, data: &[u8], cursor: &mut usize) -> Result<(), String> {
        self.enabled = read_bool(data, cursor)?;
        self.dac_enabled = read_bool(data, cursor)?;
        self.frequency = read_u16_le(data, cursor)?;
        self.output_level = (read_u8(data, cursor)? as i8).clamp(-1, 2);
        self.length.load_state(data, cursor)?;
        Ok(())
    }
}

impl Default for Channel3 {
    fn default() -> Self {
        Channel3 {
            enabled: false,
            dac_enabled: false,
            frequency: 0,
            output_level: -1,
            length: LengthCounter::default(),
        }
    }
}
