use super::registers::*;
use super::units::{Envelope, LengthCounter};
use crate::savestate::*;

/// Plain pulse channel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Channel2 {
    pub enabled: bool,
    frequency: u16,
    volume: u8,
    duty: u8,
    pub length: LengthCounter,
    pub envelope: Envelope,
}

impl Channel2 {
    pub fn frequency(&self) -> u16 { self.frequency }
    pub fn volume(&self) -> u8 { self.volume }
    pub fn duty(&self) -> u8 { self.duty }

    // --- Register writes ---

    pub fn write_nr21(&mut self, val: u8, clock_rate: u32) {
        self.length.raw = val & PULSE_LENGTH_MASK;
        self.length.reload(64, clock_rate);
        self.duty = field(val, DUTY_SHIFT, DUTY_MASK);
    }

    pub fn write_nr22(&mut self, val: u8) {
        self.envelope.write(val);
        self.volume = self.envelope.initial_volume;
    }

    pub fn write_nr23(&mut self, val: u8) {
        self.frequency = (self.frequency & 0x700) | val as u16;
    }

    /// Returns true when the write triggered the channel.
    pub fn write_nr24(&mut self, val: u8, clock_rate: u32) -> bool {
        self.frequency = (self.frequency & 0xFF) | ((val & FREQUENCY_HIGH_MASK) as u16) << 8;
        let triggering = val & TRIGGER != 0;
        if triggering {
            self.length.reload(64, clock_rate);
            self.enabled = true;
            self.volume = self.envelope.initial_volume;
            self.envelope.restart(clock_rate);
        }
        self.length.use_length = val & LENGTH_ENABLE != 0;
        triggering
    }

    // --- Clocking ---

    pub fn advance(&mut self, cycles: u32, clock_rate: u32) -> bool {
        if !self.enabled {
            return false;
        }
        self.volume = self.envelope.clock(cycles, clock_rate, self.volume);
        if self.length.clock(cycles) {
            log::trace!("channel 2 length expired");
            self.enabled = false;
            return true;
        }
        false
    }

    // --- Savestate ---

    pub fn save_state(&self, buf: &mut Vec<u8>) {
        write_bool(buf, self.enabled);
        write_u16_le(buf, self.frequency);
        write_u8(buf, self.volume);
        write_u8(buf, self.duty);
        self.length.save_state(buf);
        self.envelope.save_state(buf);
    }

    pub fn load_state(&mut self, data: &[u8], cursor: &mut usize) -> Result<(), String> {
        self.enabled = read_bool(data, cursor)?;
        self.frequency = read_u16_le(data, cursor)?;
        self.volume = read_u8(data, cursor)?.min(15);
        self.duty = read_u8(data, cursor)? & DUTY_MASK;
        self.length.load_state(data, cursor)?;
        self.envelope.load_state(data, cursor)?;
        Ok(())
    }
}
