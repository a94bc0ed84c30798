use super::registers::*;
use crate::savestate::*;

/// Length countdown shared by all four channels.
///
/// The raw field is latched on the length register write; the countdown in
/// cycles is derived from it whenever the channel reloads its length.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LengthCounter {
    pub raw: u8,
    pub counter: i64,
    pub use_length: bool,
}

impl LengthCounter {
    /// `(max - raw) * clock_rate / 256`
    pub fn reload(&mut self, max: i64, clock_rate: u32) {
        self.counter = (max - self.raw as i64) * clock_rate as i64 / 256;
    }

    /// Returns true when the countdown expires during this step.
    pub fn clock(&mut self, cycles: u32) -> bool {
        if !self.use_length {
            return false;
        }
        self.counter -= cycles as i64;
        self.counter <= 0
    }

    pub fn save_state(&self, buf: &mut Vec<u8>) {
        write_u8(buf, self.raw);
        write_i64_le(buf, self.counter);
        write_bool(buf, self.use_length);
    }

    pub fn load_state(&mut self, data: &[u8], cursor: &mut usize) -> Result<(), String> {
        self.raw = read_u8(data, cursor)?;
        self.counter = read_i64_le(data, cursor)?;
        self.use_length = read_bool(data, cursor)?;
        Ok(())
    }
}

/// Volume envelope (channels 1, 2 and 4).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    pub initial_volume: u8,
    /// +1 grows, -1 decays.
    pub direction: i8,
    /// 0 disables the envelope.
    pub step: u8,
    pub counter: i64,
}

impl Envelope {
    pub fn write(&mut self, val: u8) {
        self.initial_volume = field(val, ENVELOPE_VOLUME_SHIFT, ENVELOPE_VOLUME_MASK);
        self.direction = if val & ENVELOPE_INCREASE != 0 { 1 } else { -1 };
        self.step = val & ENVELOPE_STEP_MASK;
    }

    fn interval(&self, clock_rate: u32) -> i64 {
        self.step as i64 * clock_rate as i64 / 64
    }

    /// Called on every trigger, so the first volume step lands one full
    /// period after it instead of on the next `clock`.
    pub fn restart(&mut self, clock_rate: u32) {
        self.counter = self.interval(clock_rate);
    }

    /// Runs the countdown and returns the volume after this step.
    pub fn clock(&mut self, cycles: u32, clock_rate: u32, volume: u8) -> u8 {
        if self.step == 0 {
            return volume;
        }
        self.counter -= cycles as i64;
        if self.counter > 0 {
            return volume;
        }
        self.counter = self.interval(clock_rate);
        (volume as i16 + self.direction as i16).clamp(0, 15) as u8
    }

    pub fn save_state(&self, buf: &mut Vec<u8>) {
        write_u8(buf, self.initial_volume);
        write_u8(buf, self.direction as u8);
        write_u8(buf, self.step);
        write_i64_le(buf, self.counter);
    }

    pub fn load_state(&mut self, data: &[u8], cursor: &mut usize) -> Result<(), String> {
        self.initial_volume = read_u8(data, cursor)? & ENVELOPE_VOLUME_MASK;
        self.direction = if read_u8(data, cursor)? as i8 > 0 { 1 } else { -1 };
        self.step = read_u8(data, cursor)? & ENVELOPE_STEP_MASK;
        self.counter = read_i64_le(data, cursor)?;
        Ok(())
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Envelope {
            initial_volume: 0,
            direction: -1,
            step: 0,
            counter: 0,
        }
    }
}
