use super::registers::*;
use super::units::{Envelope, LengthCounter};
use crate::savestate::*;

/// Frequency sweep unit (channel 1 only).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sweep {
    /// 0 disables the sweep.
    pub period: u8,
    /// +1 raises the frequency, -1 lowers it.
    pub direction: i8,
    pub shift: u8,
    pub counter: i64,
}

impl Sweep {
    fn interval(&self, clock_rate: u32) -> i64 {
        clock_rate as i64 / (128 / self.period as i64)
    }
}

impl Default for Sweep {
    fn default() -> Self {
        Sweep {
            period: 0,
            direction: 1,
            shift: 0,
            counter: 0,
        }
    }
}

/// Pulse channel with frequency sweep.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Channel1 {
    pub enabled: bool,
    frequency: u16,
    volume: u8,
    duty: u8,
    pub length: LengthCounter,
    pub envelope: Envelope,
    pub sweep: Sweep,
}

impl Channel1 {
    pub fn frequency(&self) -> u16 { self.frequency }
    pub fn volume(&self) -> u8 { self.volume }
    pub fn duty(&self) -> u8 { self.duty }

    // --- Register writes ---

    pub fn write_nr10(&mut self, val: u8, clock_rate: u32) {
        self.sweep.period = field(val, SWEEP_PERIOD_SHIFT, SWEEP_PERIOD_MASK);
        if self.sweep.period != 0 {
            self.sweep.counter = self.sweep.interval(clock_rate);
        }
        self.sweep.direction = if val & SWEEP_SUBTRACT != 0 { -1 } else { 1 };
        self.sweep.shift = val & SWEEP_SHIFT_MASK;
    }

    pub fn write_nr11(&mut self, val: u8, clock_rate: u32) {
        self.length.raw = val & PULSE_LENGTH_MASK;
        self.length.reload(64, clock_rate);
        self.duty = field(val, DUTY_SHIFT, DUTY_MASK);
    }

    pub fn write_nr12(&mut self, val: u8) {
        self.envelope.write(val);
        self.volume = self.envelope.initial_volume;
    }

    pub fn write_nr13(&mut self, val: u8) {
        self.frequency = (self.frequency & 0x700) | val as u16;
    }

    /// Returns true when the write triggered the channel.
    pub fn write_nr14(&mut self, val: u8, clock_rate: u32) -> bool {
        self.frequency = (self.frequency & 0xFF) | ((val & FREQUENCY_HIGH_MASK) as u16) << 8;
        let triggering = val & TRIGGER != 0;
        if triggering {
            self.trigger(clock_rate);
        }
        self.length.use_length = val & LENGTH_ENABLE != 0;
        triggering
    }

    fn trigger(&mut self, clock_rate: u32) {
        self.length.reload(64, clock_rate);
        self.enabled = true;
        self.volume = self.envelope.initial_volume;
        self.envelope.restart(clock_rate);
        if self.sweep.period != 0 {
            self.sweep.counter = self.sweep.interval(clock_rate);
        }
    }

    // --- Clocking ---

    /// Returns true when the channel switched itself off during this step.
    pub fn advance(&mut self, cycles: u32, clock_rate: u32) -> bool {
        if !self.enabled {
            return false;
        }

        if self.sweep.period != 0 {
            self.sweep.counter -= cycles as i64;
            if self.sweep.counter <= 0 {
                // Carry the overshoot so the sweep keeps its period.
                self.sweep.counter += self.sweep.interval(clock_rate);
                let delta = (self.frequency >> self.sweep.shift) as i32 * self.sweep.direction as i32;
                let next = self.frequency as i32 + delta;
                self.frequency = next as u16;
                if next > FREQUENCY_MAX as i32 {
                    log::trace!("channel 1 sweep overflow: {:#05X}", next);
                    self.enabled = false;
                    return true;
                }
            }
        }

        self.volume = self.envelope.clock(cycles, clock_rate, self.volume);

        if self.length.clock(cycles) {
            log::trace!("channel 1 length expired");
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
        write_u8(buf, self.sweep.period);
        write_u8(buf, self.sweep.direction as u8);
        write_u8(buf, self.sweep.shift);
        write_i64_le(buf, self.sweep.counter);
    }

    pub fn load_state(&mut self, data: &[u8], cursor: &mut usize) -> Result<(), String> {
        self.enabled = read_bool(data, cursor)?;
        self.frequency = read_u16_le(data, cursor)?;
        self.volume = read_u8(data, cursor)?.min(15);
        self.duty = read_u8(data, cursor)? & DUTY_MASK;
        self.length.load_state(data, cursor)?;
        self.envelope.load_state(data, cursor)?;
        self.sweep.period = read_u8(data, cursor)? & SWEEP_PERIOD_MASK;
        self.sweep.direction = if read_u8(data, cursor)? as i8 > 0 { 1 } else { -1 };
        self.sweep.shift = read_u8(data, cursor)? & SWEEP_SHIFT_MASK;
        self.sweep.counter = read_i64_le(data, cursor)?;
        Ok(())
    }
}
