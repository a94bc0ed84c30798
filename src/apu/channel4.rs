use super::registers::*;
use super::units::{Envelope, LengthCounter};
use crate::savestate::*;

/// Noise channel. The LFSR is only seeded here; shifting it is synthesis work.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Channel4 {
    pub enabled: bool,
    volume: u8,
    clock_shift: u8,
    divisor_code: u8,
    width_7bit: bool,
    lfsr: u16,
    pub length: LengthCounter,
    pub envelope: Envelope,
}

impl Channel4 {
    pub fn volume(&self) -> u8 { self.volume }
    pub fn clock_shift(&self) -> u8 { self.clock_shift }
    pub fn divisor_code(&self) -> u8 { self.divisor_code }
    pub fn width_7bit(&self) -> bool { self.width_7bit }
    pub fn lfsr(&self) -> u16 { self.lfsr }

    /// Divisor ratio; code 0 stands for one half.
    pub fn divisor_ratio(&self) -> f32 {
        if self.divisor_code == 0 {
            0.5
        } else {
            self.divisor_code as f32
        }
    }

    // --- Register writes ---

    pub fn write_nr41(&mut self, val: u8) {
        self.length.raw = val & NOISE_LENGTH_MASK;
    }

    pub fn write_nr42(&mut self, val: u8) {
        self.envelope.write(val);
        self.volume = self.envelope.initial_volume;
    }

    pub fn write_nr43(&mut self, val: u8) {
        self.clock_shift = field(val, NOISE_CLOCK_SHIFT, NOISE_CLOCK_MASK);
        self.width_7bit = val & NOISE_WIDTH_7BIT != 0;
        self.divisor_code = val & NOISE_DIVISOR_MASK;
    }

    /// Returns true when the write triggered the channel.
    pub fn write_nr44(&mut self, val: u8, clock_rate: u32) -> bool {
        let triggering = val & TRIGGER != 0;
        if triggering {
            self.length.reload(64, clock_rate);
            self.volume = self.envelope.initial_volume;
            self.envelope.restart(clock_rate);
            self.enabled = true;
            self.lfsr = LFSR_SEED;
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
            log::trace!("channel 4 length expired");
            self.enabled = false;
            return true;
        }
        false
    }

    // --- Savestate ---

    pub fn save_state(&self, buf: &mut Vec<u8>) {
        write_bool(buf, self.enabled);
        write_u8(buf, self.volume);
        write_u8(buf, self.clock_shift);
        write_u8(buf, self.divisor_code);
        write_bool(buf, self.width_7bit);
        write_u16_le(buf, self.lfsr);
        self.length.save_state(buf);
        self.envelope.save_state(buf);
    }

    pub fn load_state(&mut self, data: &[u8], cursor: &mut usize) -> Result<(), String> {
        self.enabled = read_bool(data, cursor)?;
        self.volume = read_u8(data, cursor)?.min(15);
        self.clock_shift = read_u8(data, cursor)? & NOISE_CLOCK_MASK;
        self.divisor_code = read_u8(data, cursor)? & NOISE_DIVISOR_MASK;
        self.width_7bit = read_bool(data, cursor)?;
        self.lfsr = read_u16_le(data, cursor)? & LFSR_SEED;
        self.length.load_state(data, cursor)?;
        self.envelope.load_state(data, cursor)?;
        Ok(())
    }
}

impl Default for Channel4 {
    fn default() -> Self {
        Channel4 {
            enabled: false,
            volume: 0,
            clock_shift: 0,
            divisor_code: 0,
            width_7bit: false,
            lfsr: LFSR_SEED,
            length: LengthCounter::default(),
            envelope: Envelope::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLOCK: u32 = 4_194_304;

    #[test]
    fn test_nr43_fields() {
        let mut ch = Channel4::default();
        ch.write_nr43(0x5B);
        assert_eq!(ch.clock_shift(), 5);
        assert!(ch.width_7bit());
        assert_eq!(ch.divisor_code(), 3);
        assert_eq!(ch.divisor_ratio(), 3.0);

        ch.write_nr43(0x00);
        assert_eq!(ch.divisor_ratio(), 0.5);
    }

    #[test]
    fn test_length_is_five_bits() {
        let mut ch = Channel4::default();
        ch.write_nr41(0xFF);
        assert_eq!(ch.length.raw, 0x1F);
        ch.write_nr44(0x80, CLOCK);
        assert_eq!(ch.length.counter, (64 - 0x1F) * CLOCK as i64 / 256);
    }

    #[test]
    fn test_trigger_sets_volume_and_use_length() {
        let mut ch = Channel4::default();
        ch.write_nr42(0xC0);
        assert!(ch.write_nr44(0xC0, CLOCK));
        assert!(ch.enabled);
        assert!(ch.length.use_length);
        assert_eq!(ch.volume(), 12);
        assert_eq!(ch.lfsr(), LFSR_SEED);

        assert!(!ch.write_nr44(0x00, CLOCK));
        assert!(!ch.length.use_length);
        assert!(ch.enabled);
    }

    #[test]
    fn test_envelope_grows_until_max() {
        let mut ch = Channel4::default();
        ch.write_nr42(0xE9); // volume 14, grow, step 1
        ch.write_nr44(0x80, CLOCK);
        ch.advance(CLOCK / 64, CLOCK);
        ch.advance(CLOCK / 64, CLOCK);
        assert_eq!(ch.volume(), 15);
    }
}
