// Sound register addresses and bit fields.

pub const NR10: u16 = 0xFF10;
pub const NR11: u16 = 0xFF11;
pub const NR12: u16 = 0xFF12;
pub const NR13: u16 = 0xFF13;
pub const NR14: u16 = 0xFF14;

pub const NR21: u16 = 0xFF16;
pub const NR22: u16 = 0xFF17;
pub const NR23: u16 = 0xFF18;
pub const NR24: u16 = 0xFF19;

pub const NR30: u16 = 0xFF1A;
pub const NR31: u16 = 0xFF1B;
pub const NR32: u16 = 0xFF1C;
pub const NR33: u16 = 0xFF1D;
pub const NR34: u16 = 0xFF1E;

pub const NR41: u16 = 0xFF20;
pub const NR42: u16 = 0xFF21;
pub const NR43: u16 = 0xFF22;
pub const NR44: u16 = 0xFF23;

pub const NR50: u16 = 0xFF24;
pub const NR51: u16 = 0xFF25;
pub const NR52: u16 = 0xFF26;

pub const WAVE_RAM_START: u16 = 0xFF30;
pub const WAVE_RAM_END: u16 = 0xFF3F;

/// First and last address of the sound register block.
pub const SOUND_START: u16 = NR10;
pub const SOUND_END: u16 = WAVE_RAM_END;
pub const SOUND_LEN: usize = (SOUND_END - SOUND_START + 1) as usize;

/// Registers whose bit 7 restarts a channel, in channel order.
pub const TRIGGER_REGISTERS: [u16; 4] = [NR14, NR24, NR34, NR44];

// --- NR10: sweep ---
pub const SWEEP_PERIOD_SHIFT: u8 = 4;
pub const SWEEP_PERIOD_MASK: u8 = 0x07;
pub const SWEEP_SUBTRACT: u8 = 0x08;
pub const SWEEP_SHIFT_MASK: u8 = 0x07;

// --- NRx1: length / duty ---
pub const DUTY_SHIFT: u8 = 6;
pub const DUTY_MASK: u8 = 0x03;
pub const PULSE_LENGTH_MASK: u8 = 0x3F;
pub const NOISE_LENGTH_MASK: u8 = 0x1F;

// --- NRx2: envelope ---
pub const ENVELOPE_VOLUME_SHIFT: u8 = 4;
pub const ENVELOPE_VOLUME_MASK: u8 = 0x0F;
pub const ENVELOPE_INCREASE: u8 = 0x08;
pub const ENVELOPE_STEP_MASK: u8 = 0x07;

// --- NRx3 / NRx4: frequency and control ---
pub const FREQUENCY_HIGH_MASK: u8 = 0x07;
pub const FREQUENCY_MAX: u16 = 0x7FF;
pub const TRIGGER: u8 = 0x80;
pub const LENGTH_ENABLE: u8 = 0x40;

// --- NR30: wave DAC ---
pub const WAVE_DAC_ON: u8 = 0x80;

// --- NR32: wave output level ---
pub const WAVE_LEVEL_SHIFT: u8 = 5;
pub const WAVE_LEVEL_MASK: u8 = 0x03;

// --- NR43: noise polynomial ---
pub const NOISE_CLOCK_SHIFT: u8 = 4;
pub const NOISE_CLOCK_MASK: u8 = 0x0F;
pub const NOISE_WIDTH_7BIT: u8 = 0x08;
pub const NOISE_DIVISOR_MASK: u8 = 0x07;
pub const LFSR_SEED: u16 = 0x7FFF;

// --- NR50: master volume ---
pub const RIGHT_VOLUME_MASK: u8 = 0x07;
pub const LEFT_VOLUME_SHIFT: u8 = 4;
pub const LEFT_VOLUME_MASK: u8 = 0x07;

// --- NR51: routing ---
pub const ROUTE_LEFT_SHIFT: u8 = 4;

// --- NR52: master enable / status ---
pub const MASTER_ENABLE: u8 = 0x80;
pub const STATUS_MASK: u8 = 0x0F;

/// Extract `(value >> shift) & mask`.
pub fn field(value: u8, shift: u8, mask: u8) -> u8 {
    (value >> shift) & mask
}
