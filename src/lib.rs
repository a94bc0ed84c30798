pub mod apu;
pub mod backend;
pub mod config;
pub mod io;
pub mod savestate;
pub mod script;

pub use apu::{ChannelControl, SoundEngine, DMG_CLOCK_RATE};
pub use backend::{AudioBackend, ChannelEvent, ChannelGate, ChannelId, LogBackend};
pub use io::{RegisterBank, SoundIo};
