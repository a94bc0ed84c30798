use std::fmt;

/// One of the four sound channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelId {
    Pulse1,
    Pulse2,
    Wave,
    Noise,
}

impl ChannelId {
    pub const ALL: [ChannelId; 4] = [
        ChannelId::Pulse1,
        ChannelId::Pulse2,
        ChannelId::Wave,
        ChannelId::Noise,
    ];

    /// Zero-based index, also the channel's bit in NR51/NR52.
    pub fn index(self) -> usize {
        match self {
            ChannelId::Pulse1 => 0,
            ChannelId::Pulse2 => 1,
            ChannelId::Wave => 2,
            ChannelId::Noise => 3,
        }
    }

    /// Hardware channel number, 1..=4.
    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel {}", self.number())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelEvent {
    On(ChannelId),
    Off(ChannelId),
}

/// Host audio side. Receives channel transitions as they happen.
pub trait AudioBackend {
    fn channel_on(&mut self, channel: ChannelId);
    fn channel_off(&mut self, channel: ChannelId);

    /// Silence or restore the host output without touching channel state.
    fn set_muted(&mut self, _muted: bool) {}
}

/// Records every transition in order.
impl AudioBackend for Vec<ChannelEvent> {
    fn channel_on(&mut self, channel: ChannelId) {
        self.push(ChannelEvent::On(channel));
    }

    fn channel_off(&mut self, channel: ChannelId) {
        self.push(ChannelEvent::Off(channel));
    }
}

/// Per-channel gates a mixer can consult before producing samples.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelGate {
    on: [bool; 4],
    muted: bool,
}

impl ChannelGate {
    pub fn is_on(&self, channel: ChannelId) -> bool {
        self.on[channel.index()]
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_audible(&self, channel: ChannelId) -> bool {
        !self.muted && self.is_on(channel)
    }
}

impl AudioBackend for ChannelGate {
    fn channel_on(&mut self, channel: ChannelId) {
        self.on[channel.index()] = true;
    }

    fn channel_off(&mut self, channel: ChannelId) {
        self.on[channel.index()] = false;
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }
}

/// Logs transitions and keeps a gate in sync; used by the trace player.
#[derive(Debug, Default)]
pub struct LogBackend {
    pub gate: ChannelGate,
    pub events: usize,
}

impl AudioBackend for LogBackend {
    fn channel_on(&mut self, channel: ChannelId) {
        log::info!("{} on", channel);
        self.events += 1;
        self.gate.channel_on(channel);
    }

    fn channel_off(&mut self, channel: ChannelId) {
        log::info!("{} off", channel);
        self.events += 1;
        self.gate.channel_off(channel);
    }

    fn set_muted(&mut self, muted: bool) {
        log::info!("output {}", if muted { "muted" } else { "unmuted" });
        self.gate.set_muted(muted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_numbers() {
        let numbers: Vec<u8> = ChannelId::ALL.iter().map(|c| c.number()).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert_eq!(ChannelId::Wave.to_string(), "channel 3");
    }

    #[test]
    fn test_gate_tracks_transitions_and_mute() {
        let mut gate = ChannelGate::default();
        gate.channel_on(ChannelId::Noise);
        assert!(gate.is_audible(ChannelId::Noise));
        assert!(!gate.is_on(ChannelId::Pulse1));

        gate.set_muted(true);
        assert!(gate.is_on(ChannelId::Noise));
        assert!(!gate.is_audible(ChannelId::Noise));

        gate.set_muted(false);
        gate.channel_off(ChannelId::Noise);
        assert!(!gate.is_audible(ChannelId::Noise));
    }

    #[test]
    fn test_vec_backend_ignores_mute() {
        let mut events: Vec<ChannelEvent> = Vec::new();
        events.set_muted(true);
        events.channel_on(ChannelId::Pulse2);
        assert_eq!(events, vec![ChannelEvent::On(ChannelId::Pulse2)]);
    }
}
