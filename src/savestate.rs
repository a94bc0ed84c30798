use std::fs;
use std::path::Path;

use crate::apu::registers::SOUND_LEN;
use crate::backend::AudioBackend;
use crate::io::SoundIo;

const MAGIC: [u8; 4] = *b"GBSN";
const VERSION: u8 = 0x01;

// --- Write helpers ---

pub fn write_u8(buf: &mut Vec<u8>, val: u8) {
    buf.push(val);
}

pub fn write_u16_le(buf: &mut Vec<u8>, val: u16) {
    buf.extend_from_slice(&val.to_le_bytes());
}

pub fn write_u32_le(buf: &mut Vec<u8>, val: u32) {
    buf.extend_from_slice(&val.to_le_bytes());
}

pub fn write_i64_le(buf: &mut Vec<u8>, val: i64) {
    buf.extend_from_slice(&val.to_le_bytes());
}

pub fn write_bool(buf: &mut Vec<u8>, val: bool) {
    buf.push(if val { 1 } else { 0 });
}

pub fn write_bytes(buf: &mut Vec<u8>, data: &[u8]) {
    buf.extend_from_slice(data);
}

// --- Read helpers ---

pub fn read_bytes<'a>(data: &'a [u8], cursor: &mut usize, len: usize) -> Result<&'a [u8], String> {
    let slice = data
        .get(*cursor..*cursor + len)
        .ok_or_else(|| format!("Snapshot truncated at byte {}", *cursor))?;
    *cursor += len;
    Ok(slice)
}

fn read_array<const N: usize>(data: &[u8], cursor: &mut usize) -> Result<[u8; N], String> {
    let mut out = [0u8; N];
    out.copy_from_slice(read_bytes(data, cursor, N)?);
    Ok(out)
}

pub fn read_u8(data: &[u8], cursor: &mut usize) -> Result<u8, String> {
    Ok(read_array::<1>(data, cursor)?[0])
}

pub fn read_u16_le(data: &[u8], cursor: &mut usize) -> Result<u16, String> {
    Ok(u16::from_le_bytes(read_array(data, cursor)?))
}

pub fn read_u32_le(data: &[u8], cursor: &mut usize) -> Result<u32, String> {
    Ok(u32::from_le_bytes(read_array(data, cursor)?))
}

pub fn read_i64_le(data: &[u8], cursor: &mut usize) -> Result<i64, String> {
    Ok(i64::from_le_bytes(read_array(data, cursor)?))
}

pub fn read_bool(data: &[u8], cursor: &mut usize) -> Result<bool, String> {
    Ok(read_u8(data, cursor)? != 0)
}

// --- Top-level save/load ---

/// Serialize the register bank, plus the engine's derived state when
/// `include_cache` is set.
pub fn save(io: &SoundIo, include_cache: bool) -> Vec<u8> {
    let mut buf = Vec::new();

    // Header
    write_bytes(&mut buf, &MAGIC);
    write_u8(&mut buf, VERSION);

    // Body
    write_bytes(&mut buf, &io.registers());
    write_bool(&mut buf, include_cache);
    if include_cache {
        io.engine().save_state(&mut buf);
    }

    buf
}

/// Restore a snapshot. Without a cached engine state the engine is rebuilt
/// from the registers; either way the backend hears the net transitions.
pub fn load(io: &mut SoundIo, data: &[u8], backend: &mut dyn AudioBackend) -> Result<(), String> {
    if data.len() < MAGIC.len() + 2 + SOUND_LEN {
        return Err("Snapshot too small".to_string());
    }

    let mut cursor = 0;

    // Validate header
    let magic = read_bytes(data, &mut cursor, 4)?;
    if magic != MAGIC {
        return Err("Invalid snapshot magic".to_string());
    }

    let version = read_u8(data, &mut cursor)?;
    if version != VERSION {
        return Err(format!("Unsupported snapshot version: {}", version));
    }

    // Body
    let regs = read_bytes(data, &mut cursor, SOUND_LEN)?;
    let has_cache = read_bool(data, &mut cursor)?;
    if !has_cache {
        return io.restore(regs, backend);
    }

    let before = io.engine().status_bits();
    let mut engine = io.engine().clone();
    engine.load_state(data, &mut cursor)?;
    if cursor != data.len() {
        return Err(format!("{} trailing bytes after snapshot", data.len() - cursor));
    }

    io.restore_registers(regs)?;
    *io.engine_mut() = engine;
    io.engine().announce_changes(before, backend);
    Ok(())
}

// --- File I/O wrappers ---

pub fn save_to_file(io: &SoundIo, include_cache: bool, path: &Path) -> Result<(), String> {
    let data = save(io, include_cache);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create snapshot directory: {}", e))?;
    }
    fs::write(path, &data).map_err(|e| format!("Failed to write snapshot: {}", e))?;
    log::debug!("wrote {} byte snapshot to {}", data.len(), path.display());
    Ok(())
}

pub fn load_from_file(io: &mut SoundIo, path: &Path, backend: &mut dyn AudioBackend) -> Result<(), String> {
    let data = fs::read(path).map_err(|e| format!("Failed to read snapshot: {}", e))?;
    load(io, &data, backend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apu::registers::*;
    use crate::backend::{ChannelEvent, ChannelId};

    fn playing() -> SoundIo {
        let mut io = SoundIo::default();
        let mut events: Vec<ChannelEvent> = Vec::new();
        io.write(NR52, 0x80, &mut events);
        io.write(NR50, 0x35, &mut events);
        io.write(NR51, 0xF3, &mut events);
        io.write(NR12, 0xA2, &mut events);
        io.write(NR11, 0x20, &mut events);
        io.write(NR13, 0x80, &mut events);
        io.write(NR14, 0xC3, &mut events);
        io.advance(10_000, &mut events);
        io
    }

    #[test]
    fn test_cached_snapshot_restores_exact_state() {
        let io = playing();
        let data = save(&io, true);

        let mut restored = SoundIo::default();
        let mut events: Vec<ChannelEvent> = Vec::new();
        load(&mut restored, &data, &mut events).unwrap();

        assert_eq!(restored, io);
        assert_eq!(events, vec![ChannelEvent::On(ChannelId::Pulse1)]);
    }

    fn reload_from_snapshot(io: &SoundIo) -> (SoundIo, Vec<ChannelEvent>) {
        let data = save(io, false);
        let mut restored = SoundIo::default();
        let mut events: Vec<ChannelEvent> = Vec::new();
        load(&mut restored, &data, &mut events).unwrap();
        (restored, events)
    }

    #[test]
    fn test_register_snapshot_skips_length_expired_channel() {
        let mut io = SoundIo::default();
        let mut events: Vec<ChannelEvent> = Vec::new();
        io.write(NR52, 0x80, &mut events);
        io.write(NR22, 0xF0, &mut events);
        io.write(NR21, 0x3F, &mut events);
        io.write(NR24, 0xC0, &mut events);
        io.advance(DMG_CLOCK / 256, &mut events);
        assert_eq!(io.engine().status_bits(), 0);

        let (restored, events) = reload_from_snapshot(&io);
        assert!(!restored.engine().is_enabled(ChannelId::Pulse2));
        assert!(events.is_empty());
    }

    #[test]
    fn test_register_snapshot_skips_sweep_overflowed_channel() {
        let mut io = SoundIo::default();
        let mut events: Vec<ChannelEvent> = Vec::new();
        io.write(NR52, 0x80, &mut events);
        io.write(NR12, 0xF0, &mut events);
        io.write(NR10, 0x11, &mut events);
        io.write(NR13, 0xFE, &mut events);
        io.write(NR14, 0x87, &mut events);
        io.advance(DMG_CLOCK / 128, &mut events);
        assert!(!io.engine().is_enabled(ChannelId::Pulse1));

        let (restored, events) = reload_from_snapshot(&io);
        assert!(!restored.engine().is_enabled(ChannelId::Pulse1));
        assert!(events.is_empty());
    }

    #[test]
    fn test_register_snapshot_reloads() {
        let io = playing();
        let data = save(&io, false);

        let mut restored = SoundIo::default();
        let mut events: Vec<ChannelEvent> = Vec::new();
        load(&mut restored, &data, &mut events).unwrap();

        let engine = restored.engine();
        assert!(engine.is_enabled(ChannelId::Pulse1));
        assert_eq!(engine.left_volume(), 3);
        assert_eq!(engine.right_volume(), 5);
        assert_eq!(engine.channel1.frequency(), 0x380);
        // Counters restart from the register values.
        assert_eq!(engine.channel1.length.counter, 32 * DMG_CLOCK as i64 / 256);
        assert_eq!(events, vec![ChannelEvent::On(ChannelId::Pulse1)]);
    }

    const DMG_CLOCK: u32 = crate::apu::DMG_CLOCK_RATE;

    #[test]
    fn test_load_rejects_bad_header() {
        let mut data = save(&playing(), false);
        let mut io = SoundIo::default();
        let mut events: Vec<ChannelEvent> = Vec::new();

        data[0] = b'X';
        assert_eq!(load(&mut io, &data, &mut events), Err("Invalid snapshot magic".to_string()));

        data[0] = MAGIC[0];
        data[4] = 0x7F;
        assert!(load(&mut io, &data, &mut events).is_err());
        assert!(load(&mut io, &data[..10], &mut events).is_err());
        assert!(events.is_empty());
    }

    #[test]
    fn test_truncated_cache_leaves_state_untouched() {
        let data = save(&playing(), true);
        let mut io = SoundIo::default();
        let mut events: Vec<ChannelEvent> = Vec::new();

        assert!(load(&mut io, &data[..data.len() - 3], &mut events).is_err());
        assert_eq!(io, SoundIo::default());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slots").join("state.gbsn");
        let io = playing();
        save_to_file(&io, true, &path).unwrap();

        let mut restored = SoundIo::default();
        let mut events: Vec<ChannelEvent> = Vec::new();
        load_from_file(&mut restored, &path, &mut events).unwrap();
        assert_eq!(restored, io);

        let missing = dir.path().join("missing.gbsn");
        assert!(load_from_file(&mut restored, &missing, &mut events).is_err());
    }
}
