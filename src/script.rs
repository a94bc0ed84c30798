//! Register trace scripts for the `gb_sound` player.
//!
//! One command per line, `#` starts a comment:
//!
//! ```text
//! write FF26 80     # master on
//! write FF24 77
//! advance 70224
//! reload
//! ```

use crate::backend::AudioBackend;
use crate::io::SoundIo;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Write { address: u16, value: u8 },
    /// CPU cycles; halved in double-speed mode.
    Advance(u32),
    Reload,
}

pub fn parse(source: &str) -> Result<Vec<Command>, String> {
    let mut commands = Vec::new();
    for (number, line) in source.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let command = parse_line(line).map_err(|e| format!("line {}: {}", number + 1, e))?;
        commands.push(command);
    }
    Ok(commands)
}

fn parse_line(line: &str) -> Result<Command, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    match words.as_slice() {
        ["write", address, value] => Ok(Command::Write {
            address: parse_hex_u16(address)?,
            value: parse_hex_u8(value)?,
        }),
        ["advance", cycles] => cycles
            .parse()
            .map(Command::Advance)
            .map_err(|e| format!("bad cycle count '{}': {}", cycles, e)),
        ["reload"] => Ok(Command::Reload),
        _ => Err(format!("unrecognized command '{}'", line)),
    }
}

fn strip_hex_prefix(text: &str) -> &str {
    text.strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .or_else(|| text.strip_prefix('$'))
        .unwrap_or(text)
}

fn parse_hex_u16(text: &str) -> Result<u16, String> {
    u16::from_str_radix(strip_hex_prefix(text), 16)
        .map_err(|e| format!("bad address '{}': {}", text, e))
}

fn parse_hex_u8(text: &str) -> Result<u8, String> {
    u8::from_str_radix(strip_hex_prefix(text), 16)
        .map_err(|e| format!("bad value '{}': {}", text, e))
}

/// Run `commands` against `io` in order.
pub fn play(commands: &[Command], io: &mut SoundIo, double_speed: bool, backend: &mut dyn AudioBackend) {
    for command in commands {
        match *command {
            Command::Write { address, value } => io.write(address, value, backend),
            Command::Advance(cycles) => io.advance_cpu_cycles(cycles, double_speed, backend),
            Command::Reload => io.reload(backend),
        }
    }
}
