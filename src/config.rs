use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::apu::DMG_CLOCK_RATE;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub clock: Clock,
    pub snapshot: Snapshot,
    pub audio: Audio,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Clock {
    pub cycles_per_second: u32,
    /// CPU cycles fed to the trace player are halved when set.
    pub double_speed: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    /// Store the engine's derived state next to the register bytes.
    pub include_cache: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Audio {
    pub muted: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            clock: Clock::default(),
            snapshot: Snapshot::default(),
            audio: Audio::default(),
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Clock {
            cycles_per_second: DMG_CLOCK_RATE,
            double_speed: false,
        }
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Snapshot { include_cache: true }
    }
}

impl Config {
    pub fn config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("gb_sound");
        path.push("config.toml");
        path
    }

    /// Load from the user config directory, writing defaults on first run.
    pub fn load() -> Self {
        let path = Self::config_path();
        if path.exists() {
            return Self::load_from(&path);
        }
        let config = Config::default();
        if let Err(e) = config.write_to(&path) {
            log::warn!("{}", e);
        } else {
            log::info!("Wrote default config to {}", path.display());
        }
        config
    }

    /// Load from `path`, falling back to defaults on any error.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => return config,
                Err(e) => log::warn!("Error parsing {}: {}; using defaults", path.display(), e),
            },
            Err(e) => log::warn!("Error reading {}: {}; using defaults", path.display(), e),
        }
        Config::default()
    }

    pub fn parse(contents: &str) -> Result<Self, String> {
        let config: Config = toml::from_str(contents).map_err(|e| e.to_string())?;
        if config.clock.cycles_per_second == 0 {
            return Err("clock.cycles_per_second must be nonzero".to_string());
        }
        Ok(config)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Error creating config directory: {}", e))?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| format!("Error serializing config: {}", e))?;
        std::fs::write(path, contents)
            .map_err(|e| format!("Error writing {}: {}", path.display(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::parse("[clock]\ndouble_speed = true\n").unwrap();
        assert!(config.clock.double_speed);
        assert_eq!(config.clock.cycles_per_second, DMG_CLOCK_RATE);
        assert!(config.snapshot.include_cache);
        assert!(!config.audio.muted);
    }

    #[test]
    fn test_zero_clock_rejected() {
        assert!(Config::parse("[clock]\ncycles_per_second = 0\n").is_err());
        assert!(Config::parse("clock = 5").is_err());
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.audio.muted = true;
        config.clock.cycles_per_second = 8_388_608;

        config.write_to(&path).unwrap();
        assert_eq!(Config::load_from(&path), config);
    }

    #[test]
    fn test_unreadable_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not = [valid").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
        assert_eq!(Config::load_from(&dir.path().join("absent.toml")), Config::default());
    }
}
