use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::session::tier::Tier;

const MAX_LIVES: u32 = 9;
const MAX_TIME_LIMIT_SECS: u32 = 600;
const MAX_DELAY_MS: u64 = 5000;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_max_lives")]
    pub max_lives: u32,
    /// Zero disables the countdown.
    #[serde(default = "default_time_limit_secs")]
    pub time_limit_secs: u32,
    #[serde(default)]
    pub default_tier: Tier,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub corpus_path: Option<PathBuf>,
    #[serde(default)]
    pub corpus_url: Option<String>,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_death_delay_ms")]
    pub death_delay_ms: u64,
    #[serde(default = "default_victory_delay_ms")]
    pub victory_delay_ms: u64,
    #[serde(default = "default_time_of_day_cycle_secs")]
    pub time_of_day_cycle_secs: u32,
}

fn default_max_lives() -> u32 {
    3
}
fn default_time_limit_secs() -> u32 {
    60
}
fn default_theme() -> String {
    "pond".to_string()
}
fn default_death_delay_ms() -> u64 {
    1000
}
fn default_victory_delay_ms() -> u64 {
    100
}
fn default_time_of_day_cycle_secs() -> u32 {
    15
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_lives: default_max_lives(),
            time_limit_secs: default_time_limit_secs(),
            default_tier: Tier::default(),
            theme: default_theme(),
            corpus_path: None,
            corpus_url: None,
            data_dir: None,
            death_delay_ms: default_death_delay_ms(),
            victory_delay_ms: default_victory_delay_ms(),
            time_of_day_cycle_secs: default_time_of_day_cycle_secs(),
        }
    }
}

impl Config {
    /// Missing file gives defaults. A file that cannot be read or parsed also
    /// gives defaults, so a typo never blocks a game; the reason comes back
    /// for the caller to log once its logger is up.
    pub fn load() -> (Self, Option<String>) {
        Self::load_or_default(&Self::config_path())
    }

    pub fn load_or_default(path: &Path) -> (Self, Option<String>) {
        if !path.exists() {
            return (Config::default(), None);
        }
        match Self::load_from(path) {
            Ok(config) => (config, None),
            Err(e) => (
                Config::default(),
                Some(format!("ignoring {}: {e:#}", path.display())),
            ),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.validate();
        Ok(config)
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("typefrog")
            .join("config.toml")
    }

    /// Clamp values into playable ranges.
    pub fn validate(&mut self) {
        self.max_lives = self.max_lives.clamp(1, MAX_LIVES);
        self.time_limit_secs = self.time_limit_secs.min(MAX_TIME_LIMIT_SECS);
        self.death_delay_ms = self.death_delay_ms.min(MAX_DELAY_MS);
        self.victory_delay_ms = self.victory_delay_ms.min(MAX_DELAY_MS);
        self.time_of_day_cycle_secs = self.time_of_day_cycle_secs.max(1);
    }

    pub fn time_limit(&self) -> Option<u32> {
        (self.time_limit_secs > 0).then_some(self.time_limit_secs)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("typefrog")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde_defaults_from_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.max_lives, 3);
        assert_eq!(config.time_limit(), Some(60));
        assert_eq!(config.default_tier, Tier::Principiante);
    }

    #[test]
    fn test_config_partial_file_keeps_other_defaults() {
        let toml_str = r#"
max_lives = 5
default_tier = "advanced"
corpus_path = "/tmp/texts.json"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.max_lives, 5);
        assert_eq!(config.default_tier, Tier::Avanzado);
        assert_eq!(config.corpus_path, Some(PathBuf::from("/tmp/texts.json")));
        assert_eq!(config.death_delay_ms, 1000);
        assert_eq!(config.victory_delay_ms, 100);
    }

    #[test]
    fn test_zero_time_limit_means_untimed() {
        let config: Config = toml::from_str("time_limit_secs = 0").unwrap();
        assert_eq!(config.time_limit(), None);
    }

    #[test]
    fn test_validate_clamps_out_of_range() {
        let mut config = Config {
            max_lives: 0,
            time_limit_secs: 10_000,
            death_delay_ms: 60_000,
            victory_delay_ms: 9_000,
            time_of_day_cycle_secs: 0,
            ..Config::default()
        };
        config.validate();
        assert_eq!(config.max_lives, 1);
        assert_eq!(config.time_limit_secs, 600);
        assert_eq!(config.death_delay_ms, 5000);
        assert_eq!(config.victory_delay_ms, 5000);
        assert_eq!(config.time_of_day_cycle_secs, 1);

        config.max_lives = 42;
        config.validate();
        assert_eq!(config.max_lives, 9);
    }

    #[test]
    fn test_load_from_rejects_bad_toml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_lives = \"three\"").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_bad_file_falls_back_with_reason() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let (config, warning) = Config::load_or_default(&path);
        assert_eq!(config, Config::default());
        assert!(warning.is_none());

        fs::write(&path, "max_lives = [").unwrap();
        let (config, warning) = Config::load_or_default(&path);
        assert_eq!(config, Config::default());
        assert!(warning.unwrap().contains("config.toml"));

        fs::write(&path, "max_lives = 4").unwrap();
        let (config, warning) = Config::load_or_default(&path);
        assert_eq!(config.max_lives, 4);
        assert!(warning.is_none());
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config {
            corpus_url: Some("https://example.com/texts.json".into()),
            ..Config::default()
        };
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config, deserialized);
    }
}
