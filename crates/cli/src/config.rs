//! `config.toml` in the data directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;
use goalplan_ai::{GeminiConfig, DEFAULT_API_KEY_ENV, DEFAULT_BASE_URL, DEFAULT_MODEL};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// IANA zone the working hours are read in
    pub timezone: String,
    pub calendar: CalendarSection,
    pub ai: AiSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSection {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSection {
    pub model: String,
    pub base_url: String,
    /// Environment variable the API key is read from
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            calendar: CalendarSection::default(),
            ai: AiSection::default(),
        }
    }
}

impl Default for CalendarSection {
    fn default() -> Self {
        Self {
            name: "goalplan".to_string(),
        }
    }
}

impl Default for AiSection {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: 60,
        }
    }
}

impl Config {
    pub fn time_zone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow!("invalid timezone {:?} in config: {e}", self.timezone))
    }

    /// Gemini settings, with the key taken from the environment.
    pub fn gemini(&self) -> GeminiConfig {
        GeminiConfig {
            model: self.ai.model.clone(),
            base_url: self.ai.base_url.clone(),
            timeout: Duration::from_secs(self.ai.timeout_secs),
            ..GeminiConfig::default()
        }
        .with_key_from_env(&self.ai.api_key_env)
    }
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.toml")
}

pub fn load_config(data_dir: &Path) -> Result<Config> {
    let p = config_path(data_dir);
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = std::fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config(data_dir: &Path, cfg: &Config) -> Result<()> {
    std::fs::create_dir_all(data_dir).with_context(|| format!("create {}", data_dir.display()))?;
    let p = config_path(data_dir);
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    std::fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

/// Write the default config unless one exists. Returns whether it wrote.
pub fn init_config(data_dir: &Path) -> Result<bool> {
    if config_path(data_dir).exists() {
        return Ok(false);
    }
    save_config(data_dir, &Config::default())?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_config(dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn test_init_then_load() {
        let dir = tempfile::tempdir().unwrap();
        assert!(init_config(dir.path()).unwrap());
        assert!(!init_config(dir.path()).unwrap());
        assert_eq!(load_config(dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            config_path(dir.path()),
            "timezone = \"Asia/Tokyo\"\n[ai]\ntimeout_secs = 5\n",
        )
        .unwrap();

        let cfg = load_config(dir.path()).unwrap();
        assert_eq!(cfg.time_zone().unwrap(), chrono_tz::Asia::Tokyo);
        assert_eq!(cfg.ai.timeout_secs, 5);
        assert_eq!(cfg.ai.model, DEFAULT_MODEL);
        assert_eq!(cfg.calendar.name, "goalplan");
    }

    #[test]
    fn test_bad_timezone() {
        let cfg = Config {
            timezone: "Mars/Olympus".into(),
            ..Config::default()
        };
        assert!(cfg.time_zone().is_err());
    }
}
