use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::app_dirs::AppDirs;
use crate::corpus::{Corpus, PhrasePools};
use crate::error::{Result, TypespeedError};
use crate::session::{Difficulty, SessionConfig, DEFAULT_DURATIONS};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub difficulty: Difficulty,
    pub duration_secs: u64,
    /// Durations offered in the settings panel
    pub durations: Vec<u64>,
    pub tick_rate_ms: u64,
    pub log_level: String,
    pub phrases: PhrasePools,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Easy,
            duration_secs: 60,
            durations: DEFAULT_DURATIONS.to_vec(),
            tick_rate_ms: 100,
            log_level: "info".to_string(),
            phrases: PhrasePools::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.durations.is_empty() {
            return Err(TypespeedError::InvalidConfig(
                "durations must not be empty".into(),
            ));
        }
        if self.durations.contains(&0) || self.duration_secs == 0 {
            return Err(TypespeedError::InvalidConfig(
                "durations must be at least one second".into(),
            ));
        }
        if self.tick_rate_ms == 0 {
            return Err(TypespeedError::InvalidConfig(
                "tick_rate_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            difficulty: self.difficulty,
            duration_secs: self.duration_secs,
        }
    }

    /// Builtin phrases with any configured pools swapped in
    pub fn corpus(&self) -> Result<Corpus> {
        Corpus::builtin()?.with_overrides(&self.phrases)
    }

    /// Offered durations, sorted, always including the configured default
    pub fn duration_choices(&self) -> Vec<u64> {
        let mut choices = self.durations.clone();
        choices.push(self.duration_secs);
        choices.sort_unstable();
        choices.dedup();
        choices
    }
}

pub trait ConfigStore {
    fn load(&self) -> Result<Config>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// A missing or unreadable file yields the defaults. Values that parse but make
    /// no sense are an error.
    fn load(&self) -> Result<Config> {
        let cfg = match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => cfg,
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "malformed config, using defaults");
                    Config::default()
                }
            },
            Err(_) => {
                debug!(path = %self.path.display(), "no config file, using defaults");
                Config::default()
            }
        };
        cfg.validate()?;
        Ok(cfg)
    }
}
