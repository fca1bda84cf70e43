//! Engine configuration.
//!
//! Lives in /etc/ascent/config.toml unless `--config` or `$ASCENT_CONFIG`
//! point elsewhere. Every table is optional; a missing file means defaults.
//!
//! ```toml
//! [scale]
//! xp_per_sublevel = [100, 200, 400, 800, 1600, 3200, 6400]
//! tier_rewards = [25, 50, 75, 100, 150, 200, 300]
//!
//! [review]
//! adult_age = 18
//!
//! [log]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AscentError, Result};
use crate::review_gate::ReviewPolicy;
use crate::scale::RankScale;

/// System configuration directory
pub const SYSTEM_CONFIG_DIR: &str = "/etc/ascent";
const CONFIG_FILE: &str = "config.toml";

/// Environment variable overriding the config location
pub const CONFIG_ENV: &str = "ASCENT_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scale: RankScale,
    pub review: ReviewPolicy,
    pub log: LogConfig,
}

impl EngineConfig {
    /// Resolve the config location and load it
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env = std::env::var(CONFIG_ENV).ok();
        match explicit {
            Some(path) if !path.exists() => Err(AscentError::Config(format!(
                "config file not found: {}",
                path.display()
            ))),
            _ => Self::load_from(&resolve_path(explicit, env.as_deref())),
        }
    }

    /// Load from one file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.scale.validate()?;
        Ok(config)
    }
}

/// `--config` wins, then `$ASCENT_CONFIG`, then the system path
pub fn resolve_path(explicit: Option<&Path>, env: Option<&str>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match env {
        Some(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => config_path(),
    }
}

/// Get the system config file path
pub fn config_path() -> PathBuf {
    PathBuf::from(SYSTEM_CONFIG_DIR).join(CONFIG_FILE)
}
