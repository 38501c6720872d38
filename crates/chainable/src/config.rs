//! Chainable configuration.
//!
//! Two layers: `ChainableConfig` is process-wide and usually read from a
//! TOML file; `ChainOptions` is the per-call policy. The column read when a
//! call names none is always `DEFAULT_COLUMN`.
//!
//! ```toml
//! time_zone = "America/New_York"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::chain::ChainMode;
use crate::error::{ChainError, Result};
use crate::zone::ReferenceZone;

/// Column read when the caller does not name one
pub const DEFAULT_COLUMN: &str = "created_at";

/// Zone used when none is configured
pub const DEFAULT_TIME_ZONE: &str = "UTC";

/// Process-wide configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainableConfig {
    /// IANA name of the reference time zone
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

fn default_time_zone() -> String {
    DEFAULT_TIME_ZONE.to_string()
}

impl Default for ChainableConfig {
    fn default() -> Self {
        Self {
            time_zone: default_time_zone(),
        }
    }
}

impl ChainableConfig {
    pub fn with_time_zone(mut self, name: &str) -> Self {
        self.time_zone = name.to_string();
        self
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ChainError::Config(e.to_string()))
    }

    /// Load config from `path`, failing on a missing or invalid file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        config.zone()?;
        Ok(config)
    }

    /// Load config from `path`, falling back to defaults
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "ignoring chainable config"
                );
                Self::default()
            }
        }
    }

    /// Save config to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ChainError::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Resolved reference zone
    pub fn zone(&self) -> Result<ReferenceZone> {
        ReferenceZone::parse(&self.time_zone)
    }
}

/// Per-call chain policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ChainOptions {
    /// Let a chain that ended yesterday still count as current
    #[serde(default)]
    pub except_today: bool,

    /// Report the longest chain instead of the current one
    #[serde(default)]
    pub longest: bool,
}

impl ChainOptions {
    pub fn except_today() -> Self {
        Self {
            except_today: true,
            ..Default::default()
        }
    }

    pub fn longest() -> Self {
        Self {
            longest: true,
            ..Default::default()
        }
    }

    pub fn mode(&self) -> ChainMode {
        if self.longest {
            ChainMode::Longest
        } else {
            ChainMode::Current
        }
    }
}
