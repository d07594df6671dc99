//! Service configuration
//!
//! Defaults, then an optional `failwatch.toml`, then `FAILWATCH__*`
//! environment variables (e.g. `FAILWATCH__ALERTING__FAILURE_THRESHOLD=3`).

use alerting::{AlertingConfig, WatchdogConfig};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use pager::PagerConfig;
use serde::{Deserialize, Serialize};

/// Config file looked up in the working directory (extension optional)
pub const CONFIG_FILE: &str = "failwatch";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "FAILWATCH";

/// Top-level settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub alerting: AlertingConfig,
    pub pager: PagerConfig,
    pub watchdog: WatchdogConfig,
    pub logging: LoggingSettings,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Listen address
    pub addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Settings {
    /// Load from the config file and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_builder(
            Config::builder().add_source(File::with_name(CONFIG_FILE).required(false)),
        )
    }

    /// Layer environment overrides on top of `builder` and deserialize
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
