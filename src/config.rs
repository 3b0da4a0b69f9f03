//! Layered configuration for the store and its CLI.
//!
//! Sources, later ones overriding earlier ones:
//! - built-in defaults
//! - `srcmodel.toml` in the working directory
//! - environment variables prefixed `SRCMODEL_`, with `__` separating
//!   nested levels (`SRCMODEL_LIMITS__MAX_FILES=500000`)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::storage::SnapshotLimits;

pub const CONFIG_FILE: &str = "srcmodel.toml";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Configuration schema version.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Capacity hint handed to `Project::init`; arenas size themselves
    /// from it with per-kind factors.
    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: usize,

    /// Upper bounds applied when reading snapshots.
    #[serde(default)]
    pub limits: SnapshotLimits,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-target overrides, e.g. `project = "debug"`.
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_version() -> u32 {
    1
}

fn default_initial_capacity() -> usize {
    256
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            initial_capacity: default_initial_capacity(),
            limits: SnapshotLimits::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load from defaults, config file, then environment.
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed("SRCMODEL_").split("__"))
            .extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.initial_capacity, 256);
        assert_eq!(settings.logging.default, "warn");
        assert_eq!(settings.limits.max_files, 1_000_000);
    }

    #[test]
    fn test_toml_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE,
                r#"
                initial_capacity = 64

                [limits]
                max_files = 10

                [logging]
                default = "info"
                "#,
            )?;
            let settings = Settings::load()?;
            assert_eq!(settings.initial_capacity, 64);
            assert_eq!(settings.limits.max_files, 10);
            assert_eq!(settings.logging.default, "info");
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_toml() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE, "initial_capacity = 64")?;
            jail.set_env("SRCMODEL_INITIAL_CAPACITY", "128");
            jail.set_env("SRCMODEL_LIMITS__MAX_STRING_LEN", "1024");
            let settings = Settings::load()?;
            assert_eq!(settings.initial_capacity, 128);
            assert_eq!(settings.limits.max_string_len, 1024);
            Ok(())
        });
    }
}
