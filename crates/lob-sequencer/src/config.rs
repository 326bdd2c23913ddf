//! Configuration for a book sequencer.
//!
//! Either use defaults, load a TOML file, or override via environment
//! variables:
//!
//! - `LOB_SYMBOL`           (default: "DEFAULT")
//! - `LOB_CHANNEL_CAPACITY` (default: "1024")
//! - `LOB_DEPTH_LEVELS`     (default: "10")
//! - `LOB_LOG`              (default: "info")

use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{ensure, Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Instrument this book trades; used in log fields.
    pub symbol: String,

    /// Bound of the request queue in front of the engine task. Submitters
    /// wait when it is full.
    pub channel_capacity: usize,

    /// Price levels per side included in each published snapshot.
    pub depth_levels: usize,

    /// `tracing-subscriber` filter directives installed by `init_tracing`.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            symbol: "DEFAULT".to_string(),
            channel_capacity: 1024,
            depth_levels: 10,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Construct a `Config` from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();
        let config = Config {
            symbol: lookup("LOB_SYMBOL").unwrap_or(defaults.symbol),
            channel_capacity: read_or_default(&lookup, "LOB_CHANNEL_CAPACITY", defaults.channel_capacity)?,
            depth_levels: read_or_default(&lookup, "LOB_DEPTH_LEVELS", defaults.depth_levels)?,
            log_filter: lookup("LOB_LOG").unwrap_or(defaults.log_filter),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).context("parsing sequencer config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("loading {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.symbol.trim().is_empty(), "symbol must not be empty");
        ensure!(self.channel_capacity > 0, "channel_capacity must be at least 1");
        ensure!(self.depth_levels > 0, "depth_levels must be at least 1");
        Ok(())
    }
}

fn read_or_default<T>(lookup: impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(val) => val
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: `{val}`")),
        None => Ok(default),
    }
}
