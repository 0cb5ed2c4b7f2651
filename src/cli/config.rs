//! TOML configuration file support.
//!
//! Settings shared by several commands can live in a config file instead of
//! being repeated on the command line. Command-line flags win.
//!
//! ```toml
//! # specstack.toml
//! [store]
//! buffer_size = 8388608
//! buffered = true
//!
//! [composite]
//! redshift_bin = 0.2
//! luminosity_bin = 0.5
//! output_dir = "composites"
//! include_bal = false
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use specstack::store::ReaderConfig;

/// Root configuration structure for specstack.toml files.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Spectrum store reader settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Composite settings.
    #[serde(default)]
    pub composite: CompositeConfig,
}

/// Reader settings.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Page buffer size in bytes.
    pub buffer_size: Option<usize>,

    /// Read through the page buffer.
    pub buffered: Option<bool>,
}

/// Settings for the composite command.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompositeConfig {
    /// Redshift bin width.
    pub redshift_bin: Option<f64>,

    /// Absolute magnitude bin width.
    pub luminosity_bin: Option<f64>,

    /// Directory composites are written to.
    pub output_dir: Option<PathBuf>,

    /// Keep broad absorption line quasars.
    pub include_bal: Option<bool>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Load the file at `path` if given, the defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse TOML configuration")?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        for (name, size) in [
            ("redshift_bin", self.composite.redshift_bin),
            ("luminosity_bin", self.composite.luminosity_bin),
        ] {
            if let Some(size) = size {
                if !(size.is_finite() && size > 0.0) {
                    anyhow::bail!("composite.{} must be positive, got {}", name, size);
                }
            }
        }
        Ok(())
    }

    /// Reader configuration with the file's overrides applied.
    pub fn reader_config(&self) -> ReaderConfig {
        let mut config = ReaderConfig::default();
        if let Some(size) = self.store.buffer_size {
            config.buffer_size = size;
        }
        if let Some(buffered) = self.store.buffered {
            config.buffered = buffered;
        }
        config
    }
}
