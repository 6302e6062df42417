//! Build configuration.
//!
//! One [`Config`] is constructed at startup and passed explicitly to every
//! component. It is assembled in three layers, each overriding the last:
//!
//! ```text
//! stock defaults  →  iiif.toml (if present)  →  command-line flags
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! data = "data"                      # Root of site/archive/locator/type/filename
//! hostname = "http://localhost:4000" # Base for tile and manifest URIs
//! output_dir = "."                   # Receives manifests/ and images/tiles/
//!
//! [catalog]
//! path = "data.csv"                  # CSV catalog, one row per page image
//! has_headers = false                # Whether the first line is a header
//! extensions = ["jpg", "jpeg"]       # Accepted image extensions (case-insensitive)
//!
//! [tiles]
//! tile_size = 1024                   # Tile edge in pixels
//! quality = 90                       # JPEG quality (1-100)
//! on_failure = "skip"                # "skip" the row or "abort" the build
//!
//! [processing]
//! max_processes = 4                  # Tile encoding threads (omit for all cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::tiling::supported_input_extensions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Complete build configuration. All fields have defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Root directory under which `site/archive/locator/item_type/filename`
    /// resolves to a source image.
    pub data: String,
    /// Base URI used for every externally visible tile and manifest URI.
    pub hostname: String,
    /// Directory that receives `manifests/` and `images/tiles/`.
    pub output_dir: String,
    pub catalog: CatalogConfig,
    pub tiles: TilesConfig,
    pub processing: ProcessingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: "data".to_string(),
            hostname: "http://localhost:4000".to_string(),
            output_dir: ".".to_string(),
            catalog: CatalogConfig::default(),
            tiles: TilesConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.hostname.starts_with("http://") || self.hostname.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "hostname must be an http(s) URL, got {:?}",
                self.hostname
            )));
        }
        if self.tiles.tile_size < 16 {
            return Err(ConfigError::Validation(
                "tiles.tile_size must be at least 16".into(),
            ));
        }
        if self.tiles.quality == 0 || self.tiles.quality > 100 {
            return Err(ConfigError::Validation(
                "tiles.quality must be 1-100".into(),
            ));
        }
        if self.catalog.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "catalog.extensions must not be empty".into(),
            ));
        }
        let supported = supported_input_extensions();
        for ext in &self.catalog.extensions {
            let lower = ext.trim_start_matches('.').to_ascii_lowercase();
            if !supported.contains(&lower.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "catalog.extensions: no decoder for {ext:?} (supported: {})",
                    supported.join(", ")
                )));
            }
        }
        Ok(())
    }

    /// Hostname without a trailing slash.
    pub fn base_uri(&self) -> &str {
        self.hostname.trim_end_matches('/')
    }

    pub fn data_root(&self) -> PathBuf {
        PathBuf::from(&self.data)
    }

    pub fn catalog_path(&self) -> PathBuf {
        PathBuf::from(&self.catalog.path)
    }

    pub fn manifests_dir(&self) -> PathBuf {
        Path::new(&self.output_dir).join("manifests")
    }

    pub fn tiles_dir(&self) -> PathBuf {
        Path::new(&self.output_dir).join("images").join("tiles")
    }

    /// `{hostname}/images/tiles`, the prefix of every Image API base URL.
    pub fn tiles_base_url(&self) -> String {
        format!("{}/images/tiles", self.base_uri())
    }
}

/// Where the catalog lives and which rows count as images.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    pub path: String,
    pub has_headers: bool,
    /// Accepted filename extensions, matched case-insensitively.
    pub extensions: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: "data.csv".to_string(),
            has_headers: false,
            extensions: vec!["jpg".to_string(), "jpeg".to_string()],
        }
    }
}

/// What to do when a present, readable image cannot be tiled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Skip the row and report it in the build summary.
    #[default]
    Skip,
    /// Stop the whole build.
    Abort,
}

/// Tile generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TilesConfig {
    pub tile_size: u32,
    pub quality: u32,
    pub on_failure: FailurePolicy,
}

impl Default for TilesConfig {
    fn default() -> Self {
        Self {
            tile_size: 1024,
            quality: 90,
            on_failure: FailurePolicy::Skip,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of tile encoding threads.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(Config::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub data: Option<String>,
    pub hostname: Option<String>,
    pub catalog: Option<String>,
    pub output_dir: Option<String>,
}

impl Overrides {
    /// Express the overrides as a sparse TOML table for merging.
    pub fn to_toml(&self) -> toml::Value {
        let mut table = toml::Table::new();
        if let Some(data) = &self.data {
            table.insert("data".into(), toml::Value::String(data.clone()));
        }
        if let Some(hostname) = &self.hostname {
            table.insert("hostname".into(), toml::Value::String(hostname.clone()));
        }
        if let Some(output_dir) = &self.output_dir {
            table.insert("output_dir".into(), toml::Value::String(output_dir.clone()));
        }
        if let Some(catalog) = &self.catalog {
            let mut section = toml::Table::new();
            section.insert("path".into(), toml::Value::String(catalog.clone()));
            table.insert("catalog".into(), toml::Value::Table(section));
        }
        toml::Value::Table(table)
    }
}

/// Merge the layers, deserialize, and validate.
pub fn resolve_config(
    file: Option<toml::Value>,
    overrides: &Overrides,
) -> Result<Config, ConfigError> {
    let mut merged = stock_defaults_value()?;
    if let Some(file) = file {
        merged = merge_toml(merged, file);
    }
    merged = merge_toml(merged, overrides.to_toml());
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path` (optional on disk) with command-line overrides.
pub fn load_config(path: &Path, overrides: &Overrides) -> Result<Config, ConfigError> {
    resolve_config(load_raw_config(path)?, overrides)
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# iiif-assemble configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.
#
# Command-line flags (--data, --hostname, --catalog, --output) override
# the values in this file.

# Root directory holding the scans. Each catalog row resolves to
#   <data>/<site>/<archive>/<locator>/<item type>/<filename>
data = "data"

# Base URI under which manifests/ and images/tiles/ are published.
# Baked into every manifest and info.json; use `iiif-assemble rewrite`
# to move an existing build to a new host.
hostname = "http://localhost:4000"

# Directory that receives manifests/ and images/tiles/.
output_dir = "."

# ---------------------------------------------------------------------------
# Catalog
# ---------------------------------------------------------------------------
[catalog]
# CSV with columns: site, archive, locator, item type, filename, title.
# Row order matters: contiguous rows with the same site and title become
# the pages of one document.
path = "data.csv"

# Set to true when the first line holds column names.
has_headers = false

# Only rows whose filename ends in one of these (case-insensitive) are used.
extensions = ["jpg", "jpeg"]

# ---------------------------------------------------------------------------
# Tiles
# ---------------------------------------------------------------------------
[tiles]
# Edge length of a full-resolution tile in pixels.
tile_size = 1024

# JPEG quality for tiles (1-100).
quality = 90

# What to do when a scan exists but cannot be decoded:
#   "skip"  - leave the page out and list it in the build summary
#   "abort" - stop the build (manifests finished so far stay on disk)
on_failure = "skip"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum threads used to encode the tiles of one image.
# Omit to use all CPU cores. Values above the core count are clamped.
# max_processes = 4
"##
}
