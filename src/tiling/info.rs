//! The `info.json` descriptor that accompanies every tile set.
//!
//! Descriptors written by other level-0 generators are read leniently:
//! only `@id`, `width` and `height` are required, and any fields this crate
//! does not model are kept in [`ImageInfo::extra`] and written back untouched.

use super::calculations::{Size, TilePlan};
use crate::atomic::write_atomic;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io;
use std::path::Path;

pub const INFO_FILENAME: &str = "info.json";
pub const IMAGE_CONTEXT: &str = "http://iiif.io/api/image/2/context.json";
pub const IMAGE_PROTOCOL: &str = "http://iiif.io/api/image";
pub const LEVEL0_PROFILE: &str = "http://iiif.io/api/image/2/level0.json";

fn default_context() -> String {
    IMAGE_CONTEXT.to_string()
}

fn default_protocol() -> String {
    IMAGE_PROTOCOL.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    #[serde(rename = "@context", default = "default_context")]
    pub context: String,
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub profile: Value,
    /// Full-region sizes available as static files, largest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sizes: Vec<Size>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tiles: Vec<TileInfo>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileInfo {
    pub width: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(rename = "scaleFactors")]
    pub scale_factors: Vec<u32>,
}

impl ImageInfo {
    /// Descriptor for a freshly generated level-0 tile set.
    pub fn level0(id: String, plan: &TilePlan) -> Self {
        Self {
            context: default_context(),
            id,
            protocol: default_protocol(),
            width: plan.width,
            height: plan.height,
            profile: Value::Array(vec![Value::String(LEVEL0_PROFILE.to_string())]),
            sizes: plan.sizes.clone(),
            tiles: vec![TileInfo {
                width: plan.tile_size,
                height: None,
                scale_factors: plan.scale_factors.clone(),
            }],
            extra: Map::new(),
        }
    }

    /// Load `info.json` from a tile directory.
    pub fn load(tile_dir: &Path) -> io::Result<Self> {
        let content = std::fs::read_to_string(tile_dir.join(INFO_FILENAME))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Replace `info.json` in a tile directory. Returns whether the file
    /// changed.
    pub fn save(&self, tile_dir: &Path) -> io::Result<bool> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(&tile_dir.join(INFO_FILENAME), json.as_bytes())
    }
}
