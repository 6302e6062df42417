//! Deep-zoom tile generation.
//!
//! Produces IIIF Image API 2.0 level-0 static tile sets: a directory of
//! pre-cut JPEG tiles plus an `info.json` descriptor, servable by any static
//! file host.
//!
//! The module is split into:
//! - **Calculations**: pure tile geometry (unit testable)
//! - **Parameters**: what to generate ([`TileRequest`], [`Quality`])
//! - **Info**: the `info.json` descriptor ([`ImageInfo`])
//! - **Backend**: [`TileGenerator`] trait + [`RustTiler`]

pub mod backend;
pub mod calculations;
mod info;
mod params;
pub mod rust_backend;

pub use backend::{TileGenerator, TilingError};
pub use calculations::Size;
pub use info::{IMAGE_CONTEXT, INFO_FILENAME, ImageInfo, LEVEL0_PROFILE};
pub use params::{Quality, TileRequest};
pub use rust_backend::{RustTiler, supported_input_extensions};
