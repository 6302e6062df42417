//! # iiif-assemble
//!
//! Turns a flat CSV catalog of scanned archive pages into IIIF Presentation
//! 2.0 manifests backed by static, level-0 IIIF Image API 2.0 tiles. The
//! output is a directory of JSON and JPEG files that any static file host
//! can serve to a deep-zoom viewer such as Mirador.
//!
//! # Architecture: One Streaming Pass
//!
//! ```text
//! data.csv ─▶ catalog ─▶ assemble ─▶ store ─▶ manifests/<id>.json
//!                           │                  manifests/index.json
//!                           ▼
//!                         cache ─▶ tiling ─▶ images/tiles/<content_id>/
//! ```
//!
//! Rows are read in file order. Contiguous rows that share a document key
//! (the slug of `"{site} - {title}"`) become the pages of one manifest.
//! Each page's scan is tiled once, addressed by the SHA-256 of its bytes,
//! and reused on every later run.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | Build driver: wires catalog, assembler, cache and store; emits progress events |
//! | [`catalog`] | CSV reader yielding [`catalog::CatalogRow`]s in file order |
//! | [`assemble`] | Row filters and the two-state document assembler; dry-run planning for `check` |
//! | [`manifest`] | In-memory document model with gap-free page numbering |
//! | [`presentation`] | Renders a manifest as IIIF Presentation 2.0 JSON-LD |
//! | [`store`] | Manifest persistence and the upserting `index.json` |
//! | [`atomic`] | Temp-and-rename file replacement shared by every writer |
//! | [`cache`] | Content-addressed tile cache with staged generation |
//! | [`tiling`] | Level-0 tile geometry, `info.json`, and the pure Rust tiler |
//! | [`content_id`] | SHA-256 content identifiers for source images |
//! | [`slug`] | Title → document key normalization |
//! | [`rewrite`] | Moves a generated site to a new base URL |
//! | [`config`] | `iiif.toml` loading, layering with CLI flags, validation |
//! | [`output`] | CLI output formatting for every command |
//!
//! # Design Decisions
//!
//! ## Content-Addressed Tiles
//!
//! A scan's tile directory is named by the hash of its bytes, not its
//! filename. Catalogs get reorganized; scans get renamed and moved between
//! archive folders. None of that should trigger hours of re-tiling. It also
//! means the same scan catalogued under two documents is tiled once.
//!
//! ## Static Level-0 Tiles
//!
//! Every tile a viewer can request is pre-rendered, so publishing needs no
//! image server. The tiler is pure Rust (`image` + `rayon`): no ImageMagick,
//! no libvips, a single self-contained binary.
//!
//! ## Incremental Index
//!
//! `manifests/index.json` accumulates across runs. Entries are upserted by
//! manifest URI, so a re-run (or a run over a partial catalog) updates the
//! documents it saw and leaves the rest alone.
//!
//! ## Explicit Configuration
//!
//! One [`config::Config`] value is built at startup from stock defaults,
//! `iiif.toml` and CLI flags, then passed to every component. Nothing reads
//! global state, which keeps every stage testable against a temp directory.

pub mod assemble;
pub mod atomic;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod content_id;
pub mod manifest;
pub mod output;
pub mod pipeline;
pub mod presentation;
pub mod rewrite;
pub mod slug;
pub mod store;
pub mod tiling;

#[cfg(test)]
pub(crate) mod test_helpers;
