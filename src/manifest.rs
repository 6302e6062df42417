//! In-memory model of one document under assembly.
//!
//! A [`Manifest`] is a plain value: the assembler fills it, the
//! [`presentation`](crate::presentation) module renders it, the
//! [`store`](crate::store) persists it. Pages can only be added through
//! [`Manifest::append_page`], which numbers them, so canvases are always
//! `1..=N` with no gaps regardless of how many catalog rows were skipped
//! in between.

use crate::content_id::ContentId;
use crate::slug::slugify;
use std::fmt;
use std::path::PathBuf;

/// Identity of a document: the slug of `"{site} - {title}"`.
///
/// Doubles as the manifest file stem, so it is always non-empty and
/// filesystem-safe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentKey(String);

impl DocumentKey {
    /// Derive the key for a full document title. `None` when the title
    /// slugifies to nothing.
    pub fn from_title(title: &str) -> Option<Self> {
        let slug = slugify(title);
        if slug.is_empty() {
            None
        } else {
            Some(Self(slug))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Descriptive fields copied from the first row of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub title: String,
    pub archive: String,
    pub locator: String,
    pub item_type: String,
}

/// A source image resolved to its tile set.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    pub source_path: PathBuf,
    pub content_id: ContentId,
    /// Image API base URL, `{hostname}/images/tiles/<content_id>`.
    pub tile_base_url: String,
    pub width: u32,
    pub height: u32,
    pub thumbnail_url: Option<String>,
}

/// One page of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    /// 1-based position within the document.
    pub page_number: u32,
    pub image: ImageRecord,
}

impl Canvas {
    pub fn label(&self) -> String {
        format!("Page {}", self.page_number)
    }

    pub fn width(&self) -> u32 {
        self.image.width
    }

    pub fn height(&self) -> u32 {
        self.image.height
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    pub id: DocumentKey,
    pub label: String,
    /// Holding archive, repeated in the manifest index.
    pub location: String,
    pub metadata: DocumentMetadata,
    canvases: Vec<Canvas>,
}

impl Manifest {
    /// Open an empty document. `label` is the full `"{site} - {title}"`.
    pub fn new(id: DocumentKey, label: String, metadata: DocumentMetadata) -> Self {
        Self {
            id,
            location: metadata.archive.clone(),
            label,
            metadata,
            canvases: Vec::new(),
        }
    }

    /// Append a page and return its number.
    pub fn append_page(&mut self, image: ImageRecord) -> u32 {
        let page_number = self.canvases.len() as u32 + 1;
        self.canvases.push(Canvas { page_number, image });
        page_number
    }

    pub fn canvases(&self) -> &[Canvas] {
        &self.canvases
    }

    pub fn page_count(&self) -> usize {
        self.canvases.len()
    }
}
