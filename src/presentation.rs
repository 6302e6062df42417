//! IIIF Presentation API 2.0 rendering.
//!
//! Turns a [`Manifest`] into the JSON-LD document a viewer such as Mirador
//! loads. The wire structs below borrow from the manifest and exist only
//! for serialization; field order follows the Presentation API examples.
//!
//! ```text
//! sc:Manifest   {host}/manifests/{id}.json
//! └─ sc:Sequence    {host}/manifests/{id}/sequence/normal
//!    └─ sc:Canvas       {host}/manifests/{id}/canvas/page-{n}
//!       └─ oa:Annotation    {host}/manifests/{id}/annotation/page-{n}
//!          └─ dctypes:Image     {tile base}/full/full/0/default.jpg
//!             └─ service (Image API 2, level 0)  {tile base}
//! ```
//!
//! Rendering is deterministic: the same manifest always yields the same
//! bytes, which keeps re-runs from touching unchanged files.

use crate::manifest::{Canvas, Manifest};
use crate::tiling::{IMAGE_CONTEXT, LEVEL0_PROFILE};
use serde::Serialize;

pub const PRESENTATION_CONTEXT: &str = "http://iiif.io/api/presentation/2/context.json";

/// `{base}/manifests/{id}.json`
pub fn manifest_uri(base_uri: &str, id: &str) -> String {
    format!("{}/manifests/{id}.json", base_uri.trim_end_matches('/'))
}

/// Render a manifest as pretty-printed JSON with a trailing newline.
pub fn render(manifest: &Manifest, base_uri: &str) -> Result<String, serde_json::Error> {
    let doc = ManifestDoc::build(manifest, base_uri.trim_end_matches('/'));
    let mut json = serde_json::to_string_pretty(&doc)?;
    json.push('\n');
    Ok(json)
}

#[derive(Serialize)]
struct ManifestDoc<'a> {
    #[serde(rename = "@context")]
    context: &'static str,
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@type")]
    kind: &'static str,
    label: &'a str,
    location: &'a str,
    metadata: Vec<MetadataEntry<'a>>,
    sequences: Vec<SequenceDoc<'a>>,
}

#[derive(Serialize)]
struct MetadataEntry<'a> {
    label: &'static str,
    value: &'a str,
}

#[derive(Serialize)]
struct SequenceDoc<'a> {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@type")]
    kind: &'static str,
    label: &'static str,
    canvases: Vec<CanvasDoc<'a>>,
}

#[derive(Serialize)]
struct CanvasDoc<'a> {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@type")]
    kind: &'static str,
    label: String,
    width: u32,
    height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    thumbnail: Option<&'a str>,
    images: Vec<AnnotationDoc<'a>>,
}

#[derive(Serialize)]
struct AnnotationDoc<'a> {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@type")]
    kind: &'static str,
    motivation: &'static str,
    resource: ImageResource<'a>,
    on: String,
}

#[derive(Serialize)]
struct ImageResource<'a> {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@type")]
    kind: &'static str,
    format: &'static str,
    width: u32,
    height: u32,
    service: ImageService<'a>,
}

#[derive(Serialize)]
struct ImageService<'a> {
    #[serde(rename = "@context")]
    context: &'static str,
    #[serde(rename = "@id")]
    id: &'a str,
    profile: &'static str,
}

impl<'a> ManifestDoc<'a> {
    fn build(manifest: &'a Manifest, base: &str) -> Self {
        let prefix = format!("{base}/manifests/{}", manifest.id);
        let meta = &manifest.metadata;
        Self {
            context: PRESENTATION_CONTEXT,
            id: manifest_uri(base, manifest.id.as_str()),
            kind: "sc:Manifest",
            label: &manifest.label,
            location: &manifest.location,
            metadata: vec![
                MetadataEntry {
                    label: "title",
                    value: &meta.title,
                },
                MetadataEntry {
                    label: "archive",
                    value: &meta.archive,
                },
                MetadataEntry {
                    label: "locator",
                    value: &meta.locator,
                },
                MetadataEntry {
                    label: "type",
                    value: &meta.item_type,
                },
            ],
            sequences: vec![SequenceDoc {
                id: format!("{prefix}/sequence/normal"),
                kind: "sc:Sequence",
                label: "Current Page Order",
                canvases: manifest
                    .canvases()
                    .iter()
                    .map(|c| CanvasDoc::build(c, &prefix))
                    .collect(),
            }],
        }
    }
}

impl<'a> CanvasDoc<'a> {
    fn build(canvas: &'a Canvas, prefix: &str) -> Self {
        let n = canvas.page_number;
        let id = format!("{prefix}/canvas/page-{n}");
        let image = &canvas.image;
        let tile_base = image.tile_base_url.trim_end_matches('/');
        Self {
            label: canvas.label(),
            kind: "sc:Canvas",
            width: canvas.width(),
            height: canvas.height(),
            thumbnail: image.thumbnail_url.as_deref(),
            images: vec![AnnotationDoc {
                id: format!("{prefix}/annotation/page-{n}"),
                kind: "oa:Annotation",
                motivation: "sc:painting",
                resource: ImageResource {
                    id: format!("{tile_base}/full/full/0/default.jpg"),
                    kind: "dctypes:Image",
                    format: "image/jpeg",
                    width: image.width,
                    height: image.height,
                    service: ImageService {
                        context: IMAGE_CONTEXT,
                        id: tile_base,
                        profile: LEVEL0_PROFILE,
                    },
                },
                on: id.clone(),
            }],
            id,
        }
    }
}
