//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Output is **document-centric, not file-centric**. The primary display for
//! every entity (document, page) is its semantic identity: positional index
//! plus label. Filesystem paths are secondary context on indented `Source:`
//! lines, so the output reads as an inventory of the archive while still
//! letting users trace a page back to its scan.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! Dessau - Letter to Mies (s-t)
//!     001 p1.jpg: tiled
//!         Source: data/Dessau/Bauhaus-Archiv/Box 3/Letter/p1.jpg
//!     002 p2.jpg: cached
//!         Source: data/Dessau/Bauhaus-Archiv/Box 3/Letter/p2.jpg
//!     line 3 notes.pdf: skipped (not an accepted image file)
//!     → manifests/s-t.json (2 pages)
//!
//! Built 1 manifest, 2 pages
//! Tiles: 1 cached, 1 tiled (2 total)
//! Skipped 1 row
//! ```
//!
//! ## Check
//!
//! ```text
//! Documents
//! 001 Dessau - Letter to Mies (2 pages)
//!     Id: s-t (from line 1)
//!
//! Skipped
//!     line 3 notes.pdf: not an accepted image file
//!
//! 1 document, 2 pages
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::assemble::{Plan, SkippedRow};
use crate::cache::TileStatus;
use crate::pipeline::{BuildEvent, BuildSummary};
use crate::rewrite::RewriteReport;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 page`, `2 pages`.
fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{n} {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

/// Format a document header: positional index + label + page count.
///
/// ```text
/// 001 Dessau - Letter to Mies (2 pages)
/// ```
fn document_header(index: usize, label: &str, pages: usize) -> String {
    format!("{} {} ({})", format_index(index), label, plural(pages, "page"))
}

fn skipped_line(skipped: &SkippedRow) -> String {
    format!("line {} {}: {}", skipped.line, skipped.filename, skipped.reason)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Build
// ============================================================================

/// Format a single build progress event as display lines.
pub fn format_build_event(event: &BuildEvent) -> Vec<String> {
    match event {
        BuildEvent::DocumentStarted { key, label } => vec![format!("{label} ({key})")],
        BuildEvent::PageAdded {
            page,
            source,
            status,
            ..
        } => {
            let status = match status {
                TileStatus::Cached => "cached",
                TileStatus::Generated => "tiled",
            };
            vec![
                format!(
                    "{}{} {}: {}",
                    indent(1),
                    format_index(*page as usize),
                    file_name(source),
                    status
                ),
                format!("{}Source: {}", indent(2), source.display()),
            ]
        }
        BuildEvent::RowSkipped(skipped) => vec![format!(
            "{}line {} {}: skipped ({})",
            indent(1),
            skipped.line,
            skipped.filename,
            skipped.reason
        )],
        BuildEvent::ManifestWritten {
            pages,
            path,
            changed,
            superseded,
            ..
        } => {
            let unchanged = if *changed { "" } else { ", unchanged" };
            let mut lines = vec![format!(
                "{}\u{2192} {} ({}{})",
                indent(1),
                path.display(),
                plural(*pages, "page"),
                unchanged
            )];
            if let Some(previous) = superseded {
                lines.push(format!(
                    "{}Warning: replaces \"{}\" written earlier in this run",
                    indent(2),
                    previous
                ));
            }
            lines
        }
    }
}

/// Format the end-of-build summary.
pub fn format_build_summary(summary: &BuildSummary) -> Vec<String> {
    let mut lines = vec![format!(
        "Built {}, {}",
        plural(summary.documents, "manifest"),
        plural(summary.pages, "page")
    )];
    lines.push(format!("Tiles: {}", summary.cache_stats));
    if !summary.skipped.is_empty() {
        lines.push(format!("Skipped {}", plural(summary.skipped.len(), "row")));
    }
    if !summary.superseded.is_empty() {
        lines.push(format!(
            "Ids written more than once: {}",
            summary.superseded.join(", ")
        ));
    }
    lines
}

pub fn print_build_summary(summary: &BuildSummary) {
    for line in format_build_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format the planned documents of a `check` run.
pub fn format_plan(plan: &Plan) -> Vec<String> {
    let mut lines = vec!["Documents".to_string()];
    for (i, doc) in plan.documents.iter().enumerate() {
        lines.push(document_header(i + 1, &doc.label, doc.pages as usize));
        lines.push(format!(
            "{}Id: {} (from line {})",
            indent(1),
            doc.key,
            doc.first_line
        ));
    }

    if !plan.skipped.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for skipped in &plan.skipped {
            lines.push(format!("{}{}", indent(1), skipped_line(skipped)));
        }
    }

    let repeated = plan.repeated_keys();
    if !repeated.is_empty() {
        lines.push(String::new());
        lines.push("Repeated ids (later documents overwrite earlier ones)".to_string());
        for key in repeated {
            lines.push(format!("{}{}", indent(1), key));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "{}, {}",
        plural(plan.documents.len(), "document"),
        plural(plan.page_count() as usize, "page")
    ));
    lines
}

pub fn print_plan(plan: &Plan) {
    for line in format_plan(plan) {
        println!("{}", line);
    }
}

// ============================================================================
// Rewrite
// ============================================================================

pub fn format_rewrite_report(report: &RewriteReport, from: &str, to: &str) -> Vec<String> {
    let mut lines = vec![
        format!("{from} \u{2192} {to}"),
        format!("{}Manifests: {}", indent(1), report.manifests_changed),
        format!("{}Tile descriptors: {}", indent(1), report.descriptors_changed),
    ];
    if report.unchanged > 0 {
        lines.push(format!(
            "{}Already up to date: {}",
            indent(1),
            plural(report.unchanged, "file")
        ));
    }
    for path in &report.missing {
        lines.push(format!("{}Missing: {}", indent(1), path.display()));
    }
    lines
}

pub fn print_rewrite_report(report: &RewriteReport, from: &str, to: &str) {
    for line in format_rewrite_report(report, from, to) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::{PlannedDocument, SkipReason};
    use crate::cache::CacheStats;
    use crate::manifest::DocumentKey;
    use std::path::PathBuf;

    fn key(title: &str) -> DocumentKey {
        DocumentKey::from_title(title).unwrap()
    }

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(0, "page"), "0 pages");
        assert_eq!(plural(1, "page"), "1 page");
        assert_eq!(plural(2, "page"), "2 pages");
    }

    #[test]
    fn document_header_with_count() {
        assert_eq!(
            document_header(1, "Dessau - Letter", 5),
            "001 Dessau - Letter (5 pages)"
        );
    }

    // =========================================================================
    // Build events
    // =========================================================================

    #[test]
    fn document_started_shows_label_and_id() {
        let lines = format_build_event(&BuildEvent::DocumentStarted {
            key: "s-t".into(),
            label: "S - T".into(),
        });
        assert_eq!(lines, vec!["S - T (s-t)"]);
    }

    #[test]
    fn page_added_shows_status_and_source() {
        let lines = format_build_event(&BuildEvent::PageAdded {
            key: "s-t".into(),
            page: 2,
            source: PathBuf::from("data/S/A/L/T/p2.jpg"),
            status: TileStatus::Cached,
        });
        assert_eq!(
            lines,
            vec!["    002 p2.jpg: cached", "        Source: data/S/A/L/T/p2.jpg"]
        );
    }

    #[test]
    fn row_skipped_shows_line_and_reason() {
        let lines = format_build_event(&BuildEvent::RowSkipped(SkippedRow {
            line: 3,
            filename: "notes.pdf".into(),
            reason: SkipReason::NotAnImage,
        }));
        assert_eq!(
            lines,
            vec!["    line 3 notes.pdf: skipped (not an accepted image file)"]
        );
    }

    #[test]
    fn manifest_written_flags_unchanged_and_superseded() {
        let lines = format_build_event(&BuildEvent::ManifestWritten {
            key: "s-t".into(),
            pages: 1,
            path: PathBuf::from("manifests/s-t.json"),
            changed: false,
            superseded: Some("S - T!".into()),
        });
        assert_eq!(lines[0], "    \u{2192} manifests/s-t.json (1 page, unchanged)");
        assert!(lines[1].contains("\"S - T!\""));
    }

    #[test]
    fn build_summary_lines() {
        let summary = BuildSummary {
            documents: 2,
            pages: 5,
            skipped: vec![SkippedRow {
                line: 3,
                filename: "x.pdf".into(),
                reason: SkipReason::NotAnImage,
            }],
            superseded: vec![],
            cache_stats: CacheStats {
                hits: 1,
                misses: 4,
                failures: 0,
            },
        };
        assert_eq!(
            format_build_summary(&summary),
            vec![
                "Built 2 manifests, 5 pages",
                "Tiles: 1 cached, 4 tiled (5 total)",
                "Skipped 1 row",
            ]
        );
    }

    // =========================================================================
    // Check
    // =========================================================================

    #[test]
    fn plan_lists_documents_skips_and_repeats() {
        let plan = Plan {
            documents: vec![
                PlannedDocument {
                    key: key("S - A"),
                    label: "S - A".into(),
                    first_line: 1,
                    pages: 2,
                },
                PlannedDocument {
                    key: key("S - B"),
                    label: "S - B".into(),
                    first_line: 3,
                    pages: 1,
                },
                PlannedDocument {
                    key: key("S - A"),
                    label: "S - A".into(),
                    first_line: 4,
                    pages: 1,
                },
            ],
            skipped: vec![SkippedRow {
                line: 5,
                filename: "p9.jpg".into(),
                reason: SkipReason::MissingTitle,
            }],
        };
        let lines = format_plan(&plan);
        assert_eq!(lines[0], "Documents");
        assert_eq!(lines[1], "001 S - A (2 pages)");
        assert_eq!(lines[2], "    Id: s-a (from line 1)");
        assert!(lines.contains(&"    line 5 p9.jpg: no title".to_string()));
        assert!(lines.contains(&"    s-a".to_string()));
        assert_eq!(lines.last().unwrap(), "3 documents, 4 pages");
    }

    #[test]
    fn empty_plan() {
        let lines = format_plan(&Plan::default());
        assert_eq!(lines, vec!["Documents", "", "0 documents, 0 pages"]);
    }

    // =========================================================================
    // Rewrite
    // =========================================================================

    #[test]
    fn rewrite_report_lines() {
        let report = RewriteReport {
            manifests_changed: 3,
            descriptors_changed: 7,
            unchanged: 0,
            missing: vec![PathBuf::from("out/manifests/gone.json")],
        };
        let lines = format_rewrite_report(&report, "http://a", "https://b");
        assert_eq!(
            lines,
            vec![
                "http://a \u{2192} https://b",
                "    Manifests: 3",
                "    Tile descriptors: 7",
                "    Missing: out/manifests/gone.json",
            ]
        );
    }
}
