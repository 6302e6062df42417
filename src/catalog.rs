//! CSV catalog reader.
//!
//! The catalog is a flat export with one row per page image:
//!
//! ```text
//! site, archive, locator, item type, filename, title
//! ```
//!
//! Row order is significant (contiguous rows form one document), so rows are
//! yielded strictly in file order and never buffered. Columns beyond the
//! sixth are ignored; fewer than six is fatal, since a short row would
//! silently shift every later field.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Number of columns every row must carry.
pub const COLUMNS: usize = 6;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Malformed catalog row at line {line}: expected {COLUMNS} columns, found {found}")]
    MalformedRow { line: u64, found: usize },
}

/// One catalog line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRow {
    /// 1-based line number in the CSV file.
    pub line: u64,
    pub site: String,
    pub archive: String,
    pub locator: String,
    pub item_type: String,
    pub filename: String,
    pub title: String,
}

impl CatalogRow {
    /// `data/site/archive/locator/item_type/filename`.
    pub fn source_path(&self, data_root: &Path) -> PathBuf {
        data_root
            .join(&self.site)
            .join(&self.archive)
            .join(&self.locator)
            .join(&self.item_type)
            .join(&self.filename)
    }

    fn from_record(record: &csv::StringRecord) -> Result<Self, CatalogError> {
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        if record.len() < COLUMNS {
            return Err(CatalogError::MalformedRow {
                line,
                found: record.len(),
            });
        }
        let field = |i: usize| record.get(i).unwrap_or_default().to_string();
        Ok(Self {
            line,
            site: field(0),
            archive: field(1),
            locator: field(2),
            item_type: field(3),
            filename: field(4),
            title: field(5),
        })
    }
}

/// Iterator over the rows of a catalog, in file order.
pub struct CatalogReader<R: Read> {
    records: csv::StringRecordsIntoIter<R>,
}

impl CatalogReader<File> {
    pub fn open(path: &Path, has_headers: bool) -> Result<Self, CatalogError> {
        Ok(Self::from_reader(File::open(path)?, has_headers))
    }
}

impl<R: Read> CatalogReader<R> {
    pub fn from_reader(reader: R, has_headers: bool) -> Self {
        let records = csv::ReaderBuilder::new()
            .has_headers(has_headers)
            .flexible(true)
            .from_reader(reader)
            .into_records();
        Self { records }
    }
}

impl<R: Read> Iterator for CatalogReader<R> {
    type Item = Result<CatalogRow, CatalogError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        Some(
            record
                .map_err(CatalogError::from)
                .and_then(|r| CatalogRow::from_record(&r)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(csv: &str, has_headers: bool) -> Vec<Result<CatalogRow, CatalogError>> {
        CatalogReader::from_reader(csv.as_bytes(), has_headers).collect()
    }

    #[test]
    fn reads_rows_in_file_order() {
        let parsed = rows(
            "S,A,L,T,p1.jpg,Title\nS,A,L,T,p2.jpg,Title\n",
            false,
        );
        let parsed: Vec<CatalogRow> = parsed.into_iter().map(Result::unwrap).collect();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].filename, "p1.jpg");
        assert_eq!(parsed[0].line, 1);
        assert_eq!(parsed[1].filename, "p2.jpg");
        assert_eq!(parsed[1].line, 2);
        assert_eq!(parsed[1].site, "S");
        assert_eq!(parsed[1].archive, "A");
        assert_eq!(parsed[1].locator, "L");
        assert_eq!(parsed[1].item_type, "T");
        assert_eq!(parsed[1].title, "Title");
    }

    #[test]
    fn header_line_is_skipped_when_configured() {
        let parsed = rows(
            "site,archive,locator,type,filename,title\nS,A,L,T,p1.jpg,Title\n",
            true,
        );
        assert_eq!(parsed.len(), 1);
        let row = parsed[0].as_ref().unwrap();
        assert_eq!(row.filename, "p1.jpg");
        assert_eq!(row.line, 2);
    }

    #[test]
    fn first_line_is_data_by_default() {
        let parsed = rows("S,A,L,T,p1.jpg,Title\n", false);
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn quoted_fields_keep_commas() {
        let parsed = rows("S,A,L,T,p1.jpg,\"Letter, to Mies\"\n", false);
        assert_eq!(parsed[0].as_ref().unwrap().title, "Letter, to Mies");
    }

    #[test]
    fn empty_title_is_preserved_for_the_assembler() {
        let parsed = rows("S,A,L,T,p1.jpg,\n", false);
        assert_eq!(parsed[0].as_ref().unwrap().title, "");
    }

    #[test]
    fn extra_columns_are_ignored() {
        let parsed = rows("S,A,L,T,p1.jpg,Title,notes,more\n", false);
        assert_eq!(parsed[0].as_ref().unwrap().title, "Title");
    }

    #[test]
    fn short_row_is_malformed() {
        let parsed = rows("S,A,L,T,p1.jpg,Title\nS,A,L,T\n", false);
        assert!(parsed[0].is_ok());
        match &parsed[1] {
            Err(CatalogError::MalformedRow { line, found }) => {
                assert_eq!(*line, 2);
                assert_eq!(*found, 4);
            }
            other => panic!("expected MalformedRow, got {other:?}"),
        }
    }

    #[test]
    fn blank_lines_are_not_rows() {
        let parsed = rows("S,A,L,T,p1.jpg,Title\n\nS,A,L,T,p2.jpg,Title\n", false);
        assert_eq!(parsed.len(), 2);
        assert!(parsed.iter().all(Result::is_ok));
    }

    #[test]
    fn source_path_joins_five_columns() {
        let row = CatalogRow {
            line: 1,
            site: "Dessau".into(),
            archive: "Bauhaus-Archiv".into(),
            locator: "Box 3".into(),
            item_type: "Letter".into(),
            filename: "p1.jpg".into(),
            title: "ignored".into(),
        };
        assert_eq!(
            row.source_path(Path::new("data")),
            PathBuf::from("data/Dessau/Bauhaus-Archiv/Box 3/Letter/p1.jpg")
        );
    }

    #[test]
    fn open_missing_file_is_io_error() {
        let result = CatalogReader::open(Path::new("/nonexistent/data.csv"), false);
        assert!(matches!(result, Err(CatalogError::Io(_))));
    }
}
