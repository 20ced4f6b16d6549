//! CSV export of categorized tickets.
//!
//! Every exported file goes through the redacted projection in
//! [`crate::models::export`]: no discount code, no refund flag, and a
//! `Financial Status` column that only reads `REFUNDED` or nothing.
//!
//! # Files
//!
//! | File                        | Content                                   |
//! |-----------------------------|-------------------------------------------|
//! | `general_attendees.csv`     | General bucket (only when non-empty)      |
//! | `volunteer_attendees.csv`   | Volunteer bucket (only when non-empty)    |
//! | `guest_attendees.csv`       | Guest bucket (only when non-empty)        |
//! | `speaker_attendees.csv`     | Speaker bucket (only when non-empty)      |
//! | `all_attendees_merged.csv`  | All buckets in order, plus `Category`     |

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{ExportError, ExportResult};
use crate::models::export::EXPORT_HEADERS;
use crate::models::{CategorizedResult, Category, ExportRecord, MergedExportRecord, TicketRecord};

/// File name of the merged export.
pub const MERGED_FILE_NAME: &str = "all_attendees_merged.csv";

/// Extra column of the merged export.
pub const CATEGORY_HEADER: &str = "Category";

/// Which file to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTarget {
    Category(Category),
    Merged,
}

impl ExportTarget {
    pub fn file_name(&self) -> String {
        match self {
            Self::Category(c) => c.file_name(),
            Self::Merged => MERGED_FILE_NAME.to_string(),
        }
    }
}

impl fmt::Display for ExportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Category(c) => write!(f, "{}", c),
            Self::Merged => f.write_str("merged"),
        }
    }
}

impl FromStr for ExportTarget {
    type Err = ExportError;

    /// Accepts a category (`guest`), `merged`/`all`, or a download file name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        if name == "merged" || name == "all" || name == MERGED_FILE_NAME {
            return Ok(Self::Merged);
        }
        let stem = name.strip_suffix("_attendees.csv").unwrap_or(&name);
        stem.parse::<Category>()
            .map(Self::Category)
            .map_err(|_| ExportError::UnknownTarget(s.to_string()))
    }
}

/// A rendered export file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub target: ExportTarget,
    pub file_name: String,
    /// Data rows, header excluded.
    pub rows: usize,
    pub contents: String,
}

/// Render one category's tickets as CSV, header included.
pub fn render_category_csv(records: &[TicketRecord]) -> ExportResult<String> {
    let mut writer = csv_writer();
    writer.write_record(EXPORT_HEADERS)?;
    for record in records {
        writer.serialize(ExportRecord::from(record))?;
    }
    finish(writer)
}

/// Render every bucket, in category order, with a `Category` column.
pub fn render_merged_csv(result: &CategorizedResult) -> ExportResult<String> {
    let mut writer = csv_writer();
    writer.write_record(EXPORT_HEADERS.iter().copied().chain([CATEGORY_HEADER]))?;
    for record in result.records() {
        writer.serialize(MergedExportRecord::from(record))?;
    }
    finish(writer)
}

/// Render one target, or `None` when it would hold no rows.
pub fn render_target(result: &CategorizedResult, target: ExportTarget) -> ExportResult<Option<ExportFile>> {
    let (rows, contents) = match target {
        ExportTarget::Category(category) => {
            let records = result.get(category);
            if records.is_empty() {
                return Ok(None);
            }
            (records.len(), render_category_csv(records)?)
        }
        ExportTarget::Merged => {
            if result.is_empty() {
                return Ok(None);
            }
            (result.len(), render_merged_csv(result)?)
        }
    };

    Ok(Some(ExportFile {
        target,
        file_name: target.file_name(),
        rows,
        contents,
    }))
}

/// Targets that would produce a file for this result, in download order.
pub fn planned_targets(result: &CategorizedResult, include_merged: bool) -> Vec<ExportTarget> {
    let mut targets: Vec<ExportTarget> = result
        .non_empty_categories()
        .into_iter()
        .map(ExportTarget::Category)
        .collect();
    if include_merged && !result.is_empty() {
        targets.push(ExportTarget::Merged);
    }
    targets
}

/// Render every non-empty category file, and the merged file if asked.
pub fn export_bundle(result: &CategorizedResult, include_merged: bool) -> ExportResult<Vec<ExportFile>> {
    let mut files = Vec::new();
    for target in planned_targets(result, include_merged) {
        if let Some(file) = render_target(result, target)? {
            files.push(file);
        }
    }
    Ok(files)
}

/// Write rendered files into `dir`, creating it if needed.
pub fn write_bundle(files: &[ExportFile], dir: &Path) -> ExportResult<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let path = dir.join(&file.file_name);
        fs::write(&path, &file.contents)?;
        written.push(path);
    }
    Ok(written)
}

fn csv_writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> ExportResult<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}
