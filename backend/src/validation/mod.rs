//! Upload intake checks.
//!
//! Rejects anything that is not a CSV export before the parser sees it.
//! A file is accepted when its media type is a CSV type or, lacking a
//! usable media type, when its name ends in `.csv`.

use std::path::Path;

use crate::error::{PipelineError, PipelineResult};

/// Message shown when the upload is not a CSV file.
pub const INVALID_FILE_MESSAGE: &str = "Please upload a valid CSV file";

/// Message shown when processing is requested without a file.
pub const MISSING_FILE_MESSAGE: &str = "Please upload a file first";

/// Media types browsers send for `.csv` files.
const CSV_MEDIA_TYPES: [&str; 3] = ["text/csv", "application/csv", "application/vnd.ms-excel"];

/// Metadata of an uploaded file, as far as the client told us.
#[derive(Debug, Clone, Default)]
pub struct UploadInfo<'a> {
    pub file_name: Option<&'a str>,
    pub content_type: Option<&'a str>,
}

/// Check that an upload looks like a CSV file.
pub fn check_upload(upload: &UploadInfo<'_>) -> PipelineResult<()> {
    if let Some(content_type) = upload.content_type {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        if CSV_MEDIA_TYPES.contains(&essence.as_str()) {
            return Ok(());
        }
        // Generic types say nothing; fall through to the file name.
        if !essence.is_empty() && essence != "application/octet-stream" {
            return Err(invalid());
        }
    }

    match upload.file_name {
        Some(name) if has_csv_extension(Path::new(name)) => Ok(()),
        _ => Err(invalid()),
    }
}

/// Check a local file path, used by the CLI.
pub fn check_path(path: &Path) -> PipelineResult<()> {
    if has_csv_extension(path) {
        Ok(())
    } else {
        Err(invalid())
    }
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

fn invalid() -> PipelineError {
    PipelineError::InvalidInput(INVALID_FILE_MESSAGE.to_string())
}
