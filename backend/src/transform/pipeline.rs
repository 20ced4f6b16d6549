//! High-level pipeline API: uploaded bytes in, categorized tickets out.
//!
//! This module combines all steps: intake check, parsing, classification,
//! ticket expansion and bucketing. Each call is one self-contained run; the
//! caller owns the returned value and replaces it on the next run.
//!
//! # Example
//!
//! ```rust,ignore
//! use sweeper::{process_file, ParseOptions};
//! use std::path::Path;
//!
//! let output = process_file(Path::new("orders.csv"), &ParseOptions::default())?;
//! println!("{} tickets", output.result.len());
//! ```

use serde::Serialize;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use super::summary::ResultSummary;
use super::tickets::{check_ticket_total, LineItem};
use crate::api::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::error::{PipelineError, PipelineResult};
use crate::models::{columns, CategorizedResult, RawRow};
use crate::parser::{parse_bytes, parse_csv_file, ParseOptions, ParseResult};
use crate::validation::{check_path, check_upload, UploadInfo};

/// Output of one successful run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessOutput {
    /// Tickets per category, with refund flags and discount codes.
    pub result: CategorizedResult,
    pub summary: ResultSummary,
    pub csv_info: CsvInfo,
}

/// CSV file information
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
    /// Order-export columns absent from the header. Their cells read as empty.
    pub missing_columns: Vec<String>,
}

/// Categorize parsed rows.
///
/// Every row yields at least one ticket, tickets are bucketed in row order
/// and then split order. Fails only when the rows ask for more tickets than
/// a run may hold.
pub fn categorize_rows(rows: &[RawRow]) -> PipelineResult<CategorizedResult> {
    let items: Vec<LineItem> = rows.iter().map(LineItem::from_row).collect();
    check_ticket_total(&items)?;

    let mut records = Vec::new();
    for item in items {
        records.extend(item.into_tickets()?);
    }
    Ok(CategorizedResult::from_records(records))
}

/// Run the pipeline on a CSV file on disk.
pub fn process_file(path: &Path, options: &ParseOptions) -> PipelineResult<ProcessOutput> {
    check_path(path)?;
    log_info(format!("📖 Reading {}", path.display()));
    let parse_result = parse_csv_file(path, options)?;
    process_parsed(parse_result)
}

/// Run the pipeline on an uploaded file.
pub fn process_upload(
    bytes: &[u8],
    upload: &UploadInfo<'_>,
    options: &ParseOptions,
) -> PipelineResult<ProcessOutput> {
    check_upload(upload)?;
    process_bytes(bytes, options)
}

/// Run the pipeline on raw CSV bytes, skipping the intake check.
pub fn process_bytes(bytes: &[u8], options: &ParseOptions) -> PipelineResult<ProcessOutput> {
    log_info(format!("📖 Reading CSV ({} bytes)...", bytes.len()));
    let parse_result = parse_bytes(bytes, options)?;
    process_parsed(parse_result)
}

/// Transform already-parsed CSV data.
pub fn process_parsed(parse_result: ParseResult) -> PipelineResult<ProcessOutput> {
    log_success(format!("Detected encoding: {}", parse_result.encoding));
    log_success(format!("Detected separator: '{}'", format_delimiter(parse_result.delimiter)));
    log_success(format!("Read {} rows", parse_result.rows.len()));

    let missing_columns: Vec<String> = columns::ALL
        .iter()
        .filter(|c| !parse_result.headers.iter().any(|h| h.as_str() == **c))
        .map(|c| c.to_string())
        .collect();
    if !missing_columns.is_empty() {
        log_warning(format!(
            "Missing columns (read as empty): {}",
            missing_columns.join(", ")
        ));
    }

    let csv_info = CsvInfo {
        encoding: parse_result.encoding,
        delimiter: parse_result.delimiter,
        headers: parse_result.headers,
        row_count: parse_result.rows.len(),
        missing_columns,
    };

    log_info("⚙️  Categorizing tickets...");
    let rows = parse_result.rows;
    let result = panic::catch_unwind(AssertUnwindSafe(|| categorize_rows(&rows)))
        .map_err(|payload| PipelineError::Processing(panic_message(payload.as_ref())))??;

    let summary = ResultSummary::from_result(&result);
    log_success(format!("{} tickets from {} rows", summary.total_tickets, csv_info.row_count));
    for stats in &summary.categories {
        log_info_indent(format!("{}: {}", stats.category, stats.count), 1);
    }
    if summary.refunded_count > 0 {
        log_warning(format!("Found {} refunded records", summary.refunded_count));
    }

    Ok(ProcessOutput {
        result,
        summary,
        csv_info,
    })
}

/// Format delimiter for display
pub fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected fault".to_string()
    }
}
