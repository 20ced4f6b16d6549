//! # Sweeper - attendee lists from Squarespace order exports
//!
//! Sweeper reads a Squarespace order CSV, splits multi-ticket orders into
//! one row per ticket, sorts attendees into categories by discount code,
//! flags refunded orders and writes redacted per-category CSV files.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│  Transform  │────▶│  CSV Export │
//! │  (ISO/UTF8) │     │  (auto-enc) │     │ (split+cat) │     │ (redacted)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sweeper::{export_bundle, process_file, ParseOptions};
//! use std::path::Path;
//!
//! let output = process_file(Path::new("orders.csv"), &ParseOptions::default()).unwrap();
//! for file in export_bundle(&output.result, true).unwrap() {
//!     println!("{}: {} rows", file.file_name, file.rows);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (Category, TicketRecord, CategorizedResult)
//! - [`parser`] - CSV parsing with auto-detection
//! - [`validation`] - Upload intake checks
//! - [`transform`] - Classification, ticket expansion, pipeline
//! - [`export`] - Redacted CSV rendering
//! - [`config`] - Server configuration
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Parsing
pub mod parser;
pub mod validation;

// Transformation
pub mod transform;

// Output
pub mod export;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{CsvError, ExportError, PipelineError, ServerError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CategorizedResult,
    Category,
    ExportRecord,
    MergedExportRecord,
    RawRow,
    TicketQuantity,
    TicketRecord,
};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content,
    detect_delimiter,
    detect_encoding,
    parse_bytes,
    parse_bytes_auto,
    parse_csv_file,
    parse_str,
    ParseOptions,
    ParseResult,
};

pub use validation::{check_path, check_upload, UploadInfo};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::{
    categorize_participant,
    categorize_rows,
    expand_row,
    process_bytes,
    process_file,
    process_parsed,
    process_upload,
    rules_description,
    CsvInfo,
    ProcessOutput,
    ResultSummary,
};

// =============================================================================
// Re-exports - Export
// =============================================================================

pub use export::{
    export_bundle,
    render_category_csv,
    render_merged_csv,
    render_target,
    write_bundle,
    ExportFile,
    ExportTarget,
    MERGED_FILE_NAME,
};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, ProcessResponse};
pub use config::ServerConfig;

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
