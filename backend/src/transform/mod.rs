//! Record transformation pipeline.
//!
//! - [`classifier`] - Discount code / price to [`crate::models::Category`]
//! - [`tickets`] - Order line to individual tickets
//! - [`pipeline`] - Parse, categorize and bucket one upload
//! - [`summary`] - Counts and refunded tickets for display

pub mod classifier;
pub mod pipeline;
pub mod summary;
pub mod tickets;

pub use classifier::{categorize_participant, parse_price, rules_description, PriceTier};
pub use pipeline::{categorize_rows, process_bytes, process_file, process_parsed, process_upload, CsvInfo, ProcessOutput};
pub use summary::{CategoryStats, RefundedTicket, ResultSummary};
pub use tickets::{check_ticket_total, expand_row, is_refund_status, normalize_financial_status, parse_quantity, LineItem, MAX_TICKETS};
