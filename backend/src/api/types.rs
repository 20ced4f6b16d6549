//! REST API types for frontend integration.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::CategorizedResult;
use crate::transform::pipeline::{format_delimiter, ProcessOutput};
use crate::transform::summary::ResultSummary;

/// Response sent to the client after a CSV upload was processed.
///
/// `records` keeps discount codes and refund flags for on-screen review;
/// downloads go through the export endpoint, which redacts them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    /// Unique job identifier
    pub job_id: String,

    /// "ready", or "warning" when refunded records were found
    pub status: String,

    pub processed_at: DateTime<Utc>,

    pub file_name: Option<String>,

    pub csv_info: CsvMetadata,

    pub summary: ResultSummary,

    pub records: CategorizedResult,
}

/// CSV file metadata
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvMetadata {
    pub encoding: String,
    pub delimiter: String,
    pub row_count: usize,
    pub columns: Vec<String>,
    pub missing_columns: Vec<String>,
}

impl ProcessResponse {
    pub fn new(output: ProcessOutput, file_name: Option<String>) -> Self {
        let status = if output.summary.refunded_count > 0 { "warning" } else { "ready" };

        Self {
            job_id: Uuid::new_v4().to_string(),
            status: status.to_string(),
            processed_at: Utc::now(),
            file_name,
            csv_info: CsvMetadata {
                encoding: output.csv_info.encoding,
                delimiter: format_delimiter(output.csv_info.delimiter),
                row_count: output.csv_info.row_count,
                columns: output.csv_info.headers,
                missing_columns: output.csv_info.missing_columns,
            },
            summary: output.summary,
            records: output.result,
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParseOptions;
    use crate::transform::pipeline::process_bytes;

    const CSV: &str = "Order ID,Billing Name,Lineitem quantity,Discount Code,Financial Status\n\
                       1001,Jane Doe,2,SPE9,paid\n\
                       1002,John Roe,1,,refunded";

    #[test]
    fn test_process_response_shape() {
        let output = process_bytes(CSV.as_bytes(), &ParseOptions::default()).unwrap();
        let response = ProcessResponse::new(output, Some("orders.csv".into()));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "warning");
        assert_eq!(json["fileName"], "orders.csv");
        assert_eq!(json["csvInfo"]["rowCount"], 2);
        assert_eq!(json["csvInfo"]["delimiter"], ",");
        assert_eq!(json["summary"]["totalTickets"], 3);
        assert_eq!(json["summary"]["refundedCount"], 1);
        assert_eq!(json["records"]["speaker"].as_array().unwrap().len(), 2);
        // In-app records keep the review fields
        assert_eq!(json["records"]["speaker"][0]["Discount Code"], "SPE9");
        assert_eq!(json["records"]["general"][0]["Is Refunded"], true);
        assert_eq!(json["records"]["general"][0]["Order ID"], "1002");
    }

    #[test]
    fn test_error_response() {
        let json = error_response("Please upload a valid CSV file");
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "Please upload a valid CSV file");
        assert!(json["jobId"].is_string());
    }
}
