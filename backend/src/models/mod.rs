//! Domain models for the sweeper pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`RawRow`] - One parsed CSV row, column name to raw string
//! - [`Category`] - Participant category (general, volunteer, guest, speaker)
//! - [`TicketQuantity`] - Quantity label of a ticket (whole or split)
//! - [`TicketRecord`] - One attendee ticket, as kept in memory
//! - [`CategorizedResult`] - Tickets bucketed by category, in input order
//! - [`ExportRecord`] / [`MergedExportRecord`] - Redacted export projections

pub mod export;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub use export::{ExportRecord, MergedExportRecord};

// =============================================================================
// Source Columns
// =============================================================================

/// Column names of the Squarespace order export that the pipeline reads.
pub mod columns {
    pub const BILLING_NAME: &str = "Billing Name";
    pub const EMAIL: &str = "Email";
    pub const ORDER_ID: &str = "Order ID";
    pub const LINEITEM_QUANTITY: &str = "Lineitem quantity";
    pub const DISCOUNT_CODE: &str = "Discount Code";
    pub const LINEITEM_PRICE: &str = "Lineitem price";
    pub const LINEITEM_NAME: &str = "Lineitem name";
    pub const FINANCIAL_STATUS: &str = "Financial Status";

    /// All columns with meaning to the pipeline. Others are ignored.
    pub const ALL: [&str; 8] = [
        BILLING_NAME,
        EMAIL,
        ORDER_ID,
        LINEITEM_QUANTITY,
        DISCOUNT_CODE,
        LINEITEM_PRICE,
        LINEITEM_NAME,
        FINANCIAL_STATUS,
    ];
}

// =============================================================================
// Raw Row
// =============================================================================

/// A parsed CSV row: column header to raw cell text.
///
/// Untrusted input. Any column may be absent; [`RawRow::get`] reads a
/// missing column as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRow {
    fields: HashMap<String, String>,
}

impl RawRow {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cell text for `column`, or `""` when the column is missing.
    pub fn get(&self, column: &str) -> &str {
        self.fields.get(column).map(String::as_str).unwrap_or("")
    }

    /// Set a cell, replacing any previous value.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(column.into(), value.into());
    }

    /// Whether the row carries `column` at all.
    pub fn contains(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

// =============================================================================
// Category
// =============================================================================

/// Participant category of a ticket.
///
/// Declaration order is the bucket order used for display and for the
/// merged export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    General,
    Volunteer,
    Guest,
    Speaker,
}

impl Category {
    /// Every category, in bucket order.
    pub const ALL: [Category; 4] = [
        Category::General,
        Category::Volunteer,
        Category::Guest,
        Category::Speaker,
    ];

    /// Lower-case tag, e.g. `volunteer`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Volunteer => "volunteer",
            Self::Guest => "guest",
            Self::Speaker => "speaker",
        }
    }

    /// Tag with its first letter capitalized, as written to the merged export.
    pub fn label(&self) -> &'static str {
        match self {
            Self::General => "General",
            Self::Volunteer => "Volunteer",
            Self::Guest => "Guest",
            Self::Speaker => "Speaker",
        }
    }

    /// Download file name for this category, e.g. `guest_attendees.csv`.
    pub fn file_name(&self) -> String {
        format!("{}_attendees.csv", self.as_str())
    }

    fn index(self) -> usize {
        match self {
            Self::General => 0,
            Self::Volunteer => 1,
            Self::Guest => 2,
            Self::Speaker => 3,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "general" => Ok(Self::General),
            "volunteer" => Ok(Self::Volunteer),
            "guest" => Ok(Self::Guest),
            "speaker" => Ok(Self::Speaker),
            other => Err(format!("unknown category '{}'", other)),
        }
    }
}

// =============================================================================
// Ticket Quantity
// =============================================================================

/// The `Ticket Quantity` cell of a ticket.
///
/// An order line with quantity `n >= 2` becomes `n` tickets labelled
/// `1 (i/n)`. Anything else stays a single ticket carrying the parsed
/// quantity as-is, which may be `0` or negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketQuantity {
    Whole(i64),
    Split { index: u64, total: u64 },
}

impl TicketQuantity {
    /// 1-based position inside a split order.
    pub fn ticket_number(&self) -> Option<u64> {
        match self {
            Self::Whole(_) => None,
            Self::Split { index, .. } => Some(*index),
        }
    }
}

impl fmt::Display for TicketQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Whole(n) => write!(f, "{}", n),
            Self::Split { index, total } => write!(f, "1 ({}/{})", index, total),
        }
    }
}

impl Serialize for TicketQuantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// =============================================================================
// Ticket Record
// =============================================================================

/// One attendee ticket as held in memory.
///
/// Keeps the discount code and the refund flag for display. The export
/// files use [`ExportRecord`] instead, which has neither.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Email")]
    pub email: String,
    /// Kept as text so long numeric ids survive unchanged.
    #[serde(rename = "Order ID")]
    pub order_id: String,
    #[serde(rename = "Ticket Quantity")]
    pub quantity: TicketQuantity,
    #[serde(rename = "Ticket Number")]
    pub ticket_number: Option<u64>,
    #[serde(rename = "Discount Code")]
    pub discount_code: String,
    #[serde(rename = "Event Type")]
    pub event_type: String,
    #[serde(rename = "Price")]
    pub price: String,
    /// Lower-cased and trimmed, `paid` when the source cell was empty.
    #[serde(rename = "Financial Status")]
    pub financial_status: String,
    #[serde(rename = "Is Refunded")]
    pub is_refunded: bool,
    #[serde(rename = "Category")]
    pub category: Category,
}

impl TicketRecord {
    /// `Ticket Number` cell text: the split index, or empty.
    pub fn ticket_number_text(&self) -> String {
        self.ticket_number.map(|n| n.to_string()).unwrap_or_default()
    }
}

// =============================================================================
// Categorized Result
// =============================================================================

/// Tickets of one run, bucketed by category.
///
/// Within a bucket, tickets keep input row order and then split order.
/// Built once per run and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategorizedResult {
    buckets: [Vec<TicketRecord>; 4],
}

impl CategorizedResult {
    /// Bucket tickets by their category, preserving iteration order.
    pub fn from_records(records: impl IntoIterator<Item = TicketRecord>) -> Self {
        let mut buckets: [Vec<TicketRecord>; 4] = Default::default();
        for record in records {
            buckets[record.category.index()].push(record);
        }
        Self { buckets }
    }

    /// Tickets of one category.
    pub fn get(&self, category: Category) -> &[TicketRecord] {
        &self.buckets[category.index()]
    }

    /// All buckets in category order, including empty ones.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &[TicketRecord])> {
        Category::ALL.into_iter().map(move |c| (c, self.get(c)))
    }

    /// Every ticket, bucket after bucket.
    pub fn records(&self) -> impl Iterator<Item = &TicketRecord> {
        self.buckets.iter().flatten()
    }

    /// Categories that hold at least one ticket.
    pub fn non_empty_categories(&self) -> Vec<Category> {
        self.iter()
            .filter(|(_, records)| !records.is_empty())
            .map(|(c, _)| c)
            .collect()
    }

    /// Total tickets across all buckets.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Refunded tickets, bucket after bucket.
    pub fn refunded(&self) -> impl Iterator<Item = &TicketRecord> {
        self.records().filter(|r| r.is_refunded)
    }

    pub fn refunded_count(&self) -> usize {
        self.refunded().count()
    }
}

impl Serialize for CategorizedResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Category::ALL.len()))?;
        for (category, records) in self.iter() {
            map.serialize_entry(category.as_str(), records)?;
        }
        map.end()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(name: &str, category: Category, refunded: bool) -> TicketRecord {
        TicketRecord {
            name: name.into(),
            email: String::new(),
            order_id: "1".into(),
            quantity: TicketQuantity::Whole(1),
            ticket_number: None,
            discount_code: String::new(),
            event_type: String::new(),
            price: String::new(),
            financial_status: if refunded { "refunded" } else { "paid" }.into(),
            is_refunded: refunded,
            category,
        }
    }

    #[test]
    fn test_raw_row_missing_column_is_empty() {
        let row: RawRow = [("Email", "a@b.c")].into_iter().collect();
        assert_eq!(row.get("Email"), "a@b.c");
        assert_eq!(row.get("Billing Name"), "");
        assert!(!row.contains("Billing Name"));
    }

    #[test]
    fn test_category_names() {
        assert_eq!(Category::Volunteer.as_str(), "volunteer");
        assert_eq!(Category::Volunteer.label(), "Volunteer");
        assert_eq!(Category::Speaker.file_name(), "speaker_attendees.csv");
        assert_eq!("Guest".parse::<Category>(), Ok(Category::Guest));
        assert!("vip".parse::<Category>().is_err());
    }

    #[test]
    fn test_ticket_quantity_display() {
        assert_eq!(TicketQuantity::Whole(0).to_string(), "0");
        assert_eq!(TicketQuantity::Whole(-2).to_string(), "-2");
        assert_eq!(TicketQuantity::Split { index: 2, total: 3 }.to_string(), "1 (2/3)");
        assert_eq!(TicketQuantity::Split { index: 2, total: 3 }.ticket_number(), Some(2));
        assert_eq!(TicketQuantity::Whole(1).ticket_number(), None);
    }

    #[test]
    fn test_result_buckets_keep_order() {
        let result = CategorizedResult::from_records(vec![
            ticket("a", Category::Guest, false),
            ticket("b", Category::General, true),
            ticket("c", Category::Guest, true),
        ]);

        assert_eq!(result.len(), 3);
        let guests: Vec<&str> = result.get(Category::Guest).iter().map(|r| r.name.as_str()).collect();
        assert_eq!(guests, vec!["a", "c"]);
        assert_eq!(result.non_empty_categories(), vec![Category::General, Category::Guest]);
        assert_eq!(result.refunded_count(), 2);
    }

    #[test]
    fn test_result_serializes_all_buckets_in_order() {
        let result = CategorizedResult::from_records(vec![ticket("a", Category::Speaker, false)]);
        let json = serde_json::to_value(&result).unwrap();

        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 4);
        assert_eq!(json["speaker"][0]["Name"], "a");
        assert_eq!(json["speaker"][0]["Ticket Quantity"], "1");
        assert_eq!(json["general"].as_array().unwrap().len(), 0);
    }
}
