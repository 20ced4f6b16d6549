//! Redacted export projections of [`TicketRecord`].
//!
//! Exported files never carry the discount code or the refund flag. The
//! `Financial Status` column only says `REFUNDED` for refunded tickets and
//! is empty otherwise.

use serde::Serialize;

use super::{Category, TicketRecord};

/// Value written to `Financial Status` for refunded tickets.
pub const REFUNDED_MARKER: &str = "REFUNDED";

/// Export columns, in file order.
pub const EXPORT_HEADERS: [&str; 8] = [
    "Name",
    "Email",
    "Order ID",
    "Ticket Quantity",
    "Ticket Number",
    "Event Type",
    "Price",
    "Financial Status",
];

/// One row of a per-category export file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Order ID")]
    pub order_id: String,
    #[serde(rename = "Ticket Quantity")]
    pub ticket_quantity: String,
    #[serde(rename = "Ticket Number")]
    pub ticket_number: String,
    #[serde(rename = "Event Type")]
    pub event_type: String,
    #[serde(rename = "Price")]
    pub price: String,
    #[serde(rename = "Financial Status")]
    pub financial_status: String,
}

impl From<&TicketRecord> for ExportRecord {
    fn from(record: &TicketRecord) -> Self {
        Self {
            name: record.name.clone(),
            email: record.email.clone(),
            order_id: record.order_id.clone(),
            ticket_quantity: record.quantity.to_string(),
            ticket_number: record.ticket_number_text(),
            event_type: record.event_type.clone(),
            price: record.price.clone(),
            financial_status: if record.is_refunded {
                REFUNDED_MARKER.to_string()
            } else {
                String::new()
            },
        }
    }
}

/// One row of the merged export: an [`ExportRecord`] plus its category label.
///
/// Fields are spelled out rather than flattened, the `csv` serializer
/// does not support `#[serde(flatten)]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedExportRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Order ID")]
    pub order_id: String,
    #[serde(rename = "Ticket Quantity")]
    pub ticket_quantity: String,
    #[serde(rename = "Ticket Number")]
    pub ticket_number: String,
    #[serde(rename = "Event Type")]
    pub event_type: String,
    #[serde(rename = "Price")]
    pub price: String,
    #[serde(rename = "Financial Status")]
    pub financial_status: String,
    #[serde(rename = "Category")]
    pub category: String,
}

impl MergedExportRecord {
    pub fn new(record: ExportRecord, category: Category) -> Self {
        Self {
            name: record.name,
            email: record.email,
            order_id: record.order_id,
            ticket_quantity: record.ticket_quantity,
            ticket_number: record.ticket_number,
            event_type: record.event_type,
            price: record.price,
            financial_status: record.financial_status,
            category: category.label().to_string(),
        }
    }
}

impl From<&TicketRecord> for MergedExportRecord {
    fn from(record: &TicketRecord) -> Self {
        Self::new(ExportRecord::from(record), record.category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TicketQuantity;

    fn refunded_split() -> TicketRecord {
        TicketRecord {
            name: "Jane Doe".into(),
            email: "j@x.com".into(),
            order_id: "1001".into(),
            quantity: TicketQuantity::Split { index: 2, total: 3 },
            ticket_number: Some(2),
            discount_code: "VOL2024".into(),
            event_type: "Workshop".into(),
            price: "50".into(),
            financial_status: "refunded".into(),
            is_refunded: true,
            category: Category::Volunteer,
        }
    }

    #[test]
    fn test_export_record_redacts() {
        let export = ExportRecord::from(&refunded_split());
        assert_eq!(export.ticket_quantity, "1 (2/3)");
        assert_eq!(export.ticket_number, "2");
        assert_eq!(export.financial_status, "REFUNDED");

        let mut paid = refunded_split();
        paid.is_refunded = false;
        paid.financial_status = "paid".into();
        assert_eq!(ExportRecord::from(&paid).financial_status, "");
    }

    #[test]
    fn test_export_record_has_no_sensitive_fields() {
        let json = serde_json::to_value(ExportRecord::from(&refunded_split())).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.get("Discount Code").is_none());
        assert!(obj.get("Is Refunded").is_none());
        assert_eq!(obj.len(), EXPORT_HEADERS.len());
        for header in EXPORT_HEADERS {
            assert!(obj.contains_key(header), "missing {}", header);
        }
    }

    #[test]
    fn test_merged_record_capitalizes_category() {
        let merged = MergedExportRecord::from(&refunded_split());
        assert_eq!(merged.category, "Volunteer");
        assert_eq!(merged.financial_status, "REFUNDED");
    }
}
