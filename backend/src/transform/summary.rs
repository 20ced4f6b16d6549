//! Result summary for display.
//!
//! Counts per category, refund counts, and the refunded tickets that need a
//! human look before the lists go out.

use serde::Serialize;
use std::fmt;

use crate::export::planned_targets;
use crate::models::{CategorizedResult, Category, TicketRecord};

/// Ticket counts of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub category: Category,
    pub count: usize,
    pub refunded: usize,
}

/// A refunded ticket, reduced to what the review table shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundedTicket {
    pub name: String,
    pub email: String,
    pub order_id: String,
    pub financial_status: String,
    pub price: String,
    pub event_type: String,
    pub category: Category,
}

impl From<&TicketRecord> for RefundedTicket {
    fn from(record: &TicketRecord) -> Self {
        Self {
            name: record.name.clone(),
            email: record.email.clone(),
            order_id: record.order_id.clone(),
            financial_status: record.financial_status.clone(),
            price: record.price.clone(),
            event_type: record.event_type.clone(),
            category: record.category,
        }
    }
}

/// Everything the results view shows about one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    pub total_tickets: usize,
    pub refunded_count: usize,
    /// One entry per category, in category order, empty ones included.
    pub categories: Vec<CategoryStats>,
    pub refunded: Vec<RefundedTicket>,
    /// File names the export would produce.
    pub downloads: Vec<String>,
}

impl ResultSummary {
    pub fn from_result(result: &CategorizedResult) -> Self {
        let categories = result
            .iter()
            .map(|(category, records)| CategoryStats {
                category,
                count: records.len(),
                refunded: records.iter().filter(|r| r.is_refunded).count(),
            })
            .collect();

        let refunded: Vec<RefundedTicket> = result.refunded().map(RefundedTicket::from).collect();

        Self {
            total_tickets: result.len(),
            refunded_count: refunded.len(),
            categories,
            refunded,
            downloads: planned_targets(result, true)
                .iter()
                .map(|t| t.file_name())
                .collect(),
        }
    }
}

impl fmt::Display for ResultSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Results: {} tickets", self.total_tickets)?;
        for stats in &self.categories {
            write!(f, "   {:<10} {:>5} attendees", stats.category.as_str(), stats.count)?;
            if stats.refunded > 0 {
                write!(f, "  ({} refunded)", stats.refunded)?;
            }
            writeln!(f)?;
        }

        if self.refunded.is_empty() {
            return Ok(());
        }

        writeln!(f)?;
        writeln!(f, "⚠️  Found {} refunded records!", self.refunded_count)?;
        writeln!(
            f,
            "   {:<24} {:<28} {:<14} {:<10} {:<8} {}",
            "Name", "Email", "Order ID", "Status", "Price", "Event Type"
        )?;
        for t in &self.refunded {
            writeln!(
                f,
                "   {:<24} {:<28} {:<14} {:<10} {:<8} {}",
                t.name, t.email, t.order_id, t.financial_status, t.price, t.event_type
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawRow;
    use crate::transform::pipeline::categorize_rows;

    fn row(name: &str, quantity: &str, code: &str, status: &str) -> RawRow {
        [
            ("Billing Name", name),
            ("Lineitem quantity", quantity),
            ("Discount Code", code),
            ("Financial Status", status),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_summary_counts() {
        let result = categorize_rows(&[
            row("a", "2", "GUE1", "refunded"),
            row("b", "1", "", "paid"),
            row("c", "1", "", "Refund"),
        ]).unwrap();
        let summary = ResultSummary::from_result(&result);

        assert_eq!(summary.total_tickets, 4);
        assert_eq!(summary.refunded_count, 3);
        assert_eq!(summary.categories.len(), 4);
        assert_eq!(summary.categories[0], CategoryStats { category: Category::General, count: 2, refunded: 1 });
        assert_eq!(summary.categories[2], CategoryStats { category: Category::Guest, count: 2, refunded: 2 });
        assert_eq!(summary.categories[3].count, 0);

        // General bucket first, then guest tickets
        let names: Vec<&str> = summary.refunded.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "a"]);
        assert_eq!(
            summary.downloads,
            vec!["general_attendees.csv", "guest_attendees.csv", "all_attendees_merged.csv"]
        );
    }

    #[test]
    fn test_display_mentions_refunds() {
        let result = categorize_rows(&[row("Jane", "1", "VOL", " Refunded ")]).unwrap();
        let text = ResultSummary::from_result(&result).to_string();

        assert!(text.contains("Results: 1 tickets"));
        assert!(text.contains("volunteer"));
        assert!(text.contains("(1 refunded)"));
        assert!(text.contains("Found 1 refunded records!"));
        assert!(text.contains("Jane"));
    }

    #[test]
    fn test_display_without_refunds() {
        let result = categorize_rows(&[row("Jane", "1", "", "paid")]).unwrap();
        let text = ResultSummary::from_result(&result).to_string();
        assert!(!text.contains("refunded records"));
    }
}
