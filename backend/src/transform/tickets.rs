//! Expand order lines into individual tickets.
//!
//! ```text
//! Order line (one row)                 →  Tickets
//! ┌──────────────────────────────┐       ┌──────────────────────────┐
//! │ Order 1001, quantity 3, VOL… │  →    │ 1001  1 (1/3)  ticket 1  │
//! └──────────────────────────────┘       │ 1001  1 (2/3)  ticket 2  │
//!                                        │ 1001  1 (3/3)  ticket 3  │
//!                                        └──────────────────────────┘
//! ```
//!
//! Only a quantity of two or more splits. Every other quantity, including
//! zero, negative and unreadable ones, yields exactly one ticket.
//!
//! A run never expands to more than [`MAX_TICKETS`] tickets; larger
//! quantities fail the run instead of exhausting memory.

use crate::error::{PipelineError, PipelineResult};
use crate::models::{columns, Category, RawRow, TicketQuantity, TicketRecord};

use super::classifier::categorize_participant;

/// Financial status written when the export leaves the cell empty.
pub const DEFAULT_FINANCIAL_STATUS: &str = "paid";

/// Upper bound on the tickets one run may produce.
pub const MAX_TICKETS: u64 = 100_000;

/// Statuses that mark an order as refunded, after normalization.
const REFUND_STATUSES: [&str; 2] = ["refund", "refunded"];

/// One order line with everything derived from it, before splitting.
#[derive(Debug, Clone)]
pub struct LineItem {
    name: String,
    email: String,
    order_id: String,
    quantity: i64,
    discount_code: String,
    price: String,
    event_type: String,
    financial_status: String,
    is_refunded: bool,
    category: Category,
}

impl LineItem {
    /// Read an order line. Missing columns read as empty.
    pub fn from_row(row: &RawRow) -> Self {
        let discount_code = row.get(columns::DISCOUNT_CODE).to_string();
        let price = row.get(columns::LINEITEM_PRICE).to_string();
        let status = normalize_financial_status(row.get(columns::FINANCIAL_STATUS));
        let is_refunded = is_refund_status(&status);
        let category = categorize_participant(&discount_code, &price);

        Self {
            name: row.get(columns::BILLING_NAME).to_string(),
            email: row.get(columns::EMAIL).to_string(),
            order_id: row.get(columns::ORDER_ID).to_string(),
            quantity: parse_quantity(row.get(columns::LINEITEM_QUANTITY)),
            discount_code,
            price,
            event_type: row.get(columns::LINEITEM_NAME).to_string(),
            financial_status: if status.is_empty() {
                DEFAULT_FINANCIAL_STATUS.to_string()
            } else {
                status
            },
            is_refunded,
            category,
        }
    }

    /// Number of tickets this line expands to.
    pub fn ticket_count(&self) -> u64 {
        if self.quantity >= 2 {
            self.quantity as u64
        } else {
            1
        }
    }

    /// Expand into tickets, in ticket-number order.
    ///
    /// Fails when the quantity is above [`MAX_TICKETS`] or the tickets
    /// cannot be allocated.
    pub fn into_tickets(self) -> PipelineResult<Vec<TicketRecord>> {
        if self.quantity < 2 {
            let quantity = TicketQuantity::Whole(self.quantity);
            return Ok(vec![self.ticket(quantity)]);
        }

        let total = self.ticket_count();
        if total > MAX_TICKETS {
            return Err(too_many_tickets(&self.order_id, total));
        }

        let mut tickets = Vec::new();
        tickets
            .try_reserve_exact(total as usize)
            .map_err(|e| PipelineError::Processing(format!("order {}: {}", self.order_id, e)))?;
        tickets.extend((1..=total).map(|index| self.ticket(TicketQuantity::Split { index, total })));
        Ok(tickets)
    }

    fn ticket(&self, quantity: TicketQuantity) -> TicketRecord {
        TicketRecord {
            name: self.name.clone(),
            email: self.email.clone(),
            order_id: self.order_id.clone(),
            quantity,
            ticket_number: quantity.ticket_number(),
            discount_code: self.discount_code.clone(),
            event_type: self.event_type.clone(),
            price: self.price.clone(),
            financial_status: self.financial_status.clone(),
            is_refunded: self.is_refunded,
            category: self.category,
        }
    }
}

/// Tickets for one CSV row.
pub fn expand_row(row: &RawRow) -> PipelineResult<Vec<TicketRecord>> {
    LineItem::from_row(row).into_tickets()
}

/// Total tickets `items` expand to, or an error past [`MAX_TICKETS`].
pub fn check_ticket_total(items: &[LineItem]) -> PipelineResult<u64> {
    let mut total: u64 = 0;
    for item in items {
        total = total.saturating_add(item.ticket_count());
        if total > MAX_TICKETS {
            return Err(too_many_tickets(&item.order_id, total));
        }
    }
    Ok(total)
}

fn too_many_tickets(order_id: &str, total: u64) -> PipelineError {
    PipelineError::Processing(format!(
        "order {} brings the ticket count to {}, above the limit of {}",
        order_id, total, MAX_TICKETS
    ))
}

/// Read a quantity cell leniently.
///
/// Leading whitespace and an optional sign are accepted, then the leading
/// digits are used (`"3 tickets"` is 3, `"2.9"` is 2). No leading digits
/// reads as 0.
pub fn parse_quantity(raw: &str) -> i64 {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first().copied() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    let mut seen_digit = false;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        seen_digit = true;
        value = value.saturating_mul(10).saturating_add(i64::from(b - b'0'));
    }

    match (seen_digit, negative) {
        (false, _) => 0,
        (true, true) => -value,
        (true, false) => value,
    }
}

/// Lower-case and trim a financial status cell.
pub fn normalize_financial_status(raw: &str) -> String {
    raw.to_lowercase().trim().to_string()
}

/// Whether a normalized status means the order was refunded.
pub fn is_refund_status(normalized: &str) -> bool {
    REFUND_STATUSES.contains(&normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_row(quantity: &str, code: &str, status: &str) -> RawRow {
        [
            ("Billing Name", "Jane Doe"),
            ("Email", "j@x.com"),
            ("Order ID", "1001"),
            ("Lineitem quantity", quantity),
            ("Discount Code", code),
            ("Lineitem price", "50"),
            ("Lineitem name", "Workshop"),
            ("Financial Status", status),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_split_order() {
        let tickets = expand_row(&order_row("3", "VOL2024", "paid")).unwrap();

        assert_eq!(tickets.len(), 3);
        let labels: Vec<String> = tickets.iter().map(|t| t.quantity.to_string()).collect();
        assert_eq!(labels, vec!["1 (1/3)", "1 (2/3)", "1 (3/3)"]);
        let numbers: Vec<Option<u64>> = tickets.iter().map(|t| t.ticket_number).collect();
        assert_eq!(numbers, vec![Some(1), Some(2), Some(3)]);

        for t in &tickets {
            assert_eq!(t.category, Category::Volunteer);
            assert!(!t.is_refunded);
            assert_eq!(t.name, "Jane Doe");
            assert_eq!(t.order_id, "1001");
            assert_eq!(t.discount_code, "VOL2024");
            assert_eq!(t.event_type, "Workshop");
        }
    }

    #[test]
    fn test_single_refunded_ticket() {
        let tickets = expand_row(&order_row("1", "VOL2024", "Refunded")).unwrap();

        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].quantity, TicketQuantity::Whole(1));
        assert_eq!(tickets[0].ticket_number, None);
        assert!(tickets[0].is_refunded);
        assert_eq!(tickets[0].financial_status, "refunded");
    }

    #[test]
    fn test_split_tickets_are_each_refunded() {
        let tickets = expand_row(&order_row("2", "", "refund")).unwrap();
        assert_eq!(tickets.len(), 2);
        assert!(tickets.iter().all(|t| t.is_refunded));
    }

    #[test]
    fn test_small_or_bad_quantities_yield_one_ticket() {
        for (raw, parsed) in [("0", 0), ("", 0), ("abc", 0), ("-4", -4), ("1", 1), ("1.9", 1)] {
            let tickets = expand_row(&order_row(raw, "", "paid")).unwrap();
            assert_eq!(tickets.len(), 1, "quantity {:?}", raw);
            assert_eq!(tickets[0].quantity, TicketQuantity::Whole(parsed));
            assert_eq!(tickets[0].ticket_number_text(), "");
        }
    }

    #[test]
    fn test_missing_columns_degrade_to_empty() {
        let tickets = expand_row(&RawRow::new()).unwrap();

        assert_eq!(tickets.len(), 1);
        let t = &tickets[0];
        assert_eq!(t.name, "");
        assert_eq!(t.order_id, "");
        assert_eq!(t.quantity.to_string(), "0");
        assert_eq!(t.financial_status, "paid");
        assert!(!t.is_refunded);
        assert_eq!(t.category, Category::General);
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("3"), 3);
        assert_eq!(parse_quantity(" 12 "), 12);
        assert_eq!(parse_quantity("2.9"), 2);
        assert_eq!(parse_quantity("3 tickets"), 3);
        assert_eq!(parse_quantity("+5"), 5);
        assert_eq!(parse_quantity("-2"), -2);
        assert_eq!(parse_quantity("-"), 0);
        assert_eq!(parse_quantity("x3"), 0);
        assert_eq!(parse_quantity(""), 0);
    }

    #[test]
    fn test_refund_normalization() {
        assert!(is_refund_status(&normalize_financial_status(" Refunded ")));
        assert!(is_refund_status(&normalize_financial_status("REFUND")));
        assert!(!is_refund_status(&normalize_financial_status("partially refunded")));
        assert!(!is_refund_status(&normalize_financial_status("")));
    }

    #[test]
    fn test_huge_quantity_fails_without_allocating() {
        let err = expand_row(&order_row("100000000000", "", "paid")).unwrap_err();
        assert!(matches!(err, PipelineError::Processing(_)));
        assert!(err.to_string().contains("above the limit"));

        let tickets = expand_row(&order_row(&MAX_TICKETS.to_string(), "", "paid")).unwrap();
        assert_eq!(tickets.len() as u64, MAX_TICKETS);
    }

    #[test]
    fn test_ticket_total_across_rows() {
        let items: Vec<LineItem> = ["3", "0", "2"]
            .iter()
            .map(|q| LineItem::from_row(&order_row(q, "", "paid")))
            .collect();
        assert_eq!(check_ticket_total(&items).unwrap(), 6);

        let half = (MAX_TICKETS / 2 + 1).to_string();
        let items = vec![
            LineItem::from_row(&order_row(&half, "", "paid")),
            LineItem::from_row(&order_row(&half, "", "paid")),
        ];
        assert!(matches!(check_ticket_total(&items), Err(PipelineError::Processing(_))));
    }

    #[test]
    fn test_line_item_ticket_count() {
        assert_eq!(LineItem::from_row(&order_row("4", "", "")).ticket_count(), 4);
        assert_eq!(LineItem::from_row(&order_row("0", "", "")).ticket_count(), 1);
    }
}
