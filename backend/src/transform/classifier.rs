//! Participant classification.
//!
//! A ticket's category is a pure function of the order line's discount code
//! and price. Discount code prefixes win; everything else is `general`.

use crate::models::Category;

/// Discount code prefixes, checked in this order. First match wins.
pub const CODE_PREFIXES: [(&str, Category); 3] = [
    ("VOL", Category::Volunteer),
    ("SPE", Category::Speaker),
    ("GUE", Category::Guest),
];

/// Price bands of an order line.
///
/// Bands are computed for every unmatched line but all of them currently
/// map to [`Category::General`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceTier {
    /// 100 and above (main events).
    Large,
    /// 20 up to 100 (career panels and similar).
    Medium,
    /// Below 20, free, or no readable price.
    Small,
}

impl PriceTier {
    pub fn from_price(price: f64) -> Self {
        if price >= 100.0 {
            Self::Large
        } else if price >= 20.0 {
            Self::Medium
        } else {
            Self::Small
        }
    }

    pub fn category(self) -> Category {
        match self {
            Self::Large => Category::General,
            Self::Medium => Category::General,
            Self::Small => Category::General,
        }
    }
}

/// Category of an order line.
///
/// The code is upper-cased and trimmed before prefix matching, so
/// `" vol123"` is a volunteer. The price is only consulted when no prefix
/// matches.
pub fn categorize_participant(discount_code: &str, price: &str) -> Category {
    if !discount_code.is_empty() {
        let code = discount_code.to_uppercase();
        let code = code.trim();
        for (prefix, category) in CODE_PREFIXES {
            if code.starts_with(prefix) {
                return category;
            }
        }
    }

    PriceTier::from_price(parse_price(price)).category()
}

/// Read a price the lenient way spreadsheet exports need.
///
/// Leading whitespace is skipped and the longest decimal prefix is used,
/// so `"50.00 USD"` is `50.0`. Text without a leading number reads as `0`.
pub fn parse_price(raw: &str) -> f64 {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first().copied(), Some(b'+' | b'-')) {
        end = 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return 0.0;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().unwrap_or(0.0)
}

/// Human-readable classification rules.
pub fn rules_description() -> String {
    let mut out = String::from("Classification rules:\n");
    for (prefix, category) in CODE_PREFIXES {
        out.push_str(&format!(
            "  • {}: discount code starts with \"{}\"\n",
            category.label(),
            prefix
        ));
    }
    out.push_str("  • General: all others\n");
    out.push_str("\nDiscount codes are compared case-insensitively after trimming.\n");
    out
}
