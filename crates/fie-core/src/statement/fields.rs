//! Reduce a fragment group to raw transaction fields

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;
use tracing::debug;

use super::segment::FragmentGroup;
use crate::layout::Column;
use crate::models::Direction;

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{2}-\d{2}-\d{4}$").expect("valid regex"))
}

fn amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\d,]+\.\d{2}$").expect("valid regex"))
}

/// `DD-MM-YYYY` as printed in the date column
pub fn is_date(text: &str) -> bool {
    date_re().is_match(text)
}

/// Statement amount such as `1,500.00`
pub fn is_amount(text: &str) -> bool {
    amount_re().is_match(text)
}

/// Parse a statement amount, dropping thousands separators
pub fn parse_amount(text: &str) -> Option<Decimal> {
    if !is_amount(text) {
        return None;
    }
    Decimal::from_str(&text.replace(',', "")).ok()
}

/// All-digit token of 6 to 20 characters
pub fn is_cheque_id(text: &str) -> bool {
    (6..=20).contains(&text.len()) && text.chars().all(|c| c.is_ascii_digit())
}

/// Fields lifted from one row's fragments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFields {
    pub date: Option<String>,
    pub deposit: Option<Decimal>,
    pub withdrawal: Option<Decimal>,
    pub balance: Option<Decimal>,
    pub cheque_id: Option<String>,
    /// Particulars-column text joined in document order
    pub particulars: String,
}

impl RawFields {
    /// Direction implied by which amount column was filled
    ///
    /// A row with both amounts is read as a credit.
    pub fn direction(&self) -> Option<Direction> {
        if self.deposit.is_some() {
            Some(Direction::Credit)
        } else if self.withdrawal.is_some() {
            Some(Direction::Debit)
        } else {
            None
        }
    }

    pub fn amount(&self) -> Option<Decimal> {
        self.deposit.or(self.withdrawal)
    }

    /// A row needs a date and some money to be a transaction
    pub fn is_complete(&self) -> bool {
        self.date.is_some() && self.amount().is_some()
    }
}

/// Collect raw fields from a group without judging completeness
pub fn collect_fields(group: &FragmentGroup, cheque_marker: &str) -> RawFields {
    let mut fields = RawFields::default();
    let mut parts: Vec<&str> = Vec::new();

    for token in &group.tokens {
        let text = token.text();

        if token.column == Column::Date && fields.date.is_none() && is_date(text) {
            fields.date = Some(text.to_string());
        }

        let slot = match token.column {
            Column::Deposit => Some(&mut fields.deposit),
            Column::Withdrawal => Some(&mut fields.withdrawal),
            Column::Balance => Some(&mut fields.balance),
            _ => None,
        };
        if let Some(slot) = slot {
            if slot.is_none() {
                *slot = parse_amount(text);
            }
        }

        if fields.cheque_id.is_none() && is_cheque_id(text) {
            fields.cheque_id = Some(text.to_string());
        }

        if token.column == Column::Particulars && text != cheque_marker {
            parts.push(text);
        }
    }

    fields.particulars = parts.join(" ");
    fields
}

/// Build raw fields, or `None` for rows without a date or any amount
pub fn build_fields(group: &FragmentGroup, cheque_marker: &str) -> Option<RawFields> {
    let fields = collect_fields(group, cheque_marker);
    if !fields.is_complete() {
        debug!(
            date = ?fields.date,
            particulars = %fields.particulars,
            "Skipping fragment group without date or amount"
        );
        return None;
    }
    Some(fields)
}
