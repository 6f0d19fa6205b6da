//! Transaction assembly from raw row fields

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use thiserror::Error;

use super::fields::RawFields;
use super::narration::Narration;
use super::rails;
use crate::models::{Extras, Scope, Transaction};

/// Why one row could not become a transaction. Never fatal to the document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid date: {0}")]
    InvalidDate(String),
}

const DATE_FORMAT: &str = "%d-%m-%Y";

/// Builds a [`Transaction`] from one row's fields
pub struct TransactionBuilder<'a> {
    fields: RawFields,
    source: &'a str,
}

impl<'a> TransactionBuilder<'a> {
    pub fn new(fields: RawFields, source: &'a str) -> Self {
        Self { fields, source }
    }

    pub fn build(self) -> Result<Transaction, AssemblyError> {
        let fields = self.fields;

        let date_text = fields
            .date
            .as_deref()
            .ok_or_else(|| AssemblyError::InvalidDate("missing".to_string()))?;
        let date = NaiveDate::parse_from_str(date_text, DATE_FORMAT)
            .map_err(|_| AssemblyError::InvalidDate(date_text.to_string()))?;

        let amount = fields
            .amount()
            .ok_or_else(|| AssemblyError::InvalidAmount("missing".to_string()))?;
        if amount <= Decimal::ZERO {
            return Err(AssemblyError::NonPositiveAmount(amount));
        }

        let narration = Narration::new(&fields.particulars);
        let time = narration.time_of_day();
        let timestamp = NaiveDateTime::new(date, time.unwrap_or(NaiveTime::MIN));

        let protocol = rails::classify(&narration);
        let counterparty = rails::counterparty(&protocol);
        // The amount column is authoritative; the rail marker only fills in
        let direction = fields.direction().unwrap_or(protocol.direction);

        let id = Transaction::compute_id(
            &timestamp,
            amount,
            direction,
            &counterparty,
            protocol.mode,
            &narration.display,
            self.source,
        );

        Ok(Transaction {
            id,
            timestamp,
            amount,
            direction,
            counterparty,
            mode: protocol.mode,
            reviewed: false,
            scope: Scope::Unknown,
            category: Vec::new(),
            extras: Extras {
                balance: fields.balance,
                chq_id: fields.cheque_id,
                raw: narration.canonical,
                time,
                source_file: self.source.to_string(),
                ..Extras::default()
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, Mode};

    fn fields(date: &str, particulars: &str) -> RawFields {
        RawFields {
            date: Some(date.to_string()),
            particulars: particulars.to_string(),
            ..RawFields::default()
        }
    }

    #[test]
    fn test_build_upi_debit() {
        let mut f = fields("05-06-2024", "UPI / DR / RAVI KUMAR 3456789012");
        f.withdrawal = Some(Decimal::new(15000, 2));
        f.balance = Some(Decimal::new(985000, 2));
        f.cheque_id = Some("3456789012".to_string());

        let tx = TransactionBuilder::new(f, "june.pdf").build().unwrap();
        assert_eq!(tx.amount, Decimal::new(15000, 2));
        assert_eq!(tx.direction, Direction::Debit);
        assert_eq!(tx.mode, Mode::Upi);
        assert_eq!(tx.counterparty, "RAVI KUMAR");
        assert_eq!(tx.timestamp.to_string(), "2024-06-05 00:00:00");
        assert!(!tx.reviewed);
        assert_eq!(tx.scope, Scope::Unknown);
        assert!(tx.category.is_empty());
        assert_eq!(tx.extras.balance, Some(Decimal::new(985000, 2)));
        assert_eq!(tx.extras.chq_id.as_deref(), Some("3456789012"));
        assert_eq!(tx.extras.raw, "UPI / DR / RAVIKUMAR 3456789012");
        assert_eq!(tx.extras.source_file, "june.pdf");
        assert_eq!(tx.extras.time, None);
    }

    #[test]
    fn test_amount_column_overrides_rail_direction() {
        // A reversal printed as UPI/DR but credited back
        let mut f = fields("05-06-2024", "UPI/DR/MEERA");
        f.deposit = Some(Decimal::new(500, 0));
        let tx = TransactionBuilder::new(f, "s").build().unwrap();
        assert_eq!(tx.direction, Direction::Credit);
    }

    #[test]
    fn test_time_from_narration() {
        let mut f = fields("05-06-2024", "UPI/CR/412345678901/ASHA/SBIN 14:32:05");
        f.deposit = Some(Decimal::new(100, 0));
        let tx = TransactionBuilder::new(f, "s").build().unwrap();
        assert_eq!(tx.timestamp.to_string(), "2024-06-05 14:32:05");
        assert_eq!(tx.extras.time, NaiveTime::from_hms_opt(14, 32, 5));
    }

    #[test]
    fn test_unrecognised_rail_still_builds() {
        let mut f = fields("07-06-2024", "NEFT ACME");
        f.deposit = Some(Decimal::new(1200, 0));
        f.cheque_id = Some("778899".to_string());

        let tx = TransactionBuilder::new(f, "s").build().unwrap();
        assert_eq!(tx.mode, Mode::Unknown);
        // Direction comes from the deposit column, not the debit fallback
        assert_eq!(tx.direction, Direction::Credit);
        assert_eq!(tx.counterparty, "UNKNOWN");
        assert_eq!(tx.id.len(), 64);
        assert_eq!(tx.extras.raw, "NEFTACME");
    }

    #[test]
    fn test_zero_amount_rejected() {
        let mut f = fields("05-06-2024", "CASH DEPOSIT SELF");
        f.deposit = Some(Decimal::ZERO);
        let err = TransactionBuilder::new(f, "s").build().unwrap_err();
        assert_eq!(err, AssemblyError::NonPositiveAmount(Decimal::ZERO));
    }

    #[test]
    fn test_impossible_date_rejected() {
        let mut f = fields("31-02-2024", "CASH DEPOSIT SELF");
        f.deposit = Some(Decimal::new(1, 0));
        let err = TransactionBuilder::new(f, "s").build().unwrap_err();
        assert_eq!(err, AssemblyError::InvalidDate("31-02-2024".to_string()));
    }

    #[test]
    fn test_missing_amount_rejected() {
        let f = fields("05-06-2024", "CASH DEPOSIT SELF");
        let err = TransactionBuilder::new(f, "s").build().unwrap_err();
        assert!(matches!(err, AssemblyError::InvalidAmount(_)));
    }

    #[test]
    fn test_source_changes_id() {
        let mut f = fields("05-06-2024", "CASH DEPOSIT SELF");
        f.deposit = Some(Decimal::new(2000, 0));
        let a = TransactionBuilder::new(f.clone(), "a.pdf").build().unwrap();
        let b = TransactionBuilder::new(f, "b.pdf").build().unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.counterparty, "SELF");
        assert_eq!(a.direction, Direction::Credit);
    }
}
