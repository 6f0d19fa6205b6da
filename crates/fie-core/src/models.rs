//! Domain models for fie

use std::collections::BTreeMap;

use chrono::{NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Which way money moved relative to the account holder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Debit,
    Credit,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debit" | "dr" => Ok(Self::Debit),
            "credit" | "cr" => Ok(Self::Credit),
            _ => Err(format!("Unknown direction: {}", s)),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment rail that produced a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    /// Payment-app transfer (UPI)
    Upi,
    /// Inter-bank immediate transfer
    Imps,
    /// Cash deposited at a branch or machine
    Cash,
    /// Internal bank settlement
    Settlement,
    Unknown,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upi => "UPI",
            Self::Imps => "IMPS",
            Self::Cash => "CASH",
            Self::Settlement => "SETTLEMENT",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "UPI" => Ok(Self::Upi),
            "IMPS" => Ok(Self::Imps),
            "CASH" => Ok(Self::Cash),
            "SETTLEMENT" | "INTERNAL" => Ok(Self::Settlement),
            "UNKNOWN" => Ok(Self::Unknown),
            _ => Err(format!("Unknown mode: {}", s)),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whose money a transaction concerns (set by review, not by parsing)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Unknown,
    Personal,
    Family,
    Education,
    Shared,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Personal => "personal",
            Self::Family => "family",
            Self::Education => "education",
            Self::Shared => "shared",
        }
    }
}

impl std::str::FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unknown" => Ok(Self::Unknown),
            "personal" => Ok(Self::Personal),
            "family" => Ok(Self::Family),
            "education" => Ok(Self::Education),
            "shared" => Ok(Self::Shared),
            _ => Err(format!("Unknown scope: {}", s)),
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Audit metadata carried alongside a transaction; never interpreted by parsing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extras {
    /// Running balance printed on the statement row
    #[serde(default)]
    pub balance: Option<Decimal>,
    /// Cheque / reference number closing the row
    #[serde(default)]
    pub chq_id: Option<String>,
    /// Narration after token-merge repair
    #[serde(default)]
    pub raw: String,
    /// Time-of-day found in the narration, if any
    #[serde(default)]
    pub time: Option<NaiveTime>,
    /// Source document the row was reconstructed from
    #[serde(default)]
    pub source_file: String,
    /// Anything added downstream
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

/// A reconstructed bank transaction
///
/// Built once by [`crate::statement::TransactionBuilder`]; review and tagging
/// update `reviewed`, `scope` and `category` later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Content-derived id (see [`Transaction::compute_id`])
    pub id: String,
    pub timestamp: NaiveDateTime,
    /// Always positive; `direction` carries the sign
    pub amount: Decimal,
    pub direction: Direction,
    pub counterparty: String,
    pub mode: Mode,
    #[serde(default)]
    pub reviewed: bool,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default)]
    pub extras: Extras,
}

impl Transaction {
    /// Compute the deduplication id for a transaction's canonical fields.
    ///
    /// The source document is part of the input, so the same row parsed from
    /// two different files gets two ids.
    pub fn compute_id(
        timestamp: &NaiveDateTime,
        amount: Decimal,
        direction: Direction,
        counterparty: &str,
        mode: Mode,
        narration: &str,
        source_file: &str,
    ) -> String {
        let canonical = format!(
            "{}|{}|{}|{}|{}|{}|{}",
            timestamp.format("%Y-%m-%dT%H:%M:%S"),
            amount.normalize(),
            direction,
            counterparty,
            mode,
            narration,
            source_file,
        );
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Signed amount: negative for debits
    pub fn signed_amount(&self) -> Decimal {
        match self.direction {
            Direction::Debit => -self.amount,
            Direction::Credit => self.amount,
        }
    }
}
