//! fie Core Library
//!
//! Reconstructs bank transactions from the positioned text of PDF account
//! statements:
//! - Column classification from configurable layouts
//! - Table boundary detection (headers, footers, balance rows)
//! - Row segmentation on the cheque-id marker
//! - Narration repair and payment-rail classification
//! - Content-derived transaction ids for idempotent ingestion
//! - JSON transaction store

pub mod error;
pub mod fragment;
pub mod layout;
pub mod models;
pub mod statement;
pub mod store;

pub use error::{Error, Result};
pub use fragment::{Fragment, FragmentDump, FragmentSource};
pub use layout::{Column, ColumnBand, Markers, StatementLayout};
pub use models::{Direction, Extras, Mode, Scope, Transaction};
pub use statement::{AssemblyError, GroupFailure, ParseOutcome, ParseReport, StatementParser};
pub use store::{AddResult, JsonStore, TransactionStore};

/// Parse one document with the given layout
pub fn parse_statement<S: FragmentSource + ?Sized>(
    layout: &StatementLayout,
    source: &S,
) -> Result<ParseOutcome> {
    StatementParser::new(layout).parse_source(source)
}
