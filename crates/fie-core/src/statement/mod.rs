//! Statement parsing pipeline
//!
//! One pass over a document's fragments, page by page:
//!
//! 1. order each page and classify every fragment into a column
//! 2. drop headers, footers and balance rows ([`TableBoundary`])
//! 3. cut the stream into per-row groups ([`Segmenter`])
//! 4. lift raw fields from each group ([`build_fields`])
//! 5. assemble transactions ([`TransactionBuilder`])
//!
//! Row-level problems never fail the document; they are counted in the
//! [`ParseReport`].

pub mod assemble;
pub mod boundary;
pub mod fields;
pub mod narration;
pub mod rails;
pub mod segment;

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

pub use assemble::{AssemblyError, TransactionBuilder};
pub use boundary::{TableBoundary, TableState};
pub use fields::{build_fields, RawFields};
pub use narration::Narration;
pub use rails::ProtocolMatch;
pub use segment::{FragmentGroup, RowProgress, SegmentState, Segmenter};

use crate::error::Result;
use crate::fragment::{token_stream, Fragment, FragmentSource, Token};
use crate::layout::StatementLayout;
use crate::models::{Direction, Transaction};

/// A group that had a date and an amount but could not be assembled
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupFailure {
    /// Position of the group in the document (0-based)
    pub index: usize,
    pub cheque_id: Option<String>,
    pub error: String,
}

/// What happened while parsing one document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseReport {
    pub source: String,
    pub pages: usize,
    /// Groups closed by a cheque id
    pub groups: usize,
    /// Groups without a date or any amount
    pub skipped: usize,
    /// Transactions dropped because an earlier one had the same id
    pub duplicates: usize,
    /// Unterminated group at end of stream (0 or 1)
    pub discarded_partial: usize,
    pub failures: Vec<GroupFailure>,
    pub opening_balance: Option<Decimal>,
    pub closing_balance: Option<Decimal>,
    /// Sum of credited amounts
    pub credits: Decimal,
    /// Sum of debited amounts
    pub debits: Decimal,
}

impl ParseReport {
    /// `opening + credits - debits - closing`, when both balances were printed.
    /// Zero means the statement reconciles.
    pub fn reconciliation_delta(&self) -> Option<Decimal> {
        let opening = self.opening_balance?;
        let closing = self.closing_balance?;
        Some(opening + self.credits - self.debits - closing)
    }

    pub fn reconciles(&self) -> Option<bool> {
        self.reconciliation_delta().map(|d| d.is_zero())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    /// In document order, unique by id
    pub transactions: Vec<Transaction>,
    pub report: ParseReport,
}

/// Parses documents laid out according to one [`StatementLayout`]
pub struct StatementParser<'a> {
    layout: &'a StatementLayout,
}

impl<'a> StatementParser<'a> {
    pub fn new(layout: &'a StatementLayout) -> Self {
        Self { layout }
    }

    /// Parse a document read through a [`FragmentSource`]
    pub fn parse_source<S: FragmentSource + ?Sized>(&self, source: &S) -> Result<ParseOutcome> {
        let pages = source.pages()?;
        Ok(self.parse(source.source_id(), pages))
    }

    /// Parse pages of fragments. Pages must be in document order; fragments
    /// within a page may come in any order.
    pub fn parse(&self, source: &str, pages: Vec<Vec<Fragment>>) -> ParseOutcome {
        let markers = &self.layout.markers;
        let mut boundary = TableBoundary::new(markers);
        let mut segmenter = Segmenter::new(markers.cheque.clone());
        let mut run = Run::new(source, &markers.cheque);
        run.report.pages = pages.len();

        for fragment in token_stream(pages) {
            let column = self.layout.classify(&fragment);
            let progress = segmenter.progress();
            if !boundary.admit(&fragment, column, progress) {
                // A dated balance row: its date already opened a row
                if progress == RowProgress::DateOnly && boundary.state() != TableState::Ready {
                    segmenter.abandon();
                }
                continue;
            }
            if let Some(group) = segmenter.push(Token { fragment, column }) {
                run.finish_group(&group);
            }
        }

        if let Some(partial) = segmenter.into_partial() {
            debug!(
                tokens = partial.len(),
                "Discarding unterminated group at end of document"
            );
            run.report.discarded_partial += 1;
        }

        run.report.opening_balance = boundary.opening_balance();
        run.report.closing_balance = boundary.closing_balance();
        run.finish()
    }
}

/// Per-document accumulation
struct Run<'a> {
    source: &'a str,
    cheque_marker: &'a str,
    seen: HashSet<String>,
    transactions: Vec<Transaction>,
    report: ParseReport,
}

impl<'a> Run<'a> {
    fn new(source: &'a str, cheque_marker: &'a str) -> Self {
        Self {
            source,
            cheque_marker,
            seen: HashSet::new(),
            transactions: Vec::new(),
            report: ParseReport {
                source: source.to_string(),
                ..ParseReport::default()
            },
        }
    }

    fn finish_group(&mut self, group: &FragmentGroup) {
        let index = self.report.groups;
        self.report.groups += 1;

        let Some(fields) = build_fields(group, self.cheque_marker) else {
            self.report.skipped += 1;
            return;
        };
        let cheque_id = fields.cheque_id.clone();

        let tx = match TransactionBuilder::new(fields, self.source).build() {
            Ok(tx) => tx,
            Err(e) => {
                debug!(index, cheque_id = ?cheque_id, error = %e, "Group failed assembly");
                self.report.failures.push(GroupFailure {
                    index,
                    cheque_id,
                    error: e.to_string(),
                });
                return;
            }
        };

        if !self.seen.insert(tx.id.clone()) {
            debug!(id = %tx.id, "Dropping duplicate transaction");
            self.report.duplicates += 1;
            return;
        }

        match tx.direction {
            Direction::Credit => self.report.credits += tx.amount,
            Direction::Debit => self.report.debits += tx.amount,
        }
        self.transactions.push(tx);
    }

    fn finish(self) -> ParseOutcome {
        let report = self.report;

        if let Some(delta) = report.reconciliation_delta() {
            if !delta.is_zero() {
                warn!(
                    source = %report.source,
                    opening = %report.opening_balance.unwrap_or_default(),
                    closing = %report.closing_balance.unwrap_or_default(),
                    delta = %delta,
                    "Statement does not reconcile"
                );
            }
        }

        info!(
            source = %report.source,
            pages = report.pages,
            transactions = self.transactions.len(),
            skipped = report.skipped,
            failures = report.failures.len(),
            duplicates = report.duplicates,
            "Parsed statement"
        );

        ParseOutcome {
            transactions: self.transactions,
            report,
        }
    }
}
