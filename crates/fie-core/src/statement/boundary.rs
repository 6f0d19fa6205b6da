//! Table boundary detection and noise filtering
//!
//! Statements print the column header on every page and page numbers in the
//! footer. Neither carries any marker that distinguishes it from row data, so
//! both are recognised here by content and dropped before segmentation.
//!
//! The detector also picks up the opening and closing balance rows that
//! bracket the transaction table. Either row may carry a date, which the
//! segmenter will already have taken as the start of a row; the caller drops
//! that row when a balance marker follows a bare date.

use std::collections::HashSet;

use rust_decimal::Decimal;
use tracing::debug;

use super::fields::{is_date, parse_amount};
use super::segment::RowProgress;
use crate::fragment::Fragment;
use crate::layout::{Column, Markers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    /// Before all header captions have been seen
    PreTable,
    /// Inside the transaction table
    Ready,
    /// After the opening marker, waiting for the balance amount
    OpeningBalance,
    /// After the closing marker; nothing else is table content
    PostTable,
}

pub struct TableBoundary {
    captions: Vec<String>,
    page_word: String,
    opening: Option<String>,
    closing: Option<String>,
    state: TableState,
    seen: HashSet<usize>,
    opening_balance: Option<Decimal>,
    closing_balance: Option<Decimal>,
}

fn non_empty(word: &Option<String>) -> Option<String> {
    word.as_ref()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
}

impl TableBoundary {
    pub fn new(markers: &Markers) -> Self {
        Self {
            captions: markers
                .header_captions
                .iter()
                .map(|c| c.to_lowercase())
                .collect(),
            page_word: markers.page.to_lowercase(),
            opening: non_empty(&markers.opening),
            closing: non_empty(&markers.closing),
            state: TableState::PreTable,
            seen: HashSet::new(),
            opening_balance: None,
            closing_balance: None,
        }
    }

    pub fn state(&self) -> TableState {
        self.state
    }

    pub fn opening_balance(&self) -> Option<Decimal> {
        self.opening_balance
    }

    pub fn closing_balance(&self) -> Option<Decimal> {
        self.closing_balance
    }

    fn caption_index(&self, text: &str) -> Option<usize> {
        let lower = text.to_lowercase();
        self.captions.iter().position(|c| *c == lower)
    }

    /// Footer artifacts: the page word, or bare numbers outside the
    /// particulars column (cheque ids live in particulars)
    fn is_pagination(&self, text: &str, column: Column) -> bool {
        if text.to_lowercase() == self.page_word {
            return true;
        }
        column != Column::Particulars
            && !text.is_empty()
            && text.chars().all(|c| c.is_ascii_digit())
    }

    /// Decide whether a fragment is table content.
    ///
    /// `row` is the segmenter's progress on the current row. Balance markers
    /// are only recognised between rows or right after a row's date.
    pub fn admit(&mut self, fragment: &Fragment, column: Column, row: RowProgress) -> bool {
        let text = fragment.text.as_str();

        if self.is_pagination(text, column) {
            return false;
        }

        match self.state {
            TableState::PreTable => {
                if let Some(index) = self.caption_index(text) {
                    self.seen.insert(index);
                    if self.seen.len() == self.captions.len() {
                        debug!(top = fragment.top, "Header row complete, table starts");
                        self.state = TableState::Ready;
                    }
                }
                false
            }
            TableState::Ready => {
                if self.caption_index(text).is_some() {
                    return false;
                }
                if row != RowProgress::Open {
                    let lower = text.to_lowercase();
                    if self.opening.as_deref() == Some(lower.as_str())
                        && self.opening_balance.is_none()
                    {
                        debug!(top = fragment.top, "Opening balance row");
                        self.state = TableState::OpeningBalance;
                        return false;
                    }
                    if self.closing.as_deref() == Some(lower.as_str()) {
                        debug!(top = fragment.top, "Closing balance row, table ends");
                        self.state = TableState::PostTable;
                        return false;
                    }
                }
                true
            }
            TableState::OpeningBalance => {
                if column == Column::Balance {
                    if let Some(amount) = parse_amount(text) {
                        self.opening_balance = Some(amount);
                        self.state = TableState::Ready;
                    }
                    return false;
                }
                // A dated row means the opening row had no balance; give up on it
                if column == Column::Date && is_date(text) {
                    self.state = TableState::Ready;
                    return true;
                }
                false
            }
            TableState::PostTable => {
                if self.closing_balance.is_none() && column == Column::Balance {
                    self.closing_balance = parse_amount(text);
                }
                false
            }
        }
    }
}
