//! Transaction segmentation state machine
//!
//! Every row of this statement family ends with the cheque marker followed by
//! the row's reference number, so that pair is the only end-of-row signal.
//! A date token is not used: narrations can contain date-like text.
//!
//! ```text
//!            any non-marker               marker
//!   Ready ─────────────────▶ InTransaction ──────▶ AwaitingChequeId
//!     ▲                        │  ▲  other                 │
//!     │                        └──┘                        │ next fragment
//!     └─────────────── emit group (ends with cheque id) ◀──┘
//! ```

use tracing::{debug, trace};

use crate::fragment::Token;
use crate::layout::Column;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentState {
    Ready,
    InTransaction,
    AwaitingChequeId,
}

/// How far the current row has got, as seen by the table boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowProgress {
    /// Between rows
    Idle,
    /// A row is open but holds nothing except its date
    DateOnly,
    /// A row is open and has content beyond the date
    Open,
}

/// Fragments believed to belong to one transaction, in stream order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FragmentGroup {
    pub tokens: Vec<Token>,
}

impl FragmentGroup {
    /// The reference-number fragment that closed the group
    pub fn closing_token(&self) -> Option<&Token> {
        self.tokens.last()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

pub struct Segmenter {
    marker: String,
    state: SegmentState,
    current: Vec<Token>,
}

impl Segmenter {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            state: SegmentState::Ready,
            current: Vec::new(),
        }
    }

    pub fn state(&self) -> SegmentState {
        self.state
    }

    /// True between transactions
    pub fn is_idle(&self) -> bool {
        self.state == SegmentState::Ready
    }

    pub fn progress(&self) -> RowProgress {
        match self.state {
            SegmentState::Ready => RowProgress::Idle,
            SegmentState::InTransaction
                if self.current.iter().all(|t| t.column == Column::Date) =>
            {
                RowProgress::DateOnly
            }
            _ => RowProgress::Open,
        }
    }

    /// Drop the open row; used when it turns out to be a balance row
    pub fn abandon(&mut self) {
        if !self.current.is_empty() {
            debug!(tokens = self.current.len(), "Abandoning open row");
        }
        self.current.clear();
        self.state = SegmentState::Ready;
    }

    /// Feed one token; returns a finished group when this token closed one
    pub fn push(&mut self, token: Token) -> Option<FragmentGroup> {
        let is_marker = token.text() == self.marker;

        match self.state {
            SegmentState::Ready => {
                if is_marker {
                    trace!("Ignoring stray cheque marker between transactions");
                    return None;
                }
                self.current.clear();
                self.current.push(token);
                self.state = SegmentState::InTransaction;
                None
            }
            SegmentState::InTransaction => {
                if is_marker {
                    self.state = SegmentState::AwaitingChequeId;
                } else {
                    self.current.push(token);
                }
                None
            }
            SegmentState::AwaitingChequeId => {
                // A repeated marker still waits for the id
                if is_marker {
                    return None;
                }
                self.current.push(token);
                self.state = SegmentState::Ready;
                Some(FragmentGroup {
                    tokens: std::mem::take(&mut self.current),
                })
            }
        }
    }

    /// End of stream: hand back any unterminated group so it can be counted
    pub fn into_partial(self) -> Option<FragmentGroup> {
        if self.state == SegmentState::Ready || self.current.is_empty() {
            None
        } else {
            Some(FragmentGroup {
                tokens: self.current,
            })
        }
    }
}
