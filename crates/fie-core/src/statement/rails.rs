//! Payment-rail classification and counterparty extraction
//!
//! Each rail writes its narration in a fixed grammar, e.g.
//!
//! ```text
//! UPI/DR/412345678901/RAVI KUMAR/SBIN/ravi@okaxis   name at part 3
//! UPI/DR/RAVI KUMAR                                 name at part 2
//! IMPS/CR/ASHA TRADERS/HDFC                         name at part 2
//! CASH DEPOSIT SELF                                 name at part 1
//! NEFT SETTLEMENT/20240605                          name at part 0
//! ```
//!
//! The rules table is ordered most specific first. Positions are the bank's
//! format contract and stay explicit per rail.

use std::sync::OnceLock;

use regex::Regex;

use super::narration::Narration;
use crate::models::{Direction, Mode};

/// Where a rail's protocol segment begins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegmentStart {
    /// At the matched rail keyword
    Match,
    /// At the start of the narration
    NarrationStart,
}

struct RailRule {
    pattern: Regex,
    mode: Mode,
    direction: Direction,
    start: SegmentStart,
}

fn rule(pattern: &str, mode: Mode, direction: Direction, start: SegmentStart) -> RailRule {
    RailRule {
        pattern: Regex::new(pattern).expect("valid regex"),
        mode,
        direction,
        start,
    }
}

fn rules() -> &'static [RailRule] {
    static RULES: OnceLock<Vec<RailRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        use Direction::{Credit, Debit};
        use SegmentStart::Match;
        vec![
            rule(r"(?i)UPI\s*/\s*DR\b", Mode::Upi, Debit, Match),
            rule(r"(?i)UPI\s*/\s*CR\b", Mode::Upi, Credit, Match),
            rule(r"(?i)UPI\s*/", Mode::Upi, Debit, Match),
            rule(r"(?i)IMPS\s*[/-]\s*CR\b", Mode::Imps, Credit, Match),
            rule(r"(?i)IMPS\s*[/-]\s*DR\b", Mode::Imps, Debit, Match),
            rule(r"(?i)IMPS", Mode::Imps, Debit, Match),
            rule(r"(?i)CASH\s*DEPOSIT", Mode::Cash, Credit, Match),
            // The payee name precedes the keyword
            rule(
                r"(?i)SETTLEMENT",
                Mode::Settlement,
                Credit,
                SegmentStart::NarrationStart,
            ),
        ]
    })
}

/// Rail recognised in a narration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolMatch {
    pub mode: Mode,
    /// Direction implied by the rail marker; only a fallback
    pub direction: Direction,
    /// Narration text from the segment start to the end
    pub segment: String,
    /// The matched rail keyword, e.g. `CASH DEPOSIT`
    pub keyword: String,
}

impl ProtocolMatch {
    fn unknown(narration: &str) -> Self {
        Self {
            mode: Mode::Unknown,
            direction: Direction::Debit,
            segment: narration.to_string(),
            keyword: String::new(),
        }
    }
}

fn match_rules(text: &str) -> Option<ProtocolMatch> {
    rules().iter().find_map(|rule| {
        let m = rule.pattern.find(text)?;
        let segment = match rule.start {
            SegmentStart::Match => &text[m.start()..],
            SegmentStart::NarrationStart => text,
        };
        Some(ProtocolMatch {
            mode: rule.mode,
            direction: rule.direction,
            segment: segment.to_string(),
            keyword: m.as_str().to_string(),
        })
    })
}

/// Classify a narration. The display form is tried first; the repaired form
/// catches rail keywords that extraction split across fragments.
pub fn classify(narration: &Narration) -> ProtocolMatch {
    match_rules(&narration.display)
        .or_else(|| match_rules(&narration.canonical))
        .unwrap_or_else(|| ProtocolMatch::unknown(&narration.display))
}

fn split_parts(text: &str, delimiters: &[char]) -> Vec<String> {
    text.split(|c| delimiters.contains(&c))
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_direction_marker(part: &str) -> bool {
    matches!(part.to_uppercase().as_str(), "CR" | "DR")
}

/// `/` when the text has one; hyphens only separate slash-free narrations
fn hyphen_or_slash(text: &str) -> &'static [char] {
    if text.contains('/') {
        &['/']
    } else {
        &['-']
    }
}

/// Ordered parts of a protocol segment, split on the rail's delimiter
pub fn segment_parts(protocol: &ProtocolMatch) -> Vec<String> {
    match protocol.mode {
        Mode::Upi | Mode::Settlement => split_parts(&protocol.segment, &['/']),
        Mode::Imps => split_parts(&protocol.segment, hyphen_or_slash(&protocol.segment)),
        Mode::Cash => {
            // Keyword is part 0; the rest follows the usual delimiters
            let rest = protocol
                .segment
                .get(protocol.keyword.len()..)
                .unwrap_or_default();
            let mut parts = vec![protocol.keyword.clone()];
            parts.extend(split_parts(rest, hyphen_or_slash(rest)));
            parts
        }
        Mode::Unknown => Vec::new(),
    }
}

/// Strip digits, collapse whitespace, uppercase; empty becomes UNKNOWN
pub fn clean_name(name: &str) -> String {
    let without_digits: String = name.chars().filter(|c| !c.is_numeric()).collect();
    let collapsed = without_digits
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase();
    if collapsed.is_empty() {
        "UNKNOWN".to_string()
    } else {
        collapsed
    }
}

/// Counterparty name at the rail's fixed position
pub fn counterparty(protocol: &ProtocolMatch) -> String {
    let parts = segment_parts(protocol);

    let position = match protocol.mode {
        Mode::Upi if parts.len() >= 4 => Some(3),
        Mode::Upi => Some(2),
        Mode::Imps if parts.get(1).is_some_and(|p| is_direction_marker(p)) => Some(2),
        Mode::Imps => Some(1),
        Mode::Cash => Some(1),
        Mode::Settlement => Some(0),
        Mode::Unknown => None,
    };

    position
        .and_then(|i| parts.get(i))
        .map(|name| clean_name(name))
        .unwrap_or_else(|| "UNKNOWN".to_string())
}
