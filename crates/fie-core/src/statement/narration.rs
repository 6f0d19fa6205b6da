//! Narration normalization
//!
//! Text extraction sometimes splits one word into several fragments
//! ("SETT LEMENT"), so besides the display form we keep a repaired form in
//! which runs of purely alphabetic tokens are glued back together. Tokens with
//! digits or punctuation (dates, amounts, references, `/`) keep their spacing.

use std::sync::OnceLock;

use chrono::NaiveTime;
use regex::Regex;

fn time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d{2}:\d{2}:\d{2}\b").expect("valid regex"))
}

/// Both forms of a row's particulars text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Narration {
    /// Uppercased, whitespace collapsed
    pub display: String,
    /// `display` with alphabetic runs merged
    pub canonical: String,
}

impl Narration {
    pub fn new(raw: &str) -> Self {
        let display = display_form(raw);
        let canonical = merge_alpha_tokens(&display);
        Self { display, canonical }
    }

    /// Time-of-day printed in the narration (`HH:MM:SS`), if any
    pub fn time_of_day(&self) -> Option<NaiveTime> {
        time_re()
            .find_iter(&self.display)
            .find_map(|m| NaiveTime::parse_from_str(m.as_str(), "%H:%M:%S").ok())
    }
}

/// Uppercase and collapse every whitespace run to a single space
pub fn display_form(raw: &str) -> String {
    raw.to_uppercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_alpha_token(token: &str) -> bool {
    !token.is_empty() && token.chars().all(char::is_alphabetic)
}

/// Concatenate consecutive purely alphabetic tokens
pub fn merge_alpha_tokens(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut merging = false;

    for token in text.split_whitespace() {
        if is_alpha_token(token) {
            match out.last_mut() {
                Some(last) if merging => last.push_str(token),
                _ => out.push(token.to_string()),
            }
            merging = true;
        } else {
            out.push(token.to_string());
            merging = false;
        }
    }

    out.join(" ")
}
