//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (open_store, load_layout)
//! - `ingest` - Statement commands (parse, ingest)
//! - `transactions` - Transaction commands (list)

pub mod core;
pub mod ingest;
pub mod transactions;

// Re-export command functions for main.rs
pub use core::*;
pub use ingest::*;
pub use transactions::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
