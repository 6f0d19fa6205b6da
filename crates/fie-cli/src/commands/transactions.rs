//! Transaction command implementations

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use fie_core::{Direction, JsonStore, Mode, Scope, Transaction, TransactionStore};
use rust_decimal::Decimal;

use super::truncate;
use crate::cli::SortKey;

/// Filters for `fie list`; every set field must match
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ListFilter {
    pub direction: Option<Direction>,
    pub mode: Option<Mode>,
    pub scope: Option<Scope>,
    pub since: Option<NaiveDate>,
}

impl ListFilter {
    pub fn parse(
        direction: Option<&str>,
        mode: Option<&str>,
        scope: Option<&str>,
        since: Option<&str>,
    ) -> Result<Self> {
        Ok(Self {
            direction: direction
                .map(str::parse::<Direction>)
                .transpose()
                .map_err(|e| anyhow!("{}", e))?,
            mode: mode
                .map(str::parse::<Mode>)
                .transpose()
                .map_err(|e| anyhow!("{}", e))?,
            scope: scope
                .map(str::parse::<Scope>)
                .transpose()
                .map_err(|e| anyhow!("{}", e))?,
            since: since
                .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
                .transpose()
                .map_err(|e| anyhow!("Invalid --since date (expected YYYY-MM-DD): {}", e))?,
        })
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        self.direction.map_or(true, |d| tx.direction == d)
            && self.mode.map_or(true, |m| tx.mode == m)
            && self.scope.map_or(true, |s| tx.scope == s)
            && self.since.map_or(true, |d| tx.timestamp.date() >= d)
    }
}

/// Apply the filter, then sort (date ascending, largest amount first, or by name)
pub fn filter_and_sort(
    transactions: Vec<Transaction>,
    filter: &ListFilter,
    sort: SortKey,
) -> Vec<Transaction> {
    let mut selected: Vec<Transaction> =
        transactions.into_iter().filter(|t| filter.matches(t)).collect();

    match sort {
        SortKey::Date => selected.sort_by(|a, b| a.timestamp.cmp(&b.timestamp)),
        SortKey::Amount => selected.sort_by(|a, b| b.amount.cmp(&a.amount)),
        SortKey::Counterparty => selected.sort_by(|a, b| {
            a.counterparty
                .cmp(&b.counterparty)
                .then(a.timestamp.cmp(&b.timestamp))
        }),
    }
    selected
}

pub fn cmd_list(
    store: &JsonStore,
    filter: &ListFilter,
    sort: SortKey,
    limit: Option<usize>,
) -> Result<()> {
    let all = store.list_all()?;
    if all.is_empty() {
        println!("No transactions found. Ingest some with:");
        println!("  fie ingest statement.json");
        return Ok(());
    }

    let mut transactions = filter_and_sort(all, filter, sort);
    let matched = transactions.len();
    if let Some(limit) = limit {
        transactions.truncate(limit);
    }

    println!();
    println!("📝 Transactions ({} matching)", matched);
    println!("   ─────────────────────────────────────────────────────────────");

    let mut net = Decimal::ZERO;
    for tx in &transactions {
        let amount_str = match tx.direction {
            Direction::Debit => format!("\x1b[31m-{}\x1b[0m", tx.amount), // Red for debits
            Direction::Credit => format!("\x1b[32m+{}\x1b[0m", tx.amount), // Green for credits
        };
        net += tx.signed_amount();

        println!(
            "   {} │ {:>20} │ {:<10} │ {}",
            tx.timestamp.format("%Y-%m-%d %H:%M"),
            amount_str,
            tx.mode.as_str(),
            truncate(&tx.counterparty, 30)
        );
    }

    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Net: {}", net);

    Ok(())
}
