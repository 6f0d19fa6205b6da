//! Statement command implementations (parse, ingest)

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use fie_core::{
    parse_statement, FragmentDump, JsonStore, ParseOutcome, ParseReport, StatementLayout,
    TransactionStore,
};
use serde_json::json;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Load and parse one dump file
pub fn parse_dump(layout: &StatementLayout, path: &Path) -> Result<ParseOutcome> {
    let dump = FragmentDump::from_path(path)
        .with_context(|| format!("Failed to read fragment dump: {}", path.display()))?;
    parse_statement(layout, &dump).with_context(|| format!("Failed to parse {}", path.display()))
}

fn print_report(report: &ParseReport) {
    println!("   📄 {}", report.source);
    println!(
        "      {} groups, {} skipped, {} failed, {} duplicates",
        report.groups,
        report.skipped,
        report.failures.len(),
        report.duplicates
    );
    for failure in &report.failures {
        println!(
            "      ⚠️  group {} (chq {}): {}",
            failure.index,
            failure.cheque_id.as_deref().unwrap_or("-"),
            failure.error
        );
    }
    if report.discarded_partial > 0 {
        println!("      ⚠️  unterminated last row discarded");
    }
    match report.reconciliation_delta() {
        Some(delta) if delta.is_zero() => println!("      ✅ balances reconcile"),
        Some(delta) => println!("      ⚠️  balances off by {}", delta),
        None => {}
    }
}

/// Parse dumps and print transactions plus a report as JSON on stdout
pub fn cmd_parse(layout: &StatementLayout, files: &[PathBuf]) -> Result<()> {
    let mut documents = Vec::with_capacity(files.len());
    for file in files {
        let outcome = parse_dump(layout, file)?;
        documents.push(json!({
            "source": outcome.report.source,
            "transactions": outcome.transactions,
            "report": outcome.report,
        }));
    }

    let output = if documents.len() == 1 {
        documents.remove(0)
    } else {
        serde_json::Value::Array(documents)
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Dump files named by an ingest path, in name order
pub fn collect_dump_paths(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(path)
        .with_context(|| format!("Failed to read directory: {}", path.display()))?
    {
        let entry_path = entry?.path();
        let is_json = entry_path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if entry_path.is_file() && is_json {
            paths.push(entry_path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Totals for one ingest run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    pub documents: usize,
    pub failed_documents: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub skipped: usize,
    pub failed_groups: usize,
}

/// Parse every dump concurrently and add the results to the store.
///
/// A document that cannot be read is reported and does not stop the others.
pub async fn ingest(
    store: &JsonStore,
    layout: StatementLayout,
    path: &Path,
) -> Result<IngestSummary> {
    let paths = collect_dump_paths(path)?;
    let layout = Arc::new(layout);

    let mut tasks = JoinSet::new();
    for dump_path in paths {
        let layout = Arc::clone(&layout);
        tasks.spawn_blocking(move || {
            let outcome = parse_dump(&layout, &dump_path);
            (dump_path, outcome)
        });
    }

    let mut summary = IngestSummary::default();
    while let Some(joined) = tasks.join_next().await {
        let (dump_path, outcome) = joined.context("Parse task panicked")?;
        summary.documents += 1;

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(path = %dump_path.display(), error = %e, "Skipping unreadable dump");
                println!("   ❌ {}: {:#}", dump_path.display(), e);
                summary.failed_documents += 1;
                continue;
            }
        };

        // Ids are content-derived, so completion order does not matter
        let added = store.add(&outcome.transactions)?;
        print_report(&outcome.report);
        println!(
            "      {} new, {} already stored",
            added.inserted, added.duplicates
        );

        summary.inserted += added.inserted;
        summary.duplicates += added.duplicates;
        summary.skipped += outcome.report.skipped;
        summary.failed_groups += outcome.report.failures.len();
    }

    info!(
        documents = summary.documents,
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        "Ingest complete"
    );
    Ok(summary)
}

pub async fn cmd_ingest(store: &JsonStore, layout: StatementLayout, path: &Path) -> Result<()> {
    println!("📥 Ingesting statements from {}...", path.display());

    let summary = ingest(store, layout, path).await?;

    if summary.documents == 0 {
        println!("No fragment dumps found.");
        return Ok(());
    }

    println!();
    println!("✅ Ingest complete!");
    println!("   Documents: {}", summary.documents);
    println!("   New transactions: {}", summary.inserted);
    println!("   Already stored: {}", summary.duplicates);
    println!("   Skipped rows: {}", summary.skipped);
    if summary.failed_groups > 0 {
        println!("   Failed rows: {}", summary.failed_groups);
    }
    if summary.failed_documents > 0 {
        println!("   ⚠️  Unreadable documents: {}", summary.failed_documents);
    }

    Ok(())
}
