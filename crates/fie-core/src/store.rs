//! Transaction persistence
//!
//! The store is keyed by transaction id; adding a transaction whose id is
//! already present is a no-op, so re-ingesting a statement is safe.
//!
//! `JsonStore` keeps everything in one `{ "transactions": [...] }` document.
//! Writes go to a temp file in the same directory which is then renamed over
//! the original, so a crash never leaves a half-written store.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::models::Transaction;

/// Outcome of adding a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AddResult {
    pub inserted: usize,
    /// Skipped because the id was already stored (or repeated in the batch)
    pub duplicates: usize,
}

/// Storage collaborator for reconstructed transactions
pub trait TransactionStore {
    /// Append transactions whose ids are not stored yet
    fn add(&self, transactions: &[Transaction]) -> Result<AddResult>;

    /// Replace stored transactions by id; returns how many were found
    fn update(&self, transactions: &[Transaction]) -> Result<usize>;

    fn list_all(&self) -> Result<Vec<Transaction>>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    transactions: Vec<Transaction>,
}

/// Single-file JSON store
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    /// Open (creating if needed) the store at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self { path: path.into() };

        if let Some(parent) = store.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        if !store.path.exists() {
            info!(path = %store.path.display(), "Creating transaction store");
            store.write(&StoreFile::default())?;
        }

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// First free `.json.corrupt[.N]` name; earlier backups are never replaced
    fn backup_path(&self) -> PathBuf {
        let first = self.path.with_extension("json.corrupt");
        if !first.exists() {
            return first;
        }
        (1..)
            .map(|n| self.path.with_extension(format!("json.corrupt.{}", n)))
            .find(|p| !p.exists())
            .unwrap_or(first)
    }

    fn read(&self) -> Result<StoreFile> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "Store file missing, recreating");
                let empty = StoreFile::default();
                self.write(&empty)?;
                return Ok(empty);
            }
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_reader(BufReader::new(file)) {
            Ok(data) => Ok(data),
            Err(e) => {
                let backup = self.backup_path();
                warn!(
                    path = %self.path.display(),
                    backup = %backup.display(),
                    error = %e,
                    "Store file is unreadable, resetting to empty"
                );
                fs::rename(&self.path, &backup)?;
                let empty = StoreFile::default();
                self.write(&empty)?;
                Ok(empty)
            }
        }
    }

    fn write(&self, data: &StoreFile) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let tmp = tempfile::NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, data)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .map_err(|e| Error::Store(format!("Failed to replace {}: {}", self.path.display(), e)))?;
        Ok(())
    }
}

impl TransactionStore for JsonStore {
    fn add(&self, transactions: &[Transaction]) -> Result<AddResult> {
        let mut data = self.read()?;
        let mut ids: HashSet<String> = data.transactions.iter().map(|t| t.id.clone()).collect();
        let mut result = AddResult::default();

        for tx in transactions {
            if ids.insert(tx.id.clone()) {
                data.transactions.push(tx.clone());
                result.inserted += 1;
            } else {
                result.duplicates += 1;
            }
        }

        if result.inserted > 0 {
            self.write(&data)?;
        }
        debug!(
            inserted = result.inserted,
            duplicates = result.duplicates,
            "Added transactions to store"
        );
        Ok(result)
    }

    fn update(&self, transactions: &[Transaction]) -> Result<usize> {
        let mut data = self.read()?;
        let updates: HashMap<&str, &Transaction> =
            transactions.iter().map(|t| (t.id.as_str(), t)).collect();

        let mut count = 0;
        for stored in data.transactions.iter_mut() {
            if let Some(updated) = updates.get(stored.id.as_str()) {
                *stored = (*updated).clone();
                count += 1;
            }
        }

        if count > 0 {
            self.write(&data)?;
        }
        Ok(count)
    }

    fn list_all(&self) -> Result<Vec<Transaction>> {
        Ok(self.read()?.transactions)
    }
}

/// Default store location (~/.local/share/fie/transactions.json)
pub fn default_data_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fie")
        .join("transactions.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, Extras, Mode, Scope};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn tx(id: &str, amount: i64) -> Transaction {
        Transaction {
            id: id.to_string(),
            timestamp: NaiveDate::from_ymd_opt(2024, 6, 5)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            amount: Decimal::new(amount, 0),
            direction: Direction::Debit,
            counterparty: "RAVI KUMAR".to_string(),
            mode: Mode::Upi,
            reviewed: false,
            scope: Scope::Unknown,
            category: vec![],
            extras: Extras::default(),
        }
    }

    fn temp_store() -> (tempfile::TempDir, JsonStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("data").join("transactions.json")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_open_creates_empty_store() {
        let (_dir, store) = temp_store();
        assert!(store.path().exists());
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_add_skips_existing_ids() {
        let (_dir, store) = temp_store();
        let first = store.add(&[tx("a", 1), tx("b", 2)]).unwrap();
        assert_eq!(first, AddResult { inserted: 2, duplicates: 0 });

        let second = store.add(&[tx("b", 2), tx("c", 3), tx("c", 3)]).unwrap();
        assert_eq!(second, AddResult { inserted: 1, duplicates: 2 });

        let ids: Vec<_> = store.list_all().unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_update_replaces_by_id() {
        let (_dir, store) = temp_store();
        store.add(&[tx("a", 1), tx("b", 2)]).unwrap();

        let mut reviewed = tx("b", 2);
        reviewed.reviewed = true;
        reviewed.scope = Scope::Family;
        reviewed.category = vec!["groceries".to_string()];

        assert_eq!(store.update(&[reviewed, tx("missing", 9)]).unwrap(), 1);

        let all = store.list_all().unwrap();
        assert!(!all[0].reviewed);
        assert!(all[1].reviewed);
        assert_eq!(all[1].scope, Scope::Family);
        assert_eq!(all[1].category, vec!["groceries"]);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let (_dir, store) = temp_store();
        store.add(&[tx("a", 1)]).unwrap();
        let reopened = JsonStore::open(store.path()).unwrap();
        assert_eq!(reopened.list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_file_is_reset() {
        let (_dir, store) = temp_store();
        fs::write(store.path(), "{ not json").unwrap();

        assert!(store.list_all().unwrap().is_empty());
        assert!(store.path().with_extension("json.corrupt").exists());

        store.add(&[tx("a", 1)]).unwrap();
        assert_eq!(store.list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_repeated_corruption_keeps_every_backup() {
        let (_dir, store) = temp_store();
        fs::write(store.path(), "{ first").unwrap();
        store.list_all().unwrap();
        fs::write(store.path(), "{ second").unwrap();
        store.list_all().unwrap();

        let first = store.path().with_extension("json.corrupt");
        let second = store.path().with_extension("json.corrupt.1");
        assert_eq!(fs::read_to_string(first).unwrap(), "{ first");
        assert_eq!(fs::read_to_string(second).unwrap(), "{ second");
    }

    #[test]
    fn test_deleted_file_is_recreated() {
        let (_dir, store) = temp_store();
        store.add(&[tx("a", 1)]).unwrap();
        fs::remove_file(store.path()).unwrap();

        assert!(store.list_all().unwrap().is_empty());
        assert!(store.path().exists());
        assert_eq!(store.add(&[tx("b", 2)]).unwrap().inserted, 1);
    }

    #[test]
    fn test_amounts_survive_round_trip_exactly() {
        let (_dir, store) = temp_store();
        let mut t = tx("a", 0);
        t.amount = Decimal::new(1234567, 2);
        store.add(&[t]).unwrap();
        assert_eq!(store.list_all().unwrap()[0].amount, Decimal::new(1234567, 2));
    }
}
