//! Execution ledger: the append-only log of transformations for one dataset
//!
//! Persisted as `execution_log.json` in the dataset directory, an ordered
//! JSON array in a human-diffable pretty format. Appending is always the
//! last step of a mutating operation, after the snapshot write has
//! succeeded, so the log never references a missing snapshot.

use crate::error::{PreplineError, Result};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// One entry per successful mutating operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerRecord {
    /// File name of the snapshot this operation produced
    pub version: String,
    /// Action name, e.g. "median_impute" or "rollback"
    pub action: String,
    /// Free-form action parameters, insertion-ordered
    pub params: IndexMap<String, serde_json::Value>,
    /// Human-readable description of the step
    pub description: String,
    /// UTC wall-clock time the record was created
    pub timestamp: DateTime<Utc>,
}

impl LedgerRecord {
    pub fn new(
        version: String,
        action: impl Into<String>,
        params: IndexMap<String, serde_json::Value>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            version,
            action: action.into(),
            params,
            description: description.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Owns the ordered record sequence for one dataset
#[derive(Debug, Clone)]
pub struct ExecutionLedger {
    path: PathBuf,
}

impl ExecutionLedger {
    /// Open the ledger living inside a dataset directory
    pub fn new(dataset_dir: &Path) -> Self {
        Self {
            path: dataset_dir.join(crate::LEDGER_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// List all records in order. An absent log file is an empty sequence,
    /// not an error.
    pub fn list(&self) -> Result<Vec<LedgerRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Append one record at the end and persist the full sequence
    pub fn append(&self, record: LedgerRecord) -> Result<()> {
        let mut records = self.list()?;
        records.push(record);
        self.persist(&records)
    }

    /// Remove and return the most recent record, persisting the truncated
    /// sequence. Fails with `EmptyHistory` if there is nothing to pop.
    pub fn pop_last(&self) -> Result<LedgerRecord> {
        let mut records = self.list()?;
        let record = records.pop().ok_or(PreplineError::EmptyHistory)?;
        self.persist(&records)?;
        Ok(record)
    }

    /// The most recent record, if any
    pub fn last(&self) -> Result<Option<LedgerRecord>> {
        Ok(self.list()?.into_iter().last())
    }

    fn persist(&self, records: &[LedgerRecord]) -> Result<()> {
        let mut file = fs::File::create(&self.path)?;
        file.write_all(serde_json::to_string_pretty(records)?.as_bytes())?;
        file.sync_all()?;
        Ok(())
    }
}
