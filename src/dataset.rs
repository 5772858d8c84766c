//! Dataset handle: one open dataset with its snapshot store and ledger
//!
//! All mutating operations go through this handle. It resolves "latest" once
//! on open, keeps the pointer current across its own mutations, and enforces
//! the write-data-then-log ordering so the ledger never references a missing
//! snapshot.

use crate::error::{PreplineError, Result};
use crate::frame::DataFrame;
use crate::ledger::{ExecutionLedger, LedgerRecord};
use crate::store::{SnapshotId, SnapshotStore};
use crate::transform::Action;
use crate::workspace::PreplineWorkspace;
use indexmap::IndexMap;
use serde::Serialize;

/// Result of one executed preprocessing step
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionOutcome {
    pub dataset_id: String,
    pub new_version: String,
    pub description: String,
}

/// Result of a rollback
#[derive(Debug, Clone, Serialize)]
pub struct RollbackOutcome {
    pub dataset_id: String,
    pub rolled_back_to: String,
    pub new_version: String,
}

/// Result of an undo
#[derive(Debug, Clone, Serialize)]
pub struct UndoOutcome {
    pub dataset_id: String,
    pub undone_version: String,
    pub description: String,
}

/// Ordered version listing
#[derive(Debug, Clone, Serialize)]
pub struct VersionListing {
    pub versions: Vec<String>,
    pub latest: Option<String>,
}

#[derive(Debug)]
pub struct Dataset {
    id: String,
    store: SnapshotStore,
    ledger: ExecutionLedger,
    latest: Option<SnapshotId>,
}

impl Dataset {
    /// Open an existing dataset; fails with `DatasetNotFound` if its
    /// directory does not exist. Reconciles any snapshot left orphaned by a
    /// crash between snapshot write and ledger append.
    pub fn open(workspace: &PreplineWorkspace, id: &str) -> Result<Self> {
        let dir = workspace.dataset_dir(id);
        if !dir.exists() {
            return Err(PreplineError::dataset_not_found(id));
        }

        let store = SnapshotStore::new(dir.clone());
        let ledger = ExecutionLedger::new(&dir);

        let mut dataset = Self {
            id: id.to_string(),
            store,
            ledger,
            latest: None,
        };
        dataset.reconcile()?;
        dataset.latest = dataset.store.list()?.into_iter().last();
        Ok(dataset)
    }

    /// Create the directory for a brand-new dataset (used by ingestion)
    pub fn create(workspace: &PreplineWorkspace, id: &str) -> Result<Self> {
        let dir = workspace.dataset_dir(id);
        std::fs::create_dir_all(&dir)?;

        Ok(Self {
            id: id.to_string(),
            store: SnapshotStore::new(dir.clone()),
            ledger: ExecutionLedger::new(&dir),
            latest: None,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn ledger(&self) -> &ExecutionLedger {
        &self.ledger
    }

    /// The current highest-sequence snapshot
    pub fn latest(&self) -> Result<SnapshotId> {
        self.latest.clone().ok_or(PreplineError::EmptyHistory)
    }

    /// Discard snapshots newer than the last logged sequence number. A crash
    /// between snapshot write and ledger append leaves exactly this shape
    /// behind; the logged history is the authoritative one.
    fn reconcile(&self) -> Result<()> {
        let last_logged = match self.ledger.last()? {
            Some(record) => match SnapshotId::parse(&record.version)? {
                Some(snapshot) => snapshot.sequence,
                None => return Err(PreplineError::corrupt_store(record.version)),
            },
            // No log: only the ingested v0 snapshot is legitimate
            None => 0,
        };

        for snapshot in self.store.list()? {
            if snapshot.sequence > last_logged {
                log::warn!(
                    "Discarding unlogged snapshot {} for dataset {}",
                    snapshot.file_name(),
                    self.id
                );
                self.store.delete(&snapshot)?;
            }
        }
        Ok(())
    }

    /// Write the initial sequence-0 snapshot
    pub fn write_initial(&mut self, data: &[u8]) -> Result<SnapshotId> {
        let snapshot = self.store.write(data, 0, Some(crate::RAW_DESCRIPTOR))?;
        self.latest = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Execute one preprocessing step against the latest snapshot.
    ///
    /// Either one new snapshot file and one new ledger record are created,
    /// or neither: all validation happens before anything is written.
    pub fn execute(
        &mut self,
        action_name: &str,
        params: &IndexMap<String, serde_json::Value>,
    ) -> Result<ExecutionOutcome> {
        let latest = self.latest()?;
        let mut frame = DataFrame::from_bytes(&self.store.read(&latest)?)?;

        let feature = params
            .get("feature")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                PreplineError::invalid_parameter("Missing required parameter: feature")
            })?;

        let action = Action::parse(action_name)
            .ok_or_else(|| PreplineError::unsupported_action(action_name))?;

        let description = action.apply(&mut frame, feature)?;

        let sequence = latest.sequence + 1;
        let descriptor = action.descriptor(feature);
        let snapshot = self
            .store
            .write(&frame.to_csv_bytes()?, sequence, Some(&descriptor))?;

        self.ledger.append(LedgerRecord::new(
            snapshot.file_name(),
            action.as_str(),
            params.clone(),
            description.clone(),
        ))?;

        log::info!(
            "Executed {} on dataset {} -> {}",
            action.as_str(),
            self.id,
            snapshot.file_name()
        );

        self.latest = Some(snapshot.clone());
        Ok(ExecutionOutcome {
            dataset_id: self.id.clone(),
            new_version: snapshot.file_name(),
            description,
        })
    }

    /// Make an earlier snapshot the new latest by copying it forward.
    /// Never deletes or renumbers existing snapshots.
    pub fn rollback(&mut self, target: &str) -> Result<RollbackOutcome> {
        let target = self.store.resolve(target)?;
        let sequence = self.latest()?.sequence + 1;

        let data = self.store.read(&target)?;
        let target_name = target.file_name();
        let target_stem = target_name
            .strip_suffix(&format!(".{}", crate::SNAPSHOT_EXT))
            .unwrap_or(&target_name);
        let descriptor = format!("rollback_to_{}", target_stem);

        let snapshot = self.store.write(&data, sequence, Some(&descriptor))?;

        let mut params = IndexMap::new();
        params.insert(
            "rollback_to".to_string(),
            serde_json::Value::String(target_name.clone()),
        );
        self.ledger.append(LedgerRecord::new(
            snapshot.file_name(),
            "rollback",
            params,
            format!("Rolled back to {}", target_name),
        ))?;

        log::info!(
            "Rolled back dataset {} to {} as {}",
            self.id,
            target_name,
            snapshot.file_name()
        );

        self.latest = Some(snapshot.clone());
        Ok(RollbackOutcome {
            dataset_id: self.id.clone(),
            rolled_back_to: target_name,
            new_version: snapshot.file_name(),
        })
    }

    /// Reverse the single most recent mutating operation: pop the last
    /// ledger record and delete the snapshot it names, as a paired unit.
    pub fn undo(&mut self) -> Result<UndoOutcome> {
        let record = self.ledger.pop_last()?;

        let snapshot = SnapshotId::parse(&record.version)?
            .ok_or_else(|| PreplineError::corrupt_store(record.version.clone()))?;
        self.store.delete(&snapshot)?;

        log::info!(
            "Undid {} on dataset {}: removed {}",
            record.action,
            self.id,
            record.version
        );

        self.latest = self.store.list()?.into_iter().last();
        Ok(UndoOutcome {
            dataset_id: self.id.clone(),
            undone_version: record.version,
            description: format!("Undone: {}", record.description),
        })
    }

    /// Ordered version listing, ascending by sequence number
    pub fn versions(&self) -> Result<VersionListing> {
        let snapshots = self.store.list()?;
        let latest = snapshots.last().map(|s| s.file_name());
        Ok(VersionListing {
            versions: snapshots.iter().map(|s| s.file_name()).collect(),
            latest,
        })
    }

    /// The full execution log, oldest first
    pub fn log(&self) -> Result<Vec<LedgerRecord>> {
        self.ledger.list()
    }

    /// Load a frame for a given version reference, or the latest snapshot
    /// when none is given
    pub fn read_frame(&self, version: Option<&str>) -> Result<(SnapshotId, DataFrame)> {
        let snapshot = match version {
            Some(reference) => self.store.resolve(reference)?,
            None => self.latest()?,
        };
        let frame = DataFrame::from_bytes(&self.store.read(&snapshot)?)?;
        Ok((snapshot, frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PreplineWorkspace, Dataset) {
        let temp = TempDir::new().unwrap();
        let workspace = PreplineWorkspace::create_new(temp.path().to_path_buf()).unwrap();
        let mut dataset = Dataset::create(&workspace, "ds-test").unwrap();
        dataset
            .write_initial(b"age,city\n30,NYC\n,LA\n41,SF\n")
            .unwrap();
        (temp, workspace, dataset)
    }

    fn feature_params(feature: &str) -> IndexMap<String, serde_json::Value> {
        let mut params = IndexMap::new();
        params.insert(
            "feature".to_string(),
            serde_json::Value::String(feature.to_string()),
        );
        params
    }

    #[test]
    fn test_open_missing_dataset() {
        let temp = TempDir::new().unwrap();
        let workspace = PreplineWorkspace::create_new(temp.path().to_path_buf()).unwrap();

        assert!(matches!(
            Dataset::open(&workspace, "nope"),
            Err(PreplineError::DatasetNotFound { .. })
        ));
    }

    #[test]
    fn test_execute_creates_snapshot_and_record() {
        let (_temp, _ws, mut dataset) = setup();

        let outcome = dataset
            .execute("median_impute", &feature_params("age"))
            .unwrap();
        assert_eq!(outcome.new_version, "v1_median_impute_age.csv");
        assert_eq!(outcome.description, "Median imputation on age");

        let versions = dataset.versions().unwrap();
        assert_eq!(versions.versions.len(), 2);
        assert_eq!(versions.latest.as_deref(), Some("v1_median_impute_age.csv"));

        let log = dataset.log().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].version, "v1_median_impute_age.csv");
    }

    #[test]
    fn test_unsupported_action_leaves_no_trace() {
        let (_temp, _ws, mut dataset) = setup();

        let err = dataset
            .execute("one_hot_encode", &feature_params("age"))
            .unwrap_err();
        assert!(matches!(err, PreplineError::UnsupportedAction { .. }));

        assert_eq!(dataset.versions().unwrap().versions.len(), 1);
        assert!(dataset.log().unwrap().is_empty());
    }

    #[test]
    fn test_missing_feature_param_leaves_no_trace() {
        let (_temp, _ws, mut dataset) = setup();

        let err = dataset.execute("drop_feature", &IndexMap::new()).unwrap_err();
        assert!(matches!(err, PreplineError::InvalidParameter { .. }));
        assert_eq!(dataset.versions().unwrap().versions.len(), 1);
        assert!(dataset.log().unwrap().is_empty());
    }

    #[test]
    fn test_ledger_tail_matches_store_head() {
        let (_temp, _ws, mut dataset) = setup();

        dataset
            .execute("median_impute", &feature_params("age"))
            .unwrap();
        dataset.execute("drop_feature", &feature_params("city")).unwrap();

        let last = dataset.ledger().last().unwrap().unwrap();
        let latest = dataset.latest().unwrap();
        assert_eq!(last.version, latest.file_name());
    }

    #[test]
    fn test_rollback_adds_without_deleting() {
        let (_temp, _ws, mut dataset) = setup();

        dataset.execute("drop_feature", &feature_params("city")).unwrap();
        let outcome = dataset.rollback("v0").unwrap();

        assert_eq!(outcome.rolled_back_to, "v0_raw.csv");
        assert_eq!(outcome.new_version, "v2_rollback_to_v0_raw.csv");

        let versions = dataset.versions().unwrap().versions;
        assert_eq!(
            versions,
            vec![
                "v0_raw.csv",
                "v1_drop_feature_city.csv",
                "v2_rollback_to_v0_raw.csv"
            ]
        );

        // The copy carries the target's bytes verbatim
        let (_, rolled) = dataset.read_frame(None).unwrap();
        assert_eq!(rolled.column_names(), vec!["age", "city"]);
    }

    #[test]
    fn test_rollback_to_unknown_version() {
        let (_temp, _ws, mut dataset) = setup();

        assert!(matches!(
            dataset.rollback("v9"),
            Err(PreplineError::VersionNotFound { .. })
        ));
    }

    #[test]
    fn test_undo_removes_newest_pair() {
        let (_temp, _ws, mut dataset) = setup();

        dataset
            .execute("median_impute", &feature_params("age"))
            .unwrap();
        let outcome = dataset.undo().unwrap();

        assert_eq!(outcome.undone_version, "v1_median_impute_age.csv");
        assert_eq!(dataset.versions().unwrap().versions, vec!["v0_raw.csv"]);
        assert!(dataset.log().unwrap().is_empty());
    }

    #[test]
    fn test_undo_empty_history() {
        let (_temp, _ws, mut dataset) = setup();

        let err = dataset.undo().unwrap_err();
        assert!(matches!(err, PreplineError::EmptyHistory));
        assert_eq!(dataset.versions().unwrap().versions, vec!["v0_raw.csv"]);
    }

    #[test]
    fn test_reopen_reconciles_orphaned_snapshot() {
        let (_temp, workspace, mut dataset) = setup();
        dataset
            .execute("median_impute", &feature_params("age"))
            .unwrap();

        // Simulate a crash between snapshot write and ledger append
        std::fs::write(
            workspace.dataset_dir("ds-test").join("v2_orphan.csv"),
            b"age\n1\n",
        )
        .unwrap();

        let reopened = Dataset::open(&workspace, "ds-test").unwrap();
        let versions = reopened.versions().unwrap().versions;
        assert_eq!(
            versions,
            vec!["v0_raw.csv", "v1_median_impute_age.csv"]
        );
    }
}
