//! Common test utilities and helpers

use indexmap::IndexMap;
use prepline::ingest::ingest_csv;
use prepline::{Dataset, PreplineWorkspace, Result};
use tempfile::TempDir;

/// Test fixture manager for creating temporary test environments
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub workspace: PreplineWorkspace,
}

impl TestFixture {
    /// Create a new test fixture with initialized workspace
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let workspace = PreplineWorkspace::create_new(temp_dir.path().to_path_buf())?;

        Ok(Self {
            temp_dir,
            workspace,
        })
    }

    /// Ingest CSV content and return the opened dataset
    pub fn ingest(&self, csv: &str) -> Result<Dataset> {
        let metadata = ingest_csv(&self.workspace, "fixture.csv", csv.as_bytes())?;
        Dataset::open(&self.workspace, &metadata.dataset_id)
    }

    /// Snapshot filenames currently on disk for a dataset, sorted by name
    pub fn files_on_disk(&self, dataset_id: &str) -> Vec<String> {
        let dir = self.workspace.dataset_dir(dataset_id);
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .filter(|name| name.ends_with(".csv"))
            .collect();
        names.sort();
        names
    }
}

/// Params map carrying just the feature name
pub fn feature_params(feature: &str) -> IndexMap<String, serde_json::Value> {
    let mut params = IndexMap::new();
    params.insert(
        "feature".to_string(),
        serde_json::Value::String(feature.to_string()),
    );
    params
}
