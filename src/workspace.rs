//! Workspace management for prepline storage

use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Manages the .prepline storage directory
#[derive(Debug, Clone)]
pub struct PreplineWorkspace {
    /// Project root directory (where .prepline/ lives)
    pub root: PathBuf,
    /// .prepline/ directory path
    pub prepline_dir: PathBuf,
    /// .prepline/datasets/ directory path
    pub datasets_dir: PathBuf,
    /// .prepline/reports/ directory path
    pub reports_dir: PathBuf,
}

impl PreplineWorkspace {
    /// Find existing workspace or create a new one
    pub fn find_or_create(start_dir: Option<&Path>) -> Result<Self> {
        let current_dir = std::env::current_dir()?;
        let start = start_dir.unwrap_or(&current_dir);

        if let Some(workspace) = Self::find_existing(start)? {
            return Ok(workspace);
        }

        Self::create_new(start.to_path_buf())
    }

    /// Find existing .prepline workspace by walking up the directory tree
    fn find_existing(start_dir: &Path) -> Result<Option<Self>> {
        let mut current = start_dir;

        loop {
            let prepline_dir = current.join(".prepline");
            if prepline_dir.exists() && prepline_dir.is_dir() {
                return Ok(Some(Self::from_root(current.to_path_buf())));
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break, // Reached filesystem root
            }
        }

        Ok(None)
    }

    /// Create a new workspace in the specified root directory
    pub fn create_new(root: PathBuf) -> Result<Self> {
        let workspace = Self::from_root(root);

        fs::create_dir_all(&workspace.datasets_dir)?;
        fs::create_dir_all(&workspace.reports_dir)?;
        workspace.create_config(false)?;

        log::info!("Created prepline workspace at: {}", workspace.root.display());

        Ok(workspace)
    }

    /// Create workspace handles from a root directory path
    pub fn from_root(root: PathBuf) -> Self {
        let prepline_dir = root.join(".prepline");
        let datasets_dir = prepline_dir.join("datasets");
        let reports_dir = prepline_dir.join("reports");

        Self {
            root,
            prepline_dir,
            datasets_dir,
            reports_dir,
        }
    }

    /// Directory holding the snapshots and ledger for one dataset
    pub fn dataset_dir(&self, dataset_id: &str) -> PathBuf {
        self.datasets_dir.join(dataset_id)
    }

    /// Directory holding generated reports for one dataset
    pub fn report_dir(&self, dataset_id: &str) -> PathBuf {
        self.reports_dir.join(dataset_id)
    }

    /// List all dataset ids known to this workspace
    pub fn list_datasets(&self) -> Result<Vec<String>> {
        let mut datasets = Vec::new();

        if !self.datasets_dir.exists() {
            return Ok(datasets);
        }

        for entry in fs::read_dir(&self.datasets_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    datasets.push(name.to_string());
                }
            }
        }

        datasets.sort();
        Ok(datasets)
    }

    /// Create initial configuration file
    pub fn create_config(&self, force: bool) -> Result<()> {
        let config_path = self.prepline_dir.join("config.json");

        if config_path.exists() && !force {
            return Ok(()); // Don't overwrite existing config unless forced
        }

        let config = serde_json::json!({
            "version": crate::FORMAT_VERSION,
            "created": chrono::Utc::now(),
            "snapshot_extension": crate::SNAPSHOT_EXT,
        });

        fs::write(config_path, serde_json::to_string_pretty(&config)?)?;
        Ok(())
    }

    /// Get workspace statistics
    pub fn stats(&self) -> Result<WorkspaceStats> {
        let datasets = self.list_datasets()?;

        let mut snapshot_count = 0;
        let mut total_snapshot_size = 0u64;
        let mut total_report_size = 0u64;

        for entry in WalkDir::new(&self.datasets_dir).min_depth(1) {
            let entry = entry?;
            if entry.file_type().is_file() {
                let is_snapshot = entry
                    .path()
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e == crate::SNAPSHOT_EXT);
                if is_snapshot {
                    snapshot_count += 1;
                    total_snapshot_size += entry.metadata()?.len();
                }
            }
        }

        if self.reports_dir.exists() {
            for entry in WalkDir::new(&self.reports_dir).min_depth(1) {
                let entry = entry?;
                if entry.file_type().is_file() {
                    total_report_size += entry.metadata()?.len();
                }
            }
        }

        Ok(WorkspaceStats {
            dataset_count: datasets.len(),
            snapshot_count,
            total_snapshot_size,
            total_report_size,
        })
    }
}

/// Statistics about the workspace
#[derive(Debug, Default)]
pub struct WorkspaceStats {
    pub dataset_count: usize,
    pub snapshot_count: usize,
    pub total_snapshot_size: u64,
    pub total_report_size: u64,
}
