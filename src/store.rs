//! Snapshot store: the directory of versioned tabular files for one dataset
//!
//! Snapshot identity is encoded in the filename as `v<N>[_<descriptor>].csv`.
//! The sequence number `N` is parsed with a full numeric parse; the optional
//! descriptor is display-only and never participates in ordering.

use crate::error::{PreplineError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Identity of one immutable snapshot within a dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotId {
    /// Monotonically increasing sequence number, unique within the dataset
    pub sequence: u64,
    /// Human-readable tag of the action that produced this snapshot
    pub descriptor: Option<String>,
}

impl SnapshotId {
    pub fn new(sequence: u64, descriptor: Option<String>) -> Self {
        Self {
            sequence,
            descriptor,
        }
    }

    /// File name this snapshot is stored under
    pub fn file_name(&self) -> String {
        match &self.descriptor {
            Some(desc) => format!("v{}_{}.{}", self.sequence, desc, crate::SNAPSHOT_EXT),
            None => format!("v{}.{}", self.sequence, crate::SNAPSHOT_EXT),
        }
    }

    /// Parse a directory entry name into a snapshot identity.
    ///
    /// Returns `Ok(None)` for files that do not follow the snapshot naming
    /// convention at all (e.g. the ledger file). A file that claims to be a
    /// snapshot (`v*.csv`) but whose sequence token does not parse as a
    /// number is a `CorruptStore` error: silently skipping it would make it
    /// invisible to ordering and orphan it.
    pub fn parse(file_name: &str) -> Result<Option<Self>> {
        let Some(stem) = file_name.strip_suffix(&format!(".{}", crate::SNAPSHOT_EXT)) else {
            return Ok(None);
        };
        let Some(rest) = stem.strip_prefix('v') else {
            return Ok(None);
        };

        let (number_part, descriptor) = match rest.split_once('_') {
            Some((number, desc)) => (number, Some(desc.to_string())),
            None => (rest, None),
        };

        let sequence: u64 = number_part
            .parse()
            .map_err(|_| PreplineError::corrupt_store(file_name))?;

        Ok(Some(Self {
            sequence,
            descriptor,
        }))
    }
}

impl std::fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.file_name())
    }
}

/// Owns the directory of versioned snapshot files for one dataset
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Open a store over an existing dataset directory
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Absolute path of a snapshot file
    pub fn path(&self, snapshot: &SnapshotId) -> PathBuf {
        self.dir.join(snapshot.file_name())
    }

    /// List all snapshots, ascending by sequence number.
    ///
    /// Ordering is numeric, never lexical: `v10` sorts after `v2`.
    pub fn list(&self) -> Result<Vec<SnapshotId>> {
        let mut snapshots = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(snapshot) = SnapshotId::parse(name)? {
                snapshots.push(snapshot);
            }
        }

        snapshots.sort_by_key(|s| s.sequence);
        Ok(snapshots)
    }

    /// Resolve the highest-sequence-number snapshot
    pub fn latest(&self) -> Result<SnapshotId> {
        self.list()?
            .into_iter()
            .max_by_key(|s| s.sequence)
            .ok_or(PreplineError::EmptyHistory)
    }

    /// Resolve a caller-supplied version reference to an existing snapshot.
    ///
    /// Accepts a full file name (`v3_drop_age.csv`), a bare version tag
    /// (`v3`), or a plain sequence number (`3`).
    pub fn resolve(&self, reference: &str) -> Result<SnapshotId> {
        let snapshots = self.list()?;

        if let Some(found) = snapshots.iter().find(|s| s.file_name() == reference) {
            return Ok(found.clone());
        }

        let number_part = reference.strip_prefix('v').unwrap_or(reference);
        if let Ok(sequence) = number_part.parse::<u64>() {
            if let Some(found) = snapshots.iter().find(|s| s.sequence == sequence) {
                return Ok(found.clone());
            }
        }

        Err(PreplineError::version_not_found(reference))
    }

    /// Write a new immutable snapshot file.
    ///
    /// Fails with `Conflict` if the sequence number is already taken, so a
    /// racing writer fails loudly instead of corrupting history. The data is
    /// written to a temp file and renamed into place so a crash never leaves
    /// a half-written snapshot under a valid name.
    pub fn write(&self, data: &[u8], sequence: u64, descriptor: Option<&str>) -> Result<SnapshotId> {
        if self.list()?.iter().any(|s| s.sequence == sequence) {
            return Err(PreplineError::Conflict { sequence });
        }

        let snapshot = SnapshotId::new(sequence, descriptor.map(|d| d.to_string()));
        let final_path = self.path(&snapshot);
        let tmp_path = final_path.with_extension("csv.tmp");

        fs::write(&tmp_path, data)?;
        fs::rename(&tmp_path, &final_path)?;

        log::debug!("Wrote snapshot {}", final_path.display());
        Ok(snapshot)
    }

    /// Read the raw bytes of a snapshot
    pub fn read(&self, snapshot: &SnapshotId) -> Result<Vec<u8>> {
        let path = self.path(snapshot);
        if !path.exists() {
            return Err(PreplineError::version_not_found(snapshot.file_name()));
        }
        Ok(fs::read(path)?)
    }

    /// Delete a snapshot file. Idempotent: deleting an already-absent file
    /// succeeds, so the companion ledger pop can always proceed.
    pub fn delete(&self, snapshot: &SnapshotId) -> Result<()> {
        let path = self.path(snapshot);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("Snapshot already absent on delete: {}", path.display());
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
