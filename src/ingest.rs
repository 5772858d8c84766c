//! CSV ingestion: validate an upload and create the sequence-0 snapshot

use crate::dataset::Dataset;
use crate::error::{PreplineError, Result};
use crate::frame::DataFrame;
use crate::workspace::PreplineWorkspace;
use serde::Serialize;
use uuid::Uuid;

/// Metadata returned to the caller after a successful ingestion
#[derive(Debug, Clone, Serialize)]
pub struct DatasetMetadata {
    pub dataset_id: String,
    pub filename: String,
    pub rows: usize,
    pub columns: usize,
    pub column_names: Vec<String>,
    pub current_version: String,
}

/// Validate and ingest a CSV payload, saving the raw data as version v0.
///
/// Rejects non-.csv filenames, unreadable CSV, and empty data. The payload
/// is parsed into a frame and written back out, so what lands on disk is
/// normalized CSV rather than whatever bytes arrived.
pub fn ingest_csv(
    workspace: &PreplineWorkspace,
    filename: &str,
    data: &[u8],
) -> Result<DatasetMetadata> {
    if !filename.to_lowercase().ends_with(".csv") {
        return Err(PreplineError::invalid_input(
            "Only CSV files are supported",
        ));
    }

    let frame = DataFrame::from_bytes(data)
        .map_err(|e| PreplineError::invalid_input(format!("Failed to read CSV file: {}", e)))?;

    if frame.n_cols() == 0 {
        return Err(PreplineError::invalid_input(
            "CSV must contain at least one column",
        ));
    }
    if frame.n_rows() == 0 {
        return Err(PreplineError::invalid_input("Uploaded CSV is empty"));
    }

    let dataset_id = Uuid::new_v4().to_string();
    let mut dataset = Dataset::create(workspace, &dataset_id)?;
    let snapshot = dataset.write_initial(&frame.to_csv_bytes()?)?;

    log::info!(
        "Ingested {} as dataset {} ({} rows, {} columns)",
        filename,
        dataset_id,
        frame.n_rows(),
        frame.n_cols()
    );

    Ok(DatasetMetadata {
        dataset_id,
        filename: filename.to_string(),
        rows: frame.n_rows(),
        columns: frame.n_cols(),
        column_names: frame.column_names().iter().map(|s| s.to_string()).collect(),
        current_version: snapshot.file_name(),
    })
}
