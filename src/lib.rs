//! # prepline
//!
//! A backend for iteratively cleaning tabular datasets: upload a CSV, score
//! its quality, apply preprocessing steps one at a time, inspect the effect,
//! and roll back or undo mistakes. Every mutating step produces an immutable
//! snapshot plus a matching record in an append-only execution ledger.

pub mod cli;
pub mod commands;
pub mod dataset;
pub mod error;
pub mod frame;
pub mod ingest;
pub mod ledger;
pub mod recommend;
pub mod report;
pub mod risk;
pub mod score;
pub mod server;
pub mod stats;
pub mod store;
pub mod transform;
pub mod workspace;

pub use dataset::Dataset;
pub use error::{PreplineError, Result};
pub use workspace::PreplineWorkspace;

/// Current format version for prepline files
pub const FORMAT_VERSION: &str = "1.0.0";

/// File extension used for snapshot files
pub const SNAPSHOT_EXT: &str = "csv";

/// Ledger file name inside each dataset directory
pub const LEDGER_FILE: &str = "execution_log.json";

/// Descriptor given to the originally ingested snapshot (v0)
pub const RAW_DESCRIPTOR: &str = "raw";
