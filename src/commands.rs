//! Command implementations for the prepline CLI

use crate::cli::{Commands, OutputFormat};
use crate::dataset::Dataset;
use crate::error::{PreplineError, Result};
use crate::ingest;
use crate::report;
use crate::score;
use crate::server;
use crate::workspace::PreplineWorkspace;
use indexmap::IndexMap;
use std::path::Path;

/// Execute a command
pub fn execute_command(command: Commands, workspace_path: Option<&Path>) -> Result<()> {
    match command {
        Commands::Init { force } => init_command(workspace_path, force),
        Commands::Ingest { file } => ingest_command(workspace_path, &file),
        Commands::Exec {
            dataset,
            action,
            feature,
        } => exec_command(workspace_path, &dataset, &action, &feature),
        Commands::Rollback { dataset, to } => rollback_command(workspace_path, &dataset, &to),
        Commands::Undo { dataset } => undo_command(workspace_path, &dataset),
        Commands::Versions { dataset, format } => {
            versions_command(workspace_path, &dataset, &format)
        }
        Commands::Log { dataset, format } => log_command(workspace_path, &dataset, &format),
        Commands::Score {
            dataset,
            target,
            version,
            format,
        } => score_command(
            workspace_path,
            &dataset,
            target.as_deref(),
            version.as_deref(),
            &format,
        ),
        Commands::Rescore {
            dataset,
            target,
            format,
        } => rescore_command(workspace_path, &dataset, target.as_deref(), &format),
        Commands::Report { dataset, target } => {
            report_command(workspace_path, &dataset, target.as_deref())
        }
        Commands::Stats => stats_command(workspace_path),
        Commands::Serve { port } => server::serve(workspace_path, port),
    }
}

fn open_workspace(workspace_path: Option<&Path>) -> Result<PreplineWorkspace> {
    PreplineWorkspace::find_or_create(workspace_path)
}

fn parse_format(format: &str) -> Result<OutputFormat> {
    OutputFormat::parse(format).map_err(PreplineError::invalid_input)
}

/// Initialize prepline workspace
fn init_command(workspace_path: Option<&Path>, force: bool) -> Result<()> {
    let current_dir = std::env::current_dir()?;
    let root = workspace_path.unwrap_or(&current_dir);

    let workspace = if force {
        let workspace = PreplineWorkspace::from_root(root.to_path_buf());
        std::fs::create_dir_all(&workspace.datasets_dir)?;
        std::fs::create_dir_all(&workspace.reports_dir)?;
        workspace.create_config(true)?;
        workspace
    } else {
        // For init, always create in the specified directory rather than
        // searching parent directories
        PreplineWorkspace::create_new(root.to_path_buf())?
    };

    println!(
        "✅ Initialized prepline workspace at: {}",
        workspace.root.display()
    );
    println!(
        "📁 Workspace directory: {}",
        workspace.prepline_dir.display()
    );

    Ok(())
}

/// Ingest a CSV file as a new dataset
fn ingest_command(workspace_path: Option<&Path>, file: &Path) -> Result<()> {
    let workspace = open_workspace(workspace_path)?;

    let filename = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| PreplineError::invalid_input("Invalid file path"))?;
    let data = std::fs::read(file)?;

    let metadata = ingest::ingest_csv(&workspace, filename, &data)?;

    println!("✅ Ingested '{}' as dataset: {}", filename, metadata.dataset_id);
    println!(
        "📊 {} rows, {} columns: {}",
        metadata.rows,
        metadata.columns,
        metadata.column_names.join(", ")
    );
    println!("📸 Initial version: {}", metadata.current_version);

    Ok(())
}

/// Execute one preprocessing step
fn exec_command(
    workspace_path: Option<&Path>,
    dataset_id: &str,
    action: &str,
    feature: &str,
) -> Result<()> {
    let workspace = open_workspace(workspace_path)?;
    let mut dataset = Dataset::open(&workspace, dataset_id)?;

    let mut params = IndexMap::new();
    params.insert(
        "feature".to_string(),
        serde_json::Value::String(feature.to_string()),
    );
    let outcome = dataset.execute(action, &params)?;

    println!("✅ {}", outcome.description);
    println!("📸 New version: {}", outcome.new_version);

    Ok(())
}

/// Roll a dataset back to an earlier version
fn rollback_command(workspace_path: Option<&Path>, dataset_id: &str, to: &str) -> Result<()> {
    let workspace = open_workspace(workspace_path)?;
    let mut dataset = Dataset::open(&workspace, dataset_id)?;

    let outcome = dataset.rollback(to)?;

    println!("🔄 Rolled back to: {}", outcome.rolled_back_to);
    println!("📸 New version: {}", outcome.new_version);

    Ok(())
}

/// Undo the most recent preprocessing step
fn undo_command(workspace_path: Option<&Path>, dataset_id: &str) -> Result<()> {
    let workspace = open_workspace(workspace_path)?;
    let mut dataset = Dataset::open(&workspace, dataset_id)?;

    let outcome = dataset.undo()?;

    println!("↩️  {}", outcome.description);
    println!("🗑️  Removed version: {}", outcome.undone_version);

    Ok(())
}

/// List all versions of a dataset
fn versions_command(workspace_path: Option<&Path>, dataset_id: &str, format: &str) -> Result<()> {
    let workspace = open_workspace(workspace_path)?;
    let dataset = Dataset::open(&workspace, dataset_id)?;

    let listing = dataset.versions()?;
    match parse_format(format)? {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&listing)?),
        OutputFormat::Pretty => {
            println!("📚 Versions of dataset {}:", dataset_id);
            for version in &listing.versions {
                let marker = if Some(version) == listing.latest.as_ref() {
                    " (latest)"
                } else {
                    ""
                };
                println!("  {}{}", version, marker);
            }
        }
    }

    Ok(())
}

/// Show the execution log of a dataset
fn log_command(workspace_path: Option<&Path>, dataset_id: &str, format: &str) -> Result<()> {
    let workspace = open_workspace(workspace_path)?;
    let dataset = Dataset::open(&workspace, dataset_id)?;

    let records = dataset.log()?;
    match parse_format(format)? {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Pretty => {
            println!("📜 Execution log of dataset {}:", dataset_id);
            if records.is_empty() {
                println!("  (no preprocessing executed)");
            }
            for record in &records {
                println!(
                    "  {} [{}] {} - {}",
                    record.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    record.version,
                    record.action,
                    record.description
                );
            }
        }
    }

    Ok(())
}

/// Compute the quality score of a dataset version
fn score_command(
    workspace_path: Option<&Path>,
    dataset_id: &str,
    target: Option<&str>,
    version: Option<&str>,
    format: &str,
) -> Result<()> {
    let workspace = open_workspace(workspace_path)?;
    let dataset = Dataset::open(&workspace, dataset_id)?;

    let (snapshot, frame) = dataset.read_frame(version)?;
    let report = score::compute_quality_score(&frame, dataset_id, target);

    match parse_format(format)? {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Pretty => {
            println!(
                "🏅 Quality score of {} ({}): {}",
                dataset_id,
                snapshot.file_name(),
                report.quality_score
            );
            println!(
                "  missing: {}  duplicates: {}  low variance: {}  skewness: {}",
                report.metrics.missing_ratio,
                report.metrics.duplicate_ratio,
                report.metrics.low_variance_ratio,
                report.metrics.skewness_ratio
            );
            for diagnostic in &report.feature_diagnostics {
                println!(
                    "  {} [{}]: {}",
                    diagnostic.feature,
                    diagnostic.dtype,
                    diagnostic.quality_flags.join(", ")
                );
            }
            if !report.recommendations.is_empty() {
                println!("💡 Recommendations:");
                for rec in &report.recommendations {
                    println!(
                        "  {}: {} ({})",
                        rec.target, rec.recommended_action, rec.impact
                    );
                }
            }
        }
    }

    Ok(())
}

/// Compare quality of the raw snapshot against the latest
fn rescore_command(
    workspace_path: Option<&Path>,
    dataset_id: &str,
    target: Option<&str>,
    format: &str,
) -> Result<()> {
    let workspace = open_workspace(workspace_path)?;
    let dataset = Dataset::open(&workspace, dataset_id)?;

    let result = report::rescore_dataset(&dataset, target)?;
    match parse_format(format)? {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Pretty => {
            println!(
                "🏅 {} -> {}: {} -> {} ({}{})",
                result.initial_version,
                result.final_version,
                result.initial_score,
                result.final_score,
                if result.improvement >= 0 { "+" } else { "" },
                result.improvement
            );
        }
    }

    Ok(())
}

/// Generate a quality report
fn report_command(
    workspace_path: Option<&Path>,
    dataset_id: &str,
    target: Option<&str>,
) -> Result<()> {
    let workspace = open_workspace(workspace_path)?;
    let dataset = Dataset::open(&workspace, dataset_id)?;

    let artifacts = report::generate_report(&workspace, &dataset, target)?;

    println!("✅ Report generated for dataset {}", dataset_id);
    println!("📄 JSON: {}", artifacts.json_report.display());
    println!("📄 Markdown: {}", artifacts.markdown_report.display());

    Ok(())
}

/// Show workspace statistics
fn stats_command(workspace_path: Option<&Path>) -> Result<()> {
    let workspace = open_workspace(workspace_path)?;
    let stats = workspace.stats()?;

    println!("📊 Workspace: {}", workspace.root.display());
    println!("  Datasets: {}", stats.dataset_count);
    println!("  Snapshots: {}", stats.snapshot_count);
    println!("  Snapshot size: {} bytes", stats.total_snapshot_size);
    println!("  Report size: {} bytes", stats.total_report_size);

    Ok(())
}
