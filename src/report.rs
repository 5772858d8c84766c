//! Before/after rescoring and on-disk quality reports
//!
//! Rescoring always compares the sequence-0 snapshot against the current
//! latest. Reports land under the workspace report directory as a JSON
//! document plus a human-readable markdown rendering.

use crate::dataset::Dataset;
use crate::error::Result;
use crate::ledger::LedgerRecord;
use crate::recommend::Recommendation;
use crate::score::{self, FeatureDiagnostic, QualityMetrics};
use crate::workspace::PreplineWorkspace;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

const JSON_REPORT_FILE: &str = "report.json";
const MARKDOWN_REPORT_FILE: &str = "report.md";

/// How many recommendations the markdown rendering shows
const TOP_RECOMMENDATIONS: usize = 5;

/// Quality comparison between the raw snapshot and the latest one
#[derive(Debug, Clone, Serialize)]
pub struct RescoreResult {
    pub dataset_id: String,
    pub initial_version: String,
    pub final_version: String,
    pub initial_score: i64,
    pub final_score: i64,
    pub improvement: i64,
    pub initial_metrics: QualityMetrics,
    pub final_metrics: QualityMetrics,
}

/// The full report document written to report.json
#[derive(Debug, Clone, Serialize)]
pub struct ReportDocument {
    pub dataset_id: String,
    pub generated_at: DateTime<Utc>,
    pub initial_score: i64,
    pub final_score: i64,
    pub improvement: i64,
    pub initial_metrics: QualityMetrics,
    pub final_metrics: QualityMetrics,
    pub feature_diagnostics: Vec<FeatureDiagnostic>,
    pub recommendations: Vec<Recommendation>,
    pub execution_log: Vec<LedgerRecord>,
}

/// Paths of the report files written for a dataset
#[derive(Debug, Clone, Serialize)]
pub struct ReportArtifacts {
    pub dataset_id: String,
    pub json_report: PathBuf,
    pub markdown_report: PathBuf,
}

/// Score the raw and latest snapshots and report the improvement
pub fn rescore_dataset(dataset: &Dataset, target_col: Option<&str>) -> Result<RescoreResult> {
    let (initial_snapshot, initial_frame) = dataset.read_frame(Some("v0"))?;
    let (final_snapshot, final_frame) = dataset.read_frame(None)?;

    let initial = score::compute_quality_score(&initial_frame, dataset.id(), target_col);
    let final_ = score::compute_quality_score(&final_frame, dataset.id(), target_col);

    Ok(RescoreResult {
        dataset_id: dataset.id().to_string(),
        initial_version: initial_snapshot.file_name(),
        final_version: final_snapshot.file_name(),
        initial_score: initial.quality_score,
        final_score: final_.quality_score,
        improvement: final_.quality_score - initial.quality_score,
        initial_metrics: initial.metrics,
        final_metrics: final_.metrics,
    })
}

/// Generate report.json and report.md for a dataset
pub fn generate_report(
    workspace: &PreplineWorkspace,
    dataset: &Dataset,
    target_col: Option<&str>,
) -> Result<ReportArtifacts> {
    let report_dir = workspace.report_dir(dataset.id());
    std::fs::create_dir_all(&report_dir)?;

    let rescore = rescore_dataset(dataset, target_col)?;
    let (_, final_frame) = dataset.read_frame(None)?;
    let final_analysis = score::compute_quality_score(&final_frame, dataset.id(), target_col);

    let document = ReportDocument {
        dataset_id: dataset.id().to_string(),
        generated_at: Utc::now(),
        initial_score: rescore.initial_score,
        final_score: rescore.final_score,
        improvement: rescore.improvement,
        initial_metrics: rescore.initial_metrics,
        final_metrics: rescore.final_metrics,
        feature_diagnostics: final_analysis.feature_diagnostics,
        recommendations: final_analysis.recommendations,
        execution_log: dataset.log()?,
    };

    let json_path = report_dir.join(JSON_REPORT_FILE);
    let mut json_file = File::create(&json_path)?;
    serde_json::to_writer_pretty(&mut json_file, &document)?;
    json_file.sync_all()?;

    let markdown_path = report_dir.join(MARKDOWN_REPORT_FILE);
    let mut markdown_file = File::create(&markdown_path)?;
    markdown_file.write_all(render_markdown(&document).as_bytes())?;
    markdown_file.sync_all()?;

    log::info!(
        "Wrote quality report for dataset {} to {}",
        dataset.id(),
        report_dir.display()
    );

    Ok(ReportArtifacts {
        dataset_id: dataset.id().to_string(),
        json_report: json_path,
        markdown_report: markdown_path,
    })
}

fn render_markdown(document: &ReportDocument) -> String {
    let mut out = String::new();

    out.push_str("# Dataset Quality Report\n\n");
    out.push_str(&format!("- Dataset ID: {}\n", document.dataset_id));
    out.push_str(&format!(
        "- Generated At: {}\n\n",
        document.generated_at.to_rfc3339()
    ));

    out.push_str("## Scores\n\n");
    out.push_str(&format!(
        "- Initial Quality Score: {}\n",
        document.initial_score
    ));
    out.push_str(&format!("- Final Quality Score: {}\n", document.final_score));
    out.push_str(&format!("- Improvement: {}\n\n", document.improvement));

    out.push_str("## Executed Preprocessing Steps\n\n");
    if document.execution_log.is_empty() {
        out.push_str("No preprocessing executed.\n\n");
    } else {
        for record in &document.execution_log {
            out.push_str(&format!("- {}: {}\n", record.version, record.description));
        }
        out.push('\n');
    }

    out.push_str("## Top Recommendations\n\n");
    if document.recommendations.is_empty() {
        out.push_str("None.\n");
    } else {
        for rec in document.recommendations.iter().take(TOP_RECOMMENDATIONS) {
            out.push_str(&format!(
                "- {}: {} ({})\n",
                rec.target, rec.recommended_action, rec.impact
            ));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PreplineWorkspace, Dataset) {
        let temp = TempDir::new().unwrap();
        let workspace = PreplineWorkspace::create_new(temp.path().to_path_buf()).unwrap();
        let mut dataset = Dataset::create(&workspace, "ds-report").unwrap();
        dataset
            .write_initial(b"grp,score\na,10\nb,\nc,20\nd,30\n")
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
    fn test_rescore_reports_improvement() {
        let (_temp, _ws, mut dataset) = setup();
        dataset
            .execute("median_impute", &feature_params("score"))
            .unwrap();

        let result = rescore_dataset(&dataset, None).unwrap();
        assert_eq!(result.initial_version, "v0_raw.csv");
        assert_eq!(result.final_version, "v1_median_impute_score.csv");
        assert!(result.final_score > result.initial_score);
        assert_eq!(
            result.improvement,
            result.final_score - result.initial_score
        );
        assert_eq!(result.final_metrics.missing_ratio, 0.0);
    }

    #[test]
    fn test_rescore_without_steps_is_flat() {
        let (_temp, _ws, dataset) = setup();

        let result = rescore_dataset(&dataset, None).unwrap();
        assert_eq!(result.initial_version, result.final_version);
        assert_eq!(result.improvement, 0);
    }

    #[test]
    fn test_generate_report_writes_both_files() {
        let (_temp, workspace, mut dataset) = setup();
        dataset
            .execute("median_impute", &feature_params("score"))
            .unwrap();

        let artifacts = generate_report(&workspace, &dataset, None).unwrap();
        assert!(artifacts.json_report.exists());
        assert!(artifacts.markdown_report.exists());

        let json: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&artifacts.json_report).unwrap()).unwrap();
        assert_eq!(json["dataset_id"], "ds-report");
        assert_eq!(json["execution_log"].as_array().unwrap().len(), 1);

        let markdown = std::fs::read_to_string(&artifacts.markdown_report).unwrap();
        assert!(markdown.contains("# Dataset Quality Report"));
        assert!(markdown.contains("Median imputation on score"));
    }
}
