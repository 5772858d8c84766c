//! Dataset quality scoring
//!
//! The score starts at 100 and loses weighted points for missing cells,
//! duplicate rows, low-variance numeric columns, and heavily skewed numeric
//! columns. Alongside the score, every column gets a diagnostic entry with
//! quality flags and a risk assessment.

use crate::frame::DataFrame;
use crate::recommend::{self, Recommendation};
use crate::risk::{self, RiskAssessment};
use crate::stats;
use serde::Serialize;

const MISSING_WEIGHT: f64 = 30.0;
const DUPLICATE_WEIGHT: f64 = 20.0;
const LOW_VARIANCE_WEIGHT: f64 = 25.0;
const SKEWNESS_WEIGHT: f64 = 15.0;

/// Missing percentage above which a column is flagged
const HIGH_MISSINGNESS_PCT: f64 = 20.0;

/// Absolute skewness above which a numeric column is flagged
const SKEWNESS_THRESHOLD: f64 = 1.0;

#[derive(Debug, Clone, Serialize)]
pub struct QualityMetrics {
    pub missing_ratio: f64,
    pub duplicate_ratio: f64,
    pub low_variance_ratio: f64,
    pub skewness_ratio: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureDiagnostic {
    pub feature: String,
    pub missing_percentage: f64,
    pub unique_values: usize,
    pub dtype: String,
    pub quality_flags: Vec<String>,
    pub risk_analysis: RiskAssessment,
}

#[derive(Debug, Clone, Serialize)]
pub struct QualityReport {
    pub dataset_id: String,
    pub rows: usize,
    pub columns: usize,
    pub quality_score: i64,
    pub metrics: QualityMetrics,
    pub feature_diagnostics: Vec<FeatureDiagnostic>,
    pub recommendations: Vec<Recommendation>,
}

/// Score a frame and assemble the full quality report
pub fn compute_quality_score(
    frame: &DataFrame,
    dataset_id: &str,
    target_col: Option<&str>,
) -> QualityReport {
    let n_rows = frame.n_rows();
    let n_cols = frame.n_cols();

    let risk_analysis = risk::detect_feature_risks(frame, target_col);

    let missing_ratio = frame.total_null_count() as f64 / frame.cell_count().max(1) as f64;
    let duplicate_ratio = frame.duplicate_row_count() as f64 / n_rows.max(1) as f64;

    let numeric_cols: Vec<&str> = frame
        .column_names()
        .into_iter()
        .filter(|name| frame.is_numeric_column(name))
        .collect();

    let low_variance_cols: Vec<&str> = numeric_cols
        .iter()
        .copied()
        .filter(|name| frame.distinct_count(name) <= 1)
        .collect();
    let low_variance_ratio = low_variance_cols.len() as f64 / n_cols.max(1) as f64;

    let skewed_cols: Vec<&str> = numeric_cols
        .iter()
        .copied()
        .filter(|name| {
            stats::skewness(&frame.numeric_values(name))
                .is_some_and(|skew| skew.abs() > SKEWNESS_THRESHOLD)
        })
        .collect();
    let skewness_ratio = skewed_cols.len() as f64 / numeric_cols.len().max(1) as f64;

    let score = 100.0
        - missing_ratio * MISSING_WEIGHT
        - duplicate_ratio * DUPLICATE_WEIGHT
        - low_variance_ratio * LOW_VARIANCE_WEIGHT
        - skewness_ratio * SKEWNESS_WEIGHT;
    let quality_score = (score.round() as i64).max(0);

    let mut feature_diagnostics = Vec::new();
    for name in frame.column_names() {
        let missing_pct = if n_rows > 0 {
            frame.null_count(name) as f64 / n_rows as f64 * 100.0
        } else {
            0.0
        };

        let mut flags = Vec::new();
        if missing_pct > HIGH_MISSINGNESS_PCT {
            flags.push("High Missingness".to_string());
        }
        if low_variance_cols.contains(&name) {
            flags.push("Low Variance".to_string());
        }
        if skewed_cols.contains(&name) {
            flags.push("High Skewness".to_string());
        }
        if flags.is_empty() {
            flags.push("Safe".to_string());
        }

        let assessment = risk_analysis.get(name).cloned().unwrap_or(RiskAssessment {
            risk_label: vec!["Safe".to_string()],
            reason: vec!["No significant risk detected".to_string()],
            suggested_action: vec!["Retain".to_string()],
        });

        feature_diagnostics.push(FeatureDiagnostic {
            feature: name.to_string(),
            missing_percentage: round2(missing_pct),
            unique_values: frame.distinct_count(name),
            dtype: if frame.is_numeric_column(name) {
                "numeric".to_string()
            } else {
                "text".to_string()
            },
            quality_flags: flags,
            risk_analysis: assessment,
        });
    }

    let recommendations =
        recommend::generate_recommendations(frame, &feature_diagnostics, target_col);

    QualityReport {
        dataset_id: dataset_id.to_string(),
        rows: n_rows,
        columns: n_cols,
        quality_score,
        metrics: QualityMetrics {
            missing_ratio: round4(missing_ratio),
            duplicate_ratio: round4(duplicate_ratio),
            low_variance_ratio: round4(low_variance_ratio),
            skewness_ratio: round4(skewness_ratio),
        },
        feature_diagnostics,
        recommendations,
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}
