//! Preprocessing recommendations derived from diagnostics and risk labels

use crate::frame::DataFrame;
use crate::score::FeatureDiagnostic;
use indexmap::IndexMap;
use serde::Serialize;

/// Missing percentage above which a numeric imputation is high impact
const HIGH_IMPACT_MISSING_PCT: f64 = 20.0;

/// Minority class ratio below which a binary target is imbalanced
const IMBALANCE_THRESHOLD: f64 = 0.2;

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: String,
    pub scope: String,
    pub target: String,
    pub issue: String,
    pub recommended_action: String,
    pub reason: String,
    pub impact: String,
}

impl Recommendation {
    fn feature(target: &str, kind: &str, issue: &str, action: &str, reason: String, impact: &str) -> Self {
        Self {
            kind: kind.to_string(),
            scope: "Feature".to_string(),
            target: target.to_string(),
            issue: issue.to_string(),
            recommended_action: action.to_string(),
            reason,
            impact: impact.to_string(),
        }
    }
}

/// Build the recommendation list for a scored frame.
///
/// Feature-level entries come from missing values and risk labels; the one
/// dataset-level entry flags an imbalanced binary target.
pub fn generate_recommendations(
    frame: &DataFrame,
    diagnostics: &[FeatureDiagnostic],
    target_col: Option<&str>,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    for diagnostic in diagnostics {
        let feature = diagnostic.feature.as_str();
        let missing_pct = diagnostic.missing_percentage;

        if missing_pct > 0.0 {
            if diagnostic.dtype == "numeric" {
                recommendations.push(Recommendation::feature(
                    feature,
                    "Preprocessing",
                    "Missing Values",
                    "Median Imputation",
                    format!("{}% missing values in numeric feature", missing_pct),
                    if missing_pct > HIGH_IMPACT_MISSING_PCT {
                        "High"
                    } else {
                        "Medium"
                    },
                ));
            } else {
                recommendations.push(Recommendation::feature(
                    feature,
                    "Preprocessing",
                    "Missing Values",
                    "Mode Imputation",
                    format!("{}% missing values in categorical feature", missing_pct),
                    "Medium",
                ));
            }
        }

        let risk = &diagnostic.risk_analysis;
        if risk.risk_label.iter().any(|l| l == "Leakage-Prone") {
            recommendations.push(Recommendation::feature(
                feature,
                "Risk Mitigation",
                "Target Leakage",
                "Drop Feature",
                risk.reason.join(", "),
                "High",
            ));
        }
        if risk.risk_label.iter().any(|l| l == "High Risk") {
            recommendations.push(Recommendation::feature(
                feature,
                "Risk Mitigation",
                "Multicollinearity",
                "Drop or Transform",
                risk.reason.join(", "),
                "Medium",
            ));
        }
    }

    if let Some(rec) = imbalance_recommendation(frame, target_col) {
        recommendations.push(rec);
    }

    recommendations
}

/// Dataset-level class imbalance check for a binary target
fn imbalance_recommendation(frame: &DataFrame, target_col: Option<&str>) -> Option<Recommendation> {
    let target = target_col?;
    let column = frame.column(target)?;

    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for value in column.iter().flatten() {
        *counts.entry(value.as_str()).or_insert(0) += 1;
    }
    if counts.len() != 2 {
        return None;
    }

    let total: usize = counts.values().sum();
    let minority = counts.values().copied().min()?;
    let minority_ratio = minority as f64 / total as f64;
    if minority_ratio >= IMBALANCE_THRESHOLD {
        return None;
    }

    Some(Recommendation {
        kind: "Preprocessing".to_string(),
        scope: "Dataset".to_string(),
        target: target.to_string(),
        issue: "Class Imbalance".to_string(),
        recommended_action: "Apply SMOTE".to_string(),
        reason: format!(
            "Minority class ratio is {}",
            (minority_ratio * 100.0).round() / 100.0
        ),
        impact: "High".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::compute_quality_score;

    fn frame(csv: &str) -> DataFrame {
        DataFrame::from_bytes(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_numeric_missing_values_suggest_median() {
        let f = frame("age,name\n30,Alice\n,Bob\n41,Cara\n25,Dan\n");
        let report = compute_quality_score(&f, "ds", None);

        let rec = report
            .recommendations
            .iter()
            .find(|r| r.target == "age")
            .unwrap();
        assert_eq!(rec.issue, "Missing Values");
        assert_eq!(rec.recommended_action, "Median Imputation");
        assert_eq!(rec.impact, "High");
    }

    #[test]
    fn test_categorical_missing_values_suggest_mode() {
        let f = frame("color,n\nred,1\n,2\nblue,3\nred,4\ngreen,5\nred,6\n");
        let report = compute_quality_score(&f, "ds", None);

        let rec = report
            .recommendations
            .iter()
            .find(|r| r.target == "color")
            .unwrap();
        assert_eq!(rec.recommended_action, "Mode Imputation");
        assert_eq!(rec.impact, "Medium");
    }

    #[test]
    fn test_imbalanced_binary_target() {
        let f = frame("x,label\n1,0\n2,0\n3,0\n4,0\n5,0\n6,0\n7,0\n8,0\n9,0\n10,1\n");
        let report = compute_quality_score(&f, "ds", Some("label"));

        let rec = report
            .recommendations
            .iter()
            .find(|r| r.issue == "Class Imbalance")
            .unwrap();
        assert_eq!(rec.scope, "Dataset");
        assert_eq!(rec.recommended_action, "Apply SMOTE");
        assert_eq!(rec.reason, "Minority class ratio is 0.1");
    }

    #[test]
    fn test_balanced_target_has_no_imbalance_entry() {
        let f = frame("x,label\n1,0\n2,1\n3,0\n4,1\n");
        let report = compute_quality_score(&f, "ds", Some("label"));
        assert!(!report
            .recommendations
            .iter()
            .any(|r| r.issue == "Class Imbalance"));
    }

    #[test]
    fn test_clean_frame_has_no_recommendations() {
        let f = frame("grp,score\na,10\na,20\nb,10\nb,20\n");
        let report = compute_quality_score(&f, "ds", None);
        assert!(report.recommendations.is_empty());
    }
}
