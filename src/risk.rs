//! Feature risk and leakage detection

use crate::frame::DataFrame;
use crate::stats;
use indexmap::IndexMap;
use serde::Serialize;

/// Unique-value ratio above which a column looks like an identifier
const ID_LIKE_RATIO: f64 = 0.95;

/// Absolute correlation with the target above which a feature is
/// leakage-prone
const TARGET_CORR_THRESHOLD: f64 = 0.9;

/// Absolute pairwise correlation between two features above which they are
/// treated as multicollinear
const COLLINEARITY_THRESHOLD: f64 = 0.95;

/// Risk assessment for one feature
#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessment {
    pub risk_label: Vec<String>,
    pub reason: Vec<String>,
    pub suggested_action: Vec<String>,
}

impl RiskAssessment {
    fn flag(&mut self, label: &str, reason: &str, action: &str) {
        self.risk_label.push(label.to_string());
        self.reason.push(reason.to_string());
        self.suggested_action.push(action.to_string());
    }
}

/// Assess every column for leakage and multicollinearity risk.
///
/// Multicollinearity uses pairwise correlation between numeric features as
/// a lightweight stand-in for a full variance-inflation analysis.
pub fn detect_feature_risks(
    frame: &DataFrame,
    target_col: Option<&str>,
) -> IndexMap<String, RiskAssessment> {
    let numeric_cols: Vec<String> = frame
        .column_names()
        .iter()
        .filter(|name| frame.is_numeric_column(name))
        .map(|name| name.to_string())
        .collect();

    let target_corr = target_correlations(frame, target_col, &numeric_cols);
    let collinear = collinear_partners(frame, &numeric_cols);

    let mut results = IndexMap::new();
    for name in frame.column_names() {
        let mut assessment = RiskAssessment {
            risk_label: Vec::new(),
            reason: Vec::new(),
            suggested_action: Vec::new(),
        };

        if frame.n_rows() > 0 {
            let unique_ratio = frame.distinct_count(name) as f64 / frame.n_rows() as f64;
            if unique_ratio > ID_LIKE_RATIO {
                assessment.flag("Leakage-Prone", "High cardinality (ID-like)", "Drop");
            }
        }

        if let Some(corr) = target_corr.get(name) {
            if corr.abs() > TARGET_CORR_THRESHOLD {
                assessment.flag("Leakage-Prone", "Highly correlated with target", "Drop");
            }
        }

        if let Some(partner) = collinear.get(name) {
            assessment.flag(
                "High Risk",
                &format!("High multicollinearity (with {})", partner),
                "Drop or Transform",
            );
        }

        if assessment.risk_label.is_empty() {
            assessment.flag("Safe", "No significant risk detected", "Retain");
        }

        results.insert(name.to_string(), assessment);
    }

    results
}

/// Correlation of each numeric feature with the target, over rows where
/// both values are present
fn target_correlations(
    frame: &DataFrame,
    target_col: Option<&str>,
    numeric_cols: &[String],
) -> IndexMap<String, f64> {
    let mut correlations = IndexMap::new();

    let Some(target) = target_col else {
        return correlations;
    };
    if !frame.has_column(target) || !frame.is_numeric_column(target) {
        return correlations;
    }

    for name in numeric_cols {
        if name == target {
            continue;
        }
        let (xs, ys) = paired_values(frame, name, target);
        if let Some(corr) = stats::pearson(&xs, &ys) {
            correlations.insert(name.clone(), corr);
        }
    }

    correlations
}

/// For each numeric feature, the first other numeric feature it is highly
/// correlated with, if any
fn collinear_partners(frame: &DataFrame, numeric_cols: &[String]) -> IndexMap<String, String> {
    let mut partners = IndexMap::new();

    for (i, a) in numeric_cols.iter().enumerate() {
        for b in numeric_cols.iter().skip(i + 1) {
            let (xs, ys) = paired_values(frame, a, b);
            if let Some(corr) = stats::pearson(&xs, &ys) {
                if corr.abs() > COLLINEARITY_THRESHOLD {
                    partners.entry(a.clone()).or_insert_with(|| b.clone());
                    partners.entry(b.clone()).or_insert_with(|| a.clone());
                }
            }
        }
    }

    partners
}

/// Parallel numeric values of two columns over rows where both parse
fn paired_values(frame: &DataFrame, a: &str, b: &str) -> (Vec<f64>, Vec<f64>) {
    let (Some(col_a), Some(col_b)) = (frame.column(a), frame.column(b)) else {
        return (Vec::new(), Vec::new());
    };

    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for (cell_a, cell_b) in col_a.iter().zip(col_b) {
        let parsed_a = cell_a.as_ref().and_then(|v| v.trim().parse::<f64>().ok());
        let parsed_b = cell_b.as_ref().and_then(|v| v.trim().parse::<f64>().ok());
        if let (Some(x), Some(y)) = (parsed_a, parsed_b) {
            xs.push(x);
            ys.push(y);
        }
    }

    (xs, ys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_like_column_flagged() {
        let csv = "id,grp\n1,a\n2,a\n3,b\n4,b\n5,a\n";
        let frame = DataFrame::from_bytes(csv.as_bytes()).unwrap();
        let risks = detect_feature_risks(&frame, None);

        assert!(risks["id"].risk_label.contains(&"Leakage-Prone".to_string()));
        assert_eq!(risks["grp"].risk_label, vec!["Safe"]);
    }

    #[test]
    fn test_target_correlation_flagged() {
        // x is a perfect linear function of the target; noise repeats
        // values so it cannot trip the cardinality rule instead
        let csv = "x,noise,y\n1,5,2\n2,9,4\n3,5,6\n4,9,8\n";
        let frame = DataFrame::from_bytes(csv.as_bytes()).unwrap();
        let risks = detect_feature_risks(&frame, Some("y"));

        assert!(risks["x"].risk_label.contains(&"Leakage-Prone".to_string()));
        assert!(!risks["noise"]
            .risk_label
            .contains(&"Leakage-Prone".to_string()));
    }

    #[test]
    fn test_collinear_pair_flagged() {
        let csv = "a,b,c\n1,2,5\n2,4,1\n3,6,9\n4,8,2\n5,10,6\n";
        let frame = DataFrame::from_bytes(csv.as_bytes()).unwrap();
        let risks = detect_feature_risks(&frame, None);

        assert!(risks["a"].risk_label.contains(&"High Risk".to_string()));
        assert!(risks["b"].risk_label.contains(&"High Risk".to_string()));
        assert!(!risks["c"].risk_label.contains(&"High Risk".to_string()));
    }

    #[test]
    fn test_safe_default() {
        let csv = "grp\na\na\nb\nb\n";
        let frame = DataFrame::from_bytes(csv.as_bytes()).unwrap();
        let risks = detect_feature_risks(&frame, None);

        assert_eq!(risks["grp"].risk_label, vec!["Safe"]);
        assert_eq!(risks["grp"].suggested_action, vec!["Retain"]);
    }
}
