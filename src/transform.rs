//! Preprocessing actions applied to one column of a frame

use crate::error::{PreplineError, Result};
use crate::frame::DataFrame;
use crate::stats;

/// The supported preprocessing actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    DropFeature,
    MedianImpute,
    MeanImpute,
    ModeImpute,
    LogTransform,
    StandardScale,
}

impl Action {
    /// Parse an action name; None means the name is not in the supported set
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "drop_feature" => Some(Self::DropFeature),
            "median_impute" => Some(Self::MedianImpute),
            "mean_impute" => Some(Self::MeanImpute),
            "mode_impute" => Some(Self::ModeImpute),
            "log_transform" => Some(Self::LogTransform),
            "standard_scale" => Some(Self::StandardScale),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DropFeature => "drop_feature",
            Self::MedianImpute => "median_impute",
            Self::MeanImpute => "mean_impute",
            Self::ModeImpute => "mode_impute",
            Self::LogTransform => "log_transform",
            Self::StandardScale => "standard_scale",
        }
    }

    /// Snapshot descriptor for a step: action name plus a filesystem-safe
    /// form of the feature name
    pub fn descriptor(&self, feature: &str) -> String {
        format!("{}_{}", self.as_str(), sanitize_feature(feature))
    }

    /// Apply this action to the frame in place, returning the step
    /// description for the ledger
    pub fn apply(&self, frame: &mut DataFrame, feature: &str) -> Result<String> {
        if !frame.has_column(feature) {
            return Err(PreplineError::invalid_parameter(format!(
                "Feature not present in dataset: {}",
                feature
            )));
        }

        match self {
            Self::DropFeature => {
                // A snapshot must keep at least one column to round-trip
                // through CSV with its shape intact
                if frame.n_cols() == 1 {
                    return Err(PreplineError::invalid_parameter(
                        "Cannot drop the last remaining column",
                    ));
                }
                frame.drop_column(feature)?;
                Ok(format!("Dropped feature: {}", feature))
            }
            Self::MedianImpute => {
                let fill = stats::median(&frame.numeric_values(feature));
                fill_nulls(frame, feature, fill.map(format_number))?;
                Ok(format!("Median imputation on {}", feature))
            }
            Self::MeanImpute => {
                let fill = stats::mean(&frame.numeric_values(feature));
                fill_nulls(frame, feature, fill.map(format_number))?;
                Ok(format!("Mean imputation on {}", feature))
            }
            Self::ModeImpute => {
                let fill = frame
                    .column(feature)
                    .and_then(|column| stats::mode(column.iter().flatten().map(|v| v.as_str())))
                    .map(|v| v.to_string());
                fill_nulls(frame, feature, fill)?;
                Ok(format!("Mode imputation on {}", feature))
            }
            Self::LogTransform => {
                require_numeric(frame, feature)?;
                // Documented quirk: non-positive values map to 0, not an error
                map_numeric(frame, feature, |v| if v > 0.0 { v.ln() } else { 0.0 })?;
                Ok(format!("Log transform on {}", feature))
            }
            Self::StandardScale => {
                require_numeric(frame, feature)?;
                let values = frame.numeric_values(feature);
                let mean = stats::mean(&values).ok_or_else(|| {
                    PreplineError::invalid_parameter(format!(
                        "Cannot scale {}: column has no values",
                        feature
                    ))
                })?;
                let std = stats::std_dev(&values).filter(|s| *s > 0.0).ok_or_else(|| {
                    PreplineError::invalid_parameter(format!(
                        "Cannot scale {}: standard deviation is zero",
                        feature
                    ))
                })?;
                map_numeric(frame, feature, |v| (v - mean) / std)?;
                Ok(format!("Standard scaling on {}", feature))
            }
        }
    }
}

/// Replace non [A-Za-z0-9_-] characters so the feature name is safe inside
/// a snapshot filename
fn sanitize_feature(feature: &str) -> String {
    feature
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

fn require_numeric(frame: &DataFrame, feature: &str) -> Result<()> {
    if frame.is_numeric_column(feature) {
        Ok(())
    } else {
        Err(PreplineError::invalid_parameter(format!(
            "Feature is not numeric: {}",
            feature
        )))
    }
}

/// Fill null cells with the given value; with no fill value the column is
/// left as-is (an all-null column has no statistic to impute from)
fn fill_nulls(frame: &mut DataFrame, feature: &str, fill: Option<String>) -> Result<()> {
    let Some(fill) = fill else { return Ok(()) };
    let Some(column) = frame.column(feature) else {
        return Err(PreplineError::invalid_parameter(format!(
            "No such column: {}",
            feature
        )));
    };

    let filled = column
        .iter()
        .map(|cell| Some(cell.clone().unwrap_or_else(|| fill.clone())))
        .collect();
    frame.set_column(feature, filled)
}

/// Apply f to every non-null cell of a numeric column, keeping nulls
fn map_numeric<F: Fn(f64) -> f64>(frame: &mut DataFrame, feature: &str, f: F) -> Result<()> {
    let Some(column) = frame.column(feature) else {
        return Err(PreplineError::invalid_parameter(format!(
            "No such column: {}",
            feature
        )));
    };

    let mapped = column
        .iter()
        .map(|cell| {
            cell.as_ref().map(|v| match v.trim().parse::<f64>() {
                Ok(parsed) => format_number(f(parsed)),
                // Unreachable after require_numeric; pass through untouched
                Err(_) => v.clone(),
            })
        })
        .collect();
    frame.set_column(feature, mapped)
}

/// Render whole numbers without a trailing fraction so imputed integers
/// look like their neighbors
fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        v.to_string()
    }
}
