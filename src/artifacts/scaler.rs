//! Standardization parameters artifact.

use serde::{Deserialize, Serialize};

/// Supported `scaler.json` format revision.
pub const SCALER_FORMAT_VERSION: u32 = 1;

/// Per-column mean and scale, in the fitted column order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerParams {
    pub format_version: u32,
    pub columns: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl ScalerParams {
    /// Standardize a raw vector: `(x - mean) / scale` per column.
    pub fn transform(&self, raw: &[f64]) -> Vec<f64> {
        raw.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect()
    }

    /// An identity scaler (mean 0, scale 1) over the given columns.
    pub fn identity(columns: &[&str]) -> Self {
        Self {
            format_version: SCALER_FORMAT_VERSION,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            mean: vec![0.0; columns.len()],
            scale: vec![1.0; columns.len()],
        }
    }

    /// Soundness check against the schema's column layout, run at load time.
    pub(crate) fn validate(&self, expected_columns: &[&str]) -> Result<(), String> {
        if self.format_version != SCALER_FORMAT_VERSION {
            return Err(format!(
                "unsupported format_version {} (expected {})",
                self.format_version, SCALER_FORMAT_VERSION
            ));
        }
        if self.columns.len() != expected_columns.len() {
            return Err(format!(
                "scaler fitted on {} columns, schema has {}",
                self.columns.len(),
                expected_columns.len()
            ));
        }
        for (fitted, expected) in self.columns.iter().zip(expected_columns) {
            if fitted != expected {
                return Err(format!(
                    "scaler column order mismatch: found {:?}, expected {:?}",
                    fitted, expected
                ));
            }
        }
        if self.mean.len() != self.columns.len() || self.scale.len() != self.columns.len() {
            return Err("mean/scale arrays do not match the column count".to_string());
        }
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err("mean contains non-finite values".to_string());
        }
        if self.scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return Err("scale contains zero or non-finite values".to_string());
        }
        Ok(())
    }
}
