//! Numeric coercion, imputation and standardization.

use crate::artifacts::ScalerParams;
use crate::error::NumericCoercionError;
use serde_json::Value;
use tracing::debug;

/// Turns encoded cells into the standardized vector the classifier reads.
///
/// Coercion is forgiving on the realtime path: any cell that cannot be read
/// as a finite number is imputed as zero, the same fill the artifacts were
/// fitted with.
pub struct FeatureNormalizer;

impl FeatureNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Interpret a JSON cell as a finite number if possible.
    fn coerce(cell: &Value) -> Option<f64> {
        let number = match cell {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        };
        number.filter(|n| n.is_finite())
    }

    /// Coerce every cell, impute failures as zero, then standardize with
    /// the fitted scaler. Never fails: bad cells degrade to the fill value.
    pub fn normalize(&self, cells: &[Value], scaler: &ScalerParams) -> Vec<f64> {
        let mut imputed = 0usize;
        let raw: Vec<f64> = cells
            .iter()
            .map(|cell| {
                Self::coerce(cell).unwrap_or_else(|| {
                    imputed += 1;
                    0.0
                })
            })
            .collect();

        if imputed > 0 {
            debug!(imputed, "non-numeric cells imputed as zero");
        }

        scaler.transform(&raw)
    }
}

impl Default for FeatureNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse file content as a whitespace- or comma-separated numeric matrix.
///
/// This is the strict counterpart of record normalization: a bad cell is an
/// error rather than a zero. Blank lines are skipped; rows may come back
/// ragged and are checked for uniform width by the caller.
pub fn parse_matrix(text: &str) -> Result<Vec<Vec<f64>>, NumericCoercionError> {
    let mut matrix = Vec::new();

    for (row, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let mut values = Vec::new();
        for (column, token) in trimmed
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .enumerate()
        {
            let value = token.parse::<f64>().map_err(|_| NumericCoercionError {
                row,
                column,
                value: token.to_string(),
            })?;
            if !value.is_finite() {
                return Err(NumericCoercionError {
                    row,
                    column,
                    value: token.to_string(),
                });
            }
            values.push(value);
        }
        matrix.push(values);
    }

    Ok(matrix)
}
