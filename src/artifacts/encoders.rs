//! Categorical vocabulary artifact.

use crate::error::UnknownCategoryError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Supported `categorical_encoders.json` format revision.
pub const ENCODERS_FORMAT_VERSION: u32 = 1;

/// Reserved fallback bucket for values outside the fitted vocabulary.
pub const FALLBACK_CATEGORY: &str = "other";

/// Fitted vocabularies for the categorical columns. Each vocabulary is an
/// ordered list of known string values whose position is the encoded code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalEncoders {
    pub format_version: u32,
    pub vocabularies: HashMap<String, Vec<String>>,
}

impl CategoricalEncoders {
    /// Encode one value: its vocabulary position, or the position of the
    /// "other" bucket when the value was never seen in training.
    pub fn encode(&self, column: &str, value: &str) -> Result<usize, UnknownCategoryError> {
        let vocabulary =
            self.vocabularies
                .get(column)
                .ok_or_else(|| UnknownCategoryError {
                    column: column.to_string(),
                    value: value.to_string(),
                })?;

        if let Some(position) = vocabulary.iter().position(|known| known == value) {
            return Ok(position);
        }

        match vocabulary.iter().position(|known| known == FALLBACK_CATEGORY) {
            Some(fallback) => {
                warn!(column = %column, value = %value, "unknown category, encoding as \"other\"");
                Ok(fallback)
            }
            None => Err(UnknownCategoryError {
                column: column.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// Soundness check against the schema's categorical columns, run at
    /// load time. A missing "other" bucket is tolerated here; it only
    /// becomes an error when an unknown value actually needs it.
    pub(crate) fn validate(&self, expected_columns: &[&str]) -> Result<(), String> {
        if self.format_version != ENCODERS_FORMAT_VERSION {
            return Err(format!(
                "unsupported format_version {} (expected {})",
                self.format_version, ENCODERS_FORMAT_VERSION
            ));
        }

        for column in expected_columns {
            match self.vocabularies.get(*column) {
                None => return Err(format!("no vocabulary for column {:?}", column)),
                Some(vocabulary) if vocabulary.is_empty() => {
                    return Err(format!("empty vocabulary for column {:?}", column))
                }
                Some(vocabulary) => {
                    if !vocabulary.iter().any(|v| v == FALLBACK_CATEGORY) {
                        warn!(column = %column, "vocabulary has no \"other\" fallback bucket");
                    }
                }
            }
        }

        Ok(())
    }
}
