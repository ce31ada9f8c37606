//! Error taxonomy for the detection pipeline.
//!
//! Components raise the most specific error they can; everything that can
//! fail a prediction converges into [`PredictionError`], which the HTTP
//! layer renders as a status code plus an `{"error": ...}` body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which persisted artifact an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Classifier,
    Scaler,
    Encoders,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Classifier => write!(f, "classifier"),
            ArtifactKind::Scaler => write!(f, "scaler"),
            ArtifactKind::Encoders => write!(f, "categorical encoders"),
        }
    }
}

/// Artifact storage failures. Fatal until the files are fixed; the bundle
/// cache stays empty so a later call retries the load.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("{kind} artifact not found at {}", path.display())]
    Missing { kind: ArtifactKind, path: PathBuf },

    #[error("{kind} artifact at {} is invalid: {reason}", path.display())]
    Corrupt {
        kind: ArtifactKind,
        path: PathBuf,
        reason: String,
    },
}

impl ArtifactError {
    /// The artifact this error is about.
    pub fn kind(&self) -> ArtifactKind {
        match self {
            ArtifactError::Missing { kind, .. } => *kind,
            ArtifactError::Corrupt { kind, .. } => *kind,
        }
    }
}

/// An incoming record that does not carry every schema field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required fields: {}", missing_fields.join(", "))]
pub struct SchemaError {
    /// Absent field names, in canonical schema order.
    pub missing_fields: Vec<String>,
}

/// A categorical value outside the fitted vocabulary, with no "other"
/// bucket to fall back on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown value {value:?} in column {column:?} and no \"other\" category is fitted")]
pub struct UnknownCategoryError {
    pub column: String,
    pub value: String,
}

/// A batch matrix cell that cannot be read as a finite number.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("row {row}, column {column}: cannot read {value:?} as a number")]
pub struct NumericCoercionError {
    pub row: usize,
    pub column: usize,
    pub value: String,
}

/// Top-level failure of a prediction request.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    UnknownCategory(#[from] UnknownCategoryError),

    #[error(transparent)]
    Coercion(#[from] NumericCoercionError),

    /// Classifier-internal failure (shape mismatch, corrupt tree walk).
    #[error("classifier evaluation failed: {0}")]
    Classifier(String),
}

impl IntoResponse for PredictionError {
    fn into_response(self) -> Response {
        let status = match &self {
            PredictionError::Schema(_)
            | PredictionError::UnknownCategory(_)
            | PredictionError::Coercion(_) => StatusCode::BAD_REQUEST,
            PredictionError::Artifact(_) => StatusCode::SERVICE_UNAVAILABLE,
            PredictionError::Classifier(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "prediction request failed");
        } else {
            tracing::warn!(error = %self, "prediction request rejected");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_lists_fields() {
        let err = SchemaError {
            missing_fields: vec!["duration".to_string(), "flag".to_string()],
        };
        assert_eq!(err.to_string(), "missing required fields: duration, flag");
    }

    #[test]
    fn test_status_mapping() {
        let schema: PredictionError = SchemaError {
            missing_fields: vec!["duration".to_string()],
        }
        .into();
        assert_eq!(schema.into_response().status(), StatusCode::BAD_REQUEST);

        let artifact: PredictionError = ArtifactError::Missing {
            kind: ArtifactKind::Classifier,
            path: PathBuf::from("model/classifier.json"),
        }
        .into();
        assert_eq!(
            artifact.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );

        let classifier = PredictionError::Classifier("bad shape".to_string());
        assert_eq!(
            classifier.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_artifact_error_kind() {
        let err = ArtifactError::Corrupt {
            kind: ArtifactKind::Scaler,
            path: PathBuf::from("model/scaler.json"),
            reason: "truncated".to_string(),
        };
        assert_eq!(err.kind(), ArtifactKind::Scaler);
        assert!(err.to_string().contains("scaler"));
    }
}
