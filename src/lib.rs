//! Intrusion Detection Pipeline Library
//!
//! Real-time classification of network connection records against a
//! pre-trained decision-forest artifact bundle, behind a thin HTTP surface.

pub mod artifacts;
pub mod config;
pub mod detector;
pub mod encoder;
pub mod error;
pub mod metrics;
pub mod normalizer;
pub mod schema;
pub mod server;
pub mod sink;
pub mod types;

pub use artifacts::{ArtifactBundle, ArtifactStore};
pub use config::AppConfig;
pub use detector::DetectionEngine;
pub use error::PredictionError;
pub use schema::ConnectionSchema;
pub use types::{prediction::PredictionResult, record::FeatureRecord};
