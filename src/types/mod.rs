//! Type definitions for the detection pipeline

pub mod prediction;
pub mod record;

pub use prediction::{
    BatchPredictionSummary, FileDiagnostic, FileOutcome, PredictionResult, TopFeatures,
    TrafficLabel,
};
pub use record::FeatureRecord;
