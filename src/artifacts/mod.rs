//! Persisted model artifacts: typed formats, validation, loading, caching.

pub mod classifier;
pub mod encoders;
pub mod loader;
pub mod scaler;

pub use classifier::{Classifier, DecisionTree, TreeNode};
pub use encoders::CategoricalEncoders;
pub use loader::{write_artifact, ArtifactBundle, ArtifactPaths, ArtifactStatus, ArtifactStore};
pub use scaler::ScalerParams;
