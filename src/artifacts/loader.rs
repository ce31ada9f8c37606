//! Artifact bundle loading with process-wide at-most-once caching.

use crate::artifacts::classifier::Classifier;
use crate::artifacts::encoders::CategoricalEncoders;
use crate::artifacts::scaler::ScalerParams;
use crate::error::{ArtifactError, ArtifactKind};
use crate::schema::ConnectionSchema;
use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// File names of the three artifacts inside the model directory.
pub const CLASSIFIER_FILE: &str = "classifier.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const ENCODERS_FILE: &str = "categorical_encoders.json";

/// Locations of the persisted artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub classifier: PathBuf,
    pub scaler: PathBuf,
    pub encoders: PathBuf,
}

impl ArtifactPaths {
    /// Standard layout: the three JSON files under one model directory.
    pub fn new<P: AsRef<Path>>(model_dir: P) -> Self {
        let dir = model_dir.as_ref();
        Self {
            classifier: dir.join(CLASSIFIER_FILE),
            scaler: dir.join(SCALER_FILE),
            encoders: dir.join(ENCODERS_FILE),
        }
    }
}

/// The immutable artifact triple every prediction depends on.
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    pub classifier: Classifier,
    pub scaler: ScalerParams,
    pub encoders: CategoricalEncoders,
}

impl ArtifactBundle {
    /// Load and cross-validate all three artifacts against the schema.
    pub fn load(paths: &ArtifactPaths) -> Result<Self, ArtifactError> {
        let schema = ConnectionSchema::new();

        let classifier: Classifier = read_artifact(ArtifactKind::Classifier, &paths.classifier)?;
        classifier
            .validate(schema.field_count())
            .map_err(|reason| ArtifactError::Corrupt {
                kind: ArtifactKind::Classifier,
                path: paths.classifier.clone(),
                reason,
            })?;
        info!(
            trees = classifier.tree_count(),
            classes = ?classifier.classes,
            "classifier artifact loaded"
        );

        let scaler: ScalerParams = read_artifact(ArtifactKind::Scaler, &paths.scaler)?;
        scaler
            .validate(schema.field_names())
            .map_err(|reason| ArtifactError::Corrupt {
                kind: ArtifactKind::Scaler,
                path: paths.scaler.clone(),
                reason,
            })?;
        info!(columns = scaler.columns.len(), "scaler artifact loaded");

        let encoders: CategoricalEncoders = read_artifact(ArtifactKind::Encoders, &paths.encoders)?;
        encoders
            .validate(schema.categorical_fields())
            .map_err(|reason| ArtifactError::Corrupt {
                kind: ArtifactKind::Encoders,
                path: paths.encoders.clone(),
                reason,
            })?;
        info!(
            columns = encoders.vocabularies.len(),
            "categorical encoders artifact loaded"
        );

        Ok(Self {
            classifier,
            scaler,
            encoders,
        })
    }
}

fn read_artifact<T: DeserializeOwned>(kind: ArtifactKind, path: &Path) -> Result<T, ArtifactError> {
    let raw = fs::read_to_string(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            ArtifactError::Missing {
                kind,
                path: path.to_path_buf(),
            }
        } else {
            ArtifactError::Corrupt {
                kind,
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        }
    })?;

    serde_json::from_str(&raw).map_err(|e| ArtifactError::Corrupt {
        kind,
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Serialize one artifact to its JSON file.
pub fn write_artifact<T: Serialize>(path: &Path, artifact: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(artifact)?;
    fs::write(path, json)
}

/// Per-artifact presence report for the model-info surface.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactStatus {
    pub classifier_loaded: bool,
    pub scaler_loaded: bool,
    pub encoders_loaded: bool,
    pub ready: bool,
}

/// Owns the lazily-loaded artifact bundle.
///
/// The first successful [`ArtifactStore::ensure_loaded`] call reads storage
/// and caches the bundle for the process lifetime; concurrent callers race
/// through the cell's exclusive init and all observe the same instance.
/// Failed loads leave the cell empty so the next caller retries.
pub struct ArtifactStore {
    paths: ArtifactPaths,
    bundle: OnceCell<Arc<ArtifactBundle>>,
}

impl ArtifactStore {
    pub fn new(paths: ArtifactPaths) -> Self {
        Self {
            paths,
            bundle: OnceCell::new(),
        }
    }

    /// Cached bundle, loading it on first use.
    pub fn ensure_loaded(&self) -> Result<Arc<ArtifactBundle>, ArtifactError> {
        self.bundle
            .get_or_try_init(|| ArtifactBundle::load(&self.paths).map(Arc::new))
            .map(Arc::clone)
    }

    /// Bundle if already loaded; never touches storage.
    pub fn cached(&self) -> Option<Arc<ArtifactBundle>> {
        self.bundle.get().cloned()
    }

    /// Presence report. A cached bundle counts every artifact as loaded;
    /// before the first load each file is checked on disk.
    pub fn status(&self) -> ArtifactStatus {
        if self.bundle.get().is_some() {
            return ArtifactStatus {
                classifier_loaded: true,
                scaler_loaded: true,
                encoders_loaded: true,
                ready: true,
            };
        }

        let classifier_loaded = self.paths.classifier.exists();
        let scaler_loaded = self.paths.scaler.exists();
        let encoders_loaded = self.paths.encoders.exists();
        ArtifactStatus {
            classifier_loaded,
            scaler_loaded,
            encoders_loaded,
            ready: classifier_loaded && scaler_loaded && encoders_loaded,
        }
    }
}
