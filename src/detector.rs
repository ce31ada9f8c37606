//! Detection engine: the full path from raw record to persisted result.

use crate::artifacts::{ArtifactBundle, ArtifactPaths, ArtifactStatus, ArtifactStore, Classifier};
use crate::config::AppConfig;
use crate::encoder::RecordEncoder;
use crate::error::{ArtifactError, PredictionError};
use crate::normalizer::{parse_matrix, FeatureNormalizer};
use crate::schema::ConnectionSchema;
use crate::sink::ResultSink;
use crate::types::prediction::{
    BatchPredictionSummary, FileDiagnostic, FileOutcome, PredictionResult, TopFeatures,
    TrafficLabel,
};
use crate::types::record::FeatureRecord;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info};

/// Ties the pipeline stages together behind one synchronous surface.
///
/// The engine is stateless apart from the artifact cache and is shared
/// across request handlers behind an `Arc`.
pub struct DetectionEngine {
    schema: ConnectionSchema,
    encoder: RecordEncoder,
    normalizer: FeatureNormalizer,
    store: ArtifactStore,
    sink: ResultSink,
}

impl DetectionEngine {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_paths(
            ArtifactPaths::new(&config.artifacts.model_dir),
            ResultSink::new(&config.artifacts.results_file),
        )
    }

    /// Engine with explicit artifact and snapshot locations.
    pub fn with_paths(paths: ArtifactPaths, sink: ResultSink) -> Self {
        Self {
            schema: ConnectionSchema::new(),
            encoder: RecordEncoder::new(),
            normalizer: FeatureNormalizer::new(),
            store: ArtifactStore::new(paths),
            sink,
        }
    }

    /// Load (or fetch the cached) artifact bundle.
    pub fn ensure_ready(&self) -> Result<Arc<ArtifactBundle>, ArtifactError> {
        self.store.ensure_loaded()
    }

    pub fn artifact_status(&self) -> ArtifactStatus {
        self.store.status()
    }

    pub fn sink(&self) -> &ResultSink {
        &self.sink
    }

    /// Classify one record: validate, encode, standardize, predict,
    /// persist the result snapshot.
    ///
    /// Validation runs before the artifacts are touched, so an incomplete
    /// record is reported even while the bundle is unavailable.
    pub fn detect(&self, record: &FeatureRecord) -> Result<PredictionResult, PredictionError> {
        self.schema.validate(record)?;
        let bundle = self.store.ensure_loaded()?;

        let cells = self.encoder.encode(record, &bundle.encoders)?;
        let scaled = self.normalizer.normalize(&cells, &bundle.scaler);

        let scores = bundle.classifier.class_scores(&scaled)?;
        let raw_class = bundle.classifier.class_for_scores(&scores);
        let label = TrafficLabel::from_anomaly_flag(bundle.classifier.is_anomaly(raw_class));

        let mut result = PredictionResult::new(label)
            .with_top_features(self.rank_top_features(&bundle.classifier));
        if bundle.classifier.is_probabilistic() {
            result = result.with_probabilities(scores[0], scores[1]);
        }

        debug!(
            prediction = ?result.prediction,
            confidence = ?result.confidence,
            "record classified"
        );

        self.sink.persist(&result);
        Ok(result)
    }

    /// Row-wise prediction over an already-standardized matrix.
    ///
    /// Batch rows come from the same offline preprocessing that exported
    /// the artifacts, so they are taken as scaled and are not validated
    /// against the record schema.
    pub fn detect_batch(
        &self,
        matrix: &[Vec<f64>],
    ) -> Result<BatchPredictionSummary, PredictionError> {
        let bundle = self.store.ensure_loaded()?;
        let classifier = &bundle.classifier;

        let mut predictions = Vec::with_capacity(matrix.len());
        let mut confidences = Vec::new();

        for row in matrix {
            let scores = classifier.class_scores(row)?;
            let raw_class = classifier.class_for_scores(&scores);
            predictions.push(classifier.is_anomaly(raw_class) as u8);

            if classifier.is_probabilistic() {
                confidences.push(scores.iter().copied().fold(f64::MIN, f64::max));
            }
        }

        let num_samples = predictions.len();
        let num_anomalies = predictions.iter().filter(|&&p| p == 1).count();
        let anomaly_ratio = if num_samples > 0 {
            num_anomalies as f64 / num_samples as f64
        } else {
            0.0
        };
        let confidence = if confidences.is_empty() {
            None
        } else {
            Some(confidences.iter().sum::<f64>() / confidences.len() as f64)
        };

        let summary = BatchPredictionSummary {
            predictions,
            num_samples,
            num_anomalies,
            anomaly_ratio,
            prediction: TrafficLabel::from_anomaly_flag(num_anomalies > 0),
            confidence,
        };

        info!(
            num_samples = summary.num_samples,
            num_anomalies = summary.num_anomalies,
            anomaly_ratio = summary.anomaly_ratio,
            "batch prediction complete"
        );

        self.sink.persist(&summary);
        Ok(summary)
    }

    /// Process uploaded file content: a numeric matrix of the classifier's
    /// width becomes a batch prediction, anything else becomes a diagnostic
    /// note. Either outcome is persisted as the latest result.
    pub fn process_file(
        &self,
        file_name: &str,
        content: &str,
    ) -> Result<FileOutcome, PredictionError> {
        let line_count = content.lines().count();

        let note = match parse_matrix(content) {
            Ok(matrix) if matrix.is_empty() => "no numeric rows found".to_string(),
            Ok(matrix) => {
                let width = matrix[0].len();
                if matrix.iter().any(|row| row.len() != width) {
                    "rows have inconsistent column counts".to_string()
                } else {
                    let bundle = self.store.ensure_loaded()?;
                    if width != bundle.classifier.n_features {
                        format!(
                            "rows have {} columns, classifier expects {}",
                            width, bundle.classifier.n_features
                        )
                    } else {
                        let summary = self.detect_batch(&matrix)?;
                        return Ok(FileOutcome::Batch(summary));
                    }
                }
            }
            Err(e) => e.to_string(),
        };

        info!(file = %file_name, note = %note, "file content is not scorable, recording a diagnostic");
        let diagnostic = FileDiagnostic::new(file_name, line_count, note);
        self.sink.persist(&diagnostic);
        Ok(FileOutcome::Diagnostic(diagnostic))
    }

    /// Train-time importances of the five heaviest schema fields, in rank
    /// order. Stable sorting keeps canonical column order between equal
    /// weights.
    fn rank_top_features(&self, classifier: &Classifier) -> TopFeatures {
        let importances = match classifier.global_feature_importance() {
            Some(importances) => importances,
            None => return TopFeatures::default(),
        };

        let names = self.schema.field_names();
        let mut ranked: Vec<(usize, f64)> = importances.iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        TopFeatures::from_ranked(
            ranked
                .into_iter()
                .take(5)
                .filter_map(|(index, weight)| {
                    names.get(index).map(|name| (name.to_string(), weight))
                })
                .collect(),
        )
    }
}
