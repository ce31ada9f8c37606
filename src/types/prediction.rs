//! Prediction output types.

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Binary traffic classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficLabel {
    Normal,
    Attack,
}

impl TrafficLabel {
    /// Label from the canonical anomaly flag (true means attack).
    pub fn from_anomaly_flag(flag: bool) -> Self {
        if flag {
            TrafficLabel::Attack
        } else {
            TrafficLabel::Normal
        }
    }

    pub fn is_attack(&self) -> bool {
        matches!(self, TrafficLabel::Attack)
    }
}

/// Ranked feature importances.
///
/// Serialized as a JSON object whose keys appear in descending-importance
/// order, so the ranking survives the trip to the client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopFeatures(Vec<(String, f64)>);

impl TopFeatures {
    /// Build from pairs already sorted by descending importance.
    pub fn from_ranked(pairs: Vec<(String, f64)>) -> Self {
        Self(pairs)
    }

    /// Feature names in rank order.
    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for TopFeatures {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, importance) in &self.0 {
            map.serialize_entry(name, importance)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TopFeatures {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TopFeaturesVisitor;

        impl<'de> Visitor<'de> for TopFeaturesVisitor {
            type Value = TopFeatures;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of feature name to importance weight")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut pairs = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, importance)) = access.next_entry::<String, f64>()? {
                    pairs.push((name, importance));
                }
                Ok(TopFeatures(pairs))
            }
        }

        deserializer.deserialize_map(TopFeaturesVisitor)
    }
}

/// Outcome of a single-record detection.
///
/// The probability fields are null when the loaded classifier votes labels
/// without class probabilities (the one-class variant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub prediction: TrafficLabel,
    /// Highest class probability.
    pub confidence: Option<f64>,
    pub is_attack: bool,
    pub probability_normal: Option<f64>,
    pub probability_attack: Option<f64>,
    /// Train-time global importances of the heaviest schema fields. These
    /// describe what the model weighs overall, not this record.
    pub top_features: TopFeatures,
}

impl PredictionResult {
    /// A label-only result with no probability information.
    pub fn new(prediction: TrafficLabel) -> Self {
        Self {
            prediction,
            confidence: None,
            is_attack: prediction.is_attack(),
            probability_normal: None,
            probability_attack: None,
            top_features: TopFeatures::default(),
        }
    }

    /// Attach the class probability pair; confidence becomes their maximum.
    pub fn with_probabilities(mut self, normal: f64, attack: f64) -> Self {
        self.confidence = Some(normal.max(attack));
        self.probability_normal = Some(normal);
        self.probability_attack = Some(attack);
        self
    }

    pub fn with_top_features(mut self, top_features: TopFeatures) -> Self {
        self.top_features = top_features;
        self
    }
}

/// Aggregate outcome of a batch run over a pre-scaled numeric matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPredictionSummary {
    /// Per-sample flags, uniformly 1 for anomaly and 0 for normal.
    pub predictions: Vec<u8>,
    pub num_samples: usize,
    pub num_anomalies: usize,
    /// `num_anomalies / num_samples`; 0.0 for an empty batch.
    pub anomaly_ratio: f64,
    /// "attack" as soon as a single anomaly is present.
    pub prediction: TrafficLabel,
    /// Mean per-sample confidence; null without class probabilities.
    pub confidence: Option<f64>,
}

/// Fallback report for an uploaded file that does not parse as a numeric
/// matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDiagnostic {
    pub file_name: String,
    pub line_count: usize,
    pub note: String,
    pub timestamp: DateTime<Utc>,
}

impl FileDiagnostic {
    pub fn new(file_name: impl Into<String>, line_count: usize, note: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            line_count,
            note: note.into(),
            timestamp: Utc::now(),
        }
    }
}

/// What a file-processing request produced.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FileOutcome {
    Batch(BatchPredictionSummary),
    Diagnostic(FileDiagnostic),
}
