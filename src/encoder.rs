//! Categorical encoding of incoming records.

use crate::artifacts::CategoricalEncoders;
use crate::error::PredictionError;
use crate::schema::ConnectionSchema;
use crate::types::record::FeatureRecord;
use serde_json::Value;

/// Rewrites a record's categorical cells to their fitted vocabulary codes,
/// emitting all cells in canonical column order.
pub struct RecordEncoder {
    schema: ConnectionSchema,
}

impl RecordEncoder {
    pub fn new() -> Self {
        Self {
            schema: ConnectionSchema::new(),
        }
    }

    /// Cells in canonical order, with protocol_type, service and flag
    /// replaced by their vocabulary codes.
    ///
    /// Categorical cells are looked up by their literal JSON rendering, so
    /// a non-string cell still gets a deterministic key: `17` is matched as
    /// "17", `null` as "null". Unfitted keys take the "other" bucket.
    pub fn encode(
        &self,
        record: &FeatureRecord,
        encoders: &CategoricalEncoders,
    ) -> Result<Vec<Value>, PredictionError> {
        let mut cells = Vec::with_capacity(self.schema.field_count());

        for field in self.schema.field_names() {
            let cell = record.get(field);
            if self.schema.is_categorical(field) {
                let text = match cell {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => Value::Null.to_string(),
                };
                let code = encoders.encode(field, &text)?;
                cells.push(Value::from(code));
            } else {
                cells.push(cell.cloned().unwrap_or(Value::Null));
            }
        }

        Ok(cells)
    }
}

impl Default for RecordEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::testutil::sample_encoders;
    use crate::error::PredictionError;
    use crate::types::record::sample_normal_record;
    use std::collections::HashMap;

    #[test]
    fn test_encodes_in_canonical_order() {
        let encoder = RecordEncoder::new();
        let cells = encoder
            .encode(&sample_normal_record(), &sample_encoders())
            .unwrap();

        assert_eq!(cells.len(), 41);
        assert_eq!(cells[0], Value::from(0)); // duration
        assert_eq!(cells[1], Value::from(2)); // tcp
        assert_eq!(cells[2], Value::from(1)); // http
        assert_eq!(cells[3], Value::from(2)); // SF
        assert_eq!(cells[4], Value::from(181)); // src_bytes
        assert_eq!(cells[28], Value::from(1.0)); // same_srv_rate
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let encoder = RecordEncoder::new();
        let encoders = sample_encoders();
        let record = sample_normal_record();

        let first = encoder.encode(&record, &encoders).unwrap();
        let second = encoder.encode(&record, &encoders).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_service_takes_the_other_bucket() {
        let encoder = RecordEncoder::new();
        let encoders = sample_encoders();

        let mut record = sample_normal_record();
        record.set("service", "zzz_unknown");

        let cells = encoder.encode(&record, &encoders).unwrap();
        let other = encoders.encode("service", "other").unwrap();
        assert_eq!(cells[2], Value::from(other));
    }

    #[test]
    fn test_non_string_categorical_uses_its_json_rendering() {
        let encoder = RecordEncoder::new();
        let mut encoders = sample_encoders();
        let vocabulary = encoders.vocabularies.get_mut("service").unwrap();
        vocabulary.push("17".to_string());
        let code = vocabulary.len() - 1;

        let mut record = sample_normal_record();
        record.set("service", 17);

        let cells = encoder.encode(&record, &encoders).unwrap();
        assert_eq!(cells[2], Value::from(code));
    }

    #[test]
    fn test_unknown_value_without_other_bucket_is_an_error() {
        let encoder = RecordEncoder::new();
        let mut vocabularies = HashMap::new();
        vocabularies.insert("protocol_type".to_string(), vec!["tcp".to_string()]);
        vocabularies.insert("service".to_string(), vec!["http".to_string()]);
        vocabularies.insert("flag".to_string(), vec!["SF".to_string()]);
        let encoders = CategoricalEncoders {
            format_version: 1,
            vocabularies,
        };

        let mut record = sample_normal_record();
        record.set("flag", "S0");

        match encoder.encode(&record, &encoders).unwrap_err() {
            PredictionError::UnknownCategory(err) => {
                assert_eq!(err.column, "flag");
                assert_eq!(err.value, "S0");
            }
            other => panic!("expected an unknown-category error, got {other}"),
        }
    }
}
