//! Canonical connection-record schema.
//!
//! The 41-field layout is fixed by the trained artifacts: the scaler and
//! the classifier both address columns by position in this order, so the
//! order here must never change independently of the model files.

use crate::error::SchemaError;
use crate::types::record::FeatureRecord;

/// Number of columns in a complete record.
pub const FEATURE_COUNT: usize = 41;

/// Column names in the order the artifacts were fitted.
const FIELD_NAMES: [&str; FEATURE_COUNT] = [
    "duration",
    "protocol_type",
    "service",
    "flag",
    "src_bytes",
    "dst_bytes",
    "land",
    "wrong_fragment",
    "urgent",
    "hot",
    "num_failed_logins",
    "logged_in",
    "num_compromised",
    "root_shell",
    "su_attempted",
    "num_root",
    "num_file_creations",
    "num_shells",
    "num_access_files",
    "num_outbound_cmds",
    "is_host_login",
    "is_guest_login",
    "count",
    "srv_count",
    "serror_rate",
    "srv_serror_rate",
    "rerror_rate",
    "srv_rerror_rate",
    "same_srv_rate",
    "diff_srv_rate",
    "srv_diff_host_rate",
    "dst_host_count",
    "dst_host_srv_count",
    "dst_host_same_srv_rate",
    "dst_host_diff_srv_rate",
    "dst_host_same_src_port_rate",
    "dst_host_srv_diff_host_rate",
    "dst_host_serror_rate",
    "dst_host_srv_serror_rate",
    "dst_host_rerror_rate",
    "dst_host_srv_rerror_rate",
];

/// Columns that hold categorical strings rather than numbers.
const CATEGORICAL_FIELDS: [&str; 3] = ["protocol_type", "service", "flag"];

/// Schema validator for incoming feature records.
pub struct ConnectionSchema;

impl ConnectionSchema {
    pub fn new() -> Self {
        Self
    }

    /// Column names in canonical order.
    pub fn field_names(&self) -> &'static [&'static str] {
        &FIELD_NAMES
    }

    /// Names of the categorical columns.
    pub fn categorical_fields(&self) -> &'static [&'static str] {
        &CATEGORICAL_FIELDS
    }

    pub fn field_count(&self) -> usize {
        FIELD_NAMES.len()
    }

    pub fn is_categorical(&self, field: &str) -> bool {
        CATEGORICAL_FIELDS.contains(&field)
    }

    /// Check that every canonical field is present in the record.
    ///
    /// Reports the complete set of absent fields in canonical order.
    /// Values are not inspected here; coercion happens later in the
    /// pipeline. Extra keys are ignored.
    pub fn validate(&self, record: &FeatureRecord) -> Result<(), SchemaError> {
        let missing_fields: Vec<String> = FIELD_NAMES
            .iter()
            .filter(|name| !record.contains(name))
            .map(|name| name.to_string())
            .collect();

        if missing_fields.is_empty() {
            Ok(())
        } else {
            Err(SchemaError { missing_fields })
        }
    }
}

impl Default for ConnectionSchema {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::record::sample_normal_record;

    #[test]
    fn test_field_layout() {
        let schema = ConnectionSchema::new();
        assert_eq!(schema.field_count(), 41);
        assert_eq!(schema.field_names()[0], "duration");
        assert_eq!(schema.field_names()[11], "logged_in");
        assert_eq!(schema.field_names()[22], "count");
        assert_eq!(schema.field_names()[24], "serror_rate");
        assert_eq!(schema.field_names()[28], "same_srv_rate");
        assert_eq!(schema.field_names()[40], "dst_host_srv_rerror_rate");
    }

    #[test]
    fn test_categorical_fields() {
        let schema = ConnectionSchema::new();
        assert!(schema.is_categorical("protocol_type"));
        assert!(schema.is_categorical("service"));
        assert!(schema.is_categorical("flag"));
        assert!(!schema.is_categorical("duration"));
        assert!(!schema.is_categorical("src_bytes"));
    }

    #[test]
    fn test_complete_record_validates() {
        let schema = ConnectionSchema::new();
        assert!(schema.validate(&sample_normal_record()).is_ok());
    }

    #[test]
    fn test_each_missing_field_is_reported_by_name() {
        let schema = ConnectionSchema::new();
        for field in schema.field_names() {
            let mut record = sample_normal_record();
            record.remove(field);

            let err = schema.validate(&record).unwrap_err();
            assert_eq!(err.missing_fields, vec![field.to_string()]);
        }
    }

    #[test]
    fn test_empty_record_reports_all_fields_in_order() {
        let schema = ConnectionSchema::new();
        let err = schema.validate(&FeatureRecord::new()).unwrap_err();

        assert_eq!(err.missing_fields.len(), 41);
        assert_eq!(err.missing_fields[0], "duration");
        assert_eq!(err.missing_fields[40], "dst_host_srv_rerror_rate");
    }

    #[test]
    fn test_extra_keys_are_ignored() {
        let schema = ConnectionSchema::new();
        let mut record = sample_normal_record();
        record.set("not_a_schema_field", 42);
        assert!(schema.validate(&record).is_ok());
    }
}
