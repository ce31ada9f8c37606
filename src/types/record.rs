//! Incoming feature record type.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One network-connection observation, a mapping from schema field names to
/// scalar JSON values.
///
/// The shape is deliberately open: extra keys are carried but never read,
/// and missing keys are caught by schema validation rather than by
/// deserialization, so the client gets a field-by-field report instead of a
/// serde error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureRecord {
    fields: Map<String, Value>,
}

impl FeatureRecord {
    pub fn new() -> Self {
        Self { fields: Map::new() }
    }

    /// Value of a field, if present.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Set a field value, replacing any previous one.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A known-benign HTTP connection, used as the baseline record across
/// pipeline tests.
#[cfg(test)]
pub(crate) fn sample_normal_record() -> FeatureRecord {
    let mut record = FeatureRecord::new();
    record.set("duration", 0);
    record.set("protocol_type", "tcp");
    record.set("service", "http");
    record.set("flag", "SF");
    record.set("src_bytes", 181);
    record.set("dst_bytes", 545);
    record.set("land", 0);
    record.set("wrong_fragment", 0);
    record.set("urgent", 0);
    record.set("hot", 0);
    record.set("num_failed_logins", 0);
    record.set("logged_in", 1);
    record.set("num_compromised", 0);
    record.set("root_shell", 0);
    record.set("su_attempted", 0);
    record.set("num_root", 0);
    record.set("num_file_creations", 0);
    record.set("num_shells", 0);
    record.set("num_access_files", 0);
    record.set("num_outbound_cmds", 0);
    record.set("is_host_login", 0);
    record.set("is_guest_login", 0);
    record.set("count", 9);
    record.set("srv_count", 9);
    record.set("serror_rate", 0.0);
    record.set("srv_serror_rate", 0.0);
    record.set("rerror_rate", 0.0);
    record.set("srv_rerror_rate", 0.0);
    record.set("same_srv_rate", 1.0);
    record.set("diff_srv_rate", 0.0);
    record.set("srv_diff_host_rate", 0.0);
    record.set("dst_host_count", 25);
    record.set("dst_host_srv_count", 25);
    record.set("dst_host_same_srv_rate", 1.0);
    record.set("dst_host_diff_srv_rate", 0.0);
    record.set("dst_host_same_src_port_rate", 0.0);
    record.set("dst_host_srv_diff_host_rate", 0.0);
    record.set("dst_host_serror_rate", 0.0);
    record.set("dst_host_srv_serror_rate", 0.0);
    record.set("dst_host_rerror_rate", 0.0);
    record.set("dst_host_srv_rerror_rate", 0.0);
    record
}

/// A flood-shaped record: half-open connections to one service, never
/// logged in.
#[cfg(test)]
pub(crate) fn sample_attack_record() -> FeatureRecord {
    let mut record = sample_normal_record();
    record.set("flag", "S0");
    record.set("src_bytes", 0);
    record.set("dst_bytes", 0);
    record.set("logged_in", 0);
    record.set("count", 511);
    record.set("srv_count", 511);
    record.set("serror_rate", 1.0);
    record.set("srv_serror_rate", 1.0);
    record.set("same_srv_rate", 0.0);
    record.set("dst_host_serror_rate", 1.0);
    record
}
