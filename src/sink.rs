//! Best-effort persistence of the most recent result.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Writes the latest result snapshot to one well-known file.
///
/// The file is overwritten on every detection, never appended. Persistence
/// problems are logged and swallowed; a prediction must not fail because
/// the snapshot could not be written.
pub struct ResultSink {
    path: PathBuf,
}

impl ResultSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the snapshot with `payload` serialized as pretty JSON.
    pub fn persist<T: Serialize>(&self, payload: &T) {
        let json = match serde_json::to_string_pretty(payload) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "result snapshot serialization failed");
                return;
            }
        };

        match fs::write(&self.path, json) {
            Ok(()) => debug!(path = %self.path.display(), "result snapshot written"),
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "result snapshot write failed"
            ),
        }
    }

    /// Current snapshot content, if one has been written.
    pub fn read_latest(&self) -> Option<String> {
        fs::read_to_string(&self.path).ok()
    }
}
