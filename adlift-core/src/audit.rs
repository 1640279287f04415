//! Append-only audit trail of proposed mutations.
//!
//! Every bid or state change pushed through the gateway is recorded here
//! and persisted as CSV with a fixed column set. The column layout is a
//! stable contract consumed by downstream reporting - do not reorder.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("failed to write audit trail: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode audit row: {0}")]
    Csv(#[from] csv::Error),
}

/// One proposed mutation. Field order doubles as the CSV column order.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub timestamp: String,
    pub action_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub old_value: String,
    pub new_value: String,
    pub reason: String,
    pub dry_run: bool,
}

impl AuditEntry {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        action_type: impl Into<String>,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
        reason: impl Into<String>,
        dry_run: bool,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            action_type: action_type.into(),
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            old_value: old_value.into(),
            new_value: new_value.into(),
            reason: reason.into(),
            dry_run,
        }
    }
}

/// Collects audit entries in memory and writes them out once per run.
#[derive(Debug)]
pub struct AuditSink {
    output_dir: PathBuf,
    entries: Mutex<Vec<AuditEntry>>,
}

impl AuditSink {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Record one mutation attempt. Entries are immutable once logged.
    pub fn log(&self, entry: AuditEntry) {
        debug!(
            "Audit: {} {} {}: {} -> {} ({})",
            entry.action_type,
            entry.entity_type,
            entry.entity_id,
            entry.old_value,
            entry.new_value,
            entry.reason
        );
        self.entries
            .lock()
            .expect("audit sink mutex poisoned")
            .push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("audit sink mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write all entries to a timestamped CSV file in the output directory.
    /// Returns the written path, or `None` when there was nothing to save.
    pub fn save(&self) -> Result<Option<PathBuf>, AuditError> {
        let entries = self
            .entries
            .lock()
            .expect("audit sink mutex poisoned")
            .clone();

        if entries.is_empty() {
            info!("No audit entries to save");
            return Ok(None);
        }

        std::fs::create_dir_all(&self.output_dir)?;
        let filename = format!("ppc_audit_{}.csv", Utc::now().format("%Y%m%d_%H%M%S"));
        let path = self.output_dir.join(filename);

        let mut writer = csv::Writer::from_path(&path)?;
        for entry in &entries {
            writer.serialize(entry)?;
        }
        writer.flush()?;

        info!("Audit trail saved to {:?} ({} entries)", path, entries.len());
        Ok(Some(path))
    }
}
