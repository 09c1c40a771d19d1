//! Detecting files produced in the working directory.

use std::collections::HashMap;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use walkdir::WalkDir;

use crate::api::types::FileRecord;

/// Top-level regular files of a directory and their modification times.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceSnapshot {
    files: HashMap<String, SystemTime>,
}

impl WorkspaceSnapshot {
    /// Scan `dir`. Unreadable entries are skipped.
    pub fn capture(dir: &Path) -> Self {
        let mut files = HashMap::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::debug!("Skipping workspace entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if let Some(modified) = entry.metadata().ok().and_then(|m| m.modified().ok()) {
                files.insert(name.to_string(), modified);
            }
        }
        Self { files }
    }

    /// Files that are new, or modified later, compared to `earlier`.
    /// Sorted by filename.
    pub fn changes_since(&self, earlier: &WorkspaceSnapshot) -> Vec<FileRecord> {
        let mut changed: Vec<FileRecord> = self
            .files
            .iter()
            .filter(|(name, modified)| match earlier.files.get(*name) {
                Some(before) => *modified > before,
                None => true,
            })
            .map(|(name, modified)| FileRecord {
                filename: name.clone(),
                timestamp: epoch_seconds(*modified),
            })
            .collect();
        changed.sort_by(|a, b| a.filename.cmp(&b.filename));
        changed
    }
}

fn epoch_seconds(time: SystemTime) -> i64 {
    DateTime::<Utc>::from(time).timestamp()
}
