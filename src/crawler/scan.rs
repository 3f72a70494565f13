//! Existing-file scan - the source of idempotency across runs

use crate::crawler::types::FILE_EXTENSION;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Names of already-downloaded files in `dirs`.
///
/// Only `.xlsx` files larger than `min_bytes` count; zero-byte leftovers of
/// earlier failures are ignored. Missing directories are skipped.
pub fn scan_existing_files<P: AsRef<Path>>(dirs: &[P], min_bytes: u64) -> HashSet<String> {
    let mut existing = HashSet::new();

    for dir in dirs {
        let dir = dir.as_ref();
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Skipping {:?}: {}", dir, e);
                continue;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(FILE_EXTENSION) {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    warn!("Cannot stat {:?}: {}", path, e);
                    continue;
                }
            };

            if metadata.is_file() && metadata.len() > min_bytes {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    existing.insert(name.to_string());
                }
            }
        }
    }

    debug!("Found {} existing files", existing.len());
    existing
}
