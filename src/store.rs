use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{IngestError, Result};
use crate::record::{GameIdentity, TeamGameRecord};
use crate::teams;

/// Output file name for an identity: lower-cased short code, season token,
/// game id. This is also the dedup key.
pub fn record_file_name(short_code: &str, identity: &GameIdentity) -> String {
    format!(
        "{}_{}_{}.json",
        teams::file_stem(short_code),
        identity.season,
        identity.game_id
    )
}

/// Idempotent record store: one JSON document per record, written atomically.
///
/// The set of existing file names is snapshotted once when the store opens;
/// `exists` answers from that snapshot so a re-run skips already-persisted
/// identities before any per-record network work.
#[derive(Debug)]
pub struct RecordStore {
    dir: PathBuf,
    existing: HashSet<String>,
}

impl RecordStore {
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|err| IngestError::Store {
            path: dir.display().to_string(),
            reason: err.to_string(),
        })?;
        let mut existing = HashSet::new();
        let entries = fs::read_dir(dir).map_err(|err| IngestError::Store {
            path: dir.display().to_string(),
            reason: err.to_string(),
        })?;
        for entry in entries.flatten() {
            existing.insert(entry.file_name().to_string_lossy().into_owned());
        }
        debug!(dir = %dir.display(), known = existing.len(), "opened record store");
        Ok(Self {
            dir: dir.to_path_buf(),
            existing,
        })
    }

    pub fn exists(&self, file_name: &str) -> bool {
        self.existing.contains(file_name)
    }

    /// Serializes the completed record and writes it temp-then-rename so a
    /// crash never leaves a partial file visible.
    pub fn store(&mut self, file_name: &str, record: &TeamGameRecord) -> Result<PathBuf> {
        let path = self.dir.join(file_name);
        let json = serde_json::to_string_pretty(record).map_err(|err| IngestError::Store {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|err| IngestError::Store {
            path: tmp.display().to_string(),
            reason: err.to_string(),
        })?;
        fs::rename(&tmp, &path).map_err(|err| IngestError::Store {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        self.existing.insert(file_name.to_string());
        Ok(path)
    }
}
