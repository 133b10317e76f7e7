use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::IngestError;

const CACHE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct CacheFile {
    version: u32,
    entries: HashMap<String, CacheEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    body: String,
    fetched_at: u64,
    ttl_secs: u64,
}

impl CacheEntry {
    fn expired(&self, now_secs: u64) -> bool {
        now_secs >= self.fetched_at.saturating_add(self.ttl_secs)
    }
}

/// Persistent response cache keyed by request path. Entries carry their own
/// TTL; expired entries are dropped lazily on lookup and by `sweep`. The
/// backing file survives process restarts, and an unreadable file or a
/// version bump just starts the cache empty (corruption is a miss, never
/// fatal).
#[derive(Debug)]
pub struct HttpCache {
    path: PathBuf,
    file: CacheFile,
    default_ttl: Duration,
}

impl HttpCache {
    pub fn open(path: PathBuf, default_ttl: Duration) -> Self {
        let file = match load_cache_file(&path) {
            Ok(Some(file)) => file,
            Ok(None) => CacheFile::default(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "starting with empty cache");
                CacheFile::default()
            }
        };
        Self {
            path,
            file,
            default_ttl,
        }
    }

    /// Cached body for `key` if present and inside its TTL. An expired entry
    /// is purged on the spot.
    pub fn lookup(&mut self, key: &str, now: SystemTime) -> Option<String> {
        let now_secs = system_time_to_secs(now)?;
        match self.file.entries.get(key) {
            Some(entry) if entry.expired(now_secs) => {
                debug!(key, "cache entry expired");
                self.file.entries.remove(key);
                None
            }
            Some(entry) => Some(entry.body.clone()),
            None => None,
        }
    }

    pub fn insert(&mut self, key: &str, body: String, now: SystemTime) {
        let fetched_at = system_time_to_secs(now).unwrap_or_default();
        self.file.entries.insert(
            key.to_string(),
            CacheEntry {
                body,
                fetched_at,
                ttl_secs: self.default_ttl.as_secs(),
            },
        );
        self.save();
    }

    /// Drops every expired entry. Called opportunistically once per
    /// reconciliation iteration to bound file growth.
    pub fn sweep(&mut self, now: SystemTime) {
        let Some(now_secs) = system_time_to_secs(now) else {
            return;
        };
        let before = self.file.entries.len();
        self.file.entries.retain(|_, entry| !entry.expired(now_secs));
        let dropped = before - self.file.entries.len();
        if dropped > 0 {
            debug!(dropped, "swept expired cache entries");
            self.save();
        }
    }

    fn save(&mut self) {
        self.file.version = CACHE_VERSION;
        if let Err(err) = save_cache_file(&self.path, &self.file) {
            warn!(path = %self.path.display(), error = %err, "failed to persist cache");
        }
    }
}

fn load_cache_file(path: &Path) -> Result<Option<CacheFile>, IngestError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(IngestError::CacheCorruption(err.to_string())),
    };
    let file = serde_json::from_str::<CacheFile>(&raw)
        .map_err(|err| IngestError::CacheCorruption(err.to_string()))?;
    if file.version != CACHE_VERSION {
        return Ok(None);
    }
    Ok(Some(file))
}

fn save_cache_file(path: &Path, file: &CacheFile) -> Result<(), IngestError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).ok();
    }
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string(file).map_err(|err| IngestError::Store {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    fs::write(&tmp, json).map_err(|err| IngestError::Store {
        path: tmp.display().to_string(),
        reason: err.to_string(),
    })?;
    fs::rename(&tmp, path).map_err(|err| IngestError::Store {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    Ok(())
}

fn system_time_to_secs(time: SystemTime) -> Option<u64> {
    time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}
