use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};

use super::LocalStoreError;

/// A flat string key-value store in the shape of browser local storage.
pub trait KeyValueBackend: Send {
    fn get(&self, key: &str) -> Result<Option<String>, LocalStoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), LocalStoreError>;
    fn remove(&mut self, key: &str) -> Result<(), LocalStoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: BTreeMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, LocalStoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), LocalStoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), LocalStoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Keeps every key in a single JSON object on disk, rewritten on each change.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    entries: BTreeMap<String, String>,
    quarantined: Option<PathBuf>,
}

impl FileBackend {
    /// Opens the store at `path`. A file that is not a JSON object is moved
    /// aside to `<path>.corrupt-<timestamp>` and the store starts empty, so
    /// the first write never clobbers it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LocalStoreError> {
        let path = path.as_ref().to_path_buf();
        let mut quarantined = None;

        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(err) => {
                    let aside = corrupt_path(&path);
                    fs::rename(&path, &aside)?;
                    warn!(
                        path = %path.display(),
                        moved_to = %aside.display(),
                        error = %err,
                        "Local store file unreadable, moved aside and starting empty"
                    );
                    quarantined = Some(aside);
                    BTreeMap::new()
                }
            }
        } else {
            debug!(path = %path.display(), "Local store file not found, starting empty");
            BTreeMap::new()
        };

        Ok(Self {
            path,
            entries,
            quarantined,
        })
    }

    /// Where an unreadable file found at open time was moved.
    pub fn quarantined(&self) -> Option<&Path> {
        self.quarantined.as_deref()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), LocalStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let raw = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

fn corrupt_path(path: &Path) -> PathBuf {
    let mut aside = path.as_os_str().to_owned();
    aside.push(format!(".corrupt-{}", Utc::now().format("%Y%m%dT%H%M%S%.3f")));
    PathBuf::from(aside)
}

impl KeyValueBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, LocalStoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), LocalStoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), LocalStoreError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}
