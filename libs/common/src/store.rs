//! Flat-file JSON persistence.
//!
//! Each subsystem owns one document, loaded fully at startup and rewritten
//! in full on every mutation. Write volume is low (a handful of events per
//! minute at peak), so there is no incremental update path.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

/// A single JSON document on disk.
pub struct JsonStore {
    path: PathBuf,
    // Serializes concurrent saves of the same document.
    write_guard: Mutex<()>,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and deserialize the whole document.
    ///
    /// A missing or unreadable file yields `T::default()` with a logged
    /// warning: a corrupt store must not keep the process from booting.
    pub fn load_or_default<T>(&self) -> T
    where
        T: DeserializeOwned + Default,
    {
        if !self.path.exists() {
            return T::default();
        }
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(err) => {
                    tracing::warn!(path = %self.path.display(), %err, "unparseable document, starting empty");
                    T::default()
                }
            },
            Err(err) => {
                tracing::warn!(path = %self.path.display(), %err, "unreadable document, starting empty");
                T::default()
            }
        }
    }

    /// Serialize and rewrite the whole document.
    ///
    /// Writes to a sibling temp file and renames over the target so a crash
    /// mid-write never leaves a half-document behind.
    pub fn save<T: Serialize>(&self, value: &T) -> Result<()> {
        let _guard = self.write_guard.lock();

        let raw = serde_json::to_string_pretty(value)?;
        let tmp = self.path.with_extension("json.tmp");
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&tmp, raw).map_err(|err| {
            Error::persistence(format!("write {}: {err}", tmp.display()))
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|err| {
            Error::persistence(format!("rename {}: {err}", self.path.display()))
        })?;
        Ok(())
    }
}
