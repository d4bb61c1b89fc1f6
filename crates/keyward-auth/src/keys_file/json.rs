//! JSON keys file
//!
//! File layout:
//!
//! ```json
//! {
//!   "ssh-ed25519 AAAAC3Nza... alice@laptop": {
//!     "cn": "alice",
//!     "roles": ["arn:aws:iam::123456789012:role/dev"],
//!     "defaultRole": "arn:aws:iam::123456789012:role/dev"
//!   }
//! }
//! ```
//!
//! Attribute names are whatever the cache configuration asks for.

use crate::keys_file::record::{KeyRecord, KeyRecords};
use crate::keys_file::KeysFile;
use async_trait::async_trait;
use keyward_core::{Error, Result};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct JsonKeysFile {
    path: PathBuf,
    records: RwLock<KeyRecords>,
}

impl JsonKeysFile {
    /// Nothing is read until [`KeysFile::load`] is called
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: RwLock::new(KeyRecords::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl KeysFile for JsonKeysFile {
    async fn load(&self) -> Result<()> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            Error::KeysFile(format!("Failed to read {}: {}", self.path.display(), e))
        })?;

        let records: KeyRecords = serde_json::from_str(&content).map_err(|e| {
            Error::MalformedKeysFile(format!("{}: {}", self.path.display(), e))
        })?;

        debug!(
            path = %self.path.display(),
            records = records.len(),
            "Keys file loaded"
        );
        *self.records.write() = records;
        Ok(())
    }

    async fn keys(&self) -> Result<KeyRecords> {
        Ok(self.records.read().clone())
    }

    async fn search(&self, key: &str) -> Result<Option<KeyRecord>> {
        Ok(self.records.read().get(key).cloned())
    }
}
