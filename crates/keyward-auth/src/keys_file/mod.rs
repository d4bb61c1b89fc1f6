//! Keys file directory
//!
//! A flat alternative to LDAP: a file mapping key material to user
//! attributes. The cache reloads it on every refresh.

mod json;
mod record;

pub use json::JsonKeysFile;
pub use record::{KeyRecord, KeyRecords};

use async_trait::async_trait;
use keyward_core::Result;
use std::sync::Arc;

/// Keys file port
#[async_trait]
pub trait KeysFile: Send + Sync {
    /// Re-read the underlying source
    async fn load(&self) -> Result<()>;

    /// Records from the last successful load
    async fn keys(&self) -> Result<KeyRecords>;

    /// Look up the record for one key string
    async fn search(&self, key: &str) -> Result<Option<KeyRecord>>;
}

#[async_trait]
impl<T: KeysFile + ?Sized> KeysFile for Arc<T> {
    async fn load(&self) -> Result<()> {
        (**self).load().await
    }

    async fn keys(&self) -> Result<KeyRecords> {
        (**self).keys().await
    }

    async fn search(&self, key: &str) -> Result<Option<KeyRecord>> {
        (**self).search(key).await
    }
}
