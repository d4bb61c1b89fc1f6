//! User caches
//!
//! Resolves SSH signature challenges to directory users:
//! - `protocol`: the shared verify / refresh-on-miss / retry-once cache
//! - `ldap`: snapshots built from LDAP entries and group roles
//! - `keys_file`: snapshots built from a flat keys file

mod keys_file;
mod ldap;
mod protocol;

pub use keys_file::{KeysFileUserCache, KeysFileUserSource};
pub use ldap::{LdapUserCache, LdapUserSource};
pub use protocol::{Snapshot, UserCache, UserSource};

use async_trait::async_trait;
use keyward_core::config::{Backend, KeywardConfig};
use keyward_core::{GroupRoles, Result, User, UserMap};
use keyward_crypto::{parse_public_key, PublicKey, Signature};
use std::sync::Arc;
use tracing::warn;

use crate::keys_file::{JsonKeysFile, KeysFile};
use crate::ldap::{Directory, LdapDirectory};
use crate::stats::Stats;

/// What the SSH-facing server needs from a user cache
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Rebuild the cache from its directory
    async fn update(&self) -> Result<()>;

    /// `Ok(None)` is "not authenticated", not an error
    async fn authenticate(
        &self,
        username: &str,
        challenge: &[u8],
        signature: &Signature,
    ) -> Result<Option<Arc<User>>>;

    fn users(&self) -> UserMap;
}

#[async_trait]
impl<S: UserSource> Authenticator for UserCache<S> {
    async fn update(&self) -> Result<()> {
        UserCache::update(self).await
    }

    async fn authenticate(
        &self,
        username: &str,
        challenge: &[u8],
        signature: &Signature,
    ) -> Result<Option<Arc<User>>> {
        UserCache::authenticate(self, username, challenge, signature).await
    }

    fn users(&self) -> UserMap {
        UserCache::users(self)
    }
}

/// Either engine behind one handle, as chosen by configuration
pub enum AnyUserCache {
    Ldap(LdapUserCache<Arc<dyn Directory>>),
    KeysFile(KeysFileUserCache<Arc<dyn KeysFile>>),
}

impl AnyUserCache {
    /// Build the configured engine and run its initial sync
    pub async fn from_config(config: &KeywardConfig, stats: Arc<dyn Stats>) -> (Self, Result<()>) {
        match config.cache.backend {
            Backend::Ldap => {
                let directory: Arc<dyn Directory> =
                    Arc::new(LdapDirectory::new(config.ldap.clone()));
                let source = LdapUserSource::new(directory, config.cache.clone());
                let (cache, outcome) = UserCache::new(source, stats).await;
                (AnyUserCache::Ldap(cache), outcome)
            }
            Backend::KeysFile => {
                let keys_file: Arc<dyn KeysFile> =
                    Arc::new(JsonKeysFile::new(config.keys_file.path.clone()));
                let source = KeysFileUserSource::new(keys_file, config.cache.clone());
                let (cache, outcome) = UserCache::new(source, stats).await;
                (AnyUserCache::KeysFile(cache), outcome)
            }
        }
    }

    pub fn backend(&self) -> Backend {
        match self {
            AnyUserCache::Ldap(_) => Backend::Ldap,
            AnyUserCache::KeysFile(_) => Backend::KeysFile,
        }
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        match self {
            AnyUserCache::Ldap(cache) => cache.snapshot(),
            AnyUserCache::KeysFile(cache) => cache.snapshot(),
        }
    }

    pub fn user(&self, username: &str) -> Option<Arc<User>> {
        self.snapshot().users.get(username).cloned()
    }

    pub fn groups(&self) -> GroupRoles {
        self.snapshot().groups.clone()
    }

    pub fn refresh_count(&self) -> u64 {
        match self {
            AnyUserCache::Ldap(cache) => cache.refresh_count(),
            AnyUserCache::KeysFile(cache) => cache.refresh_count(),
        }
    }
}

#[async_trait]
impl Authenticator for AnyUserCache {
    async fn update(&self) -> Result<()> {
        match self {
            AnyUserCache::Ldap(cache) => cache.update().await,
            AnyUserCache::KeysFile(cache) => cache.update().await,
        }
    }

    async fn authenticate(
        &self,
        username: &str,
        challenge: &[u8],
        signature: &Signature,
    ) -> Result<Option<Arc<User>>> {
        match self {
            AnyUserCache::Ldap(cache) => cache.authenticate(username, challenge, signature).await,
            AnyUserCache::KeysFile(cache) => {
                cache.authenticate(username, challenge, signature).await
            }
        }
    }

    fn users(&self) -> UserMap {
        self.snapshot().users.clone()
    }
}

/// Parse one stored key, logging and dropping it when unreadable
pub(crate) fn parse_user_key(username: &str, material: &str) -> Option<PublicKey> {
    match parse_public_key(material) {
        Ok(key) => Some(key),
        Err(err) => {
            warn!(
                "SSH key parsing for user {} failed (key was '{}'): {}. This key will not be added.",
                username, material, err
            );
            None
        }
    }
}

pub(crate) fn parse_user_keys(username: &str, materials: &[String]) -> Vec<PublicKey> {
    materials
        .iter()
        .filter_map(|material| parse_user_key(username, material))
        .collect()
}
