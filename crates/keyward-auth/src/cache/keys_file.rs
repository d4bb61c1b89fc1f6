//! Keys-file-backed user cache
//!
//! Several records may name the same user; their keys accumulate and their
//! roles are merged without duplicates. A record that cannot be read is
//! skipped on its own and never aborts the refresh.

use async_trait::async_trait;
use keyward_core::config::CacheConfig;
use keyward_core::{GroupRoles, Result, User, UserMap};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache::parse_user_key;
use crate::cache::protocol::{Snapshot, UserCache, UserSource};
use crate::keys_file::{KeyRecord, KeysFile};

pub type KeysFileUserCache<K> = UserCache<KeysFileUserSource<K>>;

pub struct KeysFileUserSource<K> {
    keys_file: K,
    config: CacheConfig,
}

impl<K: KeysFile> KeysFileUserSource<K> {
    pub fn new(keys_file: K, config: CacheConfig) -> Self {
        Self { keys_file, config }
    }

    pub fn keys_file(&self) -> &K {
        &self.keys_file
    }

    fn default_role(&self, record: &KeyRecord) -> String {
        match record.optional_str(&self.config.default_role_attr) {
            Ok(Some(role)) if !role.is_empty() => role.to_string(),
            Ok(_) => self.config.default_role.clone(),
            Err(err) => {
                warn!(error = %err, "Ignoring unreadable default role");
                self.config.default_role.clone()
            }
        }
    }

    /// Fold one record into the user map being built
    fn apply_record(&self, users: &mut HashMap<String, User>, key: &str, record: &KeyRecord) {
        let username = match record.required_str(&self.config.user_attr) {
            Ok(username) => username,
            Err(err) => {
                warn!(error = %err, key, "Skipping keys file record");
                return;
            }
        };

        // The first record seen for a user decides its default role
        let user = users
            .entry(username.to_string())
            .or_insert_with(|| User::new(username, self.default_role(record)));

        if let Some(parsed) = parse_user_key(username, key) {
            user.ssh_keys.push(parsed);
        }

        if !self.config.enable_server_roles {
            return;
        }

        match record.str_list(&self.config.role_attribute) {
            Ok(roles) => {
                for role in roles {
                    if !user.add_arn(role) {
                        debug!(username, role, "Role already recorded for user");
                    }
                }
            }
            Err(err) => warn!(error = %err, username, "Ignoring unreadable role list"),
        }
    }
}

#[async_trait]
impl<K: KeysFile> UserSource for KeysFileUserSource<K> {
    fn metric_prefix(&self) -> &'static str {
        "keysFileCache"
    }

    fn name(&self) -> &'static str {
        "Keys file"
    }

    async fn fetch(&self) -> Result<Snapshot> {
        self.keys_file.load().await?;
        let records = self.keys_file.keys().await?;

        // Accumulates for this refresh only; per-user ARN sets dedupe roles
        let mut users: HashMap<String, User> = HashMap::new();
        for (key, record) in &records {
            self.apply_record(&mut users, key, record);
        }

        let users: UserMap = users
            .into_iter()
            .map(|(username, user)| (username, Arc::new(user)))
            .collect();

        Ok(Snapshot::new(users, GroupRoles::new()))
    }
}
