//! LDAP-backed user cache
//!
//! Each refresh:
//! - Loads group DN -> role ARNs (when server roles are enabled)
//! - Loads every entry carrying an `sshPublicKey`
//! - Resolves each entry's `memberOf` groups into its ARN set

use async_trait::async_trait;
use keyward_core::config::CacheConfig;
use keyward_core::{Error, GroupRoles, Result, User, UserMap, MEMBER_OF_ATTR, SSH_PUBLIC_KEY_ATTR};
use keyward_crypto::{fingerprint, parse_public_key};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::parse_user_keys;
use crate::cache::protocol::{Snapshot, UserCache, UserSource};
use crate::ldap::{Directory, ModifyRequest, SearchEntry, SearchRequest};

const GROUP_FILTER: &str = "(objectClass=groupOfNames)";
const USER_FILTER: &str = "(sshPublicKey=*)";

pub type LdapUserCache<D> = UserCache<LdapUserSource<D>>;

pub struct LdapUserSource<D> {
    directory: D,
    config: CacheConfig,
}

impl<D: Directory> LdapUserSource<D> {
    pub fn new(directory: D, config: CacheConfig) -> Self {
        Self { directory, config }
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    async fn fetch_groups(&self) -> Result<GroupRoles> {
        let request = SearchRequest::new(
            &self.config.base_dn,
            GROUP_FILTER,
            vec![self.config.role_attribute.clone()],
        );

        let entries = self.directory.search(&request).await?;

        let mut groups = GroupRoles::with_capacity(entries.len());
        for entry in entries {
            let arns = entry.attribute_values(&self.config.role_attribute).to_vec();
            debug!("Adding {:?} to {}", arns, entry.dn);
            groups.insert(entry.dn, arns);
        }

        Ok(groups)
    }

    fn user_attributes(&self) -> Vec<String> {
        let mut attributes = vec![
            SSH_PUBLIC_KEY_ATTR.to_string(),
            self.config.user_attr.clone(),
            MEMBER_OF_ATTR.to_string(),
        ];
        if self.config.enable_server_roles {
            attributes.push(self.config.default_role_attr.clone());
        }
        attributes
    }

    fn build_user(&self, entry: &SearchEntry, groups: &GroupRoles) -> Option<User> {
        let username = entry.attribute_value(&self.config.user_attr);
        if username.is_empty() {
            warn!(
                dn = %entry.dn,
                "Skipping LDAP entry without a {} attribute",
                self.config.user_attr
            );
            return None;
        }

        let keys = parse_user_keys(username, entry.attribute_values(SSH_PUBLIC_KEY_ATTR));
        let mut user = User::new(username, self.default_role(entry)).with_keys(keys);

        if self.config.enable_server_roles {
            for group_dn in entry.attribute_values(MEMBER_OF_ATTR) {
                debug!("{} is a member of {}", username, group_dn);
                // Unknown groups contribute nothing
                if let Some(arns) = groups.get(group_dn) {
                    for arn in arns {
                        user.add_arn(arn.as_str());
                    }
                }
            }
        }

        debug!("Information on {} (re-)generated.", username);
        Some(user)
    }

    fn default_role(&self, entry: &SearchEntry) -> String {
        if self.config.enable_server_roles {
            let role = entry.attribute_value(&self.config.default_role_attr);
            if !role.is_empty() {
                return role.to_string();
            }
        }
        self.config.default_role.clone()
    }
}

#[async_trait]
impl<D: Directory> UserSource for LdapUserSource<D> {
    fn metric_prefix(&self) -> &'static str {
        "ldapCache"
    }

    fn name(&self) -> &'static str {
        "LDAP"
    }

    async fn fetch(&self) -> Result<Snapshot> {
        let groups = if self.config.enable_server_roles {
            self.fetch_groups().await?
        } else {
            GroupRoles::new()
        };

        let request = SearchRequest::new(&self.config.base_dn, USER_FILTER, self.user_attributes());
        let entries = self.directory.search(&request).await?;

        let mut users = UserMap::with_capacity(entries.len());
        for entry in &entries {
            if let Some(user) = self.build_user(entry, &groups) {
                users.insert(user.username.clone(), Arc::new(user));
            }
        }

        Ok(Snapshot::new(users, groups))
    }
}

impl<D: Directory> UserCache<LdapUserSource<D>> {
    /// Register an additional public key on a user's directory entry.
    ///
    /// The cache is not refreshed; the key becomes usable on the next miss.
    pub async fn add_ssh_key(&self, username: &str, key_material: &str) -> Result<()> {
        let key_material = key_material.trim();
        let key = parse_public_key(key_material)
            .map_err(|e| Error::InvalidPublicKey(e.to_string()))?;

        let source = self.source();
        let config = source.config();
        let filter = format!(
            "({}={})",
            config.user_attr,
            ldap3::ldap_escape(username)
        );
        let request = SearchRequest::new(&config.base_dn, filter, vec![config.user_attr.clone()]);

        let entry = source
            .directory()
            .search(&request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::UserNotFound(username.to_string()))?;

        let modify = ModifyRequest::new(&entry.dn)
            .add(SSH_PUBLIC_KEY_ATTR, vec![key_material.to_string()]);
        source.directory().modify(&modify).await?;

        info!(
            username,
            dn = %entry.dn,
            fingerprint = %fingerprint(&key),
            "Added SSH key to directory entry"
        );
        Ok(())
    }
}
