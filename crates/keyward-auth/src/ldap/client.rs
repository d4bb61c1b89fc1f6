//! LDAP Client implementation
//!
//! Implements the directory port over `ldap3`. Every operation opens a
//! connection, binds with the service account, runs, and unbinds.
//! Supports LDAP, LDAPS (SSL), and STARTTLS connections.

use crate::ldap::directory::Directory;
use crate::ldap::types::*;
use async_trait::async_trait;
use keyward_core::config::LdapConfig;
use keyward_core::{Error, Result};
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, LdapError, Mod, Scope, SearchOptions};
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

/// Directory backed by a live LDAP server
pub struct LdapDirectory {
    config: LdapConfig,
}

impl LdapDirectory {
    pub fn new(config: LdapConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LdapConfig {
        &self.config
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_seconds)
    }

    /// Create LDAP connection with proper TLS settings
    async fn create_connection(&self) -> Result<(LdapConnAsync, Ldap)> {
        let settings = LdapConnSettings::new()
            .set_conn_timeout(self.timeout())
            .set_starttls(self.config.start_tls);

        debug!("Connecting to LDAP server: {}", self.config.server_url);

        LdapConnAsync::with_settings(settings, &self.config.server_url)
            .await
            .map_err(|e| map_ldap_error("connect", e))
    }

    /// Connect and bind with the service account
    async fn bound_connection(&self) -> Result<Ldap> {
        let (conn, mut ldap) = self.create_connection().await?;
        ldap3::drive!(conn);

        if self.config.bind_dn.is_empty() {
            return Ok(ldap);
        }

        let result = ldap
            .with_timeout(self.timeout())
            .simple_bind(&self.config.bind_dn, &self.config.bind_password)
            .await
            .map_err(|e| map_ldap_error("bind", e))?;

        if result.rc != 0 {
            let _ = ldap.unbind().await;
            return Err(Error::Directory(format!(
                "Service account bind failed with code: {}",
                result.rc
            )));
        }

        Ok(ldap)
    }
}

#[async_trait]
impl Directory for LdapDirectory {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchEntry>> {
        let mut ldap = self.bound_connection().await?;

        debug!(
            base_dn = %request.base_dn,
            filter = %request.filter,
            "Searching LDAP"
        );

        let options = SearchOptions::new()
            .deref(deref_aliases(request.deref_aliases))
            .sizelimit(request.size_limit)
            .timelimit(request.time_limit)
            .typesonly(request.types_only);

        let outcome = ldap
            .with_search_options(options)
            .with_timeout(self.timeout())
            .search(
                &request.base_dn,
                scope(request.scope),
                &request.filter,
                request.attributes.clone(),
            )
            .await
            .map_err(|e| map_ldap_error("search", e))
            .and_then(|rs| rs.success().map_err(|e| map_ldap_error("search", e)));

        let _ = ldap.unbind().await;
        let (rs, _res) = outcome?;

        let entries: Vec<SearchEntry> = rs
            .into_iter()
            .map(|raw| {
                let entry = ldap3::SearchEntry::construct(raw);
                SearchEntry {
                    dn: entry.dn,
                    attributes: entry.attrs.into_iter().collect(),
                }
            })
            .collect();

        debug!("LDAP search returned {} entries", entries.len());
        Ok(entries)
    }

    async fn modify(&self, request: &ModifyRequest) -> Result<()> {
        let mut ldap = self.bound_connection().await?;

        let mods: Vec<Mod<String>> = request
            .changes
            .iter()
            .map(|change| match change {
                Modification::Add { attribute, values } => {
                    Mod::Add(attribute.clone(), value_set(values))
                }
                Modification::Delete { attribute, values } => {
                    Mod::Delete(attribute.clone(), value_set(values))
                }
                Modification::Replace { attribute, values } => {
                    Mod::Replace(attribute.clone(), value_set(values))
                }
            })
            .collect();

        debug!(dn = %request.dn, changes = mods.len(), "Modifying LDAP entry");

        let outcome = ldap
            .with_timeout(self.timeout())
            .modify(&request.dn, mods)
            .await
            .map_err(|e| map_ldap_error("modify", e))
            .and_then(|res| res.success().map_err(|e| map_ldap_error("modify", e)));

        let _ = ldap.unbind().await;
        outcome.map(|_| ())
    }
}

fn value_set(values: &[String]) -> HashSet<String> {
    values.iter().cloned().collect()
}

fn scope(scope: SearchScope) -> Scope {
    match scope {
        SearchScope::Base => Scope::Base,
        SearchScope::OneLevel => Scope::OneLevel,
        SearchScope::WholeSubtree => Scope::Subtree,
    }
}

fn deref_aliases(deref: DerefAliases) -> ldap3::DerefAliases {
    match deref {
        DerefAliases::Never => ldap3::DerefAliases::Never,
        DerefAliases::InSearching => ldap3::DerefAliases::Searching,
        DerefAliases::FindingBaseObject => ldap3::DerefAliases::Finding,
        DerefAliases::Always => ldap3::DerefAliases::Always,
    }
}

fn map_ldap_error(operation: &str, err: LdapError) -> Error {
    match err {
        LdapError::Timeout { .. } => Error::DirectoryTimeout(format!("LDAP {} timed out", operation)),
        other => Error::Directory(format!("LDAP {} failed: {}", operation, other)),
    }
}
