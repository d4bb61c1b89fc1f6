//! Configuration for Keyward

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeywardConfig {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub ldap: LdapConfig,

    #[serde(default)]
    pub keys_file: KeysFileConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl KeywardConfig {
    pub fn from_file(path: &str) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::InvalidConfig(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content)
            .map_err(|e| crate::Error::InvalidConfig(format!("Failed to parse config: {}", e)))
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(backend) = std::env::var("KEYWARD_BACKEND") {
            match backend.as_str() {
                "ldap" => config.cache.backend = Backend::Ldap,
                "keys_file" | "keysfile" => config.cache.backend = Backend::KeysFile,
                other => warn!("Ignoring unknown KEYWARD_BACKEND value: {}", other),
            }
        }
        if let Ok(attr) = std::env::var("KEYWARD_USER_ATTR") {
            config.cache.user_attr = attr;
        }
        if let Ok(base_dn) = std::env::var("KEYWARD_BASE_DN") {
            config.cache.base_dn = base_dn;
        }
        if std::env::var("KEYWARD_ENABLE_SERVER_ROLES")
            .map(|v| v == "true")
            .unwrap_or(false)
        {
            config.cache.enable_server_roles = true;
        }
        if let Ok(attr) = std::env::var("KEYWARD_ROLE_ATTR") {
            config.cache.role_attribute = attr;
        }
        if let Ok(role) = std::env::var("KEYWARD_DEFAULT_ROLE") {
            config.cache.default_role = role;
        }
        if let Ok(attr) = std::env::var("KEYWARD_DEFAULT_ROLE_ATTR") {
            config.cache.default_role_attr = attr;
        }

        // LDAP connection from environment
        if let Ok(url) = std::env::var("KEYWARD_LDAP_URL") {
            config.ldap.server_url = url;
        }
        if let Ok(dn) = std::env::var("KEYWARD_LDAP_BIND_DN") {
            config.ldap.bind_dn = dn;
        }
        if let Ok(password) = std::env::var("KEYWARD_LDAP_BIND_PASSWORD") {
            config.ldap.bind_password = password;
        }
        if std::env::var("KEYWARD_LDAP_START_TLS")
            .map(|v| v == "true")
            .unwrap_or(false)
        {
            config.ldap.start_tls = true;
        }
        if let Ok(timeout) = std::env::var("KEYWARD_LDAP_TIMEOUT") {
            if let Ok(t) = timeout.parse() {
                config.ldap.timeout_seconds = t;
            }
        }

        if let Ok(path) = std::env::var("KEYWARD_KEYS_FILE") {
            config.keys_file.path = PathBuf::from(path);
        }
        if let Ok(level) = std::env::var("KEYWARD_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("KEYWARD_LOG_FORMAT") {
            config.logging.format = format;
        }

        config
    }

    pub fn validate(&self) -> crate::Result<()> {
        self.cache.validate()?;
        match self.cache.backend {
            Backend::Ldap => self.ldap.validate(),
            Backend::KeysFile => self.keys_file.validate(),
        }
    }
}

/// Which directory backs the user cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    #[default]
    Ldap,
    KeysFile,
}

/// Attribute names and role policy shared by both cache engines
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: Backend,

    /// Attribute holding the username
    #[serde(default = "default_user_attr")]
    pub user_attr: String,

    /// Base DN for directory searches (LDAP only)
    #[serde(default)]
    pub base_dn: String,

    /// Resolve per-user roles from the directory
    #[serde(default)]
    pub enable_server_roles: bool,

    /// Attribute listing role ARNs (on groups for LDAP, on records for the keys file)
    #[serde(default = "default_role_attribute")]
    pub role_attribute: String,

    /// Role assumed when the directory supplies no per-user default
    #[serde(default)]
    pub default_role: String,

    /// Attribute holding a per-user default role
    #[serde(default = "default_default_role_attr")]
    pub default_role_attr: String,
}

fn default_user_attr() -> String {
    "cn".to_string()
}

fn default_role_attribute() -> String {
    "businessCategory".to_string()
}

fn default_default_role_attr() -> String {
    "defaultRole".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            user_attr: default_user_attr(),
            base_dn: String::new(),
            enable_server_roles: false,
            role_attribute: default_role_attribute(),
            default_role: String::new(),
            default_role_attr: default_default_role_attr(),
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> crate::Result<()> {
        if self.user_attr.is_empty() {
            return Err(crate::Error::InvalidConfig(
                "Username attribute is required".into(),
            ));
        }
        if self.backend == Backend::Ldap && self.base_dn.is_empty() {
            return Err(crate::Error::InvalidConfig(
                "Base DN is required for the LDAP backend".into(),
            ));
        }
        if self.enable_server_roles && self.role_attribute.is_empty() {
            return Err(crate::Error::InvalidConfig(
                "Role attribute is required when server roles are enabled".into(),
            ));
        }
        Ok(())
    }
}

/// LDAP connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LdapConfig {
    /// LDAP server URL (ldap:// or ldaps://)
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Use STARTTLS for connection upgrade
    #[serde(default)]
    pub start_tls: bool,

    /// Bind DN for LDAP queries (service account)
    #[serde(default)]
    pub bind_dn: String,

    /// Bind password
    #[serde(default)]
    pub bind_password: String,

    /// Connection and operation timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_server_url() -> String {
    "ldap://localhost:389".to_string()
}

fn default_timeout() -> u64 {
    10
}

impl Default for LdapConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            start_tls: false,
            bind_dn: String::new(),
            bind_password: String::new(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl LdapConfig {
    pub fn validate(&self) -> crate::Result<()> {
        if self.server_url.is_empty() {
            return Err(crate::Error::InvalidConfig("Server URL is required".into()));
        }
        if !self.server_url.starts_with("ldap://") && !self.server_url.starts_with("ldaps://") {
            return Err(crate::Error::InvalidConfig(
                "Server URL must start with ldap:// or ldaps://".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(crate::Error::InvalidConfig(
                "LDAP timeout must be at least one second".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeysFileConfig {
    pub path: PathBuf,
}

impl Default for KeysFileConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/etc/keyward/keys.json"),
        }
    }
}

impl KeysFileConfig {
    pub fn validate(&self) -> crate::Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(crate::Error::InvalidConfig(
                "Keys file path is required".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Forward cache timings and counters to the metrics recorder
    #[serde(default)]
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = KeywardConfig::default();
        assert_eq!(config.cache.backend, Backend::Ldap);
        assert_eq!(config.cache.user_attr, "cn");
        assert!(!config.cache.enable_server_roles);
        assert_eq!(config.ldap.timeout_seconds, 10);
    }

    #[test]
    fn test_parse_toml() {
        let config = KeywardConfig::from_toml(
            r#"
            [cache]
            backend = "keys_file"
            user_attr = "username"
            enable_server_roles = true
            role_attribute = "roles"
            default_role = "arn:aws:iam::1:role/default"

            [keys_file]
            path = "/tmp/keys.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.cache.backend, Backend::KeysFile);
        assert_eq!(config.cache.user_attr, "username");
        assert_eq!(config.cache.role_attribute, "roles");
        assert_eq!(config.cache.default_role_attr, "defaultRole");
        assert_eq!(config.keys_file.path, PathBuf::from("/tmp/keys.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_malformed_toml() {
        let err = KeywardConfig::from_toml("[cache\nbackend =").unwrap_err();
        assert!(matches!(err, crate::Error::InvalidConfig(_)));
    }

    #[test]
    fn test_config_validation() {
        let mut config = KeywardConfig::default();

        // Should fail - LDAP backend without a base DN
        assert!(config.validate().is_err());

        config.cache.base_dn = "dc=example,dc=com".to_string();
        assert!(config.validate().is_ok());

        config.ldap.server_url = "http://ldap.example.com".to_string();
        assert!(config.validate().is_err());
    }
}
