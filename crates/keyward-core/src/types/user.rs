//! User types

use ssh_key::PublicKey;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Username to user mapping making up one cache snapshot
pub type UserMap = HashMap<String, Arc<User>>;

/// Group DN to the role ARNs attached to that group
pub type GroupRoles = HashMap<String, Vec<String>>;

/// A user known to the directory, with the keys it may authenticate with
/// and the roles it may assume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub ssh_keys: Vec<PublicKey>,
    pub arns: BTreeSet<String>,
    pub default_role: String,
}

impl User {
    pub fn new(username: impl Into<String>, default_role: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ssh_keys: Vec::new(),
            arns: BTreeSet::new(),
            default_role: default_role.into(),
        }
    }

    pub fn with_keys(mut self, keys: Vec<PublicKey>) -> Self {
        self.ssh_keys = keys;
        self
    }

    /// Record a role; returns false if the user already had it
    pub fn add_arn(&mut self, arn: impl Into<String>) -> bool {
        self.arns.insert(arn.into())
    }

    /// A user without keys can never authenticate until re-synced
    pub fn can_authenticate(&self) -> bool {
        !self.ssh_keys.is_empty()
    }

    pub fn can_assume(&self, arn: &str) -> bool {
        self.arns.contains(arn)
    }

    /// The role to assume when the caller expressed no preference
    pub fn resolve_role<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        match requested {
            Some(role) if !role.is_empty() => role,
            _ => &self.default_role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_core::OsRng;
    use ssh_key::{Algorithm, PrivateKey};

    fn public_key() -> PublicKey {
        PrivateKey::random(&mut OsRng, Algorithm::Ed25519)
            .unwrap()
            .public_key()
            .clone()
    }

    #[test]
    fn test_new_user_has_no_keys() {
        let user = User::new("alice", "arn:aws:iam::1:role/default");
        assert_eq!(user.username, "alice");
        assert!(!user.can_authenticate());
        assert!(user.arns.is_empty());
    }

    #[test]
    fn test_add_arn_rejects_duplicates() {
        let mut user = User::new("alice", "");
        assert!(user.add_arn("arn:aws:iam::1:role/dev"));
        assert!(!user.add_arn("arn:aws:iam::1:role/dev"));
        assert_eq!(user.arns.len(), 1);
        assert!(user.can_assume("arn:aws:iam::1:role/dev"));
    }

    #[test]
    fn test_with_keys() {
        let user = User::new("bob", "").with_keys(vec![public_key(), public_key()]);
        assert!(user.can_authenticate());
        assert_eq!(user.ssh_keys.len(), 2);
    }

    #[test]
    fn test_resolve_role() {
        let user = User::new("carol", "arn:aws:iam::1:role/default");
        assert_eq!(user.resolve_role(None), "arn:aws:iam::1:role/default");
        assert_eq!(user.resolve_role(Some("")), "arn:aws:iam::1:role/default");
        assert_eq!(
            user.resolve_role(Some("arn:aws:iam::1:role/admin")),
            "arn:aws:iam::1:role/admin"
        );
    }
}
