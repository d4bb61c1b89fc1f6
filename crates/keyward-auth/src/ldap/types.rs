//! LDAP request and entry types
//!
//! Transport-neutral shapes for the directory port:
//! - Search requests (base, scope, filter, projected attributes)
//! - Search result entries (DN and multi-valued attributes)
//! - Modify requests

use std::collections::HashMap;

// ============================================================================
// Search
// ============================================================================

/// Search scope relative to the base DN
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    /// Only the base entry
    Base,
    /// Immediate children of the base entry
    OneLevel,
    /// The base entry and everything below it
    #[default]
    WholeSubtree,
}

/// Alias dereferencing policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DerefAliases {
    #[default]
    Never,
    InSearching,
    FindingBaseObject,
    Always,
}

/// LDAP search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub base_dn: String,
    pub scope: SearchScope,
    pub deref_aliases: DerefAliases,
    /// Maximum number of entries (0 = server default)
    pub size_limit: i32,
    /// Server-side time limit in seconds (0 = server default)
    pub time_limit: i32,
    pub types_only: bool,
    pub filter: String,
    pub attributes: Vec<String>,
}

impl SearchRequest {
    /// Whole-subtree search that never dereferences aliases
    pub fn new(
        base_dn: impl Into<String>,
        filter: impl Into<String>,
        attributes: Vec<String>,
    ) -> Self {
        Self {
            base_dn: base_dn.into(),
            scope: SearchScope::WholeSubtree,
            deref_aliases: DerefAliases::Never,
            size_limit: 0,
            time_limit: 0,
            types_only: false,
            filter: filter.into(),
            attributes,
        }
    }
}

/// A single search result entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchEntry {
    /// Distinguished name
    pub dn: String,

    /// Attribute name to values
    pub attributes: HashMap<String, Vec<String>>,
}

impl SearchEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: HashMap::new(),
        }
    }

    /// Builder-style attribute setter, mostly useful for fakes
    pub fn with_attribute<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// First value of an attribute, or the empty string when absent
    pub fn attribute_value(&self, name: &str) -> &str {
        self.attributes
            .get(name)
            .and_then(|v| v.first())
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    /// All values of an attribute, empty when absent
    pub fn attribute_values(&self, name: &str) -> &[String] {
        self.attributes
            .get(name)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

// ============================================================================
// Modify
// ============================================================================

/// A single attribute change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modification {
    Add { attribute: String, values: Vec<String> },
    Delete { attribute: String, values: Vec<String> },
    Replace { attribute: String, values: Vec<String> },
}

/// LDAP modify request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyRequest {
    pub dn: String,
    pub changes: Vec<Modification>,
}

impl ModifyRequest {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            changes: Vec::new(),
        }
    }

    pub fn add(mut self, attribute: impl Into<String>, values: Vec<String>) -> Self {
        self.changes.push(Modification::Add {
            attribute: attribute.into(),
            values,
        });
        self
    }

    pub fn replace(mut self, attribute: impl Into<String>, values: Vec<String>) -> Self {
        self.changes.push(Modification::Replace {
            attribute: attribute.into(),
            values,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_request_defaults() {
        let request = SearchRequest::new(
            "dc=example,dc=com",
            "(sshPublicKey=*)",
            vec!["sshPublicKey".to_string(), "cn".to_string()],
        );

        assert_eq!(request.scope, SearchScope::WholeSubtree);
        assert_eq!(request.deref_aliases, DerefAliases::Never);
        assert_eq!(request.size_limit, 0);
        assert!(!request.types_only);
    }

    #[test]
    fn test_entry_attribute_access() {
        let entry = SearchEntry::new("cn=alice,dc=example,dc=com")
            .with_attribute("cn", ["alice"])
            .with_attribute("memberOf", ["cn=dev", "cn=ops"]);

        assert_eq!(entry.attribute_value("cn"), "alice");
        assert_eq!(entry.attribute_values("memberOf").len(), 2);

        // Missing attributes read as empty
        assert_eq!(entry.attribute_value("defaultRole"), "");
        assert!(entry.attribute_values("sshPublicKey").is_empty());
    }

    #[test]
    fn test_modify_request_builder() {
        let request = ModifyRequest::new("cn=alice,dc=example,dc=com")
            .add("sshPublicKey", vec!["AAAA".to_string()])
            .replace("defaultRole", vec!["arn:aws:iam::1:role/dev".to_string()]);

        assert_eq!(request.changes.len(), 2);
        assert!(matches!(request.changes[0], Modification::Add { .. }));
    }
}
