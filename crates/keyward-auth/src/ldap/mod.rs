//! LDAP directory access
//!
//! Provides:
//! - The directory port consumed by the LDAP user cache
//! - Search/modify request and entry types
//! - An `ldap3`-backed implementation with TLS/STARTTLS support

mod client;
mod directory;
mod types;

pub use client::LdapDirectory;
pub use directory::Directory;
pub use types::*;
