//! Keyward Core Library
//!
//! Identity model, error types, and configuration shared by the Keyward
//! credential broker crates.

pub mod config;
pub mod error;
pub mod types;

pub use config::KeywardConfig;
pub use error::{Error, Result};
pub use types::{GroupRoles, User, UserMap};

/// Keyward version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Directory attribute holding SSH public keys
pub const SSH_PUBLIC_KEY_ATTR: &str = "sshPublicKey";

/// Directory attribute listing the groups an entry belongs to
pub const MEMBER_OF_ATTR: &str = "memberOf";
