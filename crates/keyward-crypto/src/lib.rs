//! Cryptography utilities for Keyward

pub mod keys;

pub use keys::*;
pub use ssh_key::{PublicKey, Signature};
