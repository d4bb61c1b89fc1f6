//! Core types for Keyward

mod user;

pub use user::*;
