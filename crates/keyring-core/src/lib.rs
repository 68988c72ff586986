//! Core library for Keyring.
//!
//! Contains the key and user domain types, field validation, the status
//! rules, and the services that apply them on top of a `keyring-storage`
//! backend. This crate knows nothing about HTTP, sessions, or the identity
//! provider.

pub mod clock;
pub mod error;
pub mod key;
pub mod service;
pub mod user;
