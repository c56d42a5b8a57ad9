//! # dirauth-core
//!
//! Core types shared by the authentication adapters.
//!
//! An umbrella application authenticates users through one of several backends (local
//! passwords, an LDAP directory, ...). Every backend implements the [`AuthAdapter`] interface
//! defined here and reads its settings through a [`ConfigProvider`].
//!
//! ## Modules
//!
//! - [`adapter`] - The adapter interface, supported features and the provisioning profile
//! - [`config`] - Flat key/value configuration providers, reloaded on every call
//! - [`credential`] - Username/password pairs with the password kept secret
//! - [`error`] - Error types and stable error codes
//! - [`password`] - Local password hashing used when provisioning users

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod adapter;
pub mod config;
pub mod credential;
pub mod error;
pub mod password;

// Re-export commonly used types
pub use adapter::{AdapterFeature, AuthAdapter, DirectoryProfile};
pub use config::{ConfigProvider, ConfigValues, JsonFileConfig, StaticConfig};
pub use credential::Credential;
pub use error::{Error, Result};
pub use password::{Argon2Hasher, CredentialHasher};
