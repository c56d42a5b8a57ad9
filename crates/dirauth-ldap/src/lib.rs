//! LDAP authentication adapter.
//!
//! [`LdapAuthAdapter`] checks a username/password pair by binding to an LDAP directory as the
//! user, optionally requires membership in one of a list of groups, and reads email and name
//! attributes so the application can provision an account.
//!
//! ```no_run
//! use std::sync::Arc;
//! use dirauth_core::{AuthAdapter, Credential, JsonFileConfig};
//! use dirauth_ldap::LdapAuthAdapter;
//!
//! # async fn login() -> dirauth_core::Result<()> {
//! let adapter = LdapAuthAdapter::new(Arc::new(JsonFileConfig::new("/etc/app/auth.json")));
//! if adapter.authenticate(&Credential::new("alice", "secret")).await? {
//!     let profile = adapter.get_user_info(&Credential::new("alice", "secret")).await?;
//!     println!("welcome {} {}", profile.first_name, profile.last_name);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

mod adapter;
mod client;
mod config;
mod membership;
mod profile;
mod template;

pub use adapter::LdapAuthAdapter;
#[cfg(feature = "ldap")]
pub use client::LdapClientConnector;
pub use client::{DirectoryConnector, DirectorySession, LdapEntry, SearchScope};
pub use config::{keys, AttributeMap, ConnectionSettings, DirectoryConfig, DEFAULT_PORT};
pub use membership::GroupMembershipVerifier;
pub use profile::ProfileFetcher;
pub use template::{substitute, TemplateKey, TemplateResolver};

/// Convenient result alias that reuses the core error type.
pub type Result<T> = dirauth_core::Result<T>;
