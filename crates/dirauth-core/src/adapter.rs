//! Authentication adapter interface.
//!
//! The umbrella application talks to every authentication backend through [`AuthAdapter`].
//! Implementations are stateless apart from their injected collaborators; configuration is
//! reloaded on each call.

use crate::{Credential, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Optional capabilities an adapter may offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterFeature {
    /// Users unknown to the application are created on first successful login.
    AutoCreateUsers,
    /// The application may reset a user's password through the adapter.
    ResetPasswords,
    /// The application may change a user's password through the adapter.
    UpdatePasswords,
}

impl AdapterFeature {
    /// Returns the canonical feature name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AutoCreateUsers => "auto_create_users",
            Self::ResetPasswords => "reset_passwords",
            Self::UpdatePasswords => "update_passwords",
        }
    }
}

impl fmt::Display for AdapterFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdapterFeature {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "auto_create_users" => Ok(Self::AutoCreateUsers),
            "reset_passwords" => Ok(Self::ResetPasswords),
            "update_passwords" => Ok(Self::UpdatePasswords),
            other => Err(crate::Error::ValidationError(format!(
                "unknown adapter feature `{other}`"
            ))),
        }
    }
}

/// Profile used to provision a user record in the umbrella application.
///
/// Email and names come from the directory entry; the activation flag, roles and groups are
/// configured defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryProfile {
    /// Email address.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Username exactly as submitted at login.
    pub username: String,
    /// Whether the provisioned account starts active.
    pub active: bool,
    /// Roles assigned to the provisioned account.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Groups assigned to the provisioned account.
    #[serde(default)]
    pub groups: Vec<String>,
}

/// Uniform interface implemented by every authentication backend.
#[async_trait]
pub trait AuthAdapter: Send + Sync {
    /// Checks the credential.
    ///
    /// Rejected credentials are reported as `Ok(false)`, never as an error.
    ///
    /// # Errors
    ///
    /// Returns an error only when the adapter itself cannot operate (missing backend support,
    /// unusable configuration).
    async fn authenticate(&self, credential: &Credential) -> Result<bool>;

    /// Returns a locally storable password hash for a newly provisioned user.
    ///
    /// # Errors
    ///
    /// Returns an error if the hash cannot be produced.
    fn create_user_and_get_password(&self, credential: &Credential) -> Result<String>;

    /// Authenticates the credential and returns the profile used for provisioning.
    ///
    /// # Errors
    ///
    /// Returns a distinct error for each reason the profile could not be produced.
    async fn get_user_info(&self, credential: &Credential) -> Result<DirectoryProfile>;

    /// Reports whether the adapter offers `feature`.
    fn supports_feature(&self, feature: AdapterFeature) -> bool;

    /// Removes backend state for `username`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend state cannot be removed.
    async fn delete_user(&self, username: &str) -> Result<bool>;

    /// Returns the URL where users manage their account, if one is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded.
    fn account_management_link(&self) -> Result<Option<String>>;
}
