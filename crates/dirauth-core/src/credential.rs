//! Login credentials.

use secrecy::{ExposeSecret, SecretString};

/// Username/password pair submitted by a user.
///
/// The username is passed verbatim into directory templates. The password is wrapped in a
/// [`SecretString`]: it is redacted from `Debug` output and zeroized on drop.
#[derive(Debug)]
pub struct Credential {
    username: String,
    password: SecretString,
}

impl Credential {
    /// Creates a new credential.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// Returns the username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the secret password.
    #[must_use]
    pub const fn password(&self) -> &SecretString {
        &self.password
    }

    /// Returns true if the password is empty.
    ///
    /// Directories treat a simple bind with an empty password as an unauthenticated bind that
    /// succeeds, so adapters must refuse such credentials.
    #[must_use]
    pub fn has_empty_password(&self) -> bool {
        self.password.expose_secret().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password() {
        let credential = Credential::new("alice", "hunter2");
        let rendered = format!("{credential:?}");
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_empty_password() {
        assert!(Credential::new("alice", "").has_empty_password());
        assert!(!Credential::new("alice", "pw").has_empty_password());
        assert_eq!(Credential::new("alice", "pw").password().expose_secret(), "pw");
    }
}
