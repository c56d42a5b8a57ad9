//! Error types for authentication adapters.
//!
//! Every adapter failure is reported through [`Error`]. Each variant carries a human-readable
//! message and maps to a stable error code, so callers can decide on UI messaging without
//! string matching.

use thiserror::Error;

/// Main error type for adapter operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No directory client is available in this build or deployment
    #[error("LDAP client support is required for LDAP authentication")]
    Unsupported,

    /// The directory server could not be reached
    #[error("Could not connect to LDAP server: {0}")]
    ConnectionFailed(String),

    /// The directory rejected the supplied credentials
    #[error("User could not be authenticated with LDAP server")]
    BindFailed,

    /// The user is not listed in any of the required groups
    #[error("User is not member of at least one of the required groups")]
    NotMember,

    /// A directory search failed; carries the directory's error text
    #[error("LDAP search error: {0}")]
    SearchFailed(String),

    /// The user entry could not be found
    #[error("User could not be found")]
    NotFound,

    /// A configured attribute is absent from the user entry
    #[error("LDAP entry missing attribute `{0}`")]
    MissingAttribute(String),

    /// A directory operation failed at the protocol level
    #[error("Directory error during {operation}: {message}")]
    DirectoryError {
        /// Operation that failed (connect, bind, search, unbind)
        operation: String,
        /// Error message reported by the directory client
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Local password hashing failed
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
}

/// Specialized result type for adapter operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Message shown to end users for every credential-related failure.
pub const GENERIC_LOGIN_FAILURE: &str = "Invalid username or password";

impl Error {
    /// Creates a [`Error::DirectoryError`] for the given operation.
    #[must_use]
    pub fn directory(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DirectoryError {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unsupported => "UNSUPPORTED",
            Self::ConnectionFailed(_) => "CONNECTION_FAILED",
            Self::BindFailed => "BIND_FAILED",
            Self::NotMember => "NOT_MEMBER",
            Self::SearchFailed(_) => "SEARCH_FAILED",
            Self::NotFound => "NOT_FOUND",
            Self::MissingAttribute(_) => "MISSING_ATTRIBUTE",
            Self::DirectoryError { .. } => "DIRECTORY_ERROR",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::PasswordHash(_) => "PASSWORD_HASH_ERROR",
        }
    }

    /// Returns true when the failure stems from the user's credentials or directory entry
    /// rather than from the deployment.
    #[must_use]
    pub const fn is_credential_failure(&self) -> bool {
        matches!(
            self,
            Self::BindFailed
                | Self::NotMember
                | Self::NotFound
                | Self::MissingAttribute(_)
                | Self::SearchFailed(_)
        )
    }

    /// Message that is safe to show an unauthenticated end user.
    ///
    /// Credential-related failures collapse to [`GENERIC_LOGIN_FAILURE`] so the response does
    /// not reveal whether the account exists or which check rejected it.
    #[must_use]
    pub fn public_message(&self) -> String {
        if self.is_credential_failure() || matches!(self, Self::ConnectionFailed(_)) {
            GENERIC_LOGIN_FAILURE.to_string()
        } else {
            self.to_string()
        }
    }

    /// Returns true if this error points at the deployment rather than the user and should be
    /// logged at warning level.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(
            self,
            Self::Unsupported
                | Self::ConfigError(_)
                | Self::ConnectionFailed(_)
                | Self::DirectoryError { .. }
                | Self::PasswordHash(_)
        )
    }
}

// Conversions from external error types
impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::ConfigError(format!("invalid directory URL: {err}"))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ConfigError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ConfigError(format!("Invalid configuration: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::Unsupported.error_code(), "UNSUPPORTED");
        assert_eq!(
            Error::ConnectionFailed("refused".to_string()).error_code(),
            "CONNECTION_FAILED"
        );
        assert_eq!(Error::BindFailed.error_code(), "BIND_FAILED");
        assert_eq!(Error::NotMember.error_code(), "NOT_MEMBER");
        assert_eq!(
            Error::SearchFailed("test".to_string()).error_code(),
            "SEARCH_FAILED"
        );
        assert_eq!(Error::NotFound.error_code(), "NOT_FOUND");
        assert_eq!(
            Error::MissingAttribute("mail".to_string()).error_code(),
            "MISSING_ATTRIBUTE"
        );
        assert_eq!(
            Error::directory("bind", "msg").error_code(),
            "DIRECTORY_ERROR"
        );
        assert_eq!(
            Error::ConfigError("test".to_string()).error_code(),
            "CONFIG_ERROR"
        );
        assert_eq!(
            Error::ValidationError("test".to_string()).error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            Error::PasswordHash("test".to_string()).error_code(),
            "PASSWORD_HASH_ERROR"
        );
    }

    #[test]
    fn test_error_display() {
        let err = Error::SearchFailed("No such object".to_string());
        assert_eq!(err.to_string(), "LDAP search error: No such object");

        let err = Error::directory("connect", "connection refused");
        assert_eq!(
            err.to_string(),
            "Directory error during connect: connection refused"
        );

        assert_eq!(Error::NotFound.to_string(), "User could not be found");
    }

    #[test]
    fn test_public_message_hides_reason() {
        for err in [
            Error::BindFailed,
            Error::NotMember,
            Error::NotFound,
            Error::SearchFailed("x".to_string()),
            Error::ConnectionFailed("refused".to_string()),
        ] {
            assert_eq!(err.public_message(), GENERIC_LOGIN_FAILURE);
        }

        assert_eq!(
            Error::Unsupported.public_message(),
            Error::Unsupported.to_string()
        );
    }

    #[test]
    fn test_should_log() {
        assert!(Error::Unsupported.should_log());
        assert!(Error::ConfigError("test".to_string()).should_log());
        assert!(Error::directory("search", "msg").should_log());

        assert!(!Error::BindFailed.should_log());
        assert!(!Error::NotFound.should_log());
    }

    #[test]
    fn test_from_url_parse_error() {
        let err = url::Url::parse("not a url").unwrap_err();
        let converted: Error = err.into();
        assert!(matches!(converted, Error::ConfigError(_)));
    }

    #[test]
    fn test_from_validation_errors() {
        use validator::Validate;

        #[derive(Validate)]
        struct Settings {
            #[validate(length(min = 1, message = "host must be set"))]
            host: String,
        }

        let err = Settings {
            host: String::new(),
        }
        .validate()
        .unwrap_err();
        let converted: Error = err.into();
        assert!(matches!(
            converted,
            Error::ConfigError(ref msg) if msg.contains("host must be set")
        ));
    }

    #[test]
    fn test_from_serde_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let converted: Error = err.into();
        assert!(matches!(converted, Error::ConfigError(_)));
    }
}
