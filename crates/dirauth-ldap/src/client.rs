//! Directory connections and sessions.
//!
//! The adapter talks to the directory through [`DirectoryConnector`] and [`DirectorySession`],
//! so tests can substitute doubles. The production implementation is backed by `ldap3` and is
//! only compiled with the `ldap` feature.

use crate::config::ConnectionSettings;
use async_trait::async_trait;
use dirauth_core::{Error, Result};
use secrecy::SecretString;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Represents the search scope for LDAP queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// Base object only.
    Base,
    /// One level below the base.
    OneLevel,
    /// Entire subtree.
    Subtree,
}

#[cfg(feature = "ldap")]
impl From<SearchScope> for ldap3::Scope {
    fn from(scope: SearchScope) -> Self {
        match scope {
            SearchScope::Base => ldap3::Scope::Base,
            SearchScope::OneLevel => ldap3::Scope::OneLevel,
            SearchScope::Subtree => ldap3::Scope::Subtree,
        }
    }
}

/// LDAP entry returned by a search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LdapEntry {
    /// Distinguished name of the entry.
    pub dn: String,
    /// Attribute map (values preserve the order sent by the server).
    pub attributes: HashMap<String, Vec<String>>,
}

impl LdapEntry {
    /// Creates an entry with no attributes.
    #[must_use]
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: HashMap::new(),
        }
    }

    /// Adds an attribute and returns the updated entry.
    #[must_use]
    pub fn with_attribute<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Returns all values for the attribute.
    ///
    /// Attribute names are matched case-insensitively, since servers may return `memberUid`
    /// for a request naming `memberuid`.
    #[must_use]
    pub fn values(&self, attribute: &str) -> Option<&[String]> {
        self.attributes
            .get(attribute)
            .or_else(|| {
                self.attributes
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(attribute))
                    .map(|(_, values)| values)
            })
            .map(Vec::as_slice)
    }

    /// Returns the first value of the attribute if present.
    #[must_use]
    pub fn first(&self, attribute: &str) -> Option<&str> {
        self.values(attribute)
            .and_then(|values| values.first().map(String::as_str))
    }
}

/// An open directory session.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DirectorySession: Send {
    /// Authenticates the session as `dn`.
    async fn simple_bind(&mut self, dn: &str, password: &SecretString) -> Result<()>;

    /// Searches below `base_dn`, returning the requested attributes of every match.
    async fn search(
        &mut self,
        base_dn: &str,
        scope: SearchScope,
        filter: &str,
        attributes: &[String],
    ) -> Result<Vec<LdapEntry>>;

    /// Ends the session.
    async fn unbind(&mut self) -> Result<()>;
}

/// Opens directory sessions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DirectoryConnector: Send + Sync {
    /// Opens a session using LDAP protocol version 3. No credentials are checked.
    async fn connect(&self, settings: &ConnectionSettings) -> Result<Box<dyn DirectorySession>>;
}

/// A session owned by one adapter call, released exactly once.
///
/// Unbinding is asynchronous, so it cannot happen in `Drop`; callers must finish with
/// [`BoundSession::release`]. A session dropped without release (for example when the caller's
/// future is cancelled) is logged and its connection closes when the client handle drops.
pub(crate) struct BoundSession {
    inner: Box<dyn DirectorySession>,
    released: bool,
}

impl BoundSession {
    pub(crate) fn new(inner: Box<dyn DirectorySession>) -> Self {
        Self {
            inner,
            released: false,
        }
    }

    pub(crate) fn session(&mut self) -> &mut dyn DirectorySession {
        &mut *self.inner
    }

    /// Unbinds the session. Unbind failures are logged and otherwise ignored.
    pub(crate) async fn release(mut self) {
        self.released = true;
        match self.inner.unbind().await {
            Ok(()) => debug!("LDAP session released"),
            Err(err) => warn!(error = %err, "LDAP unbind failed"),
        }
    }
}

impl Drop for BoundSession {
    fn drop(&mut self) {
        if !self.released {
            warn!("LDAP session dropped without unbind");
        }
    }
}

/// Extracts the directory's own message from a session error.
pub(crate) fn error_detail(err: Error) -> String {
    match err {
        Error::DirectoryError { message, .. } => message,
        other => other.to_string(),
    }
}

/// Maps a failed search into [`Error::SearchFailed`] carrying the directory's message.
pub(crate) fn into_search_error(err: Error) -> Error {
    match err {
        Error::DirectoryError { message, .. } => Error::SearchFailed(message),
        other => other,
    }
}

#[cfg(feature = "ldap")]
pub use real::LdapClientConnector;

#[cfg(feature = "ldap")]
mod real {
    use super::{DirectoryConnector, DirectorySession, LdapEntry, SearchScope};
    use crate::config::ConnectionSettings;
    use async_trait::async_trait;
    use dirauth_core::{Error, Result};
    use ldap3::{LdapConnAsync, LdapConnSettings, SearchEntry};
    use secrecy::{ExposeSecret, SecretString};
    use tracing::debug;

    /// Directory connector backed by `ldap3`.
    ///
    /// `ldap3` only speaks protocol version 3, which is what every session uses.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct LdapClientConnector;

    impl LdapClientConnector {
        /// Creates a new connector instance.
        #[must_use]
        pub const fn new() -> Self {
            Self
        }
    }

    #[async_trait]
    impl DirectoryConnector for LdapClientConnector {
        async fn connect(
            &self,
            settings: &ConnectionSettings,
        ) -> Result<Box<dyn DirectorySession>> {
            let mut ldap_settings = LdapConnSettings::new()
                .set_starttls(settings.start_tls())
                .set_no_tls_verify(!settings.tls_verify());
            if let Some(timeout) = settings.connect_timeout() {
                ldap_settings = ldap_settings.set_conn_timeout(timeout);
            }

            debug!(url = %settings.url(), "connecting to LDAP server");

            let (conn, ldap) = LdapConnAsync::with_settings(ldap_settings, settings.url().as_str())
                .await
                .map_err(|err| map_ldap_error("connect", &err))?;
            ldap3::drive!(conn);

            Ok(Box::new(LdapClientSession { inner: ldap }))
        }
    }

    struct LdapClientSession {
        inner: ldap3::Ldap,
    }

    #[async_trait]
    impl DirectorySession for LdapClientSession {
        async fn simple_bind(&mut self, dn: &str, password: &SecretString) -> Result<()> {
            self.inner
                .simple_bind(dn, password.expose_secret())
                .await
                .and_then(ldap3::LdapResult::success)
                .map_err(|err| map_ldap_error("bind", &err))?;
            Ok(())
        }

        async fn search(
            &mut self,
            base_dn: &str,
            scope: SearchScope,
            filter: &str,
            attributes: &[String],
        ) -> Result<Vec<LdapEntry>> {
            let (entries, _) = self
                .inner
                .search(base_dn, scope.into(), filter, attributes.to_vec())
                .await
                .and_then(ldap3::SearchResult::success)
                .map_err(|err| map_ldap_error("search", &err))?;

            Ok(entries
                .into_iter()
                .map(SearchEntry::construct)
                .map(|entry| LdapEntry {
                    dn: entry.dn,
                    attributes: entry.attrs,
                })
                .collect())
        }

        async fn unbind(&mut self) -> Result<()> {
            self.inner
                .unbind()
                .await
                .map_err(|err| map_ldap_error("unbind", &err))
        }
    }

    fn map_ldap_error(operation: &str, err: &ldap3::LdapError) -> Error {
        Error::directory(operation, err.to_string())
    }
}
