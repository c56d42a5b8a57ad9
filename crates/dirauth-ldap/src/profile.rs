//! User profile lookup for account provisioning.

use crate::client::{into_search_error, DirectorySession, LdapEntry, SearchScope};
use crate::config::DirectoryConfig;
use crate::template::{TemplateKey, TemplateResolver};
use dirauth_core::{DirectoryProfile, Error, Result};
use tracing::debug;

/// Searches the directory for a user entry and builds a [`DirectoryProfile`].
#[derive(Debug, Clone, Copy)]
pub struct ProfileFetcher<'a> {
    config: &'a DirectoryConfig,
}

impl<'a> ProfileFetcher<'a> {
    /// Creates a fetcher over `config`.
    #[must_use]
    pub const fn new(config: &'a DirectoryConfig) -> Self {
        Self { config }
    }

    /// Looks up `username` over a bound session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SearchFailed`] with the directory's message if the search fails,
    /// [`Error::NotFound`] if it returns no entries, and [`Error::MissingAttribute`] if the
    /// first entry lacks a configured attribute.
    pub async fn fetch(
        &self,
        username: &str,
        session: &mut dyn DirectorySession,
    ) -> Result<DirectoryProfile> {
        let resolver = TemplateResolver::new(self.config);
        let (user_ou, base_dn) = (self.config.user_ou(), self.config.base_dn());
        let search_dn = resolver.resolve(TemplateKey::UserSearchDn, username, user_ou, base_dn);
        let filter = resolver.resolve(TemplateKey::UserSearchFilter, username, user_ou, base_dn);

        debug!(search_dn = %search_dn, filter = %filter, "searching LDAP for user entry");

        let entries = session
            .search(
                &search_dn,
                SearchScope::Subtree,
                &filter,
                &self.config.attributes().requested(),
            )
            .await
            .map_err(into_search_error)?;

        let entry = entries.into_iter().next().ok_or(Error::NotFound)?;
        self.extract(username, &entry)
    }

    /// Builds the profile from the first value of each configured attribute.
    ///
    /// The username is passed through verbatim; the activation flag, roles and groups are the
    /// configured defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingAttribute`] if a configured attribute has no value.
    pub fn extract(&self, username: &str, entry: &LdapEntry) -> Result<DirectoryProfile> {
        let attributes = self.config.attributes();

        Ok(DirectoryProfile {
            email: required(entry, &attributes.email)?,
            first_name: required(entry, &attributes.first_name)?,
            last_name: required(entry, &attributes.last_name)?,
            username: username.to_string(),
            active: self.config.users_auto_active(),
            roles: self.config.default_roles().to_vec(),
            groups: self.config.default_groups().to_vec(),
        })
    }
}

fn required(entry: &LdapEntry, attribute: &str) -> Result<String> {
    entry
        .first(attribute)
        .map(str::to_owned)
        .ok_or_else(|| Error::MissingAttribute(attribute.to_string()))
}
