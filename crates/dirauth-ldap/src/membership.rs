//! Group-based authorization.
//!
//! A user is authorized when their id appears in the member attribute of at least one
//! configured group. When no groups are configured every bound user is authorized. That default
//! is permissive on purpose and matches existing deployments; restrict access by listing groups
//! in `ldap_group_cn_list`.

use crate::client::{DirectorySession, SearchScope};
use crate::config::DirectoryConfig;
use crate::template::{TemplateKey, TemplateResolver};
use dirauth_core::Result;
use tracing::debug;

/// Checks group membership over an already bound session.
#[derive(Debug, Clone, Copy)]
pub struct GroupMembershipVerifier<'a> {
    config: &'a DirectoryConfig,
}

impl<'a> GroupMembershipVerifier<'a> {
    /// Creates a verifier over `config`.
    #[must_use]
    pub const fn new(config: &'a DirectoryConfig) -> Self {
        Self { config }
    }

    /// Returns true if `username` is a member of at least one configured group.
    ///
    /// Groups are searched in configured order and the first match wins.
    ///
    /// # Errors
    ///
    /// Propagates the session error if a group search fails.
    pub async fn is_member(
        &self,
        username: &str,
        session: &mut dyn DirectorySession,
    ) -> Result<bool> {
        let groups = self.config.group_cn_list();
        if groups.is_empty() {
            debug!("no LDAP groups configured, every bound user is authorized");
            return Ok(true);
        }

        let resolver = TemplateResolver::new(self.config);
        let base_dn = self.config.base_dn();
        let search_dn = resolver.resolve(TemplateKey::GroupSearchDn, "", "", base_dn);
        let member_attribute = self.config.member_attribute();
        let attributes = vec![member_attribute.to_string()];

        for group in groups {
            let filter = resolver.resolve(TemplateKey::GroupSearchFilter, group, "", base_dn);
            let entries = session
                .search(&search_dn, SearchScope::Subtree, &filter, &attributes)
                .await?;

            let found = entries.iter().any(|entry| {
                entry
                    .values(member_attribute)
                    .is_some_and(|members| members.iter().any(|member| member == username))
            });
            if found {
                debug!(username, group = %group, "LDAP group membership confirmed");
                return Ok(true);
            }
        }

        debug!(username, "user is not a member of any configured LDAP group");
        Ok(false)
    }
}
