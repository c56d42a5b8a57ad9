//! Placeholder substitution for configured DN and filter templates.
//!
//! Templates may contain `{username}`, `{groupname}`, `{user_ou}` and `{base_dn}`. The first two
//! receive the same value: one resolver serves both user lookups and group filters. Values are
//! inserted verbatim; escaping LDAP special characters is left to whoever writes the templates.

use crate::config::DirectoryConfig;

/// Token replaced with the user (or group) name.
pub const USERNAME_TOKEN: &str = "{username}";
/// Token replaced with the user (or group) name.
pub const GROUPNAME_TOKEN: &str = "{groupname}";
/// Token replaced with the configured user organizational unit.
pub const USER_OU_TOKEN: &str = "{user_ou}";
/// Token replaced with the configured base DN.
pub const BASE_DN_TOKEN: &str = "{base_dn}";

/// Configured templates that can be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKey {
    /// DN used to bind as the user (`ldap_bind_rdn_format`).
    BindRdn,
    /// Base DN of the user profile search (`ldap_user_search_dn_format`).
    UserSearchDn,
    /// Filter of the user profile search (`ldap_user_search_filter_format`).
    UserSearchFilter,
    /// Base DN of group searches (`ldap_group_search_dn_format`).
    GroupSearchDn,
    /// Filter of group searches (`ldap_group_search_filter_format`).
    GroupSearchFilter,
}

impl TemplateKey {
    /// Configuration key holding the template.
    #[must_use]
    pub const fn config_key(&self) -> &'static str {
        match self {
            Self::BindRdn => "ldap_bind_rdn_format",
            Self::UserSearchDn => "ldap_user_search_dn_format",
            Self::UserSearchFilter => "ldap_user_search_filter_format",
            Self::GroupSearchDn => "ldap_group_search_dn_format",
            Self::GroupSearchFilter => "ldap_group_search_filter_format",
        }
    }
}

/// Resolves templates from a loaded [`DirectoryConfig`].
#[derive(Debug, Clone, Copy)]
pub struct TemplateResolver<'a> {
    config: &'a DirectoryConfig,
}

impl<'a> TemplateResolver<'a> {
    /// Creates a resolver over `config`.
    #[must_use]
    pub const fn new(config: &'a DirectoryConfig) -> Self {
        Self { config }
    }

    /// Loads the template named by `key` and substitutes every token.
    #[must_use]
    pub fn resolve(&self, key: TemplateKey, name: &str, user_ou: &str, base_dn: &str) -> String {
        substitute(self.config.template(key), name, user_ou, base_dn)
    }
}

/// Replaces every occurrence of each token in `template`.
///
/// Tokens missing from the template are simply not replaced.
#[must_use]
pub fn substitute(template: &str, name: &str, user_ou: &str, base_dn: &str) -> String {
    template
        .replace(USERNAME_TOKEN, name)
        .replace(GROUPNAME_TOKEN, name)
        .replace(USER_OU_TOKEN, user_ou)
        .replace(BASE_DN_TOKEN, base_dn)
}
