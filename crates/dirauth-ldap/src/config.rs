//! Typed view of the LDAP adapter configuration.
//!
//! [`DirectoryConfig`] is rebuilt from the [`ConfigProvider`] at the start of every adapter call,
//! so it always reflects the latest configuration.

use crate::template::TemplateKey;
use dirauth_core::{ConfigProvider, ConfigValues, Error, Result};
use std::time::Duration;
use tracing::warn;
use url::Url;
use validator::Validate;

/// Default LDAP port used when neither `ldap_host` nor `ldap_port` names one.
pub const DEFAULT_PORT: u16 = 389;
/// Default attribute holding the user's email address.
pub const DEFAULT_EMAIL_ATTRIBUTE: &str = "mail";
/// Default attribute holding the user's given name.
pub const DEFAULT_FIRST_NAME_ATTRIBUTE: &str = "givenName";
/// Default attribute holding the user's family name.
pub const DEFAULT_LAST_NAME_ATTRIBUTE: &str = "sn";
/// Default multi-valued group attribute listing member user ids.
pub const DEFAULT_MEMBER_ATTRIBUTE: &str = "memberuid";

/// Configuration keys read by the adapter.
pub mod keys {
    /// Directory host name or `ldap://` / `ldaps://` URL.
    pub const HOST: &str = "ldap_host";
    /// Directory port.
    pub const PORT: &str = "ldap_port";
    /// Base DN substituted for `{base_dn}`.
    pub const BASE_DN: &str = "ldap_base_dn";
    /// User organizational unit substituted for `{user_ou}`.
    pub const USER_OU: &str = "ldap_user_ou";
    /// Ordered list of groups granting access; empty means everyone.
    pub const GROUP_CN_LIST: &str = "ldap_group_cn_list";
    /// Attribute holding the email address.
    pub const ATTRIBUTE_EMAIL: &str = "ldap_attribute_email";
    /// Attribute holding the given name.
    pub const ATTRIBUTE_FNAME: &str = "ldap_attribute_fname";
    /// Attribute holding the family name.
    pub const ATTRIBUTE_LNAME: &str = "ldap_attribute_lname";
    /// Whether provisioned users start active.
    pub const USERS_AUTO_ACTIVE: &str = "ldap_users_auto_active";
    /// Roles assigned to provisioned users.
    pub const USERS_DEFAULT_ROLES: &str = "ldap_users_default_roles";
    /// Groups assigned to provisioned users.
    pub const USERS_DEFAULT_GROUPS: &str = "ldap_users_default_groups";
    /// External account management URL.
    pub const MANAGE_ACCOUNT_URL: &str = "ldap_manage_account_url";
    /// Upgrade plain connections with StartTLS.
    pub const STARTTLS: &str = "ldap_starttls";
    /// Verify the server certificate on TLS connections.
    pub const TLS_VERIFY: &str = "ldap_tls_verify";
    /// Connection establishment timeout in seconds.
    pub const CONNECT_TIMEOUT: &str = "ldap_connect_timeout";
    /// Group attribute listing member user ids.
    pub const GROUP_MEMBER_ATTRIBUTE: &str = "ldap_group_member_attribute";
}

/// Parameters needed to open a directory connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    url: Url,
    start_tls: bool,
    tls_verify: bool,
    connect_timeout: Option<Duration>,
}

impl ConnectionSettings {
    /// Creates settings for `url` with StartTLS off, certificate verification on and the
    /// client library's default connect timeout.
    #[must_use]
    pub const fn new(url: Url) -> Self {
        Self {
            url,
            start_tls: false,
            tls_verify: true,
            connect_timeout: None,
        }
    }

    /// Directory endpoint URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Whether to upgrade the connection with StartTLS.
    #[must_use]
    pub const fn start_tls(&self) -> bool {
        self.start_tls
    }

    /// Whether to verify the server certificate.
    #[must_use]
    pub const fn tls_verify(&self) -> bool {
        self.tls_verify
    }

    /// Connect timeout, if one is configured.
    #[must_use]
    pub const fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    /// Enables or disables StartTLS.
    #[must_use]
    pub const fn with_start_tls(mut self, start_tls: bool) -> Self {
        self.start_tls = start_tls;
        self
    }

    /// Enables or disables certificate verification.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// Attribute names extracted into the provisioning profile.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct AttributeMap {
    /// Email attribute.
    #[validate(length(min = 1))]
    pub email: String,
    /// Given name attribute.
    #[validate(length(min = 1))]
    pub first_name: String,
    /// Family name attribute.
    #[validate(length(min = 1))]
    pub last_name: String,
}

impl AttributeMap {
    /// Attribute list requested from the directory.
    #[must_use]
    pub fn requested(&self) -> Vec<String> {
        vec![
            self.email.clone(),
            self.first_name.clone(),
            self.last_name.clone(),
        ]
    }
}

impl Default for AttributeMap {
    fn default() -> Self {
        Self {
            email: DEFAULT_EMAIL_ATTRIBUTE.to_string(),
            first_name: DEFAULT_FIRST_NAME_ATTRIBUTE.to_string(),
            last_name: DEFAULT_LAST_NAME_ATTRIBUTE.to_string(),
        }
    }
}

/// Immutable LDAP configuration for a single adapter call.
#[derive(Debug, Clone, Validate)]
pub struct DirectoryConfig {
    #[validate(length(min = 1, message = "ldap_host must be set"))]
    host: String,
    #[validate(range(min = 1, message = "ldap_port must be between 1 and 65535"))]
    port: Option<u16>,
    base_dn: String,
    user_ou: String,
    #[validate(length(min = 1, message = "ldap_bind_rdn_format must be set"))]
    bind_rdn_format: String,
    user_search_dn_format: String,
    user_search_filter_format: String,
    group_search_dn_format: String,
    group_search_filter_format: String,
    group_cn_list: Vec<String>,
    #[validate(nested)]
    attributes: AttributeMap,
    #[validate(length(min = 1))]
    member_attribute: String,
    users_auto_active: bool,
    default_roles: Vec<String>,
    default_groups: Vec<String>,
    connection: ConnectionSettings,
}

impl DirectoryConfig {
    /// Loads a fresh configuration from `provider`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the configuration cannot be loaded or is invalid.
    pub fn from_provider(provider: &dyn ConfigProvider) -> Result<Self> {
        Self::from_values(&provider.load()?)
    }

    /// Builds the configuration from a snapshot of values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if a value cannot be parsed or validation fails.
    pub fn from_values(values: &ConfigValues) -> Result<Self> {
        let host = values.get(keys::HOST).unwrap_or_default().trim().to_string();
        let port = parse_number::<u16>(values, keys::PORT)?;
        let connect_timeout = parse_number::<u64>(values, keys::CONNECT_TIMEOUT)?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let attributes = AttributeMap {
            email: string_or(values, keys::ATTRIBUTE_EMAIL, DEFAULT_EMAIL_ATTRIBUTE),
            first_name: string_or(values, keys::ATTRIBUTE_FNAME, DEFAULT_FIRST_NAME_ATTRIBUTE),
            last_name: string_or(values, keys::ATTRIBUTE_LNAME, DEFAULT_LAST_NAME_ATTRIBUTE),
        };

        let connection = ConnectionSettings::new(endpoint_url(&host, port)?)
            .with_start_tls(parse_bool(values, keys::STARTTLS)?.unwrap_or(false))
            .with_tls_verify(parse_bool(values, keys::TLS_VERIFY)?.unwrap_or(true))
            .with_connect_timeout(connect_timeout);

        let config = Self {
            host,
            port,
            base_dn: values.get(keys::BASE_DN).unwrap_or_default(),
            user_ou: values.get(keys::USER_OU).unwrap_or_default(),
            bind_rdn_format: template(values, TemplateKey::BindRdn),
            user_search_dn_format: template(values, TemplateKey::UserSearchDn),
            user_search_filter_format: template(values, TemplateKey::UserSearchFilter),
            group_search_dn_format: template(values, TemplateKey::GroupSearchDn),
            group_search_filter_format: template(values, TemplateKey::GroupSearchFilter),
            group_cn_list: values.get_list(keys::GROUP_CN_LIST),
            attributes,
            member_attribute: string_or(
                values,
                keys::GROUP_MEMBER_ATTRIBUTE,
                DEFAULT_MEMBER_ATTRIBUTE,
            ),
            users_auto_active: auto_active(values),
            default_roles: values.get_list(keys::USERS_DEFAULT_ROLES),
            default_groups: values.get_list(keys::USERS_DEFAULT_GROUPS),
            connection,
        };

        config.validate()?;

        Ok(config)
    }

    /// Directory host as configured.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Configured port, if any.
    #[must_use]
    pub const fn port(&self) -> Option<u16> {
        self.port
    }

    /// Base DN.
    #[must_use]
    pub fn base_dn(&self) -> &str {
        &self.base_dn
    }

    /// User organizational unit.
    #[must_use]
    pub fn user_ou(&self) -> &str {
        &self.user_ou
    }

    /// Raw template for `key`.
    #[must_use]
    pub fn template(&self, key: TemplateKey) -> &str {
        match key {
            TemplateKey::BindRdn => &self.bind_rdn_format,
            TemplateKey::UserSearchDn => &self.user_search_dn_format,
            TemplateKey::UserSearchFilter => &self.user_search_filter_format,
            TemplateKey::GroupSearchDn => &self.group_search_dn_format,
            TemplateKey::GroupSearchFilter => &self.group_search_filter_format,
        }
    }

    /// Groups granting access, in configured order. Empty means no restriction.
    #[must_use]
    pub fn group_cn_list(&self) -> &[String] {
        &self.group_cn_list
    }

    /// Attribute names extracted into the profile.
    #[must_use]
    pub const fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    /// Group attribute listing member user ids.
    #[must_use]
    pub fn member_attribute(&self) -> &str {
        &self.member_attribute
    }

    /// Whether provisioned users start active.
    #[must_use]
    pub const fn users_auto_active(&self) -> bool {
        self.users_auto_active
    }

    /// Roles assigned to provisioned users.
    #[must_use]
    pub fn default_roles(&self) -> &[String] {
        &self.default_roles
    }

    /// Groups assigned to provisioned users.
    #[must_use]
    pub fn default_groups(&self) -> &[String] {
        &self.default_groups
    }

    /// Connection parameters.
    #[must_use]
    pub const fn connection(&self) -> &ConnectionSettings {
        &self.connection
    }
}

/// Reads the account management URL; an empty value counts as unset.
///
/// The link is passed to the application unvalidated and plays no part in logging in.
pub(crate) fn manage_account_url(values: &ConfigValues) -> Option<String> {
    values
        .get(keys::MANAGE_ACCOUNT_URL)
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
}

fn template(values: &ConfigValues, key: TemplateKey) -> String {
    values.get(key.config_key()).unwrap_or_default()
}

fn string_or(values: &ConfigValues, key: &str, default: &str) -> String {
    values
        .get(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Whether provisioned users start active. Unrecognised values read as inactive.
fn auto_active(values: &ConfigValues) -> bool {
    match values.get_bool(keys::USERS_AUTO_ACTIVE) {
        Some(active) => active,
        None => {
            if let Some(raw) = values.get(keys::USERS_AUTO_ACTIVE) {
                warn!(
                    key = keys::USERS_AUTO_ACTIVE,
                    value = %raw,
                    "not a boolean, provisioned users start inactive"
                );
            }
            false
        }
    }
}

fn parse_bool(values: &ConfigValues, key: &str) -> Result<Option<bool>> {
    match values.get(key) {
        None => Ok(None),
        Some(raw) => values
            .get_bool(key)
            .map(Some)
            .ok_or_else(|| Error::ConfigError(format!("{key} is not a boolean: `{raw}`"))),
    }
}

fn parse_number<T: std::str::FromStr>(values: &ConfigValues, key: &str) -> Result<Option<T>> {
    match values.get(key).map(|raw| raw.trim().to_string()) {
        None => Ok(None),
        Some(raw) if raw.is_empty() => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::ConfigError(format!("{key} is not a valid number: `{raw}`"))),
    }
}

/// Builds the endpoint URL from `ldap_host` and `ldap_port`.
///
/// A host that already carries a scheme is used as-is; the configured port only fills in a
/// missing one. A bare host becomes `ldap://host:port`.
fn endpoint_url(host: &str, port: Option<u16>) -> Result<Url> {
    if host.is_empty() {
        return Err(Error::ConfigError(format!("{} must be set", keys::HOST)));
    }

    if host.contains("://") {
        let mut url = Url::parse(host)?;
        if url.port().is_none() {
            if let Some(port) = port {
                url.set_port(Some(port)).map_err(|()| {
                    Error::ConfigError(format!("cannot apply {} to `{host}`", keys::PORT))
                })?;
            }
        }
        return Ok(url);
    }

    let port = port.unwrap_or(DEFAULT_PORT);
    Ok(Url::parse(&format!("ldap://{host}:{port}"))?)
}
