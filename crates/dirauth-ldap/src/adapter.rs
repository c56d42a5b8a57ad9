//! LDAP implementation of [`AuthAdapter`].

use crate::client::{error_detail, into_search_error, BoundSession, DirectoryConnector};
use crate::config::{self, DirectoryConfig};
use crate::membership::GroupMembershipVerifier;
use crate::profile::ProfileFetcher;
use crate::template::{TemplateKey, TemplateResolver};
use async_trait::async_trait;
use dirauth_core::{
    AdapterFeature, Argon2Hasher, AuthAdapter, ConfigProvider, Credential, CredentialHasher,
    DirectoryProfile, Error, Result,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Authenticates users against an LDAP directory.
///
/// The adapter holds no per-login state: every call reloads the configuration, opens its own
/// session and unbinds it before returning, so one instance can serve concurrent logins.
pub struct LdapAuthAdapter {
    config: Arc<dyn ConfigProvider>,
    connector: Option<Arc<dyn DirectoryConnector>>,
    hasher: Arc<dyn CredentialHasher>,
}

impl LdapAuthAdapter {
    /// Creates an adapter that reads its settings from `config`.
    ///
    /// Uses the `ldap3` client when the `ldap` feature is enabled; otherwise every directory
    /// operation fails with [`Error::Unsupported`].
    #[must_use]
    pub fn new(config: Arc<dyn ConfigProvider>) -> Self {
        Self {
            config,
            connector: default_connector(),
            hasher: Arc::new(Argon2Hasher::default()),
        }
    }

    /// Replaces the directory client.
    #[must_use]
    pub fn with_connector(mut self, connector: Arc<dyn DirectoryConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Removes the directory client, as in a build without LDAP support.
    #[must_use]
    pub fn without_connector(mut self) -> Self {
        self.connector = None;
        self
    }

    /// Replaces the hasher used by [`AuthAdapter::create_user_and_get_password`].
    #[must_use]
    pub fn with_hasher(mut self, hasher: Arc<dyn CredentialHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Returns true if a directory client is available.
    #[must_use]
    pub fn has_directory_support(&self) -> bool {
        self.connector.is_some()
    }

    fn connector(&self) -> Result<&dyn DirectoryConnector> {
        self.connector.as_deref().ok_or(Error::Unsupported)
    }

    fn load_config(&self) -> Result<DirectoryConfig> {
        DirectoryConfig::from_provider(self.config.as_ref())
    }

    /// Connects, binds as the user and checks group membership.
    ///
    /// On success the caller owns the returned session and must release it. On failure the
    /// session, if one was opened, has already been released.
    async fn authorized_session(
        &self,
        connector: &dyn DirectoryConnector,
        config: &DirectoryConfig,
        credential: &Credential,
    ) -> Result<BoundSession> {
        let bind_dn = TemplateResolver::new(config).resolve(
            TemplateKey::BindRdn,
            credential.username(),
            config.user_ou(),
            config.base_dn(),
        );

        let session = connector
            .connect(config.connection())
            .await
            .map_err(|err| {
                let detail = error_detail(err);
                warn!(url = %config.connection().url(), error = %detail, "LDAP connection failed");
                Error::ConnectionFailed(detail)
            })?;
        let mut session = BoundSession::new(session);

        match authorize(&mut session, config, credential, &bind_dn).await {
            Ok(()) => Ok(session),
            Err(err) => {
                session.release().await;
                Err(err)
            }
        }
    }
}

async fn authorize(
    session: &mut BoundSession,
    config: &DirectoryConfig,
    credential: &Credential,
    bind_dn: &str,
) -> Result<()> {
    let username = credential.username();

    if credential.has_empty_password() {
        debug!(username, "refusing LDAP bind with empty password");
        return Err(Error::BindFailed);
    }

    session
        .session()
        .simple_bind(bind_dn, credential.password())
        .await
        .map_err(|err| {
            debug!(username, bind_dn, error = %err, "LDAP bind failed");
            Error::BindFailed
        })?;

    let member = GroupMembershipVerifier::new(config)
        .is_member(username, session.session())
        .await
        .map_err(into_search_error)?;
    if !member {
        return Err(Error::NotMember);
    }

    Ok(())
}

#[cfg(feature = "ldap")]
fn default_connector() -> Option<Arc<dyn DirectoryConnector>> {
    Some(Arc::new(crate::client::LdapClientConnector::new()))
}

#[cfg(not(feature = "ldap"))]
fn default_connector() -> Option<Arc<dyn DirectoryConnector>> {
    None
}

#[async_trait]
impl AuthAdapter for LdapAuthAdapter {
    async fn authenticate(&self, credential: &Credential) -> Result<bool> {
        let connector = self.connector()?;
        let config = self.load_config()?;

        match self.authorized_session(connector, &config, credential).await {
            Ok(session) => {
                session.release().await;
                debug!(username = credential.username(), "LDAP authentication succeeded");
                Ok(true)
            }
            Err(err) if err.should_log() => {
                warn!(
                    username = credential.username(),
                    reason = err.error_code(),
                    error = %err,
                    "LDAP authentication rejected"
                );
                Ok(false)
            }
            Err(err) => {
                debug!(
                    username = credential.username(),
                    reason = err.error_code(),
                    "LDAP authentication rejected"
                );
                Ok(false)
            }
        }
    }

    fn create_user_and_get_password(&self, credential: &Credential) -> Result<String> {
        // Directory accounts are never created here; the hash lets the application fall back
        // to local authentication if LDAP is switched off later.
        self.hasher.hash(credential.password())
    }

    async fn get_user_info(&self, credential: &Credential) -> Result<DirectoryProfile> {
        let connector = self.connector()?;
        let config = self.load_config()?;

        let mut session = self
            .authorized_session(connector, &config, credential)
            .await?;
        let profile = ProfileFetcher::new(&config)
            .fetch(credential.username(), session.session())
            .await;
        session.release().await;

        if let Err(err) = &profile {
            debug!(
                username = credential.username(),
                reason = err.error_code(),
                "LDAP profile lookup failed"
            );
        }
        profile
    }

    fn supports_feature(&self, feature: AdapterFeature) -> bool {
        match feature {
            AdapterFeature::AutoCreateUsers => true,
            AdapterFeature::ResetPasswords | AdapterFeature::UpdatePasswords => false,
        }
    }

    async fn delete_user(&self, username: &str) -> Result<bool> {
        debug!(username, "LDAP accounts are not deleted by the adapter");
        Ok(true)
    }

    fn account_management_link(&self) -> Result<Option<String>> {
        Ok(config::manage_account_url(&self.config.load()?))
    }
}
