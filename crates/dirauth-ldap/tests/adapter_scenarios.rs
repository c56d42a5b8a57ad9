//! End-to-end login scenarios for the LDAP adapter.
//!
//! These tests drive the public adapter API against mocked directory sessions and check both
//! the outcome and that every opened session is unbound exactly once.

use async_trait::async_trait;
use dirauth_core::{AuthAdapter, Credential, DirectoryProfile, Error, Result, StaticConfig};
use dirauth_ldap::{
    ConnectionSettings, DirectoryConnector, DirectorySession, LdapAuthAdapter, LdapEntry,
    SearchScope,
};
use mockall::mock;
use secrecy::SecretString;
use std::sync::Arc;

mock! {
    pub Session {}

    #[async_trait]
    impl DirectorySession for Session {
        async fn simple_bind(&mut self, dn: &str, password: &SecretString) -> Result<()>;
        async fn search(
            &mut self,
            base_dn: &str,
            scope: SearchScope,
            filter: &str,
            attributes: &[String],
        ) -> Result<Vec<LdapEntry>>;
        async fn unbind(&mut self) -> Result<()>;
    }
}

mock! {
    pub Connector {}

    #[async_trait]
    impl DirectoryConnector for Connector {
        async fn connect(&self, settings: &ConnectionSettings) -> Result<Box<dyn DirectorySession>>;
    }
}

/// How the mocked directory answers after a successful connect.
#[derive(Clone, Copy)]
enum Directory {
    RejectBind,
    Groups(&'static [&'static str]),
    GroupSearchFails,
    UserSearchFails,
    NoUser,
    User,
}

fn config(groups: &[&str]) -> StaticConfig {
    StaticConfig::new()
        .with("ldap_host", "ldap://directory.example.org")
        .with("ldap_port", 389)
        .with("ldap_base_dn", "dc=example,dc=org")
        .with("ldap_user_ou", "ou=People")
        .with("ldap_bind_rdn_format", "uid={username},{user_ou},{base_dn}")
        .with("ldap_user_search_dn_format", "{user_ou},{base_dn}")
        .with("ldap_user_search_filter_format", "(&(objectClass=inetOrgPerson)(uid={username}))")
        .with("ldap_group_search_dn_format", "ou=Groups,{base_dn}")
        .with("ldap_group_search_filter_format", "(&(objectClass=posixGroup)(cn={groupname}))")
        .with("ldap_group_cn_list", groups.to_vec())
        .with("ldap_attribute_email", "mail")
        .with("ldap_attribute_fname", "givenName")
        .with("ldap_attribute_lname", "sn")
        .with("ldap_users_auto_active", "0")
        .with("ldap_users_default_roles", vec!["viewer", "commenter"])
        .with("ldap_users_default_groups", Vec::<String>::new())
        .with("ldap_manage_account_url", "https://id.example.org/account")
}

fn session(directory: Directory) -> MockSession {
    let mut session = MockSession::new();

    match directory {
        Directory::RejectBind => {
            session
                .expect_simple_bind()
                .times(1)
                .returning(|_, _| Err(Error::directory("bind", "invalidCredentials (49)")));
            session.expect_search().never();
        }
        Directory::Groups(members) => {
            session.expect_simple_bind().times(1).returning(|_, _| Ok(()));
            session
                .expect_search()
                .withf(|base, _, _, _| base.starts_with("ou=Groups"))
                .returning(move |_, _, _, _| {
                    Ok(vec![LdapEntry::new("cn=staff,ou=Groups,dc=example,dc=org")
                        .with_attribute("memberUid", members.iter().copied())])
                });
        }
        Directory::GroupSearchFails => {
            session.expect_simple_bind().times(1).returning(|_, _| Ok(()));
            session
                .expect_search()
                .returning(|_, _, _, _| Err(Error::directory("search", "Operations error")));
        }
        Directory::UserSearchFails | Directory::NoUser | Directory::User => {
            session.expect_simple_bind().times(1).returning(|_, _| Ok(()));
            session
                .expect_search()
                .withf(|base, scope, _, _| {
                    base.to_string() == "ou=People,dc=example,dc=org"
                        && *scope == SearchScope::Subtree
                })
                .times(1)
                .returning(move |_, _, _, _| match directory {
                    Directory::UserSearchFails => {
                        Err(Error::directory("search", "Size limit exceeded"))
                    }
                    Directory::NoUser => Ok(Vec::new()),
                    _ => Ok(vec![LdapEntry::new("uid=alice,ou=People,dc=example,dc=org")
                        .with_attribute("mail", ["alice@example.org"])
                        .with_attribute("givenName", ["Alice"])
                        .with_attribute("sn", ["Liddell"])]),
                });
        }
    }

    session.expect_unbind().times(1).returning(|| Ok(()));
    session
}

fn adapter(groups: &[&str], directory: Directory) -> LdapAuthAdapter {
    let mut connector = MockConnector::new();
    connector
        .expect_connect()
        .times(1)
        .return_once(move |_| Ok(Box::new(session(directory))));
    LdapAuthAdapter::new(Arc::new(config(groups))).with_connector(Arc::new(connector))
}

fn alice() -> Credential {
    Credential::new("alice", "pw")
}

#[tokio::test]
async fn no_groups_configured_authorizes_any_bound_user() {
    let adapter = adapter(&[], Directory::Groups(&[]));
    assert!(adapter.authenticate(&alice()).await.unwrap());
}

#[tokio::test]
async fn staff_member_is_authorized() {
    let adapter = adapter(&["staff"], Directory::Groups(&["alice"]));
    assert!(adapter.authenticate(&alice()).await.unwrap());
}

#[tokio::test]
async fn non_member_is_rejected() {
    let adapter = adapter(&["staff"], Directory::Groups(&["bob"]));
    assert!(!adapter.authenticate(&alice()).await.unwrap());
}

#[tokio::test]
async fn authenticate_collapses_failures_to_false() {
    for directory in [Directory::RejectBind, Directory::GroupSearchFails] {
        let adapter = adapter(&["staff"], directory);
        assert!(!adapter.authenticate(&alice()).await.unwrap());
    }
}

#[tokio::test]
async fn get_user_info_builds_profile_from_entry_and_defaults() {
    let adapter = adapter(&[], Directory::User);
    let profile = adapter.get_user_info(&alice()).await.unwrap();

    assert_eq!(
        profile,
        DirectoryProfile {
            email: "alice@example.org".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Liddell".to_string(),
            username: "alice".to_string(),
            active: false,
            roles: vec!["viewer".to_string(), "commenter".to_string()],
            groups: Vec::new(),
        }
    );
}

#[tokio::test]
async fn get_user_info_reports_each_failure_distinctly() {
    let cases = [
        (&["staff"][..], Directory::RejectBind, Error::BindFailed),
        (&["staff"][..], Directory::Groups(&["bob"]), Error::NotMember),
        (
            &["staff"][..],
            Directory::GroupSearchFails,
            Error::SearchFailed("Operations error".to_string()),
        ),
        (
            &[][..],
            Directory::UserSearchFails,
            Error::SearchFailed("Size limit exceeded".to_string()),
        ),
        (&[][..], Directory::NoUser, Error::NotFound),
    ];

    for (groups, directory, expected) in cases {
        let adapter = adapter(groups, directory);
        let err = adapter.get_user_info(&alice()).await.unwrap_err();
        assert_eq!(err, expected);
        assert_eq!(err.public_message(), "Invalid username or password");
    }
}

#[tokio::test]
async fn missing_ldap_support_is_reported_before_connecting() {
    let mut connector = MockConnector::new();
    connector.expect_connect().never();
    let adapter = LdapAuthAdapter::new(Arc::new(config(&[])))
        .with_connector(Arc::new(connector))
        .without_connector();

    assert_eq!(
        adapter.authenticate(&alice()).await.unwrap_err(),
        Error::Unsupported
    );
    assert_eq!(
        adapter.get_user_info(&alice()).await.unwrap_err(),
        Error::Unsupported
    );
}

#[tokio::test]
async fn adapter_serves_concurrent_logins() {
    let mut connector = MockConnector::new();
    connector
        .expect_connect()
        .times(2)
        .returning(|_| Ok(Box::new(session(Directory::Groups(&["alice", "bob"])))));
    let adapter: Arc<dyn AuthAdapter> = Arc::new(
        LdapAuthAdapter::new(Arc::new(config(&["staff"]))).with_connector(Arc::new(connector)),
    );

    let first = tokio::spawn({
        let adapter = Arc::clone(&adapter);
        async move { adapter.authenticate(&Credential::new("alice", "pw")).await }
    });
    let second = tokio::spawn({
        let adapter = Arc::clone(&adapter);
        async move { adapter.authenticate(&Credential::new("bob", "pw")).await }
    });

    assert!(first.await.unwrap().unwrap());
    assert!(second.await.unwrap().unwrap());
}

#[test]
fn account_management_link_comes_from_config() {
    let adapter = LdapAuthAdapter::new(Arc::new(config(&[])));
    assert_eq!(
        adapter.account_management_link().unwrap().as_deref(),
        Some("https://id.example.org/account")
    );
}
