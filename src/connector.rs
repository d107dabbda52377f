//! Password and refresh connector backed by a directory.
//!
//! Logging in runs two queries: the first finds the user entry from the
//! supplied username, then binds as that entry with the supplied password.
//! The second, optional, uses the user entry to search for groups.

use async_trait::async_trait;

use crate::config::Configuration;
use crate::directory::ldap::LdapDialer;
use crate::directory::{Bind, Dialer, DirectoryConn, DirectoryEntry};
use crate::error::{Error, Result};
use crate::groups::GroupResolver;
use crate::identity::{Identity, IdentityMapper};
use crate::ports::{LoginResult, PasswordConnector, RefreshConnector, Scopes};
use crate::refresh::RefreshState;
use crate::search::{self, GroupSearch, UserSearch};
use crate::session::DirectorySession;
use crate::tls::Transport;

/// Directory connector.
///
/// Holds only validated, immutable settings; every call opens its own
/// connections, so calls may run concurrently.
pub struct AuthConnector<D = LdapDialer> {
    session: DirectorySession<D>,
    users: UserSearch,
    groups: Option<GroupSearch>,
}

impl AuthConnector<LdapDialer> {
    /// Validate `config` and create a connector reaching the configured
    /// server. No network I/O happens here.
    pub fn open(config: &Configuration) -> Result<Self> {
        let (users, groups) = validate(config)?;
        let transport = Transport::new(config)?;
        let dialer = LdapDialer::new(transport, config.timeout());

        Ok(Self::assemble(config, dialer, users, groups))
    }
}

impl<D: Dialer> AuthConnector<D> {
    /// Same as [`AuthConnector::open`] with a custom [`Dialer`].
    pub fn with_dialer(config: &Configuration, dialer: D) -> Result<Self> {
        let (users, groups) = validate(config)?;
        Ok(Self::assemble(config, dialer, users, groups))
    }

    fn assemble(
        config: &Configuration,
        dialer: D,
        users: UserSearch,
        groups: Option<GroupSearch>,
    ) -> Self {
        Self {
            session: DirectorySession::new(
                dialer,
                &config.bind_dn,
                &config.bind_pw,
            ),
            users,
            groups,
        }
    }

    /// Find the single entry matching `username`.
    ///
    /// Zero matches is `None`, several is a hard error.
    async fn user_entry(
        &self,
        conn: &mut D::Conn,
        username: &str,
    ) -> Result<Option<DirectoryEntry>> {
        let request = self.users.request(username);
        let mut entries =
            conn.search(&request).await.map_err(|source| Error::Search {
                filter: request.filter.clone(),
                source,
            })?;

        match entries.len() {
            0 => {
                tracing::info!(
                    filter = %request.filter,
                    "no results returned for filter"
                );
                Ok(None)
            },
            1 => Ok(entries.pop()),
            count => Err(Error::AmbiguousUser {
                filter: request.filter,
                count,
            }),
        }
    }

    async fn authenticate(
        &self,
        scopes: Scopes,
        username: &str,
        password: &str,
    ) -> Result<LoginResult> {
        // An empty password makes a simple bind unauthenticated, which most
        // servers accept.
        if password.is_empty() {
            tracing::info!(%username, "empty password rejected");
            return Ok(LoginResult::InvalidCredentials);
        }

        let user = self
            .session
            .with_connection(|mut conn| async move {
                let Some(user) = self.user_entry(&mut conn, username).await?
                else {
                    return Ok(None);
                };

                match conn.bind(&user.dn, password).await {
                    Ok(Bind::Success) => Ok(Some(user)),
                    Ok(Bind::InvalidCredentials) => {
                        tracing::info!(dn = %user.dn, "invalid password for user");
                        Ok(None)
                    },
                    Err(source) => Err(Error::UserBind {
                        dn: user.dn.clone(),
                        source,
                    }),
                }
            })
            .await?;

        let Some(user) = user else {
            return Ok(LoginResult::InvalidCredentials);
        };

        let mut identity = IdentityMapper::new(&self.users).from_entry(&user)?;

        if scopes.groups {
            identity.groups = Some(self.groups(&user).await?);
        }

        if scopes.offline_access {
            // Kept for refresh attempts.
            identity.connector_data =
                Some(RefreshState::new(username, user).encode()?);
        }

        Ok(LoginResult::Authenticated(identity))
    }

    async fn reverify(&self, scopes: Scopes, identity: Identity) -> Result<Identity> {
        let data = identity
            .connector_data
            .as_deref()
            .ok_or(Error::MissingRefreshState)?;
        let state = RefreshState::decode(data)?;
        let username = state.username.as_str();

        let user = self
            .session
            .with_connection(|mut conn| async move {
                self.user_entry(&mut conn, username).await
            })
            .await?
            .ok_or_else(|| Error::UserVanished {
                username: username.to_owned(),
            })?;

        if user.dn != state.entry.dn {
            return Err(Error::IdentityChanged {
                username: state.username,
                expected: state.entry.dn,
                actual: user.dn,
            });
        }

        let mut refreshed = IdentityMapper::new(&self.users).from_entry(&user)?;
        refreshed.connector_data = identity.connector_data;

        if scopes.groups {
            refreshed.groups = Some(self.groups(&user).await?);
        }

        Ok(refreshed)
    }

    async fn groups(&self, user: &DirectoryEntry) -> Result<Vec<String>> {
        GroupResolver::new(self.groups.as_ref())
            .groups(&self.session, user)
            .await
    }
}

#[async_trait]
impl<D: Dialer> PasswordConnector for AuthConnector<D> {
    async fn login(
        &self,
        scopes: Scopes,
        username: &str,
        password: &str,
    ) -> Result<LoginResult> {
        let result = self.authenticate(scopes, username, password).await;

        let outcome = match &result {
            Ok(LoginResult::Authenticated(_)) => "success",
            Ok(LoginResult::InvalidCredentials) => "invalid_credentials",
            Err(err) => {
                tracing::warn!(error = %err, %username, "login failed");
                "error"
            },
        };
        metrics::counter!("ldap_login_total", "outcome" => outcome).increment(1);

        result
    }
}

#[async_trait]
impl<D: Dialer> RefreshConnector for AuthConnector<D> {
    async fn refresh(
        &self,
        scopes: Scopes,
        identity: Identity,
    ) -> Result<Identity> {
        let result = self.reverify(scopes, identity).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(err) => {
                tracing::warn!(error = %err, "refresh failed");
                "error"
            },
        };
        metrics::counter!("ldap_refresh_total", "outcome" => outcome).increment(1);

        result
    }
}

/// Mandatory fields first, then search settings.
fn validate(
    config: &Configuration,
) -> Result<(UserSearch, Option<GroupSearch>)> {
    if config.host.is_empty() {
        return Err(Error::MissingField("host"));
    }

    search::from_config(config)
}
