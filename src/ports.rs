//! Contract between the identity-provider host and connectors.

use async_trait::async_trait;

use crate::error::Result;
use crate::identity::Identity;

/// What the host asks for on top of the bare identity.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Scopes {
    /// Resolve group memberships.
    pub groups: bool,
    /// Long-lived access: the identity must be refreshable later.
    pub offline_access: bool,
}

/// Outcome of a password check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginResult {
    Authenticated(Identity),
    /// Unknown user or wrong password. The two are not told apart.
    InvalidCredentials,
}

impl LoginResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, LoginResult::Authenticated(_))
    }

    /// Authenticated identity, if any.
    pub fn identity(self) -> Option<Identity> {
        match self {
            LoginResult::Authenticated(identity) => Some(identity),
            LoginResult::InvalidCredentials => None,
        }
    }
}

/// Inbound port for username/password logins.
#[async_trait]
pub trait PasswordConnector: Send + Sync {
    /// Check credentials and build the identity.
    async fn login(
        &self,
        scopes: Scopes,
        username: &str,
        password: &str,
    ) -> Result<LoginResult>;
}

/// Inbound port for identity refreshes.
#[async_trait]
pub trait RefreshConnector: Send + Sync {
    /// Re-validate an identity previously issued with offline access.
    async fn refresh(&self, scopes: Scopes, identity: Identity)
    -> Result<Identity>;
}
