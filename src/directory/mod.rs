//! Narrow interface over the directory client.
//!
//! The connector only needs four operations: dial, bind, search and close.
//! [`ldap::LdapDialer`] implements them with `ldap3`; tests use an in-memory
//! directory.

mod entry;
#[cfg(test)]
pub(crate) mod fake;
pub mod ldap;

use async_trait::async_trait;
use ldap3::Scope;

pub use entry::{Attribute, DirectoryEntry};

/// Failure reported by the directory client.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of a bind that reached the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bind {
    Success,
    /// The server answered "invalid credentials" (result code 49).
    InvalidCredentials,
}

/// A search to run against the directory.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub base_dn: String,
    pub scope: Scope,
    pub filter: String,
    /// Attributes to return.
    pub attributes: Vec<String>,
}

/// Opens new connections.
#[async_trait]
pub trait Dialer: Send + Sync {
    type Conn: DirectoryConn;

    /// `host:port` the dialer connects to, used for diagnostics.
    fn address(&self) -> &str;

    /// Open a new, unauthenticated connection.
    async fn dial(&self) -> Result<Self::Conn, BoxError>;
}

/// A live connection.
///
/// Clones share the same underlying connection.
#[async_trait]
pub trait DirectoryConn: Clone + Send + Sync {
    /// Authenticate the connection. Anonymous when both values are empty.
    async fn bind(&mut self, dn: &str, password: &str) -> Result<Bind, BoxError>;

    /// Entries are returned in server order.
    async fn search(
        &mut self,
        request: &SearchRequest,
    ) -> Result<Vec<DirectoryEntry>, BoxError>;

    /// Tear the connection down.
    async fn close(&mut self) -> Result<(), BoxError>;
}
