//! Error handler for autha-ldap.

use thiserror::Error;

use crate::directory::BoxError;

pub type Result<T> = std::result::Result<T, Error>;

/// Broad families of failures.
///
/// A wrong password or an unknown username is never an [`Error`]; it is
/// reported through [`crate::ports::LoginResult::InvalidCredentials`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Fatal at setup, never retried.
    Configuration,
    /// Dial, bind or search transport failure. Callers may retry.
    Connectivity,
    /// The directory content is inconsistent with the configuration, or
    /// changed under a refresh.
    DirectoryIntegrity,
    /// Opaque refresh state is missing or malformed.
    StateCorruption,
}

/// Enum representing connector errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("missing required field {0:?}")]
    MissingField(&'static str),
    #[error("{field} unknown value {value:?}")]
    InvalidScope { field: &'static str, value: String },
    #[error("invalid host {host:?}: bad port")]
    InvalidHost { host: String },
    #[error("read ca file {path:?}: {source}")]
    ReadRootCa {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("no certs found in ca file")]
    NoCertificates,
    #[error("tls configuration: {0}")]
    Tls(#[from] native_tls::Error),
    #[error("read configuration: {0}")]
    ReadConfig(#[from] std::io::Error),
    #[error("parse configuration: {0}")]
    ParseConfig(#[from] serde_yaml::Error),

    #[error("failed to connect to {address}: {source}")]
    Connect { address: String, source: BoxError },
    #[error("initial bind for user {dn:?} failed: {source}")]
    ServiceBind { dn: String, source: BoxError },
    #[error("search with filter {filter:?} failed: {source}")]
    Search { filter: String, source: BoxError },
    #[error("failed to bind as dn {dn:?}: {source}")]
    UserBind { dn: String, source: BoxError },

    #[error("filter returned multiple ({count}) results: {filter:?}")]
    AmbiguousUser { filter: String, count: usize },
    #[error("entry {dn:?} missing following required attribute(s): {missing:?}")]
    IncompleteEntry { dn: String, missing: Vec<String> },
    #[error("group entity {dn:?} missing required attribute {attribute:?}")]
    MissingGroupName { dn: String, attribute: String },
    #[error("user not found {username:?}")]
    UserVanished { username: String },
    #[error(
        "refresh for username {username:?} expected DN {expected:?} got {actual:?}"
    )]
    IdentityChanged {
        username: String,
        expected: String,
        actual: String,
    },

    #[error("identity carries no refresh state")]
    MissingRefreshState,
    #[error("failed to unmarshal refresh state: {0}")]
    CorruptRefreshState(#[source] serde_json::Error),
    #[error("failed to marshal refresh state: {0}")]
    EncodeRefreshState(#[source] serde_json::Error),
}

impl Error {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingField(_)
            | Error::InvalidScope { .. }
            | Error::InvalidHost { .. }
            | Error::ReadRootCa { .. }
            | Error::NoCertificates
            | Error::Tls(_)
            | Error::ReadConfig(_)
            | Error::ParseConfig(_) => ErrorKind::Configuration,

            Error::Connect { .. }
            | Error::ServiceBind { .. }
            | Error::Search { .. }
            | Error::UserBind { .. } => ErrorKind::Connectivity,

            Error::AmbiguousUser { .. }
            | Error::IncompleteEntry { .. }
            | Error::MissingGroupName { .. }
            | Error::UserVanished { .. }
            | Error::IdentityChanged { .. } => ErrorKind::DirectoryIntegrity,

            Error::MissingRefreshState
            | Error::CorruptRefreshState(_)
            | Error::EncodeRefreshState(_) => ErrorKind::StateCorruption,
        }
    }
}
