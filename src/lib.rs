//! Autha LDAP is a password connector authenticating users against an LDAP
//! directory and turning their entries into identities.
#![forbid(unsafe_code)]
#![deny(unused_mut)]

pub mod config;
pub mod connector;
pub mod directory;
pub mod error;
pub mod filter;
pub mod groups;
pub mod identity;
pub mod ports;
pub mod refresh;
pub mod scope;
pub mod search;
pub mod session;
pub mod telemetry;
pub mod tls;

pub use config::Configuration;
pub use connector::AuthConnector;
pub use error::{Error, ErrorKind, Result};
pub use identity::Identity;
pub use ports::{LoginResult, PasswordConnector, RefreshConnector, Scopes};
