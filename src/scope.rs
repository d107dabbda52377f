//! Search scope parsing.

use ldap3::Scope;

use crate::error::{Error, Result};

/// Translate a configured scope into the protocol value.
///
/// Base-object scope is never useful here since the entry DN is not known
/// upfront, so only "sub" and "one" are accepted.
pub fn parse_scope(field: &'static str, value: &str) -> Result<Scope> {
    match value {
        "" | "sub" => Ok(Scope::Subtree),
        "one" => Ok(Scope::OneLevel),
        _ => Err(Error::InvalidScope {
            field,
            value: value.to_owned(),
        }),
    }
}
