//! Normalized identities.

use serde::{Deserialize, Serialize};

use crate::directory::DirectoryEntry;
use crate::error::{Error, Result};
use crate::search::UserSearch;

/// Identity handed back to the host.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(rename = "userID")]
    pub user_id: String,
    /// Display name, when a name attribute is configured.
    pub username: Option<String>,
    pub email: String,
    /// Only set when groups were requested.
    pub groups: Option<Vec<String>>,
    /// Opaque connector state, used to refresh the identity later.
    #[serde(with = "crate::config::base64_bytes", default)]
    pub connector_data: Option<Vec<u8>>,
}

/// Maps user entries onto [`Identity`].
#[derive(Debug, Clone, Copy)]
pub struct IdentityMapper<'a> {
    search: &'a UserSearch,
}

impl<'a> IdentityMapper<'a> {
    /// Create a new [`IdentityMapper`].
    pub fn new(search: &'a UserSearch) -> Self {
        Self { search }
    }

    /// Build an identity, failing with every missing attribute at once.
    pub fn from_entry(&self, entry: &DirectoryEntry) -> Result<Identity> {
        let mut missing = Vec::new();
        let mut read = |attribute: &str| {
            let value = entry.get_attr(attribute);
            if value.is_empty() {
                missing.push(attribute.to_owned());
            }
            value.to_owned()
        };

        let user_id = read(&self.search.id_attr);
        let email = read(&self.search.email_attr);
        let username = self.search.name_attr.as_deref().map(&mut read);

        if !missing.is_empty() {
            return Err(Error::IncompleteEntry {
                dn: entry.dn.clone(),
                missing,
            });
        }

        Ok(Identity {
            user_id,
            username,
            email,
            ..Default::default()
        })
    }
}
