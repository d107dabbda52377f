//! Refresh state carried inside identities.

use serde::{Deserialize, Serialize};

use crate::directory::DirectoryEntry;
use crate::error::{Error, Result};

/// What a later refresh needs to re-validate an identity without a
/// password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshState {
    pub username: String,
    /// User entry as seen at login.
    pub entry: DirectoryEntry,
}

impl RefreshState {
    /// Create a new [`RefreshState`].
    pub fn new(username: impl Into<String>, entry: DirectoryEntry) -> Self {
        Self {
            username: username.into(),
            entry,
        }
    }

    /// Serialize to the opaque bytes stored on the identity.
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(Error::EncodeRefreshState)
    }

    /// Parse state previously produced by [`RefreshState::encode`].
    pub fn decode(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(Error::CorruptRefreshState)
    }
}
