//! Configuration manager for autha-ldap.
//!
//! An example configuration:
//!
//! ```yaml
//! host: ldap.example.com:636
//! # Required if the server only listens on port 389.
//! # insecureNoSSL: true
//! rootCA: /etc/autha/ldap.ca
//! bindDN: uid=serviceaccount,cn=users,dc=example,dc=com
//! bindPW: password
//! userSearch:
//!   # Translates to "(&(objectClass=person)(uid=<username>))".
//!   baseDN: cn=users,dc=example,dc=com
//!   filter: "(objectClass=person)"
//!   username: uid
//!   idAttr: uid
//!   emailAttr: mail
//!   nameAttr: name
//! groupSearch:
//!   # Translates to "(&(objectClass=group)(member=<user uid>))".
//!   baseDN: cn=groups,dc=example,dc=com
//!   filter: "(objectClass=group)"
//!   userAttr: uid
//!   groupAttr: member
//!   nameAttr: name
//! ```

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const DEFAULT_ID_ATTR: &str = "uid";
const DEFAULT_EMAIL_ATTR: &str = "mail";
const DEFAULT_TIMEOUT: u64 = 10; // seconds.

/// Connector configuration, as written by the operator.
///
/// Nothing here is validated; see [`crate::connector::AuthConnector::open`].
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Hostname and optional port of the directory server. When the port is
    /// missing it is guessed from the TLS configuration (389 or 636).
    pub host: String,
    /// Required if the directory server does not use TLS.
    #[serde(rename = "insecureNoSSL")]
    pub insecure_no_ssl: bool,
    /// Don't verify the server certificate.
    #[serde(rename = "insecureSkipVerify")]
    pub insecure_skip_verify: bool,
    /// Path to a trusted root certificate file.
    #[serde(rename = "rootCA")]
    pub root_ca: Option<PathBuf>,
    /// Base64 encoded PEM data containing root CAs.
    /// Takes precedence over `rootCA`.
    #[serde(rename = "rootCAData", with = "base64_bytes")]
    pub root_ca_data: Option<Vec<u8>>,
    /// Service account used to search users and groups.
    /// Both empty means an anonymous bind.
    #[serde(rename = "bindDN")]
    pub bind_dn: String,
    #[serde(rename = "bindPW", skip_serializing)]
    pub bind_pw: String,
    /// Deadline, in seconds, for dialing and for every directory operation.
    pub timeout: Option<u64>,
    /// User entry search configuration.
    #[serde(rename = "userSearch")]
    pub user_search: UserSearchConfig,
    /// Group search configuration.
    #[serde(rename = "groupSearch")]
    pub group_search: GroupSearchConfig,
}

/// User entry search configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSearchConfig {
    /// Where to start the search, e.g. "cn=users,dc=example,dc=com".
    #[serde(rename = "baseDN")]
    pub base_dn: String,
    /// Optional filter, e.g. "(objectClass=person)".
    pub filter: String,
    /// Attribute matched against the supplied username.
    pub username: String,
    /// Either "sub" (whole subtree, the default) or "one" (single level).
    pub scope: String,
    #[serde(rename = "idAttr")]
    pub id_attr: String,
    #[serde(rename = "emailAttr")]
    pub email_attr: String,
    /// No default. Display name is only read when set.
    #[serde(rename = "nameAttr")]
    pub name_attr: String,
}

impl Default for UserSearchConfig {
    fn default() -> Self {
        Self {
            base_dn: String::default(),
            filter: String::default(),
            username: String::default(),
            scope: String::default(),
            id_attr: DEFAULT_ID_ATTR.to_owned(),
            email_attr: DEFAULT_EMAIL_ATTR.to_owned(),
            name_attr: String::default(),
        }
    }
}

/// Group search configuration.
///
/// A group matches a user when `(<groupAttr>=<value of userAttr>)` holds,
/// for instance the "member" attribute of the group equals the "uid" of
/// the user. `userAttr` may be `DN` to use the user's distinguished name.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupSearchConfig {
    /// Empty disables group lookups.
    #[serde(rename = "baseDN")]
    pub base_dn: String,
    pub filter: String,
    pub scope: String,
    #[serde(rename = "userAttr")]
    pub user_attr: String,
    #[serde(rename = "groupAttr")]
    pub group_attr: String,
    /// Attribute holding the group display name.
    #[serde(rename = "nameAttr")]
    pub name_attr: String,
}

impl Configuration {
    /// Parse a YAML document.
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Read the YAML file at `path`, or `config.yaml` when `path` is not a
    /// file.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_path = if path.is_file() {
            path
        } else {
            tracing::debug!(
                path = %path.display(),
                "configuration path is not a file, using default"
            );
            Path::new(DEFAULT_CONFIG_PATH)
        };

        let file = File::open(file_path)?;
        Ok(serde_yaml::from_reader(file)?)
    }

    /// Deadline applied to dial, bind and search.
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
    }
}

/// (De)serialize optional bytes as a standard base64 string.
pub(crate) mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(
        value: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(encoded) if !encoded.trim().is_empty() => STANDARD
                .decode(encoded.trim())
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }
}
