//! Directory entries and attribute access.

use ldap3::SearchEntry;
use serde::{Deserialize, Serialize};

/// Pseudo attribute resolving to the entry distinguished name.
pub const DN_ATTRIBUTE: &str = "DN";

/// Snapshot of a directory object returned by a search.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    #[serde(rename = "DN")]
    pub dn: String,
    #[serde(rename = "Attributes", default)]
    pub attributes: Vec<Attribute>,
}

/// One attribute of an entry with all of its values.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Values", default)]
    pub values: Vec<String>,
}

impl DirectoryEntry {
    /// Create a new [`DirectoryEntry`] without attributes.
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: Vec::new(),
        }
    }

    /// Append an attribute.
    pub fn with_attr<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes.push(Attribute {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// First value of attribute `name`, or an empty string.
    ///
    /// `DN` resolves to the distinguished name unless the entry carries a
    /// literal `DN` attribute. Further values of multi-valued attributes are
    /// ignored.
    pub fn get_attr(&self, name: &str) -> &str {
        if let Some(attribute) =
            self.attributes.iter().find(|attr| attr.name == name)
        {
            return attribute.values.first().map_or("", String::as_str);
        }

        if name == DN_ATTRIBUTE {
            return &self.dn;
        }

        ""
    }
}

impl From<SearchEntry> for DirectoryEntry {
    fn from(entry: SearchEntry) -> Self {
        // `ldap3` hands attributes back as a map; sort them so equal entries
        // always compare and serialize the same way.
        let mut attributes = entry
            .attrs
            .into_iter()
            .map(|(name, values)| Attribute { name, values })
            .collect::<Vec<_>>();
        attributes.sort_by(|a, b| a.name.cmp(&b.name));

        Self {
            dn: entry.dn,
            attributes,
        }
    }
}
