//! Validated search parameters.

use ldap3::Scope;

use crate::config::{Configuration, GroupSearchConfig, UserSearchConfig};
use crate::directory::{DirectoryEntry, SearchRequest};
use crate::error::{Error, Result};
use crate::filter;
use crate::scope::parse_scope;

/// How user entries are looked up.
#[derive(Debug, Clone)]
pub struct UserSearch {
    pub base_dn: String,
    pub filter: Option<String>,
    pub username_attr: String,
    pub scope: Scope,
    pub id_attr: String,
    pub email_attr: String,
    pub name_attr: Option<String>,
    /// Attribute linking the user to its groups, read off the user entry.
    pub group_link_attr: Option<String>,
}

/// How group entries are looked up.
#[derive(Debug, Clone)]
pub struct GroupSearch {
    pub base_dn: String,
    pub filter: Option<String>,
    pub scope: Scope,
    pub user_attr: String,
    pub group_attr: String,
    pub name_attr: String,
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_owned())
}

impl UserSearch {
    /// Validate the user search section.
    pub fn new(config: &UserSearchConfig, group: &GroupSearchConfig) -> Result<Self> {
        if config.base_dn.is_empty() {
            return Err(Error::MissingField("userSearch.baseDN"));
        }
        if config.username.is_empty() {
            return Err(Error::MissingField("userSearch.username"));
        }

        Ok(Self {
            base_dn: config.base_dn.clone(),
            filter: non_empty(&config.filter),
            username_attr: config.username.clone(),
            scope: parse_scope("userSearch.scope", &config.scope)?,
            id_attr: config.id_attr.clone(),
            email_attr: config.email_attr.clone(),
            name_attr: non_empty(&config.name_attr),
            // Only read when group lookups are enabled.
            group_link_attr: if group.base_dn.is_empty() {
                None
            } else {
                non_empty(&group.user_attr)
            },
        })
    }

    /// `(&<filter>(<username attribute>=<username>))`.
    pub fn filter(&self, username: &str) -> String {
        filter::equality(self.filter.as_deref(), &self.username_attr, username)
    }

    /// Search for `username`, restricted to the attributes the connector
    /// reads.
    pub fn request(&self, username: &str) -> SearchRequest {
        let mut attributes: Vec<String> = Vec::with_capacity(4);
        let wanted = [
            Some(&self.id_attr),
            Some(&self.email_attr),
            self.group_link_attr.as_ref(),
            self.name_attr.as_ref(),
        ];
        for attr in wanted.into_iter().flatten() {
            if !attr.is_empty() && !attributes.contains(attr) {
                attributes.push(attr.clone());
            }
        }

        SearchRequest {
            base_dn: self.base_dn.clone(),
            scope: self.scope,
            filter: self.filter(username),
            attributes,
        }
    }
}

impl GroupSearch {
    /// Validate the group search section. `None` when no base DN is set.
    pub fn new(config: &GroupSearchConfig) -> Result<Option<Self>> {
        let scope = parse_scope("groupSearch.scope", &config.scope)?;
        if config.base_dn.is_empty() {
            return Ok(None);
        }

        for (field, value) in [
            ("groupSearch.userAttr", &config.user_attr),
            ("groupSearch.groupAttr", &config.group_attr),
            ("groupSearch.nameAttr", &config.name_attr),
        ] {
            if value.is_empty() {
                return Err(Error::MissingField(field));
            }
        }

        Ok(Some(Self {
            base_dn: config.base_dn.clone(),
            filter: non_empty(&config.filter),
            scope,
            user_attr: config.user_attr.clone(),
            group_attr: config.group_attr.clone(),
            name_attr: config.name_attr.clone(),
        }))
    }

    /// `(&<filter>(<group attribute>=<link value>))`.
    pub fn filter(&self, link_value: &str) -> String {
        filter::equality(self.filter.as_deref(), &self.group_attr, link_value)
    }

    /// Value on `user` that groups reference.
    pub fn link_value<'a>(&self, user: &'a DirectoryEntry) -> &'a str {
        user.get_attr(&self.user_attr)
    }

    /// Search groups referencing `link_value`.
    pub fn request(&self, link_value: &str) -> SearchRequest {
        SearchRequest {
            base_dn: self.base_dn.clone(),
            scope: self.scope,
            filter: self.filter(link_value),
            attributes: vec![self.name_attr.clone()],
        }
    }
}

/// Validate every search-related field of `config`.
pub fn from_config(
    config: &Configuration,
) -> Result<(UserSearch, Option<GroupSearch>)> {
    let user = UserSearch::new(&config.user_search, &config.group_search)?;
    let group = GroupSearch::new(&config.group_search)?;
    Ok((user, group))
}
