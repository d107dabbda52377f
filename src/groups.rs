//! Group membership lookups.

use crate::directory::{Dialer, DirectoryConn, DirectoryEntry};
use crate::error::{Error, Result};
use crate::search::GroupSearch;
use crate::session::DirectorySession;

/// Finds the groups referencing a user entry.
#[derive(Debug, Clone, Copy)]
pub struct GroupResolver<'a> {
    search: Option<&'a GroupSearch>,
}

impl<'a> GroupResolver<'a> {
    /// Create a new [`GroupResolver`]. `None` resolves every user to no
    /// group.
    pub fn new(search: Option<&'a GroupSearch>) -> Self {
        Self { search }
    }

    /// Names of the groups `user` belongs to, in server order.
    ///
    /// A group without the configured name attribute fails the whole
    /// lookup.
    pub async fn groups<D: Dialer>(
        &self,
        session: &DirectorySession<D>,
        user: &DirectoryEntry,
    ) -> Result<Vec<String>> {
        let Some(search) = self.search else {
            tracing::debug!("no group search configured");
            return Ok(Vec::new());
        };

        let link = search.link_value(user);
        if link.is_empty() {
            tracing::warn!(
                dn = %user.dn,
                attribute = %search.user_attr,
                "user entry has no group link value"
            );
            return Ok(Vec::new());
        }

        let request = search.request(link);
        let entries = session
            .with_connection(|mut conn| async move {
                conn.search(&request).await.map_err(|source| Error::Search {
                    filter: request.filter.clone(),
                    source,
                })
            })
            .await?;

        if entries.is_empty() {
            tracing::info!(
                filter = %search.filter(link),
                "groups search returned no groups"
            );
        }

        entries
            .iter()
            .map(|group| match group.get_attr(&search.name_attr) {
                "" => Err(Error::MissingGroupName {
                    dn: group.dn.clone(),
                    attribute: search.name_attr.clone(),
                }),
                name => Ok(name.to_owned()),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GroupSearchConfig;
    use crate::directory::fake::FakeDirectory;

    const USER_DN: &str = "uid=john,ou=people,dc=example,dc=org";
    const FILTER: &str =
        "(&(objectClass=groupOfNames)(member=uid=john,ou=people,dc=example,dc=org))";

    fn search() -> GroupSearch {
        let config = GroupSearchConfig {
            base_dn: "ou=groups,dc=example,dc=org".into(),
            filter: "(objectClass=groupOfNames)".into(),
            scope: String::new(),
            user_attr: "DN".into(),
            group_attr: "member".into(),
            name_attr: "cn".into(),
        };
        GroupSearch::new(&config).unwrap().unwrap()
    }

    fn group(name: &str) -> DirectoryEntry {
        DirectoryEntry::new(format!("cn={name},ou=groups,dc=example,dc=org"))
            .with_attr("cn", [name])
    }

    #[tokio::test]
    async fn test_groups() {
        let directory = FakeDirectory::new()
            .results(FILTER, vec![group("developers"), group("admins")]);
        let session = DirectorySession::new(directory.clone(), "", "");
        let search = search();

        let groups = GroupResolver::new(Some(&search))
            .groups(&session, &DirectoryEntry::new(USER_DN))
            .await
            .unwrap();

        assert_eq!(groups, ["developers", "admins"]);
        assert_eq!(directory.searches()[0].attributes, ["cn"]);
        assert_eq!(directory.closes(), 1);
    }

    #[tokio::test]
    async fn test_no_groups() {
        let directory = FakeDirectory::new();
        let session = DirectorySession::new(directory, "", "");
        let search = search();

        let groups = GroupResolver::new(Some(&search))
            .groups(&session, &DirectoryEntry::new(USER_DN))
            .await
            .unwrap();

        assert!(groups.is_empty());
    }

    #[tokio::test]
    async fn test_group_without_name() {
        let nameless = DirectoryEntry::new("cn=ghosts,ou=groups,dc=example,dc=org");
        let directory = FakeDirectory::new()
            .results(FILTER, vec![group("developers"), nameless]);
        let session = DirectorySession::new(directory, "", "");
        let search = search();

        let err = GroupResolver::new(Some(&search))
            .groups(&session, &DirectoryEntry::new(USER_DN))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::MissingGroupName { ref dn, ref attribute }
                if dn == "cn=ghosts,ou=groups,dc=example,dc=org" && attribute == "cn"
        ));
    }

    #[tokio::test]
    async fn test_not_configured() {
        let directory = FakeDirectory::new();
        let session = DirectorySession::new(directory.clone(), "", "");

        let groups = GroupResolver::new(None)
            .groups(&session, &DirectoryEntry::new(USER_DN))
            .await
            .unwrap();

        assert!(groups.is_empty());
        assert_eq!(directory.dials(), 0);
    }

    #[tokio::test]
    async fn test_empty_link_value() {
        // posixGroup style, linked by uid, which this entry lacks.
        let config = GroupSearchConfig {
            base_dn: "ou=groups,dc=example,dc=org".into(),
            user_attr: "uid".into(),
            group_attr: "memberUid".into(),
            name_attr: "cn".into(),
            ..Default::default()
        };
        let search = GroupSearch::new(&config).unwrap().unwrap();
        let directory = FakeDirectory::new();
        let session = DirectorySession::new(directory.clone(), "", "");

        let groups = GroupResolver::new(Some(&search))
            .groups(&session, &DirectoryEntry::new(USER_DN))
            .await
            .unwrap();

        assert!(groups.is_empty());
        assert_eq!(directory.dials(), 0);
    }

    #[tokio::test]
    async fn test_search_failure() {
        let directory = FakeDirectory::new().failing_search();
        let session = DirectorySession::new(directory.clone(), "", "");
        let search = search();

        let err = GroupResolver::new(Some(&search))
            .groups(&session, &DirectoryEntry::new(USER_DN))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Search { ref filter, .. } if filter == FILTER));
        assert_eq!(directory.closes(), 1);
    }
}
