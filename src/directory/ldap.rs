//! LDAP support.

use std::time::Duration;

use async_trait::async_trait;
use ldap3::{Ldap as Ldap3, LdapConnAsync, LdapConnSettings, SearchEntry};

use super::{
    Bind, BoxError, Dialer, DirectoryConn, DirectoryEntry, SearchRequest,
};
use crate::tls::Transport;

/// `invalidCredentials` result code.
const INVALID_CREDENTIALS: u32 = 49;

/// Dial [`Ldap3`] connections.
#[derive(Clone, Debug)]
pub struct LdapDialer {
    transport: Transport,
    timeout: Duration,
}

impl LdapDialer {
    /// Create a new [`LdapDialer`].
    ///
    /// `timeout` bounds the dial and every later bind or search.
    pub fn new(transport: Transport, timeout: Duration) -> Self {
        Self { transport, timeout }
    }
}

#[async_trait]
impl Dialer for LdapDialer {
    type Conn = LdapConnection;

    fn address(&self) -> &str {
        &self.transport.address
    }

    async fn dial(&self) -> Result<LdapConnection, BoxError> {
        let mut settings = LdapConnSettings::new().set_conn_timeout(self.timeout);
        if let Some(connector) = &self.transport.connector {
            settings = settings.set_connector(connector.clone());
        }

        let url = self.transport.url();
        tracing::debug!(
            %url,
            server_name = %self.transport.server_name,
            "connecting to directory"
        );

        let (handle, conn) = LdapConnAsync::with_settings(settings, &url).await?;
        ldap3::drive!(handle);

        Ok(LdapConnection {
            conn,
            timeout: self.timeout,
        })
    }
}

/// Handle on a live [`Ldap3`] connection.
#[derive(Clone, Debug)]
pub struct LdapConnection {
    conn: Ldap3,
    timeout: Duration,
}

#[async_trait]
impl DirectoryConn for LdapConnection {
    async fn bind(&mut self, dn: &str, password: &str) -> Result<Bind, BoxError> {
        let result = self
            .conn
            .with_timeout(self.timeout)
            .simple_bind(dn, password)
            .await?;

        if result.rc == INVALID_CREDENTIALS {
            return Ok(Bind::InvalidCredentials);
        }

        result.success()?;
        Ok(Bind::Success)
    }

    async fn search(
        &mut self,
        request: &SearchRequest,
    ) -> Result<Vec<DirectoryEntry>, BoxError> {
        let (entries, _) = self
            .conn
            .with_timeout(self.timeout)
            .search(
                &request.base_dn,
                request.scope,
                &request.filter,
                request.attributes.clone(),
            )
            .await?
            .success()?;

        Ok(entries
            .into_iter()
            .map(|entry| SearchEntry::construct(entry).into())
            .collect())
    }

    async fn close(&mut self) -> Result<(), BoxError> {
        self.conn.unbind().await?;
        Ok(())
    }
}
