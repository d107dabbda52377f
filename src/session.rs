//! Connection lifecycle.

use std::future::Future;

use crate::directory::{Bind, Dialer, DirectoryConn};
use crate::error::{Error, Result};

/// Opens a fresh, service-bound connection for every operation.
///
/// Connections are never reused nor pooled.
#[derive(Clone)]
pub struct DirectorySession<D> {
    dialer: D,
    bind_dn: String,
    bind_pw: String,
}

impl<D: Dialer> DirectorySession<D> {
    /// Create a new [`DirectorySession`]. Empty credentials bind anonymously.
    pub fn new(
        dialer: D,
        bind_dn: impl Into<String>,
        bind_pw: impl Into<String>,
    ) -> Self {
        Self {
            dialer,
            bind_dn: bind_dn.into(),
            bind_pw: bind_pw.into(),
        }
    }

    /// Dial, bind as the service account, run `operation` and close.
    ///
    /// The connection is closed on every path once dialing succeeded,
    /// whether the bind or the operation failed.
    pub async fn with_connection<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: FnOnce(D::Conn) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut conn =
            self.dialer.dial().await.map_err(|source| Error::Connect {
                address: self.dialer.address().to_owned(),
                source,
            })?;

        let result = match conn.bind(&self.bind_dn, &self.bind_pw).await {
            Ok(Bind::Success) => {
                tracing::debug!(dn = %self.bind_dn, "service account bound");
                operation(conn.clone()).await
            },
            Ok(Bind::InvalidCredentials) => Err(Error::ServiceBind {
                dn: self.bind_dn.clone(),
                source: "invalid credentials".into(),
            }),
            Err(source) => Err(Error::ServiceBind {
                dn: self.bind_dn.clone(),
                source,
            }),
        };

        if let Err(err) = conn.close().await {
            tracing::debug!(error = %err, "failed to close directory connection");
        }

        result
    }
}
