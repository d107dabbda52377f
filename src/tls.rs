//! Transport security for directory connections.

use native_tls::{Certificate, TlsConnector};

use crate::config::Configuration;
use crate::error::{Error, Result};

const DEFAULT_PORT: u16 = 389;
const DEFAULT_TLS_PORT: u16 = 636;

/// Where and how to reach the directory server.
#[derive(Clone, Debug)]
pub struct Transport {
    /// `host:port`, port filled in when the configuration omits it.
    pub address: String,
    /// Host without port, checked against the server certificate.
    pub server_name: String,
    /// `None` for plaintext connections.
    pub connector: Option<TlsConnector>,
}

impl Transport {
    /// Build transport settings from configuration.
    ///
    /// Trust material is loaded even for plaintext connections so a broken
    /// file is always reported at startup.
    pub fn new(config: &Configuration) -> Result<Self> {
        let (server_name, port) = match split_host_port(&config.host)? {
            (host, Some(port)) => (host.to_owned(), port),
            (host, None) if config.insecure_no_ssl => {
                (host.to_owned(), DEFAULT_PORT)
            },
            (host, None) => (host.to_owned(), DEFAULT_TLS_PORT),
        };

        let roots = root_certificates(config)?;

        let connector = if config.insecure_no_ssl {
            None
        } else {
            let mut builder = TlsConnector::builder();
            builder
                .danger_accept_invalid_certs(config.insecure_skip_verify)
                .danger_accept_invalid_hostnames(config.insecure_skip_verify);

            if let Some(roots) = roots {
                builder.disable_built_in_roots(true);
                for cert in roots {
                    builder.add_root_certificate(cert);
                }
            }

            Some(builder.build()?)
        };

        let address = if server_name.contains(':') {
            format!("[{server_name}]:{port}")
        } else {
            format!("{server_name}:{port}")
        };

        Ok(Self {
            address,
            server_name,
            connector,
        })
    }

    /// URL handed to the directory client.
    pub fn url(&self) -> String {
        match self.connector {
            Some(_) => format!("ldaps://{}", self.address),
            None => format!("ldap://{}", self.address),
        }
    }
}

/// Split `host[:port]`, accepting `[v6]` and `[v6]:port`.
///
/// A bare IPv6 address has no port.
fn split_host_port(input: &str) -> Result<(&str, Option<u16>)> {
    let invalid = || Error::InvalidHost {
        host: input.to_owned(),
    };

    let (host, port) = if let Some(rest) = input.strip_prefix('[') {
        let (host, rest) = rest.split_once(']').ok_or_else(invalid)?;
        match rest {
            "" => return Ok((host, None)),
            rest => (host, rest.strip_prefix(':').ok_or_else(invalid)?),
        }
    } else {
        match input.rsplit_once(':') {
            Some((host, port)) if !host.contains(':') => (host, port),
            _ => return Ok((input, None)),
        }
    };

    let port = port.parse().map_err(|_| invalid())?;
    Ok((host, Some(port)))
}

/// Inline data wins over the file path. `None` keeps the system roots.
fn root_certificates(
    config: &Configuration,
) -> Result<Option<Vec<Certificate>>> {
    let data = match (&config.root_ca_data, &config.root_ca) {
        (Some(data), _) if !data.is_empty() => data.clone(),
        (_, Some(path)) if !path.as_os_str().is_empty() => std::fs::read(path)
            .map_err(|source| Error::ReadRootCa {
                path: path.clone(),
                source,
            })?,
        _ => return Ok(None),
    };

    let certs = parse_pem_certificates(&data);
    if certs.is_empty() {
        return Err(Error::NoCertificates);
    }

    Ok(Some(certs))
}

/// Every `CERTIFICATE` block that parses; others are skipped.
fn parse_pem_certificates(data: &[u8]) -> Vec<Certificate> {
    let mut certs = Vec::new();
    for der in rustls_pemfile::certs(&mut &data[..]) {
        let der = match der {
            Ok(der) => der,
            Err(err) => {
                tracing::warn!(error = %err, "malformed pem data");
                break;
            },
        };

        match Certificate::from_der(&der) {
            Ok(cert) => certs.push(cert),
            Err(err) => {
                tracing::warn!(error = %err, "skipping unparseable certificate")
            },
        }
    }

    certs
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn plaintext(host: &str) -> Configuration {
        Configuration {
            host: host.into(),
            insecure_no_ssl: true,
            ..Default::default()
        }
    }

    const CA_BUNDLE: &[u8] = include_bytes!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/testdata/ca-bundle.pem"
    ));

    fn tls(host: &str) -> Configuration {
        Configuration {
            host: host.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_split_host_port() {
        assert_eq!(
            split_host_port("ldap.example.com:636").unwrap(),
            ("ldap.example.com", Some(636))
        );
        assert_eq!(split_host_port("[::1]:389").unwrap(), ("::1", Some(389)));
        assert_eq!(split_host_port("[::1]").unwrap(), ("::1", None));
        assert_eq!(
            split_host_port("ldap.example.com").unwrap(),
            ("ldap.example.com", None)
        );
        assert_eq!(split_host_port("::1").unwrap(), ("::1", None));
    }

    #[test]
    fn test_invalid_port() {
        for host in [
            "ldap.example.com:99999",
            "ldap.example.com:ldap",
            "ldap.example.com:",
            "[::1]:x",
            "[::1]389",
            "[::1",
        ] {
            let err = Transport::new(&plaintext(host)).unwrap_err();
            assert!(
                matches!(err, Error::InvalidHost { host: ref h } if h == host),
                "{host}"
            );
            assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
        }
    }

    #[test]
    fn test_default_ports() {
        let transport = Transport::new(&plaintext("ldap.example.com")).unwrap();
        assert_eq!(transport.address, "ldap.example.com:389");
        assert_eq!(transport.server_name, "ldap.example.com");
        assert_eq!(transport.url(), "ldap://ldap.example.com:389");

        let transport = Transport::new(&plaintext("ldap.example.com:10389")).unwrap();
        assert_eq!(transport.address, "ldap.example.com:10389");
        assert_eq!(transport.server_name, "ldap.example.com");

        let transport = Transport::new(&plaintext("::1")).unwrap();
        assert_eq!(transport.address, "[::1]:389");
    }

    #[test]
    fn test_invalid_root_ca_data() {
        let config = Configuration {
            root_ca_data: Some(b"not a certificate".to_vec()),
            ..plaintext("localhost")
        };

        let err = Transport::new(&config).unwrap_err();
        assert!(matches!(err, Error::NoCertificates));
    }

    #[test]
    fn test_inline_data_takes_precedence() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"garbage").unwrap();

        let config = Configuration {
            root_ca: Some(file.path().to_path_buf()),
            root_ca_data: Some(b"also garbage".to_vec()),
            ..plaintext("localhost")
        };

        // Both are unusable, but only the inline data is looked at.
        let err = Transport::new(&config).unwrap_err();
        assert!(matches!(err, Error::NoCertificates));
    }

    #[test]
    fn test_missing_root_ca_file() {
        let config = Configuration {
            root_ca: Some("/nonexistent/ldap.ca".into()),
            ..plaintext("localhost")
        };

        let err = Transport::new(&config).unwrap_err();
        assert!(matches!(err, Error::ReadRootCa { .. }));
    }

    #[test]
    fn test_empty_pem_block() {
        let pem = b"-----BEGIN CERTIFICATE-----\n-----END CERTIFICATE-----\n";
        assert!(parse_pem_certificates(pem).is_empty());
        assert!(parse_pem_certificates(&[0xff, 0xfe]).is_empty());
    }

    #[test]
    fn test_parse_bundle() {
        assert_eq!(parse_pem_certificates(CA_BUNDLE).len(), 2);
    }

    #[test]
    fn test_root_ca_data() {
        let config = Configuration {
            root_ca_data: Some(CA_BUNDLE.to_vec()),
            ..tls("ldap.example.com")
        };

        let transport = Transport::new(&config).unwrap();
        assert!(transport.connector.is_some());
        assert_eq!(transport.address, "ldap.example.com:636");
        assert_eq!(transport.url(), "ldaps://ldap.example.com:636");
        assert_eq!(root_certificates(&config).unwrap().unwrap().len(), 2);
    }

    #[test]
    fn test_root_ca_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CA_BUNDLE).unwrap();

        let config = Configuration {
            root_ca: Some(file.path().to_path_buf()),
            ..tls("ldap.example.com")
        };

        let transport = Transport::new(&config).unwrap();
        assert!(transport.connector.is_some());
        assert_eq!(root_certificates(&config).unwrap().unwrap().len(), 2);
    }

    #[test]
    fn test_system_roots() {
        let config = tls("ldap.example.com");
        assert!(root_certificates(&config).unwrap().is_none());
        assert!(Transport::new(&config).unwrap().connector.is_some());
    }
}
