// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Group-CA-pinned TLS connector.
//!
//! Broker certificates are signed by the group CA that discovery returned,
//! not by a public root, so the connector is built from the persisted group
//! CA file and (for mutual TLS) the device certificate and key. System roots
//! are never consulted.
//!
//! Connections are blocking: TCP connect with a timeout, then the rustls
//! handshake driven to completion. A candidate only counts as connected once
//! the handshake has finished.
//!
//! # Example
//!
//! ```ignore
//! use edgelink::transport::TlsConnector;
//!
//! let connector = TlsConnector::builder()
//!     .with_group_ca_file(&session_ca_path)?
//!     .with_identity_files("device.crt", "device.key")?
//!     .build()?;
//! let stream = connector.connect(&endpoint)?;
//! ```

use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName};
use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};

use super::Connector;
use crate::discovery::Endpoint;

/// Default per-candidate connect timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A blocking TLS stream over TCP.
pub type TlsStream = StreamOwned<ClientConnection, TcpStream>;

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`TlsConnector`].
pub struct TlsConnectorBuilder {
    group_ca_pem: Vec<Vec<u8>>,
    cert_pem: Option<Vec<u8>>,
    key_pem: Option<Vec<u8>>,
    connect_timeout: Duration,
}

impl TlsConnectorBuilder {
    fn new() -> Self {
        Self {
            group_ca_pem: Vec::new(),
            cert_pem: None,
            key_pem: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Add a group CA certificate (PEM bytes) to the trust store.
    pub fn with_group_ca_pem(mut self, pem: Vec<u8>) -> Self {
        self.group_ca_pem.push(pem);
        self
    }

    /// Add a group CA certificate loaded from a file.
    pub fn with_group_ca_file(self, path: impl AsRef<Path>) -> io::Result<Self> {
        let pem = std::fs::read(path)?;
        Ok(self.with_group_ca_pem(pem))
    }

    /// Set the device certificate and key (PEM bytes) for mutual TLS.
    pub fn with_identity_pem(mut self, cert_pem: Vec<u8>, key_pem: Vec<u8>) -> Self {
        self.cert_pem = Some(cert_pem);
        self.key_pem = Some(key_pem);
        self
    }

    /// Set the device certificate and key from files.
    pub fn with_identity_files(
        self,
        cert_path: impl AsRef<Path>,
        key_path: impl AsRef<Path>,
    ) -> io::Result<Self> {
        let cert_pem = std::fs::read(cert_path)?;
        let key_pem = std::fs::read(key_path)?;
        Ok(self.with_identity_pem(cert_pem, key_pem))
    }

    /// Set the per-candidate connect timeout (default: 10s).
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Build the connector.
    pub fn build(self) -> io::Result<TlsConnector> {
        if self.group_ca_pem.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "TLS connector requires at least one group CA",
            ));
        }

        let mut root_store = RootCertStore::empty();
        for pem in &self.group_ca_pem {
            for cert in parse_certs(pem)? {
                root_store
                    .add(cert)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            }
        }
        if root_store.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "No certificates found in group CA PEM data",
            ));
        }

        let builder = ClientConfig::builder().with_root_certificates(root_store);

        let config = match (self.cert_pem, self.key_pem) {
            (Some(cert_pem), Some(key_pem)) => {
                let certs = parse_certs(&cert_pem)?;
                let key = parse_key(&key_pem)?;
                builder
                    .with_client_auth_cert(certs, key)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?
            }
            _ => builder.with_no_client_auth(),
        };

        Ok(TlsConnector {
            config: Arc::new(config),
            connect_timeout: self.connect_timeout,
        })
    }
}

fn parse_certs(pem: &[u8]) -> io::Result<Vec<CertificateDer<'static>>> {
    rustls_pemfile::certs(&mut &pem[..]).collect::<io::Result<Vec<_>>>()
}

fn parse_key(pem: &[u8]) -> io::Result<PrivateKeyDer<'static>> {
    rustls_pemfile::private_key(&mut &pem[..])?.ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidData, "No private key found in PEM data")
    })
}

// ============================================================================
// Connector
// ============================================================================

/// TLS client connector pinned to the group CA.
#[derive(Clone)]
pub struct TlsConnector {
    config: Arc<ClientConfig>,
    connect_timeout: Duration,
}

impl TlsConnector {
    /// Start building a connector.
    pub fn builder() -> TlsConnectorBuilder {
        TlsConnectorBuilder::new()
    }

    /// Connect to one candidate and drive the handshake to completion.
    fn connect_endpoint(&self, endpoint: &Endpoint) -> io::Result<TlsStream> {
        let addr = (endpoint.host.as_str(), endpoint.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::AddrNotAvailable,
                    format!("no address for {}", endpoint),
                )
            })?;

        let tcp = TcpStream::connect_timeout(&addr, self.connect_timeout)?;
        tcp.set_read_timeout(Some(self.connect_timeout))?;
        tcp.set_write_timeout(Some(self.connect_timeout))?;
        tcp.set_nodelay(true)?;

        let server_name = ServerName::try_from(endpoint.host.clone())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let conn =
            ClientConnection::new(Arc::clone(&self.config), server_name).map_err(io::Error::other)?;

        let mut stream = StreamOwned::new(conn, tcp);
        while stream.conn.is_handshaking() {
            stream.conn.complete_io(&mut stream.sock)?;
        }

        Ok(stream)
    }
}

impl std::fmt::Debug for TlsConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConnector")
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl Connector for TlsConnector {
    type Conn = TlsStream;

    fn connect(&mut self, endpoint: &Endpoint) -> io::Result<TlsStream> {
        self.connect_endpoint(endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_group_ca() {
        let result = TlsConnector::builder().build();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("group CA"));
    }

    #[test]
    fn test_builder_rejects_garbage_ca() {
        let result = TlsConnector::builder()
            .with_group_ca_pem(b"not a pem".to_vec())
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_certs_empty_input() {
        let certs = parse_certs(b"").unwrap();
        assert!(certs.is_empty());
    }

    #[test]
    fn test_parse_key_missing() {
        assert!(parse_key(b"no key material here").is_err());
    }

    #[test]
    fn test_default_timeout() {
        let builder = TlsConnector::builder();
        assert_eq!(builder.connect_timeout, DEFAULT_CONNECT_TIMEOUT);

        let builder = builder.with_connect_timeout(Duration::from_secs(3));
        assert_eq!(builder.connect_timeout, Duration::from_secs(3));
    }
}
