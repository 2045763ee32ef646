// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! HTTP control-plane discovery client.
//!
//! Resolves a device's group over the cloud control plane's discovery API:
//!
//! ```text
//! GET https://<endpoint>:<port>/edge/discover/device/<device_name>
//! ```
//!
//! The call is authenticated with the device certificate (mutual TLS) and
//! the control-plane root CA pins the server. Responses map onto the
//! [`DiscoveryError`] taxonomy:
//!
//! | HTTP status            | Classification                         |
//! |------------------------|----------------------------------------|
//! | 400                    | `InvalidRequest` (terminal)            |
//! | 404                    | `DeviceNotRegistered` (terminal)       |
//! | 429                    | `Throttled` (retried)                  |
//! | 5xx, timeout, connect  | `Unavailable` (retried)                |
//! | unparsable body        | `Protocol` (terminal)                  |
//!
//! # Example
//!
//! ```ignore
//! use edgelink::discovery::HttpDiscovery;
//!
//! let provider = HttpDiscovery::builder("discovery.example.io")
//!     .with_root_ca_file("root.ca.pem")?
//!     .with_identity_files("device.crt", "device.key")?
//!     .build()?;
//! let info = provider.discover("tracker-ggd")?;
//! ```

use std::io;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;

use super::{DiscoveryInfo, DiscoveryProvider, Endpoint, GroupInfo, HubInfo};
use crate::error::{DiscoveryError, Error, Result};

/// Default control-plane discovery port.
pub const DEFAULT_DISCOVERY_PORT: u16 = 8443;

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct DiscoverResponse {
    #[serde(rename = "Groups", default)]
    groups: Vec<WireGroup>,
}

#[derive(Debug, Deserialize)]
struct WireGroup {
    #[serde(rename = "GroupId")]
    group_id: String,
    #[serde(rename = "Hubs", default)]
    hubs: Vec<WireHub>,
    #[serde(rename = "CAs", default)]
    cas: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WireHub {
    #[serde(rename = "HubArn")]
    hub_arn: String,
    #[serde(rename = "Connectivity", default)]
    connectivity: Vec<WireConnectivity>,
}

#[derive(Debug, Deserialize)]
struct WireConnectivity {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "HostAddress")]
    host: String,
    #[serde(rename = "PortNumber")]
    port: u16,
    #[serde(rename = "Metadata")]
    metadata: Option<String>,
}

impl From<WireGroup> for GroupInfo {
    fn from(g: WireGroup) -> Self {
        GroupInfo {
            group_id: g.group_id,
            hubs: g
                .hubs
                .into_iter()
                .map(|h| HubInfo {
                    hub_arn: h.hub_arn,
                    endpoints: h
                        .connectivity
                        .into_iter()
                        .map(|c| Endpoint {
                            id: c.id,
                            host: c.host,
                            port: c.port,
                            metadata: c.metadata,
                        })
                        .collect(),
                })
                .collect(),
            cas: g.cas,
        }
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`HttpDiscovery`].
pub struct HttpDiscoveryBuilder {
    endpoint: String,
    port: u16,
    timeout: Duration,
    root_ca_pem: Option<Vec<u8>>,
    identity_pem: Option<Vec<u8>>,
}

impl HttpDiscoveryBuilder {
    fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            port: DEFAULT_DISCOVERY_PORT,
            timeout: DEFAULT_TIMEOUT,
            root_ca_pem: None,
            identity_pem: None,
        }
    }

    /// Set the discovery port (default: 8443).
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the per-request timeout (default: 10s).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Pin the control plane with a root CA (PEM bytes).
    pub fn with_root_ca_pem(mut self, pem: Vec<u8>) -> Self {
        self.root_ca_pem = Some(pem);
        self
    }

    /// Pin the control plane with a root CA loaded from a file.
    pub fn with_root_ca_file(self, path: impl AsRef<Path>) -> io::Result<Self> {
        let pem = std::fs::read(path)?;
        Ok(self.with_root_ca_pem(pem))
    }

    /// Set the device identity for mutual TLS (certificate + key PEM bytes).
    pub fn with_identity_pem(mut self, cert_pem: Vec<u8>, key_pem: Vec<u8>) -> Self {
        let mut combined = cert_pem;
        combined.extend_from_slice(b"\n");
        combined.extend_from_slice(&key_pem);
        self.identity_pem = Some(combined);
        self
    }

    /// Set the device identity for mutual TLS from certificate and key files.
    pub fn with_identity_files(
        self,
        cert_path: impl AsRef<Path>,
        key_path: impl AsRef<Path>,
    ) -> io::Result<Self> {
        let cert_pem = std::fs::read(cert_path)?;
        let key_pem = std::fs::read(key_path)?;
        Ok(self.with_identity_pem(cert_pem, key_pem))
    }

    /// Build the discovery client.
    pub fn build(self) -> Result<HttpDiscovery> {
        let mut builder = Client::builder().use_rustls_tls().timeout(self.timeout);

        if let Some(pem) = &self.root_ca_pem {
            let ca = reqwest::Certificate::from_pem(pem)
                .map_err(|e| invalid_pem("root CA", &e))?;
            builder = builder.add_root_certificate(ca).tls_built_in_root_certs(false);
        }

        if let Some(pem) = &self.identity_pem {
            let identity = reqwest::Identity::from_pem(pem)
                .map_err(|e| invalid_pem("device identity", &e))?;
            builder = builder.identity(identity);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Io(io::Error::other(e)))?;

        Ok(HttpDiscovery {
            endpoint: self.endpoint,
            port: self.port,
            client,
        })
    }
}

fn invalid_pem(what: &str, cause: &dyn std::fmt::Display) -> Error {
    Error::Io(io::Error::new(
        io::ErrorKind::InvalidData,
        format!("bad {} PEM: {}", what, cause),
    ))
}

// ============================================================================
// Client
// ============================================================================

/// Mutual-TLS HTTP client for the control-plane discovery API.
#[derive(Debug, Clone)]
pub struct HttpDiscovery {
    /// Control-plane endpoint hostname.
    endpoint: String,
    /// Control-plane discovery port.
    port: u16,
    /// Blocking HTTP client with pinned roots and device identity.
    client: Client,
}

impl HttpDiscovery {
    /// Start building a client for the given control-plane hostname.
    pub fn builder(endpoint: impl Into<String>) -> HttpDiscoveryBuilder {
        HttpDiscoveryBuilder::new(endpoint)
    }

    /// Control-plane endpoint hostname.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn discover_url(&self, device_name: &str) -> String {
        format!(
            "https://{}:{}/edge/discover/device/{}",
            self.endpoint, self.port, device_name
        )
    }
}

impl DiscoveryProvider for HttpDiscovery {
    fn discover(&self, device_name: &str) -> std::result::Result<DiscoveryInfo, DiscoveryError> {
        if device_name.is_empty() {
            return Err(DiscoveryError::InvalidRequest(
                "empty device name".to_string(),
            ));
        }

        let url = self.discover_url(device_name);
        log::debug!("Discovery request for '{}' via {}", device_name, url);

        let response = self.client.get(&url).send().map_err(|e| {
            if e.is_timeout() {
                DiscoveryError::Unavailable(format!("request timed out: {}", e))
            } else {
                DiscoveryError::Unavailable(e.to_string())
            }
        })?;

        let status = response.status();
        match status.as_u16() {
            200 => {}
            400 => {
                return Err(DiscoveryError::InvalidRequest(format!(
                    "control plane rejected request for '{}'",
                    device_name
                )))
            }
            404 => return Err(DiscoveryError::DeviceNotRegistered(device_name.to_string())),
            429 => return Err(DiscoveryError::Throttled(format!("HTTP {}", status))),
            _ => return Err(DiscoveryError::Unavailable(format!("HTTP {}", status))),
        }

        let body: DiscoverResponse = response
            .json()
            .map_err(|e| DiscoveryError::Protocol(e.to_string()))?;

        let info = DiscoveryInfo {
            groups: body.groups.into_iter().map(GroupInfo::from).collect(),
        };

        log::debug!(
            "Discovery for '{}' returned {} group(s)",
            device_name,
            info.groups.len()
        );

        Ok(info)
    }
}
