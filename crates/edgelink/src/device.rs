// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Composed device client.
//!
//! Wires the group config file, the HTTP discovery provider, the TLS
//! connector, and the protocol engine into the one-call flow device entry
//! scripts use: resolve the device's registered name, discover the group,
//! persist its CA, and connect to the first broker candidate that accepts.
//!
//! # Example
//!
//! ```ignore
//! use edgelink::{DeviceClient, DeviceCredentials, ProtocolConfig};
//!
//! let client = DeviceClient::from_config_file(
//!     "cfg/group.json",
//!     DeviceCredentials::new("root.ca.pem", "device.crt", "device.key"),
//!     ProtocolConfig::new("certs/"),
//! )?;
//! let session = client.connect("heartrate")?;
//! ```

use std::io;
use std::path::{Path, PathBuf};

use crate::ca::save_group_ca;
use crate::config::GroupConfig;
use crate::discovery::HttpDiscovery;
use crate::error::{Error, Result};
use crate::protocol::{connect_any, discover_group, group_candidates, ProtocolConfig, Session};
use crate::transport::{TlsConnector, TlsStream};

/// Filesystem locations of the device's credentials.
#[derive(Debug, Clone)]
pub struct DeviceCredentials {
    /// Root CA pinning the control plane.
    pub root_ca: PathBuf,
    /// Device certificate (PEM).
    pub certificate: PathBuf,
    /// Device private key (PEM).
    pub private_key: PathBuf,
}

impl DeviceCredentials {
    /// Bundle credential paths.
    pub fn new(
        root_ca: impl Into<PathBuf>,
        certificate: impl Into<PathBuf>,
        private_key: impl Into<PathBuf>,
    ) -> Self {
        Self {
            root_ca: root_ca.into(),
            certificate: certificate.into(),
            private_key: private_key.into(),
        }
    }
}

/// One device's view of its group: config, credentials, protocol settings.
#[derive(Debug)]
pub struct DeviceClient {
    config: GroupConfig,
    credentials: DeviceCredentials,
    protocol: ProtocolConfig,
}

impl DeviceClient {
    /// Build a client from an already-parsed group config.
    ///
    /// Candidates are pinned to the group's configured hub, matching how
    /// provisioning registers exactly one hub per group.
    pub fn new(
        config: GroupConfig,
        credentials: DeviceCredentials,
        protocol: ProtocolConfig,
    ) -> Self {
        let protocol = if protocol.hub_arn.is_some() {
            protocol
        } else {
            protocol.with_hub_arn(config.hub_arn().to_string())
        };
        Self {
            config,
            credentials,
            protocol,
        }
    }

    /// Build a client from a group config file.
    pub fn from_config_file(
        path: impl AsRef<Path>,
        credentials: DeviceCredentials,
        protocol: ProtocolConfig,
    ) -> Result<Self> {
        Ok(Self::new(GroupConfig::load(path)?, credentials, protocol))
    }

    /// The parsed group config.
    pub fn config(&self) -> &GroupConfig {
        &self.config
    }

    /// Discover this device's group and connect to its hub.
    ///
    /// `device_name` is the local name from the config file's `devices`
    /// section; the control plane is queried with the registered
    /// `thing_name`.
    pub fn connect(&self, device_name: &str) -> Result<Session<TlsStream>> {
        let device = self.config.device(device_name)?;
        let registered_name = device.thing_name.clone();

        let mut builder = HttpDiscovery::builder(self.config.endpoint())
            .with_root_ca_file(&self.credentials.root_ca)?
            .with_identity_files(&self.credentials.certificate, &self.credentials.private_key)?;
        if let Some(port) = self.config.misc.port {
            builder = builder.with_port(port);
        }
        let provider = builder.build()?;

        let group = discover_group(&provider, &registered_name, &self.protocol)?;
        let candidates = group_candidates(&group, &self.protocol)?;

        let ca = group.cas.first().ok_or_else(|| {
            Error::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("group '{}' returned no CA material", group.group_id),
            ))
        })?;
        let ca_path = save_group_ca(&self.protocol.group_ca_dir, &group.group_id, ca)?;

        let mut connector = TlsConnector::builder()
            .with_group_ca_file(&ca_path)?
            .with_identity_files(&self.credentials.certificate, &self.credentials.private_key)?
            .build()?;

        let (connection, endpoint) = connect_any(&mut connector, &candidates)?;

        log::info!(
            "Device '{}' connected to group '{}' via {}",
            registered_name,
            group.group_id,
            endpoint
        );

        Ok(Session {
            connection,
            endpoint,
            group_id: group.group_id,
            ca_path: Some(ca_path),
        })
    }
}
