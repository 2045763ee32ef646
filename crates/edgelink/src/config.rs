// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Group setup file.
//!
//! Provisioning writes a JSON group config shared by every device in a
//! group; devices read it to learn their registered name, the hub they pin,
//! and the control-plane endpoint. This module only reads the file -- the
//! provisioning side that writes it is a separate concern.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// The `hub` section: the broker-hosting node of the group.
#[derive(Debug, Clone, Deserialize)]
pub struct HubSection {
    /// Registration identifier of the hub.
    pub thing_arn: String,
    /// Certificate identifier assigned at provisioning.
    #[serde(default)]
    pub cert_arn: Option<String>,
}

/// One entry of the `devices` section.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceSection {
    /// Name the device is registered under with the control plane.
    pub thing_name: String,
    /// Registration identifier of the device.
    #[serde(default)]
    pub thing_arn: Option<String>,
    /// Certificate identifier assigned at provisioning.
    #[serde(default)]
    pub cert_arn: Option<String>,
    /// Whether the device state shadow syncs to the cloud.
    #[serde(default)]
    pub cloud_sync: bool,
}

/// The `misc` section: control-plane coordinates.
#[derive(Debug, Clone, Deserialize)]
pub struct MiscSection {
    /// Control-plane discovery endpoint hostname.
    pub endpoint: String,
    /// Control-plane discovery port; the client default applies when absent.
    #[serde(default)]
    pub port: Option<u16>,
}

/// Parsed group config file.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupConfig {
    /// The group's hub.
    pub hub: HubSection,
    /// Devices registered in the group, keyed by their local name.
    #[serde(default)]
    pub devices: HashMap<String, DeviceSection>,
    /// Control-plane coordinates.
    pub misc: MiscSection,
}

impl GroupConfig {
    /// Load and parse a group config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::ConfigFileNotFound(path.display().to_string())
            } else {
                Error::Io(e)
            }
        })?;

        serde_json::from_str(&raw).map_err(|e| Error::MalformedConfig(e.to_string()))
    }

    /// Look up a device entry by its local name.
    pub fn device(&self, name: &str) -> Result<&DeviceSection> {
        self.devices
            .get(name)
            .ok_or_else(|| Error::DeviceNotFound(name.to_string()))
    }

    /// Registration identifier of the group's hub.
    pub fn hub_arn(&self) -> &str {
        &self.hub.thing_arn
    }

    /// Control-plane discovery endpoint hostname.
    pub fn endpoint(&self) -> &str {
        &self.misc.endpoint
    }
}
