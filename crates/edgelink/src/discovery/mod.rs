// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Group discovery for edge devices.
//!
//! A device resolves its registered group through a control-plane *discovery
//! provider*: given the device name, the provider returns the group(s) the
//! device belongs to, each with the broker-hosting hubs, their candidate
//! connectivity endpoints, and the group CA material used to validate the
//! brokers.
//!
//! # Architecture
//!
//! ```text
//! DiscoveryProvider Trait
//! +-- HttpDiscovery    (cloud control plane, mutual-TLS HTTPS)
//! +-- test fakes       (scripted results for the protocol engine tests)
//! ```
//!
//! The trait is synchronous and blocking: the protocol engine drives one
//! discovery call at a time from a single thread.

#[cfg(feature = "http-discovery")]
pub mod http;

#[cfg(feature = "http-discovery")]
pub use http::HttpDiscovery;

use crate::error::DiscoveryError;

/// One candidate connectivity endpoint of a hub.
///
/// Candidates are attempted in the order the control plane returns them;
/// the first successful transport connection wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Control-plane identifier for this entry.
    pub id: String,
    /// Broker host (IP or DNS name).
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// Free-form metadata attached at registration time.
    pub metadata: Option<String>,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// A broker-hosting hub inside a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubInfo {
    /// Registration identifier of the hub.
    pub hub_arn: String,
    /// Candidate endpoints, in control-plane order.
    pub endpoints: Vec<Endpoint>,
}

/// A discovered group: its hubs and the CA material that signs their broker
/// certificates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInfo {
    /// Group identifier, also the key under which CA material is persisted.
    pub group_id: String,
    /// Hubs of the group, in control-plane order.
    pub hubs: Vec<HubInfo>,
    /// PEM-encoded CA certificates for this group.
    pub cas: Vec<String>,
}

/// Result of one discovery call.
///
/// A device belongs to at most one group at registration time; the protocol
/// engine treats more groups than expected as a fatal configuration error
/// rather than silently picking one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryInfo {
    /// Discovered groups, in control-plane order.
    pub groups: Vec<GroupInfo>,
}

impl DiscoveryInfo {
    /// All discovered groups.
    pub fn all_groups(&self) -> &[GroupInfo] {
        &self.groups
    }

    /// All `(group_id, ca_pem)` pairs across the discovered groups.
    pub fn all_cas(&self) -> Vec<(&str, &str)> {
        self.groups
            .iter()
            .flat_map(|g| g.cas.iter().map(|ca| (g.group_id.as_str(), ca.as_str())))
            .collect()
    }

    /// All hubs across the discovered groups, in order.
    pub fn all_hubs(&self) -> Vec<&HubInfo> {
        self.groups.iter().flat_map(|g| g.hubs.iter()).collect()
    }

    /// Find a hub by its registration identifier, across all groups.
    pub fn hub_by_arn(&self, arn: &str) -> Option<&HubInfo> {
        self.all_hubs().into_iter().find(|h| h.hub_arn == arn)
    }
}

/// Control-plane discovery capability.
///
/// Implementations map their own transport failures into the
/// [`DiscoveryError`] taxonomy; retry policy lives in the protocol engine,
/// never in the provider.
pub trait DiscoveryProvider {
    /// Resolve the groups the named device is registered in.
    fn discover(&self, device_name: &str) -> Result<DiscoveryInfo, DiscoveryError>;
}

/// Find candidate endpoints matching `needle` by id, host, port, or metadata.
///
/// Returns every match across the given hubs, in order. An empty needle
/// matches nothing.
pub fn find_endpoints<'a>(hubs: &'a [HubInfo], needle: &str) -> Vec<&'a Endpoint> {
    if needle.is_empty() {
        return Vec::new();
    }

    hubs.iter()
        .flat_map(|h| h.endpoints.iter())
        .filter(|ep| {
            ep.id == needle
                || ep.host == needle
                || ep.port.to_string() == needle
                || ep.metadata.as_deref() == Some(needle)
        })
        .collect()
}

/// Debug-log the candidate endpoints of each hub.
pub fn log_hub_candidates(hubs: &[HubInfo]) {
    for hub in hubs {
        log::debug!("Hub {} has {} candidate(s)", hub.hub_arn, hub.endpoints.len());
        for ep in &hub.endpoints {
            log::debug!(
                "  candidate id={} {}:{} metadata={:?}",
                ep.id,
                ep.host,
                ep.port,
                ep.metadata
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_info() -> DiscoveryInfo {
        DiscoveryInfo {
            groups: vec![GroupInfo {
                group_id: "group-1f2e".to_string(),
                hubs: vec![HubInfo {
                    hub_arn: "arn:edge:hub/alpha".to_string(),
                    endpoints: vec![
                        Endpoint {
                            id: "ep-0".to_string(),
                            host: "10.0.1.5".to_string(),
                            port: 8883,
                            metadata: Some("lan".to_string()),
                        },
                        Endpoint {
                            id: "ep-1".to_string(),
                            host: "hub.local".to_string(),
                            port: 8883,
                            metadata: None,
                        },
                    ],
                }],
                cas: vec!["-----BEGIN CERTIFICATE-----\n...".to_string()],
            }],
        }
    }

    #[test]
    fn test_all_cas_pairs_group_id() {
        let info = sample_info();
        let cas = info.all_cas();
        assert_eq!(cas.len(), 1);
        assert_eq!(cas[0].0, "group-1f2e");
    }

    #[test]
    fn test_hub_by_arn() {
        let info = sample_info();
        assert!(info.hub_by_arn("arn:edge:hub/alpha").is_some());
        assert!(info.hub_by_arn("arn:edge:hub/missing").is_none());
    }

    #[test]
    fn test_find_endpoints_by_each_field() {
        let info = sample_info();
        let hubs = &info.groups[0].hubs;

        assert_eq!(find_endpoints(hubs, "ep-1").len(), 1);
        assert_eq!(find_endpoints(hubs, "10.0.1.5").len(), 1);
        assert_eq!(find_endpoints(hubs, "8883").len(), 2);
        assert_eq!(find_endpoints(hubs, "lan").len(), 1);
        assert!(find_endpoints(hubs, "nothing").is_empty());
    }

    #[test]
    fn test_find_endpoints_empty_needle() {
        let info = sample_info();
        assert!(find_endpoints(&info.groups[0].hubs, "").is_empty());
    }

    #[test]
    fn test_endpoint_display() {
        let ep = Endpoint {
            id: "ep-0".to_string(),
            host: "hub.local".to_string(),
            port: 8883,
            metadata: None,
        };
        assert_eq!(ep.to_string(), "hub.local:8883");
    }
}
