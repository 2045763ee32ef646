// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test code readability over pedantic
#![allow(clippy::missing_panics_doc)] // Tests panic on failure
#![allow(clippy::must_use_candidate)] // Test helpers

//! Candidate ordering and CA persistence in the full flow.
//!
//! The connector fakes script which candidates accept; the engine must walk
//! the list in discovery order, stop at the first success, and leave exactly
//! one intact CA file behind regardless of how often the flow runs.

use std::io;

use edgelink::error::DiscoveryError;
use edgelink::{
    connect_any, discover_and_connect, BackoffConfig, Connector, DiscoveryInfo, DiscoveryProvider,
    Endpoint, Error, GroupInfo, HubInfo, ProtocolConfig,
};

const CA_PEM: &str = "-----BEGIN CERTIFICATE-----\ngroup ca\n-----END CERTIFICATE-----\n";

/// Connector that accepts only the endpoint with the given id.
struct SelectiveConnector {
    accept_id: Option<String>,
    attempted: Vec<String>,
}

impl SelectiveConnector {
    fn accepting(id: &str) -> Self {
        Self {
            accept_id: Some(id.to_string()),
            attempted: Vec::new(),
        }
    }

    fn refusing_all() -> Self {
        Self {
            accept_id: None,
            attempted: Vec::new(),
        }
    }
}

impl Connector for SelectiveConnector {
    type Conn = String;

    fn connect(&mut self, endpoint: &Endpoint) -> io::Result<String> {
        self.attempted.push(endpoint.id.clone());
        if self.accept_id.as_deref() == Some(endpoint.id.as_str()) {
            Ok(endpoint.to_string())
        } else {
            Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"))
        }
    }
}

/// Provider returning the same single-group result on every call.
struct FixedProvider {
    info: DiscoveryInfo,
}

impl DiscoveryProvider for FixedProvider {
    fn discover(&self, _device_name: &str) -> Result<DiscoveryInfo, DiscoveryError> {
        Ok(self.info.clone())
    }
}

fn candidates(n: usize) -> Vec<Endpoint> {
    (0..n)
        .map(|i| Endpoint {
            id: format!("ep-{}", i),
            host: format!("10.0.1.{}", i + 1),
            port: 8883,
            metadata: None,
        })
        .collect()
}

fn provider_with_candidates(n: usize) -> FixedProvider {
    FixedProvider {
        info: DiscoveryInfo {
            groups: vec![GroupInfo {
                group_id: "group-1f2e".to_string(),
                hubs: vec![HubInfo {
                    hub_arn: "arn:edge:hub/alpha".to_string(),
                    endpoints: candidates(n),
                }],
                cas: vec![CA_PEM.to_string()],
            }],
        },
    }
}

fn fast_config(dir: &std::path::Path) -> ProtocolConfig {
    ProtocolConfig::new(dir).with_backoff(BackoffConfig::new(0, 0).with_max_retries(2))
}

#[test]
fn test_kth_candidate_wins_after_k_attempts_in_order() {
    let list = candidates(4);
    let mut connector = SelectiveConnector::accepting("ep-3");

    let (conn, endpoint) = connect_any(&mut connector, &list).unwrap();

    assert_eq!(endpoint.id, "ep-3");
    assert_eq!(conn, "10.0.1.4:8883");
    assert_eq!(connector.attempted, vec!["ep-0", "ep-1", "ep-2", "ep-3"]);
}

#[test]
fn test_first_candidate_success_stops_the_walk() {
    let list = candidates(4);
    let mut connector = SelectiveConnector::accepting("ep-0");

    let (_, endpoint) = connect_any(&mut connector, &list).unwrap();
    assert_eq!(endpoint.id, "ep-0");
    assert_eq!(connector.attempted, vec!["ep-0"]);
}

#[test]
fn test_exhausting_all_candidates_reports_the_count() {
    let list = candidates(3);
    let mut connector = SelectiveConnector::refusing_all();

    let err = connect_any(&mut connector, &list).unwrap_err();
    assert!(matches!(err, Error::ConnectionExhausted { attempted: 3 }));
    assert_eq!(connector.attempted.len(), 3);
}

#[test]
fn test_empty_candidate_list_attempts_nothing() {
    let mut connector = SelectiveConnector::refusing_all();

    let err = connect_any(&mut connector, &[]).unwrap_err();
    assert!(matches!(err, Error::ConnectionExhausted { attempted: 0 }));
    assert!(connector.attempted.is_empty());
}

#[test]
fn test_connection_failure_is_distinct_from_discovery_failure() {
    let provider = provider_with_candidates(2);
    let mut connector = SelectiveConnector::refusing_all();
    let tmp = tempfile::tempdir().unwrap();

    let err =
        discover_and_connect(&provider, &mut connector, "tracker-ggd", &fast_config(tmp.path()))
            .unwrap_err();

    // Discovery worked; only the transport attempts failed.
    assert!(matches!(err, Error::ConnectionExhausted { attempted: 2 }));
    assert!(!matches!(err, Error::DiscoveryExhausted { .. }));
}

#[test]
fn test_full_flow_binds_session_to_the_winning_candidate() {
    let provider = provider_with_candidates(3);
    let mut connector = SelectiveConnector::accepting("ep-1");
    let tmp = tempfile::tempdir().unwrap();

    let session =
        discover_and_connect(&provider, &mut connector, "tracker-ggd", &fast_config(tmp.path()))
            .unwrap();

    assert_eq!(session.group_id, "group-1f2e");
    assert_eq!(session.endpoint.id, "ep-1");
    assert_eq!(connector.attempted, vec!["ep-0", "ep-1"]);
}

#[test]
fn test_ca_persistence_is_idempotent_across_runs() {
    let provider = provider_with_candidates(1);
    let tmp = tempfile::tempdir().unwrap();
    let config = fast_config(tmp.path());

    for _ in 0..2 {
        let mut connector = SelectiveConnector::accepting("ep-0");
        let session =
            discover_and_connect(&provider, &mut connector, "tracker-ggd", &config).unwrap();

        let ca_path = session.ca_path.unwrap();
        assert_eq!(ca_path, tmp.path().join("group-1f2e_CA.crt"));
        assert_eq!(std::fs::read_to_string(&ca_path).unwrap(), CA_PEM);
    }

    // One file, no duplicates or partial writes.
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
}

#[test]
fn test_ca_file_failure_aborts_before_connecting() {
    let provider = provider_with_candidates(1);
    let mut connector = SelectiveConnector::accepting("ep-0");
    let tmp = tempfile::tempdir().unwrap();

    // Occupy the CA *directory* path with a plain file so persistence fails.
    let blocked = tmp.path().join("blocked");
    std::fs::write(&blocked, "in the way").unwrap();

    let err = discover_and_connect(
        &provider,
        &mut connector,
        "tracker-ggd",
        &ProtocolConfig::new(blocked).with_backoff(BackoffConfig::new(0, 0)),
    )
    .unwrap_err();

    assert!(matches!(err, Error::Io(_)));
    assert!(connector.attempted.is_empty());
}
