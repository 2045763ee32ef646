// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # edgelink - Edge device discovery and connect
//!
//! Device-side discovery-and-connect protocol for edge pub/sub groups: a
//! device asks the cloud control plane which *group* it belongs to, receives
//! the group's candidate broker endpoints and CA material, persists the CA,
//! and connects to the first candidate that accepts -- under a bounded
//! progressive-backoff retry budget.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgelink::{DeviceClient, DeviceCredentials, ProtocolConfig, Result};
//!
//! fn main() -> Result<()> {
//!     let client = DeviceClient::from_config_file(
//!         "cfg/group.json",
//!         DeviceCredentials::new("root.ca.pem", "device.crt", "device.key"),
//!         ProtocolConfig::new("certs/"),
//!     )?;
//!
//!     let session = client.connect("heartrate")?;
//!     println!("connected to {} in group {}", session.endpoint, session.group_id);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +--------------------------------------------------------------+
//! |                        DeviceClient                          |
//! |   group config -> discovery -> CA persistence -> connect     |
//! +--------------------------------------------------------------+
//! |                      Protocol Engine                         |
//! |   bounded retry/backoff | group-count check | first-wins     |
//! +--------------------------------------------------------------+
//! |   DiscoveryProvider Trait      |      Connector Trait        |
//! |   HttpDiscovery (mTLS HTTPS)   |      TlsConnector (rustls)  |
//! +--------------------------------------------------------------+
//! ```
//!
//! Both seams are plain synchronous traits, so the retry and ordering
//! behavior is fully testable with in-memory fakes -- no network involved.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`DeviceClient`] | Composed config + discovery + connect flow |
//! | [`ProtocolConfig`] | Retry budget, group-count limit, CA directory |
//! | [`ProgressiveBackoff`] | Per-call capped-exponential retry budget |
//! | [`DiscoveryProvider`] | Control-plane discovery capability |
//! | [`Connector`] | One transport-level connection attempt |
//! | [`Session`] | Live connection plus group id and CA path |
//!
//! ## Failure semantics
//!
//! Discovery failures and connection failures are distinct error kinds:
//! [`Error::DiscoveryExhausted`] means the control plane never produced a
//! usable answer within the budget, [`Error::ConnectionExhausted`] means
//! discovery worked but no candidate broker accepted. Neither is retried
//! across calls; the caller decides whether to re-run the flow.

/// Progressive backoff for bounded retry loops.
pub mod backoff;
/// Group CA persistence (write-if-absent).
pub mod ca;
/// Group setup file parsing.
pub mod config;
/// Composed device client (config + discovery + TLS connect).
#[cfg(all(feature = "http-discovery", feature = "tls-transport"))]
pub mod device;
/// Group discovery: data model, provider trait, HTTP control-plane client.
pub mod discovery;
/// Error taxonomy (crate-level and provider-level).
pub mod error;
/// Discovery-and-connect engine.
pub mod protocol;
/// Transport seam and TLS connector.
pub mod transport;

pub use backoff::{BackoffConfig, ProgressiveBackoff};
pub use ca::{group_ca_path, save_group_ca};
pub use config::GroupConfig;
#[cfg(all(feature = "http-discovery", feature = "tls-transport"))]
pub use device::{DeviceClient, DeviceCredentials};
#[cfg(feature = "http-discovery")]
pub use discovery::HttpDiscovery;
pub use discovery::{DiscoveryInfo, DiscoveryProvider, Endpoint, GroupInfo, HubInfo};
pub use error::{DiscoveryError, Error, Result};
pub use protocol::{
    connect_any, discover_and_connect, discover_group, ProtocolConfig, Session,
};
pub use transport::Connector;
#[cfg(feature = "tls-transport")]
pub use transport::{TlsConnector, TlsStream};
