// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Discovery-and-connect engine.
//!
//! The device-side flow: resolve the registered group through a
//! [`DiscoveryProvider`] under a bounded progressive-backoff budget, persist
//! the group CA, then walk the group's candidate endpoints through a
//! [`Connector`] until one accepts -- first success wins.
//!
//! ```text
//!  discover ----fail(transient)----> backoff, retry (bounded)
//!     |    \---fail(terminal)-----> propagate
//!     v
//!  group count check --> TooManyGroups (fatal, no connect attempted)
//!     |
//!  persist group CA (write-if-absent)
//!     |
//!  candidates in order --> connect, connect, ... first success
//!     |                                   \--> ConnectionExhausted
//!     v
//!  Session { connection, endpoint, group_id, ca_path }
//! ```
//!
//! Everything is synchronous and blocking; retry state lives on the stack of
//! one call and is never shared. Discovery failure and connection failure are
//! distinct error kinds, so a caller can tell "the control plane never
//! answered" from "no broker accepted us" and decide whether to re-run the
//! whole flow.

use std::path::PathBuf;
use std::thread;

use crate::backoff::{BackoffConfig, ProgressiveBackoff};
use crate::ca::save_group_ca;
use crate::discovery::{log_hub_candidates, DiscoveryProvider, Endpoint, GroupInfo};
use crate::error::{Error, Result};
use crate::transport::Connector;

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for one discovery-and-connect flow.
#[derive(Debug, Clone)]
pub struct ProtocolConfig {
    /// Directory the group CA is persisted under.
    pub group_ca_dir: PathBuf,
    /// Maximum acceptable group count. A device belongs to one group at
    /// registration time, so this is normally 1.
    pub max_groups: usize,
    /// Retry budget and delay schedule for discovery.
    pub backoff: BackoffConfig,
    /// Restrict candidates to this hub when set.
    pub hub_arn: Option<String>,
}

impl ProtocolConfig {
    /// Create a configuration persisting CA material under `group_ca_dir`.
    pub fn new(group_ca_dir: impl Into<PathBuf>) -> Self {
        Self {
            group_ca_dir: group_ca_dir.into(),
            max_groups: 1,
            backoff: BackoffConfig::default(),
            hub_arn: None,
        }
    }

    /// Accept up to `max` groups (default: 1).
    pub fn with_max_groups(mut self, max: usize) -> Self {
        self.max_groups = max;
        self
    }

    /// Set the discovery retry budget and delay schedule.
    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    /// Only connect to candidates of the given hub.
    pub fn with_hub_arn(mut self, arn: impl Into<String>) -> Self {
        self.hub_arn = Some(arn.into());
        self
    }
}

/// An established connection and where it came from.
#[derive(Debug)]
pub struct Session<C> {
    /// The live transport connection.
    pub connection: C,
    /// The candidate that accepted.
    pub endpoint: Endpoint,
    /// The resolved group.
    pub group_id: String,
    /// Persisted CA file, when the group carried CA material.
    pub ca_path: Option<PathBuf>,
}

// ============================================================================
// Discovery with bounded retry
// ============================================================================

/// Resolve the device's group, retrying transient failures under the
/// configured backoff budget.
///
/// Terminal outcomes:
/// - non-retryable provider errors propagate immediately, with no sleeps;
/// - a spent budget becomes [`Error::DiscoveryExhausted`];
/// - more groups than `config.max_groups` is [`Error::TooManyGroups`] -- a
///   device registered in several groups is a provisioning fault the caller
///   must see, never a choice this crate makes silently;
/// - an empty result is [`Error::GroupNotFound`].
pub fn discover_group<P>(provider: &P, device_name: &str, config: &ProtocolConfig) -> Result<GroupInfo>
where
    P: DiscoveryProvider + ?Sized,
{
    let mut backoff = ProgressiveBackoff::with_config(config.backoff);
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        match provider.discover(device_name) {
            Ok(info) => {
                let found = info.groups.len();
                if found > config.max_groups {
                    return Err(Error::TooManyGroups {
                        found,
                        max: config.max_groups,
                    });
                }
                let group = info.groups.into_iter().next().ok_or(Error::GroupNotFound)?;
                log::info!(
                    "Device '{}' discovered group '{}' on attempt {}",
                    device_name,
                    group.group_id,
                    attempts
                );
                return Ok(group);
            }
            Err(e) if e.is_transient() => match backoff.next_delay() {
                Some(delay) => {
                    log::warn!(
                        "Discovery attempt {} for '{}' failed: {} ({} retries left)",
                        attempts,
                        device_name,
                        e,
                        backoff.attempts_remaining()
                    );
                    thread::sleep(delay);
                }
                None => {
                    log::error!(
                        "Discovery for '{}' failed after {} attempts: {}",
                        device_name,
                        attempts,
                        e
                    );
                    return Err(Error::DiscoveryExhausted { attempts });
                }
            },
            Err(e) => {
                log::error!("Discovery for '{}' aborted: {}", device_name, e);
                return Err(e.into());
            }
        }
    }
}

// ============================================================================
// Candidate sequencing
// ============================================================================

/// Attempt each candidate in order; the first accepted connection wins.
///
/// Per-candidate failures are logged and the loop continues. An empty list
/// or full exhaustion is [`Error::ConnectionExhausted`], distinct from any
/// discovery failure.
pub fn connect_any<C>(connector: &mut C, candidates: &[Endpoint]) -> Result<(C::Conn, Endpoint)>
where
    C: Connector + ?Sized,
{
    for (attempt, endpoint) in candidates.iter().enumerate() {
        log::info!("Connecting to hub at {}", endpoint);
        match connector.connect(endpoint) {
            Ok(conn) => {
                log::info!("Connected to {} (candidate {})", endpoint, attempt + 1);
                return Ok((conn, endpoint.clone()));
            }
            Err(e) => {
                log::warn!("Candidate {} failed: {}", endpoint, e);
            }
        }
    }

    Err(Error::ConnectionExhausted {
        attempted: candidates.len(),
    })
}

// ============================================================================
// Full flow
// ============================================================================

/// Discover the device's group, persist its CA, and connect to the first
/// candidate endpoint that accepts.
pub fn discover_and_connect<P, C>(
    provider: &P,
    connector: &mut C,
    device_name: &str,
    config: &ProtocolConfig,
) -> Result<Session<C::Conn>>
where
    P: DiscoveryProvider + ?Sized,
    C: Connector + ?Sized,
{
    let group = discover_group(provider, device_name, config)?;
    log_hub_candidates(&group.hubs);

    let candidates = group_candidates(&group, config)?;

    let ca_path = match group.cas.first() {
        Some(ca) => Some(save_group_ca(&config.group_ca_dir, &group.group_id, ca)?),
        None => {
            log::warn!("Group '{}' returned no CA material", group.group_id);
            None
        }
    };

    let (connection, endpoint) = connect_any(connector, &candidates)?;

    Ok(Session {
        connection,
        endpoint,
        group_id: group.group_id,
        ca_path,
    })
}

/// Candidate endpoints of a group, honoring an optional hub pin, in
/// control-plane order.
pub fn group_candidates(group: &GroupInfo, config: &ProtocolConfig) -> Result<Vec<Endpoint>> {
    let candidates = match &config.hub_arn {
        Some(arn) => group
            .hubs
            .iter()
            .find(|h| h.hub_arn == *arn)
            .ok_or(Error::GroupNotFound)?
            .endpoints
            .clone(),
        None => group
            .hubs
            .iter()
            .flat_map(|h| h.endpoints.iter().cloned())
            .collect(),
    };

    Ok(candidates)
}
