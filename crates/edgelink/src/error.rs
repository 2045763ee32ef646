// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy for discovery and connection.
//!
//! Two layers:
//!
//! - [`DiscoveryError`] is what a [`DiscoveryProvider`] returns. It carries
//!   the retry classification: the engine retries a failure only when
//!   [`DiscoveryError::is_transient`] says so. Providers map their own
//!   transport errors into this enum at the boundary; nothing downstream
//!   inspects vendor error types.
//! - [`Error`] is the crate-level result type. Discovery-budget exhaustion
//!   and connection exhaustion are distinct terminal variants, as are the
//!   fatal configuration cases (`TooManyGroups`, missing config entries).
//!
//! [`DiscoveryProvider`]: crate::discovery::DiscoveryProvider

use std::io;

/// Errors returned by a discovery provider for a single `discover` call.
///
/// The engine consults [`is_transient`](DiscoveryError::is_transient) to
/// decide between backing off and propagating immediately.
#[derive(Debug)]
pub enum DiscoveryError {
    /// The request itself was malformed (bad device name, bad credentials).
    /// Never retried.
    InvalidRequest(String),
    /// The service answered but does not know this device. Never retried,
    /// and reported distinctly from service failures.
    DeviceNotRegistered(String),
    /// The service was unreachable or answered with a server-side failure.
    /// Retried within the attempt budget.
    Unavailable(String),
    /// The service asked us to slow down. Retried within the attempt budget.
    Throttled(String),
    /// The service answered with a payload this crate cannot parse.
    /// Never retried.
    Protocol(String),
}

impl DiscoveryError {
    /// Whether the failure is worth another attempt after backing off.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DiscoveryError::Unavailable(_) | DiscoveryError::Throttled(_)
        )
    }
}

impl std::fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscoveryError::InvalidRequest(msg) => write!(f, "Invalid discovery request: {}", msg),
            DiscoveryError::DeviceNotRegistered(name) => {
                write!(f, "Device not registered with the control plane: {}", name)
            }
            DiscoveryError::Unavailable(msg) => write!(f, "Discovery service unavailable: {}", msg),
            DiscoveryError::Throttled(msg) => write!(f, "Discovery request throttled: {}", msg),
            DiscoveryError::Protocol(msg) => write!(f, "Malformed discovery response: {}", msg),
        }
    }
}

impl std::error::Error for DiscoveryError {}

/// Errors returned by edgelink operations.
#[derive(Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Group config file not found at the given path.
    ConfigFileNotFound(String),
    /// Group config file exists but does not parse.
    MalformedConfig(String),
    /// Device name has no entry in the group config file.
    DeviceNotFound(String),

    // ========================================================================
    // Discovery Errors
    // ========================================================================
    /// The discovery request was rejected as malformed. Terminal.
    InvalidRequest(String),
    /// The control plane does not know this device. Terminal, distinct from
    /// a service failure.
    DeviceNotRegistered(String),
    /// The retry budget was spent on transient discovery failures.
    DiscoveryExhausted {
        /// Discovery attempts performed before giving up.
        attempts: u32,
    },
    /// Discovery returned more groups than the caller allows. A device is
    /// expected to belong to exactly one group at registration time; this is
    /// a configuration fault and is never silently resolved.
    TooManyGroups {
        /// Groups the control plane returned.
        found: usize,
        /// Groups the caller accepts.
        max: usize,
    },
    /// Discovery succeeded but no matching group (or pinned hub) was present.
    GroupNotFound,

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Every candidate endpoint was attempted and none accepted a connection.
    /// Distinct from discovery failure.
    ConnectionExhausted {
        /// Endpoints attempted (0 for an empty candidate list).
        attempted: usize,
    },

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// I/O error with underlying cause (CA persistence, credential loading).
    Io(io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // Configuration
            Error::ConfigFileNotFound(path) => write!(f, "Config file not found: {}", path),
            Error::MalformedConfig(msg) => write!(f, "Malformed group config: {}", msg),
            Error::DeviceNotFound(name) => {
                write!(f, "Device '{}' not present in group config", name)
            }
            // Discovery
            Error::InvalidRequest(msg) => write!(f, "Invalid discovery request: {}", msg),
            Error::DeviceNotRegistered(name) => {
                write!(f, "Device not registered with the control plane: {}", name)
            }
            Error::DiscoveryExhausted { attempts } => {
                write!(f, "Discovery failed after {} attempts", attempts)
            }
            Error::TooManyGroups { found, max } => write!(
                f,
                "Discovered {} groups but at most {} expected",
                found, max
            ),
            Error::GroupNotFound => write!(f, "No matching group discovered"),
            // Connection
            Error::ConnectionExhausted { attempted } => {
                write!(f, "No endpoint accepted a connection ({} attempted)", attempted)
            }
            // I/O
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

/// Terminal mapping for a non-retryable discovery failure.
///
/// Transient variants are never converted this way; the engine turns an
/// exhausted budget into [`Error::DiscoveryExhausted`] instead.
impl From<DiscoveryError> for Error {
    fn from(e: DiscoveryError) -> Self {
        match e {
            DiscoveryError::InvalidRequest(msg) | DiscoveryError::Protocol(msg) => {
                Error::InvalidRequest(msg)
            }
            DiscoveryError::DeviceNotRegistered(name) => Error::DeviceNotRegistered(name),
            // Reachable only if a caller converts directly; the engine
            // retries these within its budget.
            DiscoveryError::Unavailable(_) | DiscoveryError::Throttled(_) => {
                Error::DiscoveryExhausted { attempts: 0 }
            }
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
