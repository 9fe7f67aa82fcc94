// crates/chainsense-core/src/core/device.rs
// ============================================================================
// Module: Chainsense Device Records
// Description: Device descriptor, ledger identity, and registration progress.
// Purpose: Model the device as seen by discovery and the ledger registry.
// Dependencies: serde, serde_json, thiserror, crate::core::metric
// ============================================================================

//! ## Overview
//! [`DeviceSpecs`] is computed once at startup by capability discovery and is
//! immutable thereafter. [`DeviceId`] is the opaque identifier the ledger
//! assigns on registration; it is absent until registration is confirmed and
//! read-only afterward. [`RegistrationState`] tracks provisioning progress.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::metric::Metric;

// ============================================================================
// SECTION: Device Identity
// ============================================================================

/// Ledger-assigned device identifier.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied.
/// - Once persisted, never replaced by a different value while the on-disk
///   marker exists.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Creates a new device identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// SECTION: Device Specs
// ============================================================================

/// Display hardware metadata included in the device descriptor.
///
/// # Invariants
/// - Dimensions are in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayInfo {
    /// Display width in pixels.
    pub width: u32,
    /// Display height in pixels.
    pub height: u32,
}

/// Discovered hardware and capability descriptor for the device.
///
/// # Invariants
/// - Computed once at startup by the specs probe; immutable thereafter.
/// - `supports` lists every metric an attached sensor declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSpecs {
    /// Hostname the device identifies itself by on the network.
    pub hostname: String,
    /// Network address, when known at discovery time.
    pub address: Option<String>,
    /// Metrics the attached sensors collectively support.
    pub supports: BTreeSet<Metric>,
    /// Attached display metadata, when a display is present.
    pub display: Option<DisplayInfo>,
}

/// Errors encoding the registration payload.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// Payload serialization failed.
    #[error("registration payload encoding failed: {0}")]
    Encoding(String),
}

impl DeviceSpecs {
    /// Encodes the descriptor as the machine-readable registration payload.
    ///
    /// The payload is what gets rendered to the device's display for the
    /// network operator to scan during provisioning.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError`] when serialization fails.
    pub fn registration_payload(&self) -> Result<String, PayloadError> {
        serde_json::to_string(self).map_err(|err| PayloadError::Encoding(err.to_string()))
    }
}

// ============================================================================
// SECTION: Registration Events
// ============================================================================

/// Ledger-side notification that a device record was inserted.
///
/// # Invariants
/// - `hostname` is the hostname the inserting operator recorded; it is
///   matched against local specs before any state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEvent {
    /// Identifier assigned to the inserted device record.
    pub id: DeviceId,
    /// Hostname recorded on the inserted device record.
    pub hostname: String,
}

// ============================================================================
// SECTION: Registration State
// ============================================================================

/// Provisioning progress of the device.
///
/// # Invariants
/// - Transitions are monotonic forward (`Unregistered` →
///   `AwaitingConfirmation` → `Registered`), except that an external
///   removed-from-network signal resets `Registered` back to
///   `AwaitingConfirmation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationState {
    /// No ledger identity is known for the device.
    Unregistered,
    /// The registration payload is displayed and a confirmation is awaited.
    AwaitingConfirmation,
    /// The ledger has confirmed the device identity.
    Registered,
}

impl RegistrationState {
    /// Returns a stable label for the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unregistered => "unregistered",
            Self::AwaitingConfirmation => "awaiting_confirmation",
            Self::Registered => "registered",
        }
    }
}

impl fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
