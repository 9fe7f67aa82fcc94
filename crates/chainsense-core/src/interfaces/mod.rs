// crates/chainsense-core/src/interfaces/mod.rs
// ============================================================================
// Module: Chainsense Interfaces
// Description: Backend-agnostic interfaces for the device's external collaborators.
// Purpose: Define the contract surfaces consumed by provisioning and harvesting.
// Dependencies: async-trait, thiserror, tokio, crate::core
// ============================================================================

//! ## Overview
//! Interfaces define how a Chainsense device integrates with its external
//! collaborators (the ledger-backed device registry, the durable identity
//! marker, the physical display, the code encoder, and capability discovery)
//! without embedding transport or hardware details. Implementations must fail
//! closed on missing or invalid data.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::core::DeviceEvent;
use crate::core::DeviceId;
use crate::core::DeviceSpecs;

// ============================================================================
// SECTION: Device Registry
// ============================================================================

/// Errors returned by the device registry.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Registry backend reported an error.
    #[error("device registry error: {0}")]
    Backend(String),
    /// Insertion-event subscription could not be established.
    #[error("device registry subscription failed: {0}")]
    Subscription(String),
}

/// Ledger-backed registry of device records.
///
/// The registry connection is a process-wide singleton accessed by at most
/// one active provisioner at a time.
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// Returns whether a device record exists for the identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the ledger cannot be queried.
    async fn exists(&self, id: &DeviceId) -> Result<bool, RegistryError>;

    /// Pushes the full device descriptor onto the ledger record.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the update is rejected or the ledger
    /// is unreachable.
    async fn update_specs(&self, id: &DeviceId, specs: &DeviceSpecs) -> Result<(), RegistryError>;

    /// Subscribes to ledger-side device insertion events.
    ///
    /// The returned receiver yields one [`DeviceEvent`] per inserted record
    /// until the subscriber is dropped or the ledger ends the stream.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when the subscription cannot be established.
    async fn subscribe_inserted(&self) -> Result<mpsc::Receiver<DeviceEvent>, RegistryError>;
}

// ============================================================================
// SECTION: Identity Store
// ============================================================================

/// Errors returned by the identity store.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Marker storage I/O failed.
    #[error("identity marker io error: {0}")]
    Io(String),
    /// A different identity is already persisted.
    #[error("device identity already provisioned as {0}")]
    AlreadyProvisioned(DeviceId),
}

/// Durable slot holding the device's ledger identity marker.
///
/// # Invariants
/// - `store` is create-if-absent: it must fail, not overwrite, when an
///   identity is already persisted (prevents the double-registration race).
pub trait IdentityStore: Send + Sync {
    /// Returns the persisted identity, if any.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError`] when the marker exists but cannot be read.
    fn load(&self) -> Result<Option<DeviceId>, IdentityError>;

    /// Persists the identity marker.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::AlreadyProvisioned`] when a marker already
    /// exists, or [`IdentityError::Io`] when the write fails.
    fn store(&self, id: &DeviceId) -> Result<(), IdentityError>;
}

// ============================================================================
// SECTION: Display
// ============================================================================

/// Rendered image handed to the display.
///
/// # Invariants
/// - `pixels` is row-major with one byte per module; nonzero means dark.
/// - `pixels.len()` equals `width * width` (registration codes are square).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Image width (and height) in modules.
    pub width: u32,
    /// Row-major module bitmap; nonzero means dark.
    pub pixels: Vec<u8>,
}

/// Physical display attached to the device.
///
/// The display is a process-wide singleton accessed by at most one active
/// provisioner at a time. Operations are fire-and-forget; hardware faults
/// are the driver's concern.
pub trait DeviceDisplay: Send + Sync {
    /// Powers the display panel on.
    fn power_on(&self);

    /// Draws the image on the panel.
    fn draw(&self, image: &EncodedImage);
}

// ============================================================================
// SECTION: Code Encoder
// ============================================================================

/// Error-correction level for encoded registration codes.
///
/// # Invariants
/// - Variants are stable for configuration wire forms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCorrection {
    /// ~7% recovery capacity.
    Low,
    /// ~15% recovery capacity.
    #[default]
    Medium,
    /// ~25% recovery capacity.
    Quartile,
    /// ~30% recovery capacity.
    High,
}

/// Errors returned by the code encoder.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Payload could not be encoded at the requested level.
    #[error("code encoding failed: {0}")]
    Encoding(String),
}

/// Encoder turning a registration payload into a renderable image.
pub trait CodeEncoder: Send + Sync {
    /// Encodes the payload at the given error-correction level.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] when the payload cannot be encoded.
    fn encode(&self, payload: &str, level: ErrorCorrection) -> Result<EncodedImage, EncodeError>;
}

// ============================================================================
// SECTION: Specs Probe
// ============================================================================

/// Errors returned by capability discovery.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Discovery could not produce a device descriptor.
    #[error("device specs discovery failed: {0}")]
    Discovery(String),
}

/// Capability discovery for the local device.
///
/// Discovery runs once at startup; the device cannot proceed without its own
/// descriptor, so a failure here is fatal to provisioning.
pub trait SpecsProbe: Send + Sync {
    /// Discovers the local device descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when the descriptor cannot be computed.
    fn discover(&self) -> Result<DeviceSpecs, ProbeError>;
}
