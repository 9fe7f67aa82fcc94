// crates/chainsense-core/src/lib.rs
// ============================================================================
// Module: Chainsense Core Library
// Description: Data model and collaborator interfaces for Chainsense devices.
// Purpose: Define the metric, reading, and device records shared by all crates.
// Dependencies: serde, serde_json, thiserror, time, tokio
// ============================================================================

//! ## Overview
//! Chainsense Core defines the process-wide data model of a field-deployed
//! sensing device (metrics, readings, device descriptors, and registration
//! progress) plus the backend-agnostic interfaces for every external
//! collaborator: ledger registry, identity store, display, code encoder,
//! and specs probe.
//! Invariants:
//! - Model records carry no behavior beyond construction and accessors.
//! - Interface errors are stable for programmatic handling.
//! - A persisted device identity is never overwritten while its marker exists.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::DeviceEvent;
pub use crate::core::DeviceId;
pub use crate::core::DeviceSpecs;
pub use crate::core::DisplayInfo;
pub use crate::core::Metric;
pub use crate::core::MetricReading;
pub use crate::core::PayloadError;
pub use crate::core::RegistrationState;
pub use crate::core::Timestamp;
pub use interfaces::CodeEncoder;
pub use interfaces::DeviceDisplay;
pub use interfaces::DeviceRegistry;
pub use interfaces::EncodeError;
pub use interfaces::EncodedImage;
pub use interfaces::ErrorCorrection;
pub use interfaces::IdentityError;
pub use interfaces::IdentityStore;
pub use interfaces::ProbeError;
pub use interfaces::RegistryError;
pub use interfaces::SpecsProbe;
