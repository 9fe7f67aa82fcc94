// crates/chainsense-sensors/src/lib.rs
// ============================================================================
// Module: Chainsense Sensors Library
// Description: Sensor drivers over owned peripheral bus handles.
// Purpose: Provide concrete Sensor implementations for attached hardware.
// Dependencies: chainsense-core, chainsense-readings, thiserror, tracing
// ============================================================================

//! ## Overview
//! Drivers implement the [`chainsense_readings::Sensor`] contract over an
//! owned [`SensorBus`] handle. Byte-level bus access is an external concern:
//! the bus trait is the seam, and each driver owns its handle exclusively
//! with no sharing across sensors.
//! Invariants:
//! - Harvest always produces exactly one write per declared metric, value or
//!   error-tagged.
//! - A driver failing `init` leaves no lingering bus state behind.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod bus;
pub mod emulated;
pub mod max44009;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use bus::BusError;
pub use bus::SensorBus;
pub use emulated::EmulatedSensor;
pub use max44009::Max44009;
pub use max44009::Max44009Config;
