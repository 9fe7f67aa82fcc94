// crates/chainsense-sensors/src/bus.rs
// ============================================================================
// Module: Chainsense Sensor Bus Seam
// Description: Byte-level peripheral bus contract for sensor drivers.
// Purpose: Keep register-level I2C/SPI access outside the driver crates.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Drivers talk to their hardware through [`SensorBus`], the byte-level
//! seam. Real implementations wrap an I2C or SPI peripheral; tests script
//! responses. A bus handle is owned by exactly one driver instance.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Bus Errors
// ============================================================================

/// Errors raised by peripheral bus access.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum BusError {
    /// Byte transfer failed.
    #[error("bus io failure: {0}")]
    Io(String),
}

// ============================================================================
// SECTION: Bus Trait
// ============================================================================

/// Byte-level peripheral bus handle.
///
/// # Invariants
/// - A handle is owned exclusively by one driver; never shared across
///   sensors.
pub trait SensorBus: Send {
    /// Writes raw bytes to the peripheral.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] when the transfer fails.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), BusError>;

    /// Reads `len` raw bytes from the peripheral.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] when the transfer fails or yields fewer bytes.
    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, BusError>;
}
