// crates/chainsense-readings/src/sensor.rs
// ============================================================================
// Module: Chainsense Sensor Contract
// Description: The polymorphic sensor capability surface.
// Purpose: Define what every attached sensor driver must provide.
// Dependencies: async-trait, chainsense-core, thiserror, crate::context
// ============================================================================

//! ## Overview
//! A sensor driver identifies itself, initializes its owned bus handle,
//! declares the metrics it supports, and harvests readings into a
//! [`SensorContext`]. Harvest must always produce exactly one write per
//! declared metric (a value or an error-tagged reading), so a failing
//! sensor never silently drops its metric and never blocks sibling sensors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use async_trait::async_trait;
use chainsense_core::Metric;
use thiserror::Error;

use crate::context::SensorContext;

// ============================================================================
// SECTION: Sensor Errors
// ============================================================================

/// Errors raised by sensor drivers.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum SensorError {
    /// Peripheral bus access failed.
    #[error("sensor bus failure: {0}")]
    Bus(String),
    /// Driver is not compatible with the attached device.
    #[error("sensor driver is not compatible with the attached device: {0}")]
    Incompatible(String),
}

// ============================================================================
// SECTION: Sensor Trait
// ============================================================================

/// Attached sensor capability surface.
///
/// Bus handles are owned exclusively by their driver instance and are never
/// shared across sensors. Retry policy, if any, belongs to the driver; the
/// harvest engine never retries.
#[async_trait]
pub trait Sensor: Send + Sync {
    /// Returns the stable identity of the sensor.
    fn id(&self) -> &str;

    /// Initializes the driver and its owned bus handle.
    ///
    /// Drivers failing initialization are dropped from the harvest set.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError`] when the bus cannot be opened or the attached
    /// device is not what the driver expects.
    async fn init(&mut self) -> Result<(), SensorError>;

    /// Reads the sensor and writes one reading per declared metric into the
    /// context's pipe (value or error-tagged; see the module overview).
    async fn harvest(&self, ctx: SensorContext);

    /// Returns the metrics this sensor declares support for.
    fn metrics(&self) -> BTreeSet<Metric>;
}
