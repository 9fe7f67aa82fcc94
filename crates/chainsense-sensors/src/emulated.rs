// crates/chainsense-sensors/src/emulated.rs
// ============================================================================
// Module: Emulated Sensor Driver
// Description: Deterministic in-memory sensor for tests and bench rigs.
// Purpose: Exercise the harvest pipeline without attached hardware.
// Dependencies: chainsense-core, chainsense-readings, tokio
// ============================================================================

//! ## Overview
//! The emulated sensor scripts its read results per metric, optionally
//! delays its harvest to simulate a slow device, and can fail `init` to
//! simulate a broken driver. It honors the same harvest contract as real
//! drivers: exactly one write per declared metric.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use chainsense_core::Metric;
use chainsense_readings::Sensor;
use chainsense_readings::SensorContext;
use chainsense_readings::SensorError;

// ============================================================================
// SECTION: Emulated Sensor
// ============================================================================

/// Deterministic in-memory sensor driver.
///
/// # Invariants
/// - Declared metrics are exactly the scripted ones.
/// - Harvest writes every scripted result, in metric order.
pub struct EmulatedSensor {
    /// Sensor identity reported to the pipeline.
    id: String,
    /// Scripted read result per declared metric.
    readings: BTreeMap<Metric, Result<f64, String>>,
    /// Delay applied before harvesting, simulating a slow read.
    read_delay: Option<Duration>,
    /// Error returned from `init`, simulating a broken driver.
    init_error: Option<String>,
}

impl EmulatedSensor {
    /// Creates an emulated sensor with no scripted metrics.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            readings: BTreeMap::new(),
            read_delay: None,
            init_error: None,
        }
    }

    /// Scripts a successful reading for a metric.
    #[must_use]
    pub fn with_reading(mut self, metric: Metric, value: f64) -> Self {
        self.readings.insert(metric, Ok(value));
        self
    }

    /// Scripts a failing read for a metric.
    #[must_use]
    pub fn with_failure(mut self, metric: Metric, error: impl Into<String>) -> Self {
        self.readings.insert(metric, Err(error.into()));
        self
    }

    /// Delays every harvest by the given duration.
    #[must_use]
    pub const fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    /// Makes `init` fail with the given error.
    #[must_use]
    pub fn with_init_error(mut self, error: impl Into<String>) -> Self {
        self.init_error = Some(error.into());
        self
    }
}

#[async_trait]
impl Sensor for EmulatedSensor {
    fn id(&self) -> &str {
        &self.id
    }

    async fn init(&mut self) -> Result<(), SensorError> {
        match &self.init_error {
            Some(error) => Err(SensorError::Bus(error.clone())),
            None => Ok(()),
        }
    }

    async fn harvest(&self, ctx: SensorContext) {
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        for (metric, result) in &self.readings {
            ctx.lane(*metric).write_result(result.clone());
        }
    }

    fn metrics(&self) -> BTreeSet<Metric> {
        self.readings.keys().copied().collect()
    }
}
