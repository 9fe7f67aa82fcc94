// crates/chainsense-readings/src/harvester.rs
// ============================================================================
// Module: Chainsense Harvest Fan-Out Engine
// Description: Concurrent harvest execution across independent sensors.
// Purpose: Run every relevant sensor's harvest on its own task.
// Dependencies: chainsense-core, tokio, tracing, crate::context, crate::sensor
// ============================================================================

//! ## Overview
//! The harvester owns the set of successfully initialized sensors. For each
//! request it derives one [`SensorContext`](crate::context::SensorContext)
//! per relevant sensor and spawns the sensor's harvest on its own task.
//! Fan-out is unbounded, so a slow or stuck sensor read never delays its
//! siblings. No ordering is guaranteed between writes from different
//! sensors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;

use chainsense_core::Metric;
use tracing::debug;
use tracing::warn;

use crate::context::RequestContext;
use crate::sensor::Sensor;

// ============================================================================
// SECTION: Harvester
// ============================================================================

/// Harvest fan-out engine over the attached sensor set.
///
/// # Invariants
/// - Only sensors that initialized successfully are ever harvested.
/// - One independently scheduled task runs per sensor per request.
#[derive(Default)]
pub struct Harvester {
    /// Successfully initialized sensor drivers.
    sensors: Vec<Arc<dyn Sensor>>,
}

impl Harvester {
    /// Creates an empty harvester.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Initializes the provided drivers and keeps the ones that succeed.
    ///
    /// A driver failing `init` is dropped with a warning; sibling drivers
    /// are unaffected. Returns the number of drivers accepted.
    pub async fn register(
        &mut self,
        drivers: impl IntoIterator<Item = Box<dyn Sensor>>,
    ) -> usize {
        let mut accepted = 0;
        for mut driver in drivers {
            match driver.init().await {
                Ok(()) => {
                    debug!(sensor = driver.id(), "sensor initialized");
                    self.sensors.push(Arc::from(driver));
                    accepted += 1;
                }
                Err(err) => {
                    warn!(
                        sensor = driver.id(),
                        error = %err,
                        "sensor failed to initialize; driver dropped"
                    );
                }
            }
        }
        accepted
    }

    /// Returns the number of active sensors.
    #[must_use]
    pub fn sensor_count(&self) -> usize {
        self.sensors.len()
    }

    /// Returns the union of every active sensor's declared metrics.
    #[must_use]
    pub fn supported_metrics(&self) -> BTreeSet<Metric> {
        self.sensors.iter().flat_map(|sensor| sensor.metrics()).collect()
    }

    /// Fans the request out: spawns one harvest task per sensor whose
    /// declared metrics intersect the requested set.
    ///
    /// Must be called from within a tokio runtime. The engine does not wait
    /// for the spawned harvests; the request's aggregation drain observes
    /// their writes under its own deadline.
    pub fn harvest(&self, request: &RequestContext) {
        let mut dispatched = 0;
        for sensor in &self.sensors {
            if sensor.metrics().is_disjoint(request.requested()) {
                continue;
            }
            let ctx = request.root().for_sensor(sensor.as_ref(), request.pipe().clone());
            let sensor = Arc::clone(sensor);
            tokio::spawn(async move {
                sensor.harvest(ctx).await;
            });
            dispatched += 1;
        }
        debug!(
            label = %request.root().label(),
            sensors = dispatched,
            "harvest fan-out dispatched"
        );
    }
}
