// crates/chainsense-readings/src/pipe.rs
// ============================================================================
// Module: Chainsense Metric Pipes
// Description: Bounded per-metric reading queues with a writer/drain split.
// Purpose: Carry readings from sensor producers to the aggregation consumer.
// Dependencies: chainsense-core, tokio, tracing
// ============================================================================

//! ## Overview
//! A pipe maps each metric to an independent bounded FIFO queue of readings.
//! The writer half ([`MetricPipe`]) is cloned into every producer; exactly
//! one drain half ([`PipeDrain`]) exists per pipe and is consumed by the
//! aggregation engine. Queue capacity is fixed at creation and never
//! resized.
//!
//! Full-queue policy: writes are non-blocking drop-newest. A producer is
//! never blocked by a slow consumer; a write into a full lane drops the new
//! reading and logs it at debug level.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

use chainsense_core::Metric;
use chainsense_core::MetricReading;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

// ============================================================================
// SECTION: Pipe Construction
// ============================================================================

/// Creates a bounded pipe carrying the given metrics.
///
/// Exactly one queue is created per metric; `capacity` is the fixed depth of
/// every queue.
#[must_use]
pub fn bounded(metrics: &BTreeSet<Metric>, capacity: usize) -> (MetricPipe, PipeDrain) {
    let mut writers = BTreeMap::new();
    let mut readers = BTreeMap::new();
    for metric in metrics {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        writers.insert(*metric, tx);
        readers.insert(*metric, rx);
    }
    (
        MetricPipe {
            lanes: writers,
        },
        PipeDrain {
            lanes: readers,
        },
    )
}

// ============================================================================
// SECTION: Writer Half
// ============================================================================

/// Writer half of a pipe: one bounded lane per carried metric.
///
/// # Invariants
/// - Lane capacity is fixed at creation.
/// - Writes never block; a full lane drops the newest reading.
#[derive(Clone)]
pub struct MetricPipe {
    /// Per-metric bounded senders.
    lanes: BTreeMap<Metric, mpsc::Sender<MetricReading>>,
}

impl MetricPipe {
    /// Returns the metrics this pipe carries.
    #[must_use]
    pub fn metrics(&self) -> BTreeSet<Metric> {
        self.lanes.keys().copied().collect()
    }

    /// Returns whether the pipe carries a lane for the metric.
    #[must_use]
    pub fn carries(&self, metric: Metric) -> bool {
        self.lanes.contains_key(&metric)
    }

    /// Writes a reading into its metric's lane, applying the drop-newest
    /// policy when the lane is full or already closed.
    pub fn write(&self, reading: MetricReading) {
        let Some(lane) = self.lanes.get(&reading.metric) else {
            debug!(metric = %reading.metric, "pipe carries no lane for metric; reading discarded");
            return;
        };
        deliver(lane, reading);
    }

    /// Returns a single-metric writer bound to the metric's lane.
    ///
    /// The writer is inert when the pipe carries no lane for the metric.
    #[must_use]
    pub fn writer(&self, metric: Metric) -> MetricWriter {
        MetricWriter {
            metric,
            lane: self.clone_lane(metric),
        }
    }

    /// Returns a writer with no lane; every write through it is discarded.
    #[must_use]
    pub fn inert_writer(metric: Metric) -> MetricWriter {
        MetricWriter {
            metric,
            lane: None,
        }
    }

    /// Clones the sender for a metric's lane, if present.
    fn clone_lane(&self, metric: Metric) -> Option<mpsc::Sender<MetricReading>> {
        self.lanes.get(&metric).cloned()
    }
}

impl fmt::Debug for MetricPipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricPipe").field("metrics", &self.metrics()).finish()
    }
}

// ============================================================================
// SECTION: Single-Metric Writer
// ============================================================================

/// Writer bound to one metric's lane.
///
/// # Invariants
/// - Writes apply the pipe's drop-newest policy.
/// - An inert writer (no lane) discards readings with a debug log.
#[derive(Debug)]
pub struct MetricWriter {
    /// Metric every write is recorded against.
    metric: Metric,
    /// Lane sender; `None` when the pipe carries no lane for the metric.
    lane: Option<mpsc::Sender<MetricReading>>,
}

impl MetricWriter {
    /// Records a successful observation.
    pub fn write(&self, value: f64) {
        self.push(MetricReading::observed(self.metric, value));
    }

    /// Records a failed read, carrying the error text.
    pub fn write_error(&self, error: impl fmt::Display) {
        self.push(MetricReading::failed(self.metric, error));
    }

    /// Records a read result as a value or an error-tagged reading.
    ///
    /// This is the write-with-error pattern: a failing read still produces
    /// exactly one reading for the metric, so the metric is never silently
    /// dropped from a result set.
    pub fn write_result(&self, result: Result<f64, impl fmt::Display>) {
        self.push(MetricReading::from_result(self.metric, result));
    }

    /// Applies the drop-newest policy to one reading.
    fn push(&self, reading: MetricReading) {
        let Some(lane) = &self.lane else {
            debug!(metric = %self.metric, "writer is inert; reading discarded");
            return;
        };
        deliver(lane, reading);
    }
}

/// Delivers one reading into a lane under the drop-newest policy.
fn deliver(lane: &mpsc::Sender<MetricReading>, reading: MetricReading) {
    match lane.try_send(reading) {
        Ok(()) => {}
        Err(TrySendError::Full(dropped)) => {
            debug!(metric = %dropped.metric, "lane full; dropping newest reading");
        }
        Err(TrySendError::Closed(dropped)) => {
            debug!(metric = %dropped.metric, "lane closed; dropping reading");
        }
    }
}

// ============================================================================
// SECTION: Drain Half
// ============================================================================

/// Drain half of a pipe: one bounded receiver per carried metric.
///
/// # Invariants
/// - Exactly one drain exists per pipe.
/// - Within one lane, readings are FIFO by arrival.
#[derive(Debug)]
pub struct PipeDrain {
    /// Per-metric bounded receivers.
    lanes: BTreeMap<Metric, mpsc::Receiver<MetricReading>>,
}

impl PipeDrain {
    /// Returns the metrics this drain covers.
    #[must_use]
    pub fn metrics(&self) -> BTreeSet<Metric> {
        self.lanes.keys().copied().collect()
    }

    /// Splits the drain into its per-metric receivers.
    #[must_use]
    pub fn into_lanes(self) -> BTreeMap<Metric, mpsc::Receiver<MetricReading>> {
        self.lanes
    }
}
