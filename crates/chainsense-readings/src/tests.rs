// crates/chainsense-readings/src/tests.rs
// ============================================================================
// Module: Readings Unit Tests
// Description: Unit tests for pipes, cancellation, and context derivation.
// Purpose: Validate queue policy and root-to-child signal propagation.
// Dependencies: chainsense-readings
// ============================================================================

//! ## Overview
//! Unit tests for the pipe drop-newest policy, the cancellation handle, and
//! the context hierarchy's derivation rules.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chainsense_config::Config;
use chainsense_core::Metric;
use chainsense_core::MetricReading;
use tokio::time::Instant;

use crate::context::CancelHandle;
use crate::context::ReadingsContext;
use crate::context::SensorContext;
use crate::pipe;
use crate::sensor::Sensor;
use crate::sensor::SensorError;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// Sensor declaring only luminosity, used for context derivation tests.
struct LuminosityOnly;

#[async_trait]
impl Sensor for LuminosityOnly {
    fn id(&self) -> &str {
        "luminosity-only"
    }

    async fn init(&mut self) -> Result<(), SensorError> {
        Ok(())
    }

    async fn harvest(&self, _ctx: SensorContext) {}

    fn metrics(&self) -> BTreeSet<Metric> {
        BTreeSet::from([Metric::Luminosity])
    }
}

fn root_context() -> Arc<ReadingsContext> {
    Arc::new(ReadingsContext::new("unit", Arc::new(Config::default())))
}

// ============================================================================
// SECTION: Pipe Tests
// ============================================================================

/// Tests a full lane drops the newest reading without blocking the writer.
#[tokio::test]
async fn test_full_lane_drops_newest() {
    let metrics = BTreeSet::from([Metric::Luminosity]);
    let (pipe, drain) = pipe::bounded(&metrics, 3);

    for value in [1.0, 2.0, 3.0, 4.0] {
        pipe.write(MetricReading::observed(Metric::Luminosity, value));
    }
    drop(pipe);

    let mut lanes = drain.into_lanes();
    let mut lane = lanes.remove(&Metric::Luminosity).unwrap();
    let mut received = Vec::new();
    while let Some(reading) = lane.recv().await {
        received.push(reading.value);
    }
    assert_eq!(received, vec![1.0, 2.0, 3.0]);
}

/// Tests an inert writer discards readings without panicking.
#[tokio::test]
async fn test_inert_writer_discards() {
    let metrics = BTreeSet::from([Metric::Luminosity]);
    let (pipe, drain) = pipe::bounded(&metrics, 3);

    pipe.writer(Metric::Temperature).write(21.5);
    drop(pipe);

    let mut lanes = drain.into_lanes();
    let mut lane = lanes.remove(&Metric::Luminosity).unwrap();
    assert!(lane.recv().await.is_none());
}

/// Tests write-with-error records failures as readings.
#[tokio::test]
async fn test_write_result_records_failure() {
    let metrics = BTreeSet::from([Metric::Luminosity]);
    let (pipe, drain) = pipe::bounded(&metrics, 3);

    pipe.writer(Metric::Luminosity).write_result(Err::<f64, String>("bus nak".to_string()));
    drop(pipe);

    let mut lanes = drain.into_lanes();
    let mut lane = lanes.remove(&Metric::Luminosity).unwrap();
    let reading = lane.recv().await.unwrap();
    assert!(reading.is_failure());
    assert!(reading.value.is_nan());
}

// ============================================================================
// SECTION: Cancellation Tests
// ============================================================================

/// Tests the cancellation signal is observed by every clone.
#[tokio::test]
async fn test_cancel_handle_propagates() {
    let handle = CancelHandle::new();
    let observer = handle.clone();
    assert!(!observer.is_cancelled());

    handle.cancel();
    assert!(observer.is_cancelled());
    observer.cancelled().await;
}

/// Tests derived contexts observe root cancellation immediately.
#[tokio::test]
async fn test_child_observes_root_cancel() {
    let root = root_context();
    let request = root.for_request([Metric::Luminosity], None);
    let sensor_ctx = root.for_sensor(&LuminosityOnly, request.pipe().clone());
    assert!(!request.is_cancelled());
    assert!(!sensor_ctx.is_cancelled());

    root.cancel();
    assert!(request.is_cancelled());
    assert!(sensor_ctx.is_cancelled());
}

// ============================================================================
// SECTION: Context Derivation Tests
// ============================================================================

/// Tests the request pipe carries exactly one lane per requested metric.
#[tokio::test]
async fn test_request_pipe_lanes_match_request() {
    let root = root_context();
    let requested = [Metric::Luminosity, Metric::Humidity];
    let request = root.for_request(requested, None);

    assert_eq!(request.pipe().metrics(), BTreeSet::from(requested));
    assert_eq!(*request.requested(), BTreeSet::from(requested));
    assert!(request.deadline().is_some());
}

/// Tests the request deadline never extends past the root deadline.
#[tokio::test]
async fn test_request_deadline_capped_by_root() {
    let root_deadline = Instant::now() + Duration::from_millis(10);
    let config = Arc::new(Config::default());
    let root = Arc::new(ReadingsContext::new("unit", config).with_deadline(root_deadline));

    let request = root.for_request([Metric::Luminosity], Some(Duration::from_secs(60)));
    assert!(request.deadline().unwrap() <= root_deadline);
}

/// Tests an undeclared metric yields an inert writer on the sensor context.
#[tokio::test]
async fn test_undeclared_metric_write_discarded() {
    let root = root_context();
    let metrics = BTreeSet::from([Metric::Luminosity, Metric::Temperature]);
    let (pipe, drain) = pipe::bounded(&metrics, 3);
    let sensor_ctx = root.for_sensor(&LuminosityOnly, pipe);

    sensor_ctx.lane(Metric::Temperature).write(21.5);
    sensor_ctx.lane(Metric::Luminosity).write(120.0);
    drop(sensor_ctx);

    let mut lanes = drain.into_lanes();
    let mut temperature = lanes.remove(&Metric::Temperature).unwrap();
    assert!(temperature.recv().await.is_none());

    let mut luminosity = lanes.remove(&Metric::Luminosity).unwrap();
    let reading = luminosity.recv().await.unwrap();
    assert!((reading.value - 120.0).abs() < f64::EPSILON);
}
