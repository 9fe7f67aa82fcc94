// crates/chainsense-readings/tests/harvest_aggregate.rs
// ============================================================================
// Module: Harvest and Aggregation Tests
// Description: Tests for fan-out harvesting and time-bounded fan-in.
// Purpose: Validate failure isolation, completeness, and cancellation.
// ============================================================================
//! ## Overview
//! Validates that every aggregation request returns a result keyed by
//! exactly the requested metrics, that a failing or slow sensor never
//! affects its siblings, and that cancellation is distinguishable from a
//! timeout.

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

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chainsense_config::Config;
use chainsense_core::Metric;
use chainsense_readings::Harvester;
use chainsense_readings::MetricOutcome;
use chainsense_readings::ReadingsContext;
use chainsense_readings::Sensor;
use chainsense_readings::SensorContext;
use chainsense_readings::SensorError;
use chainsense_readings::aggregate;

// ============================================================================
// SECTION: Test Sensors
// ============================================================================

/// Deterministic sensor writing one configured result per declared metric.
struct ScriptedSensor {
    /// Sensor identity.
    id: String,
    /// Per-metric scripted read results.
    readings: BTreeMap<Metric, Result<f64, String>>,
    /// Delay before writing, when simulating a slow read.
    delay: Option<Duration>,
    /// Error to return from init, when simulating a broken driver.
    init_error: Option<String>,
}

impl ScriptedSensor {
    fn new(id: &str, readings: BTreeMap<Metric, Result<f64, String>>) -> Self {
        Self {
            id: id.to_string(),
            readings,
            delay: None,
            init_error: None,
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn with_init_error(mut self, error: &str) -> Self {
        self.init_error = Some(error.to_string());
        self
    }
}

#[async_trait]
impl Sensor for ScriptedSensor {
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
        if let Some(delay) = self.delay {
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

fn luminosity_sensor(value: f64) -> Box<dyn Sensor> {
    Box::new(ScriptedSensor::new(
        "lum-0",
        BTreeMap::from([(Metric::Luminosity, Ok(value))]),
    ))
}

fn root_context() -> Arc<ReadingsContext> {
    Arc::new(ReadingsContext::new("test", Arc::new(Config::default())))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

/// Tests a single sensor supplying a single requested metric.
#[tokio::test(start_paused = true)]
async fn test_single_sensor_single_metric() {
    let mut harvester = Harvester::new();
    assert_eq!(harvester.register([luminosity_sensor(120.0)]).await, 1);

    let root = root_context();
    let request = root.for_request([Metric::Luminosity], None);
    harvester.harvest(&request);

    let report = aggregate(request).await;
    assert!(report.is_complete());
    let outcome = report.outcome(Metric::Luminosity).unwrap();
    assert_eq!(outcome.first_value(), Some(120.0));
}

/// Tests the report key set equals the requested metric set exactly.
#[tokio::test(start_paused = true)]
async fn test_report_keys_equal_request() {
    let mut harvester = Harvester::new();
    harvester.register([luminosity_sensor(88.0)]).await;

    let requested = [Metric::Luminosity, Metric::Temperature, Metric::Humidity];
    let root = root_context();
    let request = root.for_request(requested, Some(Duration::from_millis(100)));
    harvester.harvest(&request);

    let report = aggregate(request).await;
    let keys: BTreeSet<Metric> = report.entries().keys().copied().collect();
    assert_eq!(keys, BTreeSet::from(requested));
    assert!(report.outcome(Metric::Luminosity).unwrap().is_observed());
    assert!(matches!(report.outcome(Metric::Temperature), Some(MetricOutcome::TimedOut)));
    assert!(matches!(report.outcome(Metric::Humidity), Some(MetricOutcome::TimedOut)));
}

/// Tests a failing sensor is recorded per-metric without affecting siblings.
#[tokio::test(start_paused = true)]
async fn test_failing_sensor_isolated() {
    let mut harvester = Harvester::new();
    harvester
        .register([
            luminosity_sensor(120.0),
            Box::new(ScriptedSensor::new(
                "temp-0",
                BTreeMap::from([(Metric::Temperature, Err("bus timeout".to_string()))]),
            )) as Box<dyn Sensor>,
        ])
        .await;

    let root = root_context();
    let request = root.for_request([Metric::Luminosity, Metric::Temperature], None);
    harvester.harvest(&request);

    let report = aggregate(request).await;
    assert!(report.is_complete());

    let luminosity = report.outcome(Metric::Luminosity).unwrap();
    assert_eq!(luminosity.first_value(), Some(120.0));

    let temperature = report.outcome(Metric::Temperature).unwrap();
    let readings = temperature.readings().unwrap();
    assert!(readings[0].is_failure());
    assert_eq!(readings[0].error.as_deref(), Some("bus timeout"));
}

/// Tests a stuck sensor never delays its sibling's result.
#[tokio::test(start_paused = true)]
async fn test_slow_sensor_does_not_delay_sibling() {
    let mut harvester = Harvester::new();
    harvester
        .register([
            luminosity_sensor(64.0),
            Box::new(
                ScriptedSensor::new(
                    "temp-slow",
                    BTreeMap::from([(Metric::Temperature, Ok(21.0))]),
                )
                .with_delay(Duration::from_secs(3_600)),
            ) as Box<dyn Sensor>,
        ])
        .await;

    let root = root_context();
    let request =
        root.for_request([Metric::Luminosity, Metric::Temperature], Some(Duration::from_secs(1)));
    harvester.harvest(&request);

    let report = aggregate(request).await;
    assert!(report.outcome(Metric::Luminosity).unwrap().is_observed());
    assert!(matches!(report.outcome(Metric::Temperature), Some(MetricOutcome::TimedOut)));
}

/// Tests cancellation terminates the drain with a distinct outcome.
#[tokio::test(start_paused = true)]
async fn test_cancel_distinct_from_timeout() {
    let mut harvester = Harvester::new();
    harvester
        .register([Box::new(
            ScriptedSensor::new(
                "lum-slow",
                BTreeMap::from([(Metric::Luminosity, Ok(12.0))]),
            )
            .with_delay(Duration::from_secs(3_600)),
        ) as Box<dyn Sensor>])
        .await;

    let root = root_context();
    let request = root.for_request([Metric::Luminosity], Some(Duration::from_secs(600)));
    harvester.harvest(&request);

    let canceller = Arc::clone(&root);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let report = aggregate(request).await;
    assert!(matches!(report.outcome(Metric::Luminosity), Some(MetricOutcome::Cancelled)));
}

/// Tests several sensors supplying the same metric are absorbed by the lane.
#[tokio::test(start_paused = true)]
async fn test_multiple_sensors_same_metric() {
    let mut harvester = Harvester::new();
    harvester
        .register([
            luminosity_sensor(120.0),
            Box::new(ScriptedSensor::new(
                "lum-1",
                BTreeMap::from([(Metric::Luminosity, Ok(130.0))]),
            )) as Box<dyn Sensor>,
        ])
        .await;

    let root = root_context();
    let request = root.for_request([Metric::Luminosity], None);
    harvester.harvest(&request);

    let report = aggregate(request).await;
    let outcome = report.outcome(Metric::Luminosity).unwrap();
    let readings = outcome.readings().unwrap();
    assert!(!readings.is_empty());
    for reading in readings {
        assert!(reading.value == 120.0 || reading.value == 130.0);
    }
}

/// Tests drivers failing init are dropped without affecting siblings.
#[tokio::test]
async fn test_register_drops_failing_driver() {
    let mut harvester = Harvester::new();
    let accepted = harvester
        .register([
            luminosity_sensor(42.0),
            Box::new(
                ScriptedSensor::new(
                    "temp-broken",
                    BTreeMap::from([(Metric::Temperature, Ok(21.0))]),
                )
                .with_init_error("no ack from 0x4a"),
            ) as Box<dyn Sensor>,
        ])
        .await;

    assert_eq!(accepted, 1);
    assert_eq!(harvester.sensor_count(), 1);
    assert_eq!(harvester.supported_metrics(), BTreeSet::from([Metric::Luminosity]));
}
