// crates/chainsense-readings/src/receiver.rs
// ============================================================================
// Module: Chainsense Aggregation Fan-In Engine
// Description: Time-bounded drain of a request's per-metric lanes.
// Purpose: Produce a complete, per-metric-keyed result set for each request.
// Dependencies: chainsense-core, tokio, tracing, crate::context, crate::pipe
// ============================================================================

//! ## Overview
//! Aggregation drains a request's pipe until every requested metric has at
//! least one reading, or the request deadline elapses, or the root context
//! is cancelled, whichever first. The returned report is keyed by exactly
//! the requested metric set; a metric that received nothing carries a
//! distinguished timed-out or cancelled entry, never a missing key.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::future;

use chainsense_core::Metric;
use chainsense_core::MetricReading;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::debug;

use crate::context::ReadingsContext;
use crate::context::RequestContext;

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Per-metric aggregation outcome.
///
/// # Invariants
/// - `Observed` always carries at least one reading.
/// - `TimedOut` and `Cancelled` are distinct, observable outcomes.
#[derive(Debug, Clone)]
pub enum MetricOutcome {
    /// At least one reading arrived before the deadline.
    Observed(Vec<MetricReading>),
    /// The deadline elapsed with no reading for the metric.
    TimedOut,
    /// The root context was cancelled before any reading arrived.
    Cancelled,
}

impl MetricOutcome {
    /// Returns the collected readings when the metric was observed.
    #[must_use]
    pub fn readings(&self) -> Option<&[MetricReading]> {
        match self {
            Self::Observed(readings) => Some(readings),
            Self::TimedOut | Self::Cancelled => None,
        }
    }

    /// Returns the first successfully observed value, if any.
    #[must_use]
    pub fn first_value(&self) -> Option<f64> {
        self.readings()?.iter().find(|reading| !reading.is_failure()).map(|reading| reading.value)
    }

    /// Returns true when at least one reading arrived.
    #[must_use]
    pub const fn is_observed(&self) -> bool {
        matches!(self, Self::Observed(_))
    }
}

// ============================================================================
// SECTION: Report
// ============================================================================

/// Complete aggregation result for one request.
///
/// # Invariants
/// - The key set equals the requested metric set exactly.
#[derive(Debug)]
pub struct ReadingsReport {
    /// Per-metric outcomes keyed by the requested metrics.
    entries: BTreeMap<Metric, MetricOutcome>,
}

impl ReadingsReport {
    /// Returns the outcome recorded for a metric.
    #[must_use]
    pub fn outcome(&self, metric: Metric) -> Option<&MetricOutcome> {
        self.entries.get(&metric)
    }

    /// Returns the per-metric entries.
    #[must_use]
    pub const fn entries(&self) -> &BTreeMap<Metric, MetricOutcome> {
        &self.entries
    }

    /// Consumes the report into its per-metric entries.
    #[must_use]
    pub fn into_entries(self) -> BTreeMap<Metric, MetricOutcome> {
        self.entries
    }

    /// Returns true when every requested metric was observed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.entries.values().all(MetricOutcome::is_observed)
    }
}

// ============================================================================
// SECTION: Aggregation
// ============================================================================

/// Drains the request until every metric reports or time runs out.
///
/// One drain task runs per requested metric; a metric completes on its first
/// received reading plus any immediately available extras (burst
/// absorption). Consumes the request context, dropping its writer half so
/// lanes close as soon as the harvesting producers finish.
pub async fn aggregate(request: RequestContext) -> ReadingsReport {
    let (root, requested, drain, deadline) = request.into_parts();
    let mut tasks: JoinSet<(Metric, MetricOutcome)> = JoinSet::new();
    for (metric, lane) in drain.into_lanes() {
        tasks.spawn(drain_lane(metric, lane, root.clone(), deadline));
    }

    let mut entries: BTreeMap<Metric, MetricOutcome> =
        requested.iter().map(|metric| (*metric, MetricOutcome::TimedOut)).collect();
    while let Some(joined) = tasks.join_next().await {
        if let Ok((metric, outcome)) = joined {
            entries.insert(metric, outcome);
        }
    }

    let observed = entries.values().filter(|outcome| outcome.is_observed()).count();
    debug!(
        label = %root.label(),
        requested = requested.len(),
        observed,
        "aggregation drain complete"
    );
    ReadingsReport {
        entries,
    }
}

/// Drains one metric's lane until a reading, the deadline, or cancellation.
async fn drain_lane(
    metric: Metric,
    mut lane: mpsc::Receiver<MetricReading>,
    root: ReadingsContext,
    deadline: Option<Instant>,
) -> (Metric, MetricOutcome) {
    let expired = async move {
        match deadline {
            Some(at) => tokio::time::sleep_until(at).await,
            None => future::pending().await,
        }
    };
    tokio::pin!(expired);

    tokio::select! {
        () = root.cancelled() => (metric, MetricOutcome::Cancelled),
        () = &mut expired => (metric, MetricOutcome::TimedOut),
        received = lane.recv() => match received {
            Some(reading) => {
                let mut bucket = vec![reading];
                while let Ok(extra) = lane.try_recv() {
                    bucket.push(extra);
                }
                (metric, MetricOutcome::Observed(bucket))
            }
            // Every writer is gone; nothing can arrive before the deadline.
            None => (metric, MetricOutcome::TimedOut),
        },
    }
}
