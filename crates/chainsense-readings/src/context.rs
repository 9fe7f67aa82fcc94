// crates/chainsense-readings/src/context.rs
// ============================================================================
// Module: Chainsense Execution Contexts
// Description: Root cancellation/deadline context and its derived forms.
// Purpose: Scope every harvest and aggregation to a cancellable, bounded unit.
// Dependencies: chainsense-core, chainsense-config, tokio, tracing
// ============================================================================

//! ## Overview
//! A [`ReadingsContext`] is constructed once per operating scope with a
//! cancellation handle, an optional deadline, a provenance label, and the
//! process configuration. Derived contexts add their own bindings (a sensor
//! identity plus pipe writer for [`SensorContext`], a requested metric set
//! plus a fresh pipe for [`RequestContext`]) and delegate every
//! deadline/cancellation query to the root, so cancelling the root
//! propagates immediately and consistently to every descendant.
//! Invariants:
//! - A derived context never outlives its root's cancellation signal.
//! - A sensor context only accepts writes for metrics the sensor declares.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chainsense_config::Config;
use chainsense_core::Metric;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;
use tracing::warn;

use crate::pipe;
use crate::pipe::MetricPipe;
use crate::pipe::MetricWriter;
use crate::pipe::PipeDrain;
use crate::sensor::Sensor;

// ============================================================================
// SECTION: Cancellation Handle
// ============================================================================

/// Shared cancellation signal for a context tree.
///
/// # Invariants
/// - Once cancelled, the handle stays cancelled; every clone observes the
///   signal.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    /// Signal sender shared by every clone.
    tx: Arc<watch::Sender<bool>>,
    /// Signal receiver used for queries and waits.
    rx: watch::Receiver<bool>,
}

impl CancelHandle {
    /// Creates an uncancelled handle.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Fires the cancellation signal.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Returns whether the signal has fired.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Waits until the signal fires.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// SECTION: Root Context
// ============================================================================

/// Root execution context for the readings pipeline.
///
/// Carries the cancellation handle, an optional deadline, the provenance
/// label used to tag diagnostics, and the process configuration reference.
/// Clones are cheap and share the cancellation signal and configuration, so
/// derived contexts hold a clone as their parent link.
///
/// # Invariants
/// - Cancelling any clone cancels every clone.
/// - The deadline, once set, never moves.
#[derive(Debug, Clone)]
pub struct ReadingsContext {
    /// Provenance label prefixing diagnostics from this context tree.
    label: String,
    /// Cancellation signal shared with every descendant.
    cancel: CancelHandle,
    /// Optional absolute deadline for the whole context tree.
    deadline: Option<Instant>,
    /// Process configuration reference.
    config: Arc<Config>,
}

impl ReadingsContext {
    /// Creates a root context with no deadline.
    #[must_use]
    pub fn new(label: impl Into<String>, config: Arc<Config>) -> Self {
        Self {
            label: label.into(),
            cancel: CancelHandle::new(),
            deadline: None,
            config,
        }
    }

    /// Sets an absolute deadline for the context tree.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Returns the provenance label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the configuration reference.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the deadline, if one is set.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fires cancellation for this context and every descendant.
    pub fn cancel(&self) {
        debug!(label = %self.label, "context cancelled");
        self.cancel.cancel();
    }

    /// Returns whether the context is cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Waits until the context is cancelled.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }

    /// Derives a harvest context scoped to one sensor.
    ///
    /// The sensor context shares this root's cancellation and deadline, binds
    /// the sensor's identity and declared metric set, and writes into the
    /// provided pipe.
    #[must_use]
    pub fn for_sensor(&self, sensor: &dyn Sensor, pipe: MetricPipe) -> SensorContext {
        SensorContext {
            parent: self.clone(),
            sensor_id: sensor.id().to_string(),
            declared: sensor.metrics(),
            pipe,
        }
    }

    /// Derives an aggregation context scoped to one request.
    ///
    /// A fresh pipe is created with one bounded queue per requested metric
    /// (capacity from `harvest.pipe_capacity`). The request deadline is
    /// `timeout` from now, defaulting to `harvest.request_timeout_ms`, and
    /// never extends past this root's own deadline.
    #[must_use]
    pub fn for_request(
        &self,
        metrics: impl IntoIterator<Item = Metric>,
        timeout: Option<Duration>,
    ) -> RequestContext {
        let requested: BTreeSet<Metric> = metrics.into_iter().collect();
        let (pipe, drain) = pipe::bounded(&requested, self.config.harvest.pipe_capacity);
        let timeout = timeout.unwrap_or_else(|| self.config.harvest.request_timeout());
        let request_deadline = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(root) => Some(root.min(request_deadline)),
            None => Some(request_deadline),
        };
        RequestContext {
            parent: self.clone(),
            requested,
            pipe,
            drain,
            deadline,
        }
    }
}

// ============================================================================
// SECTION: Sensor Context
// ============================================================================

/// Harvest context scoped to one sensor.
///
/// # Invariants
/// - Deadline and cancellation delegate to the root.
/// - Writers are only handed out for metrics the sensor declares.
#[derive(Debug)]
pub struct SensorContext {
    /// Root context this sensor context derives from.
    parent: ReadingsContext,
    /// Identity of the sensor this context is scoped to.
    sensor_id: String,
    /// Metrics the sensor declares support for.
    declared: BTreeSet<Metric>,
    /// Pipe the sensor writes readings into.
    pipe: MetricPipe,
}

impl SensorContext {
    /// Returns the sensor identity this context is scoped to.
    #[must_use]
    pub fn sensor_id(&self) -> &str {
        &self.sensor_id
    }

    /// Returns the root deadline, if one is set.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.parent.deadline()
    }

    /// Returns whether the root context is cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.parent.is_cancelled()
    }

    /// Waits until the root context is cancelled.
    pub async fn cancelled(&self) {
        self.parent.cancelled().await;
    }

    /// Returns a writer for one of the sensor's declared metrics.
    ///
    /// A writer for an undeclared metric is inert: the violation is logged
    /// and every write through it is discarded, so a misbehaving driver can
    /// never pollute another sensor's lanes.
    #[must_use]
    pub fn lane(&self, metric: Metric) -> MetricWriter {
        if self.declared.contains(&metric) {
            self.pipe.writer(metric)
        } else {
            warn!(
                label = %self.parent.label(),
                sensor = %self.sensor_id,
                metric = %metric,
                "sensor wrote a metric it does not declare; write discarded"
            );
            MetricPipe::inert_writer(metric)
        }
    }
}

// ============================================================================
// SECTION: Request Context
// ============================================================================

/// Aggregation context scoped to one external request.
///
/// # Invariants
/// - Exactly one bounded queue exists per requested metric.
/// - Cancellation delegates to the root; the deadline never extends past the
///   root's.
#[derive(Debug)]
pub struct RequestContext {
    /// Root context this request context derives from.
    parent: ReadingsContext,
    /// Metric set the request asks for.
    requested: BTreeSet<Metric>,
    /// Writer half handed to harvesting sensors.
    pipe: MetricPipe,
    /// Drain half consumed by aggregation.
    drain: PipeDrain,
    /// Effective absolute deadline for the request.
    deadline: Option<Instant>,
}

impl RequestContext {
    /// Returns the root context this request derives from.
    #[must_use]
    pub const fn root(&self) -> &ReadingsContext {
        &self.parent
    }

    /// Returns the requested metric set.
    #[must_use]
    pub const fn requested(&self) -> &BTreeSet<Metric> {
        &self.requested
    }

    /// Returns the writer half of the request pipe.
    #[must_use]
    pub const fn pipe(&self) -> &MetricPipe {
        &self.pipe
    }

    /// Returns the effective request deadline.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns whether the root context is cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.parent.is_cancelled()
    }

    /// Waits until the root context is cancelled.
    pub async fn cancelled(&self) {
        self.parent.cancelled().await;
    }

    /// Splits the request into the pieces the aggregation drain needs,
    /// dropping this context's writer half in the process.
    #[must_use]
    pub(crate) fn into_parts(
        self,
    ) -> (ReadingsContext, BTreeSet<Metric>, PipeDrain, Option<Instant>) {
        (self.parent, self.requested, self.drain, self.deadline)
    }
}
