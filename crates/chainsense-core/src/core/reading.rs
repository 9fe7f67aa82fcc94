// crates/chainsense-core/src/core/reading.rs
// ============================================================================
// Module: Chainsense Metric Readings
// Description: One observed value or failure for a metric.
// Purpose: Record sensor observations with explicit per-reading error state.
// Dependencies: serde, crate::core::metric, crate::core::time
// ============================================================================

//! ## Overview
//! A [`MetricReading`] is produced by exactly one sensor for exactly one
//! metric. A failing read is recorded as a reading too, value `NaN` plus the
//! error text, so a broken sensor never silently drops its metric from a
//! result set (the write-with-error pattern).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::metric::Metric;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Readings
// ============================================================================

/// One observed value or failure for a metric.
///
/// # Invariants
/// - `error` is `Some` exactly when the producing read failed; the value is
///   then `NaN`.
/// - Readings are immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricReading {
    /// Metric this reading observes.
    pub metric: Metric,
    /// Observed value; `NaN` when the read failed.
    pub value: f64,
    /// Error text when the read failed.
    pub error: Option<String>,
    /// Wall-clock instant the sensor produced the reading.
    pub observed_at: Timestamp,
}

impl MetricReading {
    /// Creates a successful reading observed now.
    #[must_use]
    pub fn observed(metric: Metric, value: f64) -> Self {
        Self {
            metric,
            value,
            error: None,
            observed_at: Timestamp::now(),
        }
    }

    /// Creates a failed reading observed now, carrying the error text.
    #[must_use]
    pub fn failed(metric: Metric, error: impl fmt::Display) -> Self {
        Self {
            metric,
            value: f64::NAN,
            error: Some(error.to_string()),
            observed_at: Timestamp::now(),
        }
    }

    /// Creates a reading from a read result (the write-with-error pattern).
    #[must_use]
    pub fn from_result(metric: Metric, result: Result<f64, impl fmt::Display>) -> Self {
        match result {
            Ok(value) => Self::observed(metric, value),
            Err(error) => Self::failed(metric, error),
        }
    }

    /// Returns true when the producing read failed.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}
