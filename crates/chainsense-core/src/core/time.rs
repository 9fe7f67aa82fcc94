// crates/chainsense-core/src/core/time.rs
// ============================================================================
// Module: Chainsense Time Model
// Description: Observation timestamps for metric readings.
// Purpose: Provide a single wall-clock representation for observed data.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Readings are observations of the physical world, so they carry the
//! wall-clock instant at which the sensor produced them. The wire form is
//! unix epoch milliseconds.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Observation timestamp in unix epoch milliseconds.
///
/// # Invariants
/// - Monotonicity is not enforced; readings record the clock as observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Returns the current wall-clock timestamp.
    #[must_use]
    pub fn now() -> Self {
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        Self(i64::try_from(millis).unwrap_or(i64::MAX))
    }

    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }
}
