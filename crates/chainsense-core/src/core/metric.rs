// crates/chainsense-core/src/core/metric.rs
// ============================================================================
// Module: Chainsense Metrics
// Description: The process-wide constant set of measurable physical quantities.
// Purpose: Provide strongly typed metric identifiers with stable wire forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Metrics name the physical quantities a device can observe. The set is a
//! process-wide constant: sensors declare which metrics they support and
//! aggregation requests are keyed by metric. Identifiers serialize as
//! snake_case strings on the wire.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Metric Identifiers
// ============================================================================

/// Named, typed physical quantity observable by attached sensors.
///
/// # Invariants
/// - Variants are stable for wire encoding and result keying.
/// - Every metric has exactly one unit of measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Ambient light level.
    Luminosity,
    /// Ambient temperature.
    Temperature,
    /// Relative air humidity.
    Humidity,
    /// Barometric pressure.
    Pressure,
}

impl Metric {
    /// Every metric the process knows about, in canonical order.
    pub const ALL: &'static [Self] =
        &[Self::Luminosity, Self::Temperature, Self::Humidity, Self::Pressure];

    /// Returns a stable identifier for the metric.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Luminosity => "luminosity",
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Pressure => "pressure",
        }
    }

    /// Returns the unit of measurement for the metric.
    #[must_use]
    pub const fn unit(self) -> &'static str {
        match self {
            Self::Luminosity => "lux",
            Self::Temperature => "°C",
            Self::Humidity => "%",
            Self::Pressure => "hPa",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
