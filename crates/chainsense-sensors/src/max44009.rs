// crates/chainsense-sensors/src/max44009.rs
// ============================================================================
// Module: MAX44009 Luminosity Driver
// Description: Ambient light sensor driver over an owned I2C bus handle.
// Purpose: Harvest luminosity readings in lux.
// Dependencies: chainsense-core, chainsense-readings, crate::bus
// ============================================================================

//! ## Overview
//! The MAX44009 reports ambient light as a two-byte exponent/mantissa
//! register pair. The driver owns its bus handle, starts the conversion
//! engine during `init`, and harvests exactly one luminosity reading per
//! request: a lux value, or an error-tagged reading when the bus fails.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chainsense_core::Metric;
use chainsense_readings::Sensor;
use chainsense_readings::SensorContext;
use chainsense_readings::SensorError;
use tracing::debug;

use crate::bus::SensorBus;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Register command starting the continuous conversion engine.
const MAX44009_APP_START: u8 = 0x03;

/// Lux weight of one mantissa count at exponent zero.
const LUX_PER_COUNT: f64 = 0.045;

// ============================================================================
// SECTION: Driver Configuration
// ============================================================================

/// Construction-time configuration for the MAX44009 driver.
///
/// # Invariants
/// - `address` and `bus_line` identify the wiring for diagnostics only; the
///   bus handle itself is opened by the host and handed in already bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Max44009Config {
    /// I2C address the sensor is wired at.
    pub address: u16,
    /// I2C bus line the sensor is wired on.
    pub bus_line: u8,
}

impl Default for Max44009Config {
    fn default() -> Self {
        Self {
            address: 0x4a,
            bus_line: 1,
        }
    }
}

// ============================================================================
// SECTION: Driver
// ============================================================================

/// MAX44009 ambient light sensor driver.
///
/// # Invariants
/// - The bus handle is owned exclusively by this driver instance.
/// - `harvest` writes exactly one luminosity reading per request.
pub struct Max44009 {
    /// Wiring configuration, used for identity and diagnostics.
    config: Max44009Config,
    /// Owned bus handle; locked only for the duration of one transfer.
    bus: Mutex<Box<dyn SensorBus>>,
}

impl Max44009 {
    /// Creates a driver over an owned bus handle.
    #[must_use]
    pub fn new(bus: Box<dyn SensorBus>, config: Max44009Config) -> Self {
        Self {
            config,
            bus: Mutex::new(bus),
        }
    }

    /// Reads the light registers and converts them to lux.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError`] when the bus transfer fails or is short.
    pub fn read(&self) -> Result<f64, SensorError> {
        let mut bus = self
            .bus
            .lock()
            .map_err(|_| SensorError::Bus("bus lock poisoned".to_string()))?;
        let raw = bus.read_bytes(2).map_err(|err| SensorError::Bus(err.to_string()))?;
        if raw.len() < 2 {
            return Err(SensorError::Bus(format!("short register read: {} bytes", raw.len())));
        }
        Ok(luminance([raw[0], raw[1]]))
    }

    /// Checks that the attached device answers like a MAX44009.
    fn verify(&self) -> bool {
        // TODO: read and match the device id register once wired hardware
        // exposing it is available on a test bench.
        true
    }
}

#[async_trait]
impl Sensor for Max44009 {
    fn id(&self) -> &str {
        "MAX44009"
    }

    async fn init(&mut self) -> Result<(), SensorError> {
        if !self.verify() {
            return Err(SensorError::Incompatible(format!(
                "device at 0x{:02x} on bus {} is not a MAX44009",
                self.config.address, self.config.bus_line
            )));
        }
        let mut bus = self
            .bus
            .lock()
            .map_err(|_| SensorError::Bus("bus lock poisoned".to_string()))?;
        bus.write_bytes(&[MAX44009_APP_START])
            .map_err(|err| SensorError::Bus(err.to_string()))?;
        debug!(
            address = self.config.address,
            bus = self.config.bus_line,
            "MAX44009 conversion engine started"
        );
        Ok(())
    }

    async fn harvest(&self, ctx: SensorContext) {
        ctx.lane(Metric::Luminosity).write_result(self.read());
    }

    fn metrics(&self) -> BTreeSet<Metric> {
        BTreeSet::from([Metric::Luminosity])
    }
}

// ============================================================================
// SECTION: Conversion
// ============================================================================

/// Converts the two-byte exponent/mantissa register pair to lux.
fn luminance(data: [u8; 2]) -> f64 {
    let exponent = i32::from((data[0] & 0xF0) >> 4);
    let mantissa = i32::from(((data[0] & 0x0F) << 4) | (data[1] & 0x0F));
    f64::from(mantissa) * 2_f64.powi(exponent) * LUX_PER_COUNT
}
