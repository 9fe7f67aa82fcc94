// crates/chainsense-config/src/lib.rs
// ============================================================================
// Module: Chainsense Config Library
// Description: Typed configuration with TOML loading and validation.
// Purpose: Provide the process-wide configuration reference carried by contexts.
// Dependencies: chainsense-core, serde, thiserror, toml
// ============================================================================

//! ## Overview
//! Configuration is deserialized from a TOML file into typed sections with
//! explicit defaults, then validated before use. Validation fails closed:
//! zero capacities and zero timeouts are rejected rather than silently
//! corrected.
//! Invariants:
//! - `Config::default()` always validates.
//! - Loading never applies a partially validated configuration.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use chainsense_core::ErrorCorrection;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Config Errors
// ============================================================================

/// Errors loading or validating configuration.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("config read failed: {0}")]
    Io(String),
    /// Configuration file is not valid TOML.
    #[error("config parse failed: {0}")]
    Parse(String),
    /// A configuration value fails validation.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

// ============================================================================
// SECTION: Sections
// ============================================================================

/// Device identity settings.
///
/// # Invariants
/// - `identity_path` names the durable identity marker slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSection {
    /// Path of the persisted identity marker file.
    pub identity_path: PathBuf,
}

impl Default for DeviceSection {
    fn default() -> Self {
        Self {
            identity_path: PathBuf::from("device.id"),
        }
    }
}

/// Harvest pipeline settings.
///
/// # Invariants
/// - `pipe_capacity` is the fixed per-metric queue depth; never resized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestSection {
    /// Bounded capacity of each per-metric reading queue.
    pub pipe_capacity: usize,
    /// Default aggregation deadline per request, in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for HarvestSection {
    fn default() -> Self {
        Self {
            pipe_capacity: 3,
            request_timeout_ms: 1_000,
        }
    }
}

impl HarvestSection {
    /// Returns the default aggregation deadline as a duration.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Registration flow settings.
///
/// # Invariants
/// - `confirmation_timeout_secs` bounds the insertion-event subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationSection {
    /// Seconds to wait for a ledger confirmation event before giving up.
    pub confirmation_timeout_secs: u64,
    /// Error-correction level for the rendered registration code.
    pub error_correction: ErrorCorrection,
}

impl Default for RegistrationSection {
    fn default() -> Self {
        Self {
            confirmation_timeout_secs: 300,
            error_correction: ErrorCorrection::Medium,
        }
    }
}

impl RegistrationSection {
    /// Returns the confirmation deadline as a duration.
    #[must_use]
    pub const fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }
}

/// Display settings.
///
/// # Invariants
/// - `image_size` is the square edge length the registration code is
///   rendered at, in pixels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySection {
    /// Rendered registration code edge length in pixels.
    pub image_size: u32,
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self {
            image_size: 176,
        }
    }
}

// ============================================================================
// SECTION: Config Root
// ============================================================================

/// Process-wide configuration for a Chainsense device.
///
/// # Invariants
/// - Every section has working defaults; an empty TOML document is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device identity settings.
    pub device: DeviceSection,
    /// Harvest pipeline settings.
    pub harvest: HarvestSection,
    /// Registration flow settings.
    pub registration: RegistrationSection,
    /// Display settings.
    pub display: DisplaySection,
}

impl Config {
    /// Loads and validates configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, parsed, or
    /// validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        let config: Self =
            toml::from_str(&raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section, failing closed on the first violation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.harvest.pipe_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "harvest.pipe_capacity",
                reason: "queue capacity must be at least 1".to_string(),
            });
        }
        if self.harvest.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "harvest.request_timeout_ms",
                reason: "aggregation deadline must be nonzero".to_string(),
            });
        }
        if self.registration.confirmation_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "registration.confirmation_timeout_secs",
                reason: "confirmation deadline must be nonzero".to_string(),
            });
        }
        if self.display.image_size == 0 {
            return Err(ConfigError::Invalid {
                field: "display.image_size",
                reason: "image size must be nonzero".to_string(),
            });
        }
        if self.device.identity_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "device.identity_path",
                reason: "identity marker path must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
