// system-tests/src/lib.rs
// ============================================================================
// Module: Chainsense System Test Support
// Description: In-memory collaborator doubles for cross-crate scenarios.
// Purpose: Exercise provisioning and harvesting without hardware or a ledger.
// Dependencies: chainsense-core, async-trait, tokio
// ============================================================================

//! ## Overview
//! Support doubles shared by the system test suites: an in-memory ledger
//! with a working insertion-event stream, a silent display, a passthrough
//! encoder, and a fixed specs probe. The ledger preserves the real
//! collaborator semantics: `exists` answers from its record set and
//! `insert_device` fans an event out to every live subscriber.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use chainsense_core::CodeEncoder;
use chainsense_core::DeviceDisplay;
use chainsense_core::DeviceEvent;
use chainsense_core::DeviceId;
use chainsense_core::DeviceRegistry;
use chainsense_core::DeviceSpecs;
use chainsense_core::EncodeError;
use chainsense_core::EncodedImage;
use chainsense_core::ErrorCorrection;
use chainsense_core::ProbeError;
use chainsense_core::RegistryError;
use chainsense_core::SpecsProbe;
use tokio::sync::mpsc;

// ============================================================================
// SECTION: In-Memory Ledger
// ============================================================================

/// In-memory stand-in for the ledger-backed device registry.
///
/// # Invariants
/// - `exists` answers from the current record set.
/// - `insert_device` fans the event out to every live subscriber.
#[derive(Default)]
pub struct InMemoryLedger {
    /// Device records keyed by identity; value is the last pushed specs.
    records: Mutex<BTreeMap<DeviceId, Option<DeviceSpecs>>>,
    /// Live insertion-event subscribers.
    subscribers: Mutex<Vec<mpsc::Sender<DeviceEvent>>>,
}

impl InMemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a device record, as if registered in an earlier round.
    pub fn seed_device(&self, id: DeviceId) {
        self.lock_records().insert(id, None);
    }

    /// Inserts a device record and notifies every live subscriber.
    pub fn insert_device(&self, id: DeviceId, hostname: impl Into<String>) {
        let hostname = hostname.into();
        self.lock_records().insert(id.clone(), None);
        let event = DeviceEvent {
            id,
            hostname,
        };
        let mut subscribers = self.lock_subscribers();
        subscribers.retain(|subscriber| subscriber.try_send(event.clone()).is_ok());
    }

    /// Returns the specs last pushed for an identity, if any.
    #[must_use]
    pub fn pushed_specs(&self, id: &DeviceId) -> Option<DeviceSpecs> {
        self.lock_records().get(id).cloned().flatten()
    }

    /// Locks the record set.
    fn lock_records(&self) -> std::sync::MutexGuard<'_, BTreeMap<DeviceId, Option<DeviceSpecs>>> {
        self.records.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Locks the subscriber list.
    fn lock_subscribers(&self) -> std::sync::MutexGuard<'_, Vec<mpsc::Sender<DeviceEvent>>> {
        self.subscribers.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Shared registry handle delegating to an in-memory ledger.
///
/// Wraps the ledger in an [`Arc`] so a test can retain its own handle for
/// inspection while the provisioner drives the same records.
pub struct SharedLedger(pub Arc<InMemoryLedger>);

#[async_trait]
impl DeviceRegistry for SharedLedger {
    async fn exists(&self, id: &DeviceId) -> Result<bool, RegistryError> {
        Ok(self.0.lock_records().contains_key(id))
    }

    async fn update_specs(&self, id: &DeviceId, specs: &DeviceSpecs) -> Result<(), RegistryError> {
        let mut records = self.0.lock_records();
        match records.get_mut(id) {
            Some(slot) => {
                *slot = Some(specs.clone());
                Ok(())
            }
            None => Err(RegistryError::Backend(format!("no record for device {id}"))),
        }
    }

    async fn subscribe_inserted(&self) -> Result<mpsc::Receiver<DeviceEvent>, RegistryError> {
        let (tx, rx) = mpsc::channel(8);
        self.0.lock_subscribers().push(tx);
        Ok(rx)
    }
}

// ============================================================================
// SECTION: Display and Encoder Doubles
// ============================================================================

/// Display double that accepts every call silently.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentDisplay;

impl DeviceDisplay for SilentDisplay {
    fn power_on(&self) {}

    fn draw(&self, _image: &EncodedImage) {}
}

/// Encoder double emitting a one-module image for any payload.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughEncoder;

impl CodeEncoder for PassthroughEncoder {
    fn encode(&self, _payload: &str, _level: ErrorCorrection) -> Result<EncodedImage, EncodeError> {
        Ok(EncodedImage {
            width: 1,
            pixels: vec![1],
        })
    }
}

// ============================================================================
// SECTION: Specs Probe Double
// ============================================================================

/// Probe double returning a fixed descriptor.
#[derive(Debug, Clone)]
pub struct FixedProbe {
    /// Descriptor returned on every discovery.
    specs: DeviceSpecs,
}

impl FixedProbe {
    /// Creates a probe returning the given descriptor.
    #[must_use]
    pub fn new(specs: DeviceSpecs) -> Self {
        Self {
            specs,
        }
    }
}

impl SpecsProbe for FixedProbe {
    fn discover(&self) -> Result<DeviceSpecs, ProbeError> {
        Ok(self.specs.clone())
    }
}
