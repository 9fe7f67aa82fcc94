// crates/chainsense-device/src/identity.rs
// ============================================================================
// Module: Chainsense Identity Stores
// Description: Durable and in-memory identity marker slots.
// Purpose: Persist the ledger-assigned identity exactly once.
// Dependencies: chainsense-core, std::fs
// ============================================================================

//! ## Overview
//! The identity marker records the ledger-assigned device identifier. Both
//! implementations enforce create-if-absent: storing over an existing marker
//! fails with the already-persisted identity, preventing the
//! double-registration race. The file store is the deployment default; the
//! in-memory store backs tests and ephemeral rigs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use chainsense_core::DeviceId;
use chainsense_core::IdentityError;
use chainsense_core::IdentityStore;

// ============================================================================
// SECTION: File Store
// ============================================================================

/// Identity marker persisted as a single file.
///
/// # Invariants
/// - `store` uses create-new semantics; an existing marker is never
///   overwritten.
/// - An empty marker file is treated as absent.
#[derive(Debug)]
pub struct FileIdentityStore {
    /// Path of the marker file.
    path: PathBuf,
}

impl FileIdentityStore {
    /// Creates a store backed by the given marker path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
        }
    }
}

impl IdentityStore for FileIdentityStore {
    fn load(&self) -> Result<Option<DeviceId>, IdentityError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                let id = raw.trim();
                if id.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(DeviceId::new(id)))
                }
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(IdentityError::Io(err.to_string())),
        }
    }

    fn store(&self, id: &DeviceId) -> Result<(), IdentityError> {
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                let existing = self.load()?.unwrap_or_else(|| id.clone());
                return Err(IdentityError::AlreadyProvisioned(existing));
            }
            Err(err) => return Err(IdentityError::Io(err.to_string())),
        };
        file.write_all(id.as_str().as_bytes()).map_err(|err| IdentityError::Io(err.to_string()))
    }
}

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// Identity marker held in process memory.
///
/// # Invariants
/// - Same create-if-absent semantics as the file store.
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    /// The stored identity, if any.
    slot: Mutex<Option<DeviceId>>,
}

impl InMemoryIdentityStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store already holding an identity.
    #[must_use]
    pub fn with_identity(id: DeviceId) -> Self {
        Self {
            slot: Mutex::new(Some(id)),
        }
    }
}

impl IdentityStore for InMemoryIdentityStore {
    fn load(&self) -> Result<Option<DeviceId>, IdentityError> {
        let slot =
            self.slot.lock().map_err(|_| IdentityError::Io("identity slot poisoned".to_string()))?;
        Ok(slot.clone())
    }

    fn store(&self, id: &DeviceId) -> Result<(), IdentityError> {
        let mut slot =
            self.slot.lock().map_err(|_| IdentityError::Io("identity slot poisoned".to_string()))?;
        if let Some(existing) = slot.as_ref() {
            return Err(IdentityError::AlreadyProvisioned(existing.clone()));
        }
        *slot = Some(id.clone());
        Ok(())
    }
}
