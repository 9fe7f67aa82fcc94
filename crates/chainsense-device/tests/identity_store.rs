// crates/chainsense-device/tests/identity_store.rs
// ============================================================================
// Module: Identity Store Tests
// Description: Tests for the create-if-absent identity marker semantics.
// Purpose: Validate the never-overwrite invariant on both store backends.
// ============================================================================
//! ## Overview
//! Validates that a persisted identity is never overwritten while the marker
//! exists, on both the file-backed and in-memory stores.

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

use chainsense_core::DeviceId;
use chainsense_core::IdentityError;
use chainsense_core::IdentityStore;
use chainsense_device::FileIdentityStore;
use chainsense_device::InMemoryIdentityStore;
use tempfile::TempDir;

// ============================================================================
// SECTION: File Store Tests
// ============================================================================

/// Tests an absent marker loads as none.
#[test]
fn test_file_store_absent() {
    let dir = TempDir::new().unwrap();
    let store = FileIdentityStore::new(dir.path().join("device.id"));
    assert_eq!(store.load().unwrap(), None);
}

/// Tests store-then-load roundtrips the identity.
#[test]
fn test_file_store_roundtrip() {
    let dir = TempDir::new().unwrap();
    let store = FileIdentityStore::new(dir.path().join("device.id"));

    store.store(&DeviceId::new("dev-42")).unwrap();
    assert_eq!(store.load().unwrap(), Some(DeviceId::new("dev-42")));
}

/// Tests a second store fails and preserves the first identity.
#[test]
fn test_file_store_never_overwrites() {
    let dir = TempDir::new().unwrap();
    let store = FileIdentityStore::new(dir.path().join("device.id"));

    store.store(&DeviceId::new("dev-42")).unwrap();
    let err = store.store(&DeviceId::new("dev-99")).unwrap_err();
    assert!(matches!(err, IdentityError::AlreadyProvisioned(existing) if existing.as_str() == "dev-42"));
    assert_eq!(store.load().unwrap(), Some(DeviceId::new("dev-42")));
}

/// Tests an empty marker file is treated as absent.
#[test]
fn test_file_store_empty_marker_is_absent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("device.id");
    std::fs::write(&path, "  \n").unwrap();

    let store = FileIdentityStore::new(path);
    assert_eq!(store.load().unwrap(), None);
}

// ============================================================================
// SECTION: In-Memory Store Tests
// ============================================================================

/// Tests the in-memory store honors the same create-if-absent semantics.
#[test]
fn test_memory_store_never_overwrites() {
    let store = InMemoryIdentityStore::new();
    assert_eq!(store.load().unwrap(), None);

    store.store(&DeviceId::new("dev-7")).unwrap();
    let err = store.store(&DeviceId::new("dev-8")).unwrap_err();
    assert!(matches!(err, IdentityError::AlreadyProvisioned(existing) if existing.as_str() == "dev-7"));
    assert_eq!(store.load().unwrap(), Some(DeviceId::new("dev-7")));
}

/// Tests the preset constructor reports the seeded identity.
#[test]
fn test_memory_store_preset() {
    let store = InMemoryIdentityStore::with_identity(DeviceId::new("dev-7"));
    assert_eq!(store.load().unwrap(), Some(DeviceId::new("dev-7")));
}
