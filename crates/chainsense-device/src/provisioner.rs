// crates/chainsense-device/src/provisioner.rs
// ============================================================================
// Module: Chainsense Device Provisioner
// Description: The registration state machine against the ledger registry.
// Purpose: Drive the register-or-update flow to a confirmed device identity.
// Dependencies: chainsense-core, chainsense-config, chainsense-readings, tokio
// ============================================================================

//! ## Overview
//! The provisioner runs once at startup. It discovers the device descriptor,
//! then either refreshes an already-registered device's specs or renders the
//! registration code and waits for the ledger's insertion event under a
//! bounded deadline. Failure severity follows the device error taxonomy:
//! specs discovery and post-confirmation identity persistence are fatal,
//! registry calls for an already-registered device are surfaced and
//! retryable, and a deadline elapse simply leaves the device awaiting
//! confirmation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use chainsense_config::RegistrationSection;
use chainsense_core::CodeEncoder;
use chainsense_core::DeviceDisplay;
use chainsense_core::DeviceId;
use chainsense_core::DeviceRegistry;
use chainsense_core::EncodeError;
use chainsense_core::IdentityError;
use chainsense_core::IdentityStore;
use chainsense_core::ProbeError;
use chainsense_core::RegistrationState;
use chainsense_core::RegistryError;
use chainsense_core::SpecsProbe;
use chainsense_readings::ReadingsContext;
use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;
use tracing::info;
use tracing::warn;

// ============================================================================
// SECTION: Provisioner Errors
// ============================================================================

/// Errors returned by the provisioner.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - `SpecsDiscovery` and `IdentityPersist` are fatal: the device cannot
///   continue correctly past either.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Builder is missing a required collaborator.
    #[error("provisioner is missing a collaborator: {0}")]
    MissingCollaborator(&'static str),
    /// Device specs discovery failed; fatal.
    #[error("device specs discovery failed: {0}")]
    SpecsDiscovery(#[source] ProbeError),
    /// Persisted identity marker could not be read.
    #[error("identity marker load failed: {0}")]
    IdentityLoad(#[source] IdentityError),
    /// Confirmed identity could not be persisted; fatal, since the ledger
    /// already believes the device is registered.
    #[error("failed to persist confirmed identity {id}: {source}")]
    IdentityPersist {
        /// Identity the ledger confirmed.
        id: DeviceId,
        /// Underlying store failure.
        source: IdentityError,
    },
    /// Registry call failed; surfaced and retryable by the caller.
    #[error("device registry call failed: {0}")]
    Registry(#[from] RegistryError),
    /// Registration payload could not be encoded.
    #[error("registration payload encoding failed: {0}")]
    Payload(String),
    /// Registration code could not be rendered.
    #[error("registration code rendering failed: {0}")]
    Encode(#[from] EncodeError),
    /// Insertion-event stream ended before a matching confirmation.
    #[error("insertion event subscription closed before confirmation")]
    SubscriptionClosed,
}

// ============================================================================
// SECTION: Provision Outcome
// ============================================================================

/// Terminal result of one provisioning round.
///
/// # Invariants
/// - `Cancelled` and `ConfirmationTimedOut` are distinct, observable
///   outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// The device holds a ledger-confirmed identity.
    Registered {
        /// The confirmed identity.
        id: DeviceId,
    },
    /// The confirmation deadline elapsed; the caller may retry a new round.
    ConfirmationTimedOut,
    /// The root context was cancelled mid-flight.
    Cancelled,
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builder wiring the provisioner's collaborators.
///
/// # Invariants
/// - `build` succeeds only when every collaborator is configured.
#[derive(Default)]
pub struct ProvisionerBuilder {
    /// Ledger registry collaborator.
    registry: Option<Arc<dyn DeviceRegistry>>,
    /// Durable identity marker slot.
    identity: Option<Arc<dyn IdentityStore>>,
    /// Physical display collaborator.
    display: Option<Arc<dyn DeviceDisplay>>,
    /// Registration code encoder collaborator.
    encoder: Option<Arc<dyn CodeEncoder>>,
    /// Capability discovery collaborator.
    probe: Option<Arc<dyn SpecsProbe>>,
    /// Registration flow settings.
    config: RegistrationSection,
}

impl ProvisionerBuilder {
    /// Wires the ledger registry.
    #[must_use]
    pub fn registry(mut self, registry: impl DeviceRegistry + 'static) -> Self {
        self.registry = Some(Arc::new(registry));
        self
    }

    /// Wires the identity store.
    #[must_use]
    pub fn identity(mut self, identity: impl IdentityStore + 'static) -> Self {
        self.identity = Some(Arc::new(identity));
        self
    }

    /// Wires the display.
    #[must_use]
    pub fn display(mut self, display: impl DeviceDisplay + 'static) -> Self {
        self.display = Some(Arc::new(display));
        self
    }

    /// Wires the code encoder.
    #[must_use]
    pub fn encoder(mut self, encoder: impl CodeEncoder + 'static) -> Self {
        self.encoder = Some(Arc::new(encoder));
        self
    }

    /// Wires the specs probe.
    #[must_use]
    pub fn probe(mut self, probe: impl SpecsProbe + 'static) -> Self {
        self.probe = Some(Arc::new(probe));
        self
    }

    /// Applies the registration flow settings.
    #[must_use]
    pub fn config(mut self, config: RegistrationSection) -> Self {
        self.config = config;
        self
    }

    /// Builds the provisioner.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::MissingCollaborator`] when a collaborator
    /// is not configured.
    pub fn build(self) -> Result<Provisioner, ProvisionError> {
        Ok(Provisioner {
            registry: self.registry.ok_or(ProvisionError::MissingCollaborator("registry"))?,
            identity: self.identity.ok_or(ProvisionError::MissingCollaborator("identity"))?,
            display: self.display.ok_or(ProvisionError::MissingCollaborator("display"))?,
            encoder: self.encoder.ok_or(ProvisionError::MissingCollaborator("encoder"))?,
            probe: self.probe.ok_or(ProvisionError::MissingCollaborator("probe"))?,
            config: self.config,
            state: RegistrationState::Unregistered,
        })
    }
}

// ============================================================================
// SECTION: Provisioner
// ============================================================================

/// Registration state machine for one device.
///
/// # Invariants
/// - At most one provisioner drives the display and registry at a time.
/// - State transitions are monotonic forward, except the external
///   removed-from-network reset.
pub struct Provisioner {
    /// Ledger registry collaborator.
    registry: Arc<dyn DeviceRegistry>,
    /// Durable identity marker slot.
    identity: Arc<dyn IdentityStore>,
    /// Physical display collaborator.
    display: Arc<dyn DeviceDisplay>,
    /// Registration code encoder collaborator.
    encoder: Arc<dyn CodeEncoder>,
    /// Capability discovery collaborator.
    probe: Arc<dyn SpecsProbe>,
    /// Registration flow settings.
    config: RegistrationSection,
    /// Current registration state.
    state: RegistrationState,
}

impl std::fmt::Debug for Provisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provisioner")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Provisioner {
    /// Returns a builder for the provisioner.
    #[must_use]
    pub fn builder() -> ProvisionerBuilder {
        ProvisionerBuilder::default()
    }

    /// Returns the current registration state.
    #[must_use]
    pub const fn state(&self) -> RegistrationState {
        self.state
    }

    /// Applies the external removed-from-network signal, resetting a
    /// registered device back to awaiting confirmation.
    pub fn mark_removed(&mut self) {
        if self.state == RegistrationState::Registered {
            warn!("device removed from network; a re-provisioning round is required");
            self.state = RegistrationState::AwaitingConfirmation;
        }
    }

    /// Runs one provisioning round to a terminal outcome.
    ///
    /// An already-registered device (marker present and confirmed by the
    /// ledger) only refreshes its specs; no code is displayed and no
    /// subscription is opened. Otherwise the registration code is rendered
    /// and the insertion-event stream is watched until a matching event, the
    /// confirmation deadline, or root cancellation.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError`]; see the error type for which variants are
    /// fatal and which are retryable.
    pub async fn provision(
        &mut self,
        ctx: &ReadingsContext,
    ) -> Result<ProvisionOutcome, ProvisionError> {
        let specs = self.probe.discover().map_err(ProvisionError::SpecsDiscovery)?;
        debug!(label = %ctx.label(), hostname = %specs.hostname, "device specs discovered");

        if let Some(id) = self.identity.load().map_err(ProvisionError::IdentityLoad)? {
            if self.registry.exists(&id).await? {
                self.state = RegistrationState::Registered;
                self.registry.update_specs(&id, &specs).await?;
                info!(label = %ctx.label(), id = %id, "device specs updated on ledger");
                return Ok(ProvisionOutcome::Registered {
                    id,
                });
            }
            warn!(
                label = %ctx.label(),
                id = %id,
                "device was removed from network; re-initializing registration"
            );
        }

        self.state = RegistrationState::AwaitingConfirmation;
        let payload = specs
            .registration_payload()
            .map_err(|err| ProvisionError::Payload(err.to_string()))?;
        let image = self.encoder.encode(&payload, self.config.error_correction)?;
        self.display.power_on();
        self.display.draw(&image);
        debug!(label = %ctx.label(), "registration code displayed; subscribing to insertion events");

        let mut events = self.registry.subscribe_inserted().await?;
        let deadline = Instant::now() + self.config.confirmation_timeout();
        loop {
            tokio::select! {
                () = ctx.cancelled() => {
                    debug!(label = %ctx.label(), "provisioning cancelled");
                    return Ok(ProvisionOutcome::Cancelled);
                }
                () = tokio::time::sleep_until(deadline) => {
                    debug!(
                        label = %ctx.label(),
                        "confirmation deadline elapsed; still awaiting confirmation"
                    );
                    return Ok(ProvisionOutcome::ConfirmationTimedOut);
                }
                event = events.recv() => match event {
                    Some(event) if event.hostname == specs.hostname => {
                        self.identity.store(&event.id).map_err(|source| {
                            ProvisionError::IdentityPersist {
                                id: event.id.clone(),
                                source,
                            }
                        })?;
                        info!(label = %ctx.label(), id = %event.id, "device registered");
                        self.state = RegistrationState::Registered;
                        // Dropping the receiver ends the subscription.
                        drop(events);
                        self.registry.update_specs(&event.id, &specs).await?;
                        return Ok(ProvisionOutcome::Registered {
                            id: event.id,
                        });
                    }
                    Some(event) => {
                        debug!(
                            label = %ctx.label(),
                            hostname = %event.hostname,
                            "insertion event for another device ignored"
                        );
                    }
                    None => return Err(ProvisionError::SubscriptionClosed),
                },
            }
        }
    }
}
