// crates/chainsense-readings/src/lib.rs
// ============================================================================
// Module: Chainsense Readings Library
// Description: Execution contexts, metric pipes, and the harvest/aggregation engines.
// Purpose: Move readings from concurrent sensors into per-metric result sets.
// Dependencies: chainsense-core, chainsense-config, tokio, tracing
// ============================================================================

//! ## Overview
//! The readings pipeline fans sensor harvests out across independent tasks
//! and fans their readings back in through bounded per-metric pipes, under a
//! cancellation-aware execution context hierarchy rooted in
//! [`ReadingsContext`].
//! Invariants:
//! - Cancelling or expiring the root context propagates to every descendant;
//!   a child never outlives a cancelled ancestor's signal.
//! - Aggregation results are keyed by exactly the requested metric set, each
//!   entry carrying an explicit per-metric status.
//! - A slow or stuck sensor never delays sibling sensors.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod context;
pub mod harvester;
pub mod pipe;
pub mod receiver;
pub mod sensor;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use context::CancelHandle;
pub use context::ReadingsContext;
pub use context::RequestContext;
pub use context::SensorContext;
pub use harvester::Harvester;
pub use pipe::MetricPipe;
pub use pipe::MetricWriter;
pub use pipe::PipeDrain;
pub use receiver::MetricOutcome;
pub use receiver::ReadingsReport;
pub use receiver::aggregate;
pub use sensor::Sensor;
pub use sensor::SensorError;

#[cfg(test)]
mod tests;
