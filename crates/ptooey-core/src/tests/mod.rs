//! Test module for scenario, determinism and property tests.
//!
//! This module exercises the whole authority loop through its public surface:
//! - **Scenario tests**: Round lifecycle and interaction flows end to end
//! - **Determinism tests**: Same seed and inputs produce identical snapshots
//! - **Property tests**: Possession invariants under random input
//! - **Helper functions**: Utilities for test setup
//!
//! # Test Structure
//!
//! - `scenarios.rs`: End-to-end round and interaction tests
//! - `determinism.rs`: Tests that verify deterministic execution
//! - `properties.rs`: `proptest` invariants
//! - `helpers.rs`: Test setup utilities and factory functions

mod determinism;
mod helpers;

// Re-export for convenience
pub use helpers::*;
