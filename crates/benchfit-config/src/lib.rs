// crates/benchfit-config/src/lib.rs
// ============================================================================
// Module: Benchfit Config Library
// Description: Canonical config model, validation, and example generation.
// Purpose: Single source of truth for benchfit.toml semantics.
// Dependencies: benchfit-core, serde, toml
// ============================================================================

//! ## Overview
//! `benchfit-config` defines the configuration model for Benchfit runs. It
//! provides strict, fail-closed validation and turns each section into the
//! explicit request structures of `benchfit-core`: filters, derivations,
//! baseline selection, summary reducers, fit specs and panel layouts.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
