// crates/usage-restrictions-config/src/lib.rs
// ============================================================================
// Module: Usage Restrictions Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for usage-restrictions.toml semantics.
// Dependencies: usage-restrictions-core, serde, toml
// ============================================================================

//! ## Overview
//! `usage-restrictions-config` defines the configuration model for the usage
//! restriction engine: where audit events go and which structural limits
//! strict document validation enforces. Validation is fail-closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
