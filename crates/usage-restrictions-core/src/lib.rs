// crates/usage-restrictions-core/src/lib.rs
// ============================================================================
// Module: Usage Restrictions Core Library
// Description: Public API surface for the usage restriction engine.
// Purpose: Expose restriction types, capability interfaces, and evaluators.
// Dependencies: crate::{audit, core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Usage restrictions describe which applications and environments may use a
//! shared account-level entity (a cloud provider, a secret, a connector).
//! A restriction set is an OR over app/environment pairs; each pair is an AND
//! of an application filter and an environment filter.
//!
//! The core answers four questions without touching storage:
//! - May a principal use an entity here? ([`runtime::evaluator`])
//! - May a principal save these restrictions? ([`runtime::validator`])
//! - What is the common part of two restriction sets? ([`runtime::intersect`])
//! - Which restrictions does a principal's permission set imply?
//!   ([`runtime::aggregator`])
//!
//! Environment metadata and application inventories are injected through the
//! traits in [`interfaces`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use audit::AccessAuditEvent;
pub use audit::FileAuditSink;
pub use audit::MaintenanceAuditEvent;
pub use audit::MaintenanceOperation;
pub use audit::NoopAuditSink;
pub use audit::RestrictionAuditSink;
pub use audit::StderrAuditSink;
pub use audit::ValidationAuditEvent;
pub use audit::ValidationOperation;
pub use interfaces::AccountTopology;
pub use interfaces::AppInventory;
pub use interfaces::AppRecord;
pub use interfaces::EnvironmentCatalog;
pub use interfaces::EnvironmentRecord;
pub use interfaces::EnvironmentTypeResolver;
pub use runtime::AccessDecision;
pub use runtime::AccessRequest;
pub use runtime::RestrictedEntity;
pub use runtime::RestrictedEntityKind;
pub use runtime::RestrictionsSummary;
pub use runtime::SaveRequest;
pub use runtime::UpdateRequest;
pub use runtime::UsageRestrictionService;
