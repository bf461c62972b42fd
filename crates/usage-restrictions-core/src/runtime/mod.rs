// crates/usage-restrictions-core/src/runtime/mod.rs
// ============================================================================
// Module: Usage Restrictions Runtime
// Description: Evaluators, validators, and maintenance over restriction sets.
// Purpose: Group the pure restriction operations and the account-bound façade.
// Dependencies: crate::{audit, core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the restriction operations:
//! [`aggregator`] derives restrictions from permissions, [`evaluator`]
//! decides access, [`intersect`] narrows sets, [`validator`] guards writes,
//! [`maintenance`] rewrites stale references, and [`summary`] lists scopes.
//! [`service`] binds them to one account.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod aggregator;
pub mod evaluator;
pub mod intersect;
pub mod maintenance;
pub mod service;
pub mod summary;
pub mod validator;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use aggregator::app_env_map_from_permissions;
pub use aggregator::app_service_map_from_permissions;
pub use aggregator::default_usage_restrictions;
pub use aggregator::env_filters_for_app;
pub use aggregator::principal_context;
pub use aggregator::principal_restrictions;
pub use aggregator::restrictions_from_user_groups;
pub use evaluator::AccessDecision;
pub use evaluator::AccessRequest;
pub use evaluator::app_env_map;
pub use evaluator::evaluate_access;
pub use evaluator::has_access;
pub use evaluator::is_usage_restrictions_subset;
pub use evaluator::user_has_permissions_to_change;
pub use intersect::common_restrictions;
pub use intersect::maximum_allowed_restrictions;
pub use maintenance::CleanupOutcome;
pub use maintenance::IdNameReference;
pub use maintenance::ReferenceSummary;
pub use maintenance::RestrictedEntity;
pub use maintenance::RestrictedEntityKind;
pub use maintenance::purge_dangling_references;
pub use maintenance::reference_summary_for_app;
pub use maintenance::reference_summary_for_env;
pub use maintenance::remove_app_env_references;
pub use service::UsageRestrictionService;
pub use summary::AppRestrictionsSummary;
pub use summary::EntityReference;
pub use summary::RestrictionsSummary;
pub use summary::restrictions_summary;
pub use validator::SaveRequest;
pub use validator::UpdateRequest;
pub use validator::check_scoped_to_account;
pub use validator::validate_on_save;
pub use validator::validate_on_update;
pub use validator::validate_setup_usages;
