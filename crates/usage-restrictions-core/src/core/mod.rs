// crates/usage-restrictions-core/src/core/mod.rs
// ============================================================================
// Module: Usage Restrictions Core Types
// Description: Canonical restriction, filter, and permission structures.
// Purpose: Provide stable, serializable types shared by every evaluator.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Core types define restriction sets, their filters, the persisted document
//! form, and the principal permission model they are derived from. These
//! types are the canonical source of truth for any outer surface (REST, CLI).

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod document;
pub mod error;
pub mod filters;
pub mod identifiers;
pub mod permissions;
pub mod restrictions;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use document::AppEnvRestrictionDocument;
pub use document::AppFilterDocument;
pub use document::DEFAULT_MAX_APP_ENV_RESTRICTIONS;
pub use document::DEFAULT_MAX_FILTER_IDS;
pub use document::EnvFilterDocument;
pub use document::RestrictionLimits;
pub use document::UsageRestrictionsDocument;
pub use error::RestrictionError;
pub use filters::AppFilter;
pub use filters::EnvFilter;
pub use filters::EnvFilterType;
pub use filters::EnvironmentType;
pub use identifiers::AccountId;
pub use identifiers::AppId;
pub use identifiers::EnvId;
pub use identifiers::GLOBAL_APP_ID;
pub use identifiers::ServiceId;
pub use permissions::Action;
pub use permissions::AppPermission;
pub use permissions::AppPermissionSummary;
pub use permissions::EntityFilter;
pub use permissions::EnvInfo;
pub use permissions::PermissionSnapshot;
pub use permissions::PermissionType;
pub use permissions::PrincipalContext;
pub use permissions::PrincipalRestrictions;
pub use permissions::UserGroup;
pub use permissions::WorkflowFilter;
pub use permissions::WorkflowFilterType;
pub use restrictions::AppEnvMap;
pub use restrictions::AppEnvRestriction;
pub use restrictions::UsageRestrictions;
pub use restrictions::has_no_restrictions;
