// crates/usage-restrictions-core/src/core/error.rs
// ============================================================================
// Module: Usage Restriction Errors
// Description: Error taxonomy for restriction validation and updates.
// Purpose: Give callers stable, matchable failure kinds.
// Dependencies: thiserror, crate::core::identifiers
// ============================================================================

//! ## Overview
//! Validation and update guards fail with [`RestrictionError`]. Read-time
//! evaluation never fails; it answers `false` instead.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::identifiers::AccountId;
use crate::core::identifiers::AppId;
use crate::core::identifiers::EnvId;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Restriction validation and update failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RestrictionError {
    /// Restrictions are structurally malformed.
    #[error("invalid usage restriction: {0}")]
    InvalidUsageRestriction(String),
    /// The actor cannot grant or change these restrictions.
    #[error("user not authorized due to usage restrictions")]
    UserNotAuthorizedDueToUsageRestrictions,
    /// Account scoping requires an account manager or all-environment access.
    #[error("user is neither account manager nor has access to all applications")]
    NotAccountManagerNorHasAllAppAccess,
    /// Account-scoped entities cannot carry restrictions.
    #[error(
        "non null restrictions are not allowed when scoping entity to account for account \
         {account_id}"
    )]
    NonNullRestrictionsWhenScopedToAccount {
        /// Owning account.
        account_id: AccountId,
    },
    /// An application still uses the entity outside the new scope.
    #[error("can't update usage scope, application {app_id} is still referencing this entity")]
    ApplicationStillReferenced {
        /// Referencing application.
        app_id: AppId,
    },
    /// An environment still uses the entity outside the new scope.
    #[error(
        "can't update usage scope, environment {env_id} of application {app_id} is still \
         referencing this entity"
    )]
    EnvironmentStillReferenced {
        /// Application owning the environment.
        app_id: AppId,
        /// Referencing environment.
        env_id: EnvId,
    },
}

impl RestrictionError {
    /// Returns a stable snake_case label for audit and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidUsageRestriction(_) => "invalid_usage_restriction",
            Self::UserNotAuthorizedDueToUsageRestrictions => {
                "user_not_authorized_due_to_usage_restrictions"
            }
            Self::NotAccountManagerNorHasAllAppAccess => {
                "not_account_mgr_nor_has_all_app_access"
            }
            Self::NonNullRestrictionsWhenScopedToAccount {
                ..
            } => "non_null_restrictions_when_scoped_to_account",
            Self::ApplicationStillReferenced {
                ..
            } => "application_still_referenced",
            Self::EnvironmentStillReferenced {
                ..
            } => "environment_still_referenced",
        }
    }
}
