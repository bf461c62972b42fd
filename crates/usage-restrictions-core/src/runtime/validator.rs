// crates/usage-restrictions-core/src/runtime/validator.rs
// ============================================================================
// Module: Restriction Validator
// Description: Save and update guards for entity restrictions.
// Purpose: Reject malformed restrictions and grants beyond the actor's scope.
// Dependencies: crate::{core, interfaces, runtime::evaluator}
// ============================================================================

//! ## Overview
//! Saving an entity runs these checks in order, stopping at the first failure:
//! 1. Account-scoped entities must not carry restrictions.
//! 2. Restrictions must be structurally valid (strict document conversion).
//! 3. Without an actor (system caller) the structurally valid set is accepted.
//! 4. An unscoped entity without restrictions is accepted.
//! 5. Account scoping needs an administrator or all-environment access.
//! 6. The new restrictions must lie within the actor's update scope, unless
//!    the actor is an administrator.
//!
//! Updating additionally requires the actor to be allowed to change the
//! entity as it currently stands, before the new restrictions are checked.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::AccountId;
use crate::core::AppEnvMap;
use crate::core::PrincipalContext;
use crate::core::RestrictionError;
use crate::core::RestrictionLimits;
use crate::core::UsageRestrictions;
use crate::core::UsageRestrictionsDocument;
use crate::interfaces::EnvironmentCatalog;
use crate::runtime::evaluator::app_env_map;
use crate::runtime::evaluator::user_has_permissions_to_change;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Inputs to validate restrictions on entity creation.
#[derive(Debug, Clone, Copy)]
pub struct SaveRequest<'a> {
    /// Account owning the entity.
    pub account_id: &'a AccountId,
    /// True when the entity is scoped to the whole account.
    pub scoped_to_account: bool,
    /// Submitted restrictions.
    pub restrictions: Option<&'a UsageRestrictionsDocument>,
    /// Acting principal; `None` for system callers.
    pub actor: Option<&'a PrincipalContext>,
}

/// Inputs to validate restrictions on entity update.
#[derive(Debug, Clone, Copy)]
pub struct UpdateRequest<'a> {
    /// Account owning the entity.
    pub account_id: &'a AccountId,
    /// True when the entity is scoped to the whole account.
    pub scoped_to_account: bool,
    /// Restrictions currently stored on the entity.
    pub old_restrictions: Option<&'a UsageRestrictions>,
    /// Submitted restrictions.
    pub new_restrictions: Option<&'a UsageRestrictionsDocument>,
    /// Acting principal; `None` for system callers.
    pub actor: Option<&'a PrincipalContext>,
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validates restrictions submitted with a new entity.
///
/// Returns the typed restrictions, or `None` when none were submitted.
///
/// # Errors
///
/// Returns [`RestrictionError`] for the first failed check.
pub fn validate_on_save<C>(
    request: &SaveRequest<'_>,
    limits: &RestrictionLimits,
    catalog: &C,
) -> Result<Option<UsageRestrictions>, RestrictionError>
where
    C: EnvironmentCatalog + ?Sized,
{
    check_scoped_to_account(request.account_id, request.scoped_to_account, request.restrictions)?;
    let restrictions = parse_restrictions(request.restrictions, limits)?;
    let Some(actor) = request.actor else {
        return Ok(restrictions);
    };
    authorize_grant(actor, request.scoped_to_account, restrictions.as_ref(), catalog)?;
    Ok(restrictions)
}

/// Validates restrictions submitted with an entity update.
///
/// # Errors
///
/// Returns [`RestrictionError`] for the first failed check.
pub fn validate_on_update<C>(
    request: &UpdateRequest<'_>,
    limits: &RestrictionLimits,
    catalog: &C,
) -> Result<Option<UsageRestrictions>, RestrictionError>
where
    C: EnvironmentCatalog + ?Sized,
{
    check_scoped_to_account(
        request.account_id,
        request.scoped_to_account,
        request.new_restrictions,
    )?;
    let restrictions = parse_restrictions(request.new_restrictions, limits)?;
    let Some(actor) = request.actor else {
        return Ok(restrictions);
    };
    let can_change_current = user_has_permissions_to_change(
        request.scoped_to_account,
        actor.is_account_admin,
        request.old_restrictions,
        Some(&actor.update),
        catalog,
    );
    if !can_change_current {
        return Err(RestrictionError::UserNotAuthorizedDueToUsageRestrictions);
    }
    authorize_grant(actor, request.scoped_to_account, restrictions.as_ref(), catalog)?;
    Ok(restrictions)
}

/// Rejects restrictions on account-scoped entities.
///
/// # Errors
///
/// Returns [`RestrictionError::NonNullRestrictionsWhenScopedToAccount`] when
/// the entity is scoped and the document lists any pair.
pub fn check_scoped_to_account(
    account_id: &AccountId,
    scoped_to_account: bool,
    restrictions: Option<&UsageRestrictionsDocument>,
) -> Result<(), RestrictionError> {
    if scoped_to_account && restrictions.is_some_and(UsageRestrictionsDocument::has_restrictions) {
        return Err(RestrictionError::NonNullRestrictionsWhenScopedToAccount {
            account_id: account_id.clone(),
        });
    }
    Ok(())
}

/// Rejects a scope change while applications or environments still use the entity.
///
/// `setup_usages` lists, per application, the environments referencing the
/// entity (an empty set means application-level references only).
///
/// # Errors
///
/// Returns [`RestrictionError::ApplicationStillReferenced`] or
/// [`RestrictionError::EnvironmentStillReferenced`] for the first reference
/// left outside the new restrictions.
pub fn validate_setup_usages<C>(
    setup_usages: &AppEnvMap,
    new_restrictions: Option<&UsageRestrictions>,
    catalog: &C,
) -> Result<(), RestrictionError>
where
    C: EnvironmentCatalog + ?Sized,
{
    if setup_usages.is_empty() {
        return Ok(());
    }
    let allowed = new_restrictions.map(|r| app_env_map(r, catalog)).unwrap_or_default();
    for (app_id, env_ids) in setup_usages {
        let Some(allowed_envs) = allowed.get(app_id) else {
            return Err(RestrictionError::ApplicationStillReferenced {
                app_id: app_id.clone(),
            });
        };
        if let Some(env_id) = env_ids.iter().find(|env_id| !allowed_envs.contains(*env_id)) {
            return Err(RestrictionError::EnvironmentStillReferenced {
                app_id: app_id.clone(),
                env_id: env_id.clone(),
            });
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Strictly converts an optional document; empty documents become `None`.
fn parse_restrictions(
    document: Option<&UsageRestrictionsDocument>,
    limits: &RestrictionLimits,
) -> Result<Option<UsageRestrictions>, RestrictionError> {
    let Some(document) = document.filter(|doc| doc.has_restrictions()) else {
        return Ok(None);
    };
    document.to_restrictions(limits).map(Some)
}

/// Checks the actor may attach these restrictions with this scoping.
fn authorize_grant<C>(
    actor: &PrincipalContext,
    scoped_to_account: bool,
    restrictions: Option<&UsageRestrictions>,
    catalog: &C,
) -> Result<(), RestrictionError>
where
    C: EnvironmentCatalog + ?Sized,
{
    if !scoped_to_account && restrictions.is_none() {
        return Ok(());
    }
    if scoped_to_account && !actor.can_scope_to_account() {
        return Err(RestrictionError::NotAccountManagerNorHasAllAppAccess);
    }
    let allowed = user_has_permissions_to_change(
        scoped_to_account,
        actor.is_account_admin,
        restrictions,
        Some(&actor.update),
        catalog,
    );
    if !allowed {
        return Err(RestrictionError::UserNotAuthorizedDueToUsageRestrictions);
    }
    Ok(())
}
