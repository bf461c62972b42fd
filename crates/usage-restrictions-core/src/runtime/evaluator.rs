// crates/usage-restrictions-core/src/runtime/evaluator.rs
// ============================================================================
// Module: Access Evaluator
// Description: Decides whether a principal may use a restricted entity.
// Purpose: Provide deterministic, fail-closed read-time access checks.
// Dependencies: serde, crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`evaluate_access`] answers one question: may this principal use this
//! entity in this context? The context is one of three shapes:
//! - A concrete application (optionally an environment): the entity's
//!   restrictions must cover the target.
//! - A not-yet-created application: the entity must name some application.
//! - The account itself: the entity must share environment scope with the
//!   principal's own permissions.
//!
//! Evaluation never fails. Every path ends in an [`AccessDecision`] with a
//! stable reason label; unknown or missing data denies.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Serialize;

use crate::core::AccountId;
use crate::core::AppEnvMap;
use crate::core::AppId;
use crate::core::EnvFilterType;
use crate::core::EnvId;
use crate::core::PrincipalRestrictions;
use crate::core::UsageRestrictions;
use crate::core::restrictions::has_no_restrictions;
use crate::interfaces::EnvironmentCatalog;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Inputs to a single access check.
#[derive(Debug, Clone, Copy)]
pub struct AccessRequest<'a> {
    /// Account owning the entity.
    pub account_id: &'a AccountId,
    /// True when the principal is an account administrator.
    pub is_account_admin: bool,
    /// Target application; `None` or the global sentinel means account level.
    pub app_id: Option<&'a AppId>,
    /// Target environment within the application.
    pub env_id: Option<&'a EnvId>,
    /// True when the target is an application being created.
    pub for_new_app: bool,
    /// Restrictions attached to the entity.
    pub entity_restrictions: Option<&'a UsageRestrictions>,
    /// Restrictions implied by the principal's permissions.
    pub principal_restrictions: Option<&'a UsageRestrictions>,
    /// Concrete environments the principal may act on, per application.
    pub principal_app_env_map: Option<&'a AppEnvMap>,
    /// True when the entity is scoped to the whole account.
    pub scoped_to_account: bool,
}

impl<'a> AccessRequest<'a> {
    /// Creates an account-level request with no restrictions attached.
    #[must_use]
    pub const fn new(account_id: &'a AccountId) -> Self {
        Self {
            account_id,
            is_account_admin: false,
            app_id: None,
            env_id: None,
            for_new_app: false,
            entity_restrictions: None,
            principal_restrictions: None,
            principal_app_env_map: None,
            scoped_to_account: false,
        }
    }

    /// Copies the principal's restrictions and map into the request.
    #[must_use]
    pub const fn with_principal(mut self, principal: &'a PrincipalRestrictions) -> Self {
        self.principal_restrictions = Some(&principal.restrictions);
        self.principal_app_env_map = Some(&principal.app_env_map);
        self
    }
}

/// Access decision with a stable reason label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccessDecision {
    /// Whether access is allowed.
    pub allowed: bool,
    /// Decision reason label.
    pub reason: &'static str,
}

impl AccessDecision {
    /// Builds an allow decision.
    #[must_use]
    pub const fn allow(reason: &'static str) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    /// Builds a deny decision.
    #[must_use]
    pub const fn deny(reason: &'static str) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }

    /// Builds a decision from a predicate.
    #[must_use]
    pub const fn from_bool(allowed: bool, allow: &'static str, deny: &'static str) -> Self {
        if allowed { Self::allow(allow) } else { Self::deny(deny) }
    }
}

// ============================================================================
// SECTION: Access Checks
// ============================================================================

/// Returns true when the request is allowed.
#[must_use]
pub fn has_access<C>(request: &AccessRequest<'_>, catalog: &C) -> bool
where
    C: EnvironmentCatalog + ?Sized,
{
    evaluate_access(request, catalog).allowed
}

/// Evaluates an access request.
#[must_use]
pub fn evaluate_access<C>(request: &AccessRequest<'_>, catalog: &C) -> AccessDecision
where
    C: EnvironmentCatalog + ?Sized,
{
    let unrestricted = has_no_restrictions(request.entity_restrictions);
    if let Some(app_id) = request.app_id.filter(|app_id| !app_id.is_global()) {
        return evaluate_app_access(request, app_id, catalog);
    }
    if request.for_new_app {
        if unrestricted {
            return AccessDecision::deny("new_app_no_restrictions");
        }
        if request.scoped_to_account {
            return AccessDecision::deny("new_app_scoped_to_account");
        }
        let names_app = request
            .entity_restrictions
            .is_some_and(|restrictions| {
                restrictions.iter().any(|pair| pair.app_filter.names_any_application())
            });
        return AccessDecision::from_bool(names_app, "new_app_allowed", "new_app_no_app_filter");
    }
    if request.scoped_to_account {
        if request.is_account_admin {
            return AccessDecision::allow("account_scoped_admin");
        }
        let all_env = request
            .principal_restrictions
            .is_some_and(UsageRestrictions::has_all_env_access);
        return AccessDecision::from_bool(
            all_env,
            "account_scoped_all_env_access",
            "account_scoped_denied",
        );
    }
    let Some(entity) = request.entity_restrictions.filter(|_| !unrestricted) else {
        return AccessDecision::from_bool(
            request.is_account_admin,
            "unrestricted_admin",
            "unrestricted_not_admin",
        );
    };
    evaluate_account_access(request, entity, catalog)
}

/// Evaluates a request targeting a concrete application.
fn evaluate_app_access<C>(request: &AccessRequest<'_>, app_id: &AppId, catalog: &C) -> AccessDecision
where
    C: EnvironmentCatalog + ?Sized,
{
    if request.scoped_to_account {
        return AccessDecision::deny("app_scoped_to_account");
    }
    let Some(entity) = request.entity_restrictions.filter(|r| !r.is_empty()) else {
        return AccessDecision::deny("app_no_restrictions");
    };
    let map = app_env_map(entity, catalog);
    match request.env_id {
        Some(env_id) => AccessDecision::from_bool(
            map.get(app_id).is_some_and(|envs| envs.contains(env_id)),
            "app_env_match",
            "app_env_mismatch",
        ),
        None => AccessDecision::from_bool(map.contains_key(app_id), "app_match", "app_mismatch"),
    }
}

/// Evaluates an account-level request against the principal's own scope.
fn evaluate_account_access<C>(
    request: &AccessRequest<'_>,
    entity: &UsageRestrictions,
    catalog: &C,
) -> AccessDecision
where
    C: EnvironmentCatalog + ?Sized,
{
    if entity.has_all_env_access() {
        return AccessDecision::allow("entity_all_env_access");
    }
    let principal = request.principal_restrictions.filter(|r| !r.is_empty());
    let principal_map = request.principal_app_env_map.filter(|map| !map.is_empty());
    let (Some(principal), Some(principal_map)) = (principal, principal_map) else {
        return AccessDecision::deny("principal_no_permissions");
    };
    let entity_map = app_env_map(entity, catalog);
    if entity_map.is_empty() {
        return AccessDecision::from_bool(
            has_any_common_env(None, entity, principal),
            "common_env_type",
            "no_common_env_type",
        );
    }
    let overlaps = entity_map.iter().any(|(app_id, entity_envs)| {
        let Some(principal_envs) = principal_map.get(app_id) else {
            return false;
        };
        if entity_envs.is_empty() {
            return has_any_common_env(Some(app_id), entity, principal);
        }
        !entity_envs.is_disjoint(principal_envs)
    });
    AccessDecision::from_bool(overlaps, "app_env_overlap", "no_app_env_overlap")
}

// ============================================================================
// SECTION: Expansion and Subsets
// ============================================================================

/// Expands restrictions into concrete environments per application.
///
/// Every resolved application becomes a key, even when no environment of it
/// is admitted.
#[must_use]
pub fn app_env_map<C>(restrictions: &UsageRestrictions, catalog: &C) -> AppEnvMap
where
    C: EnvironmentCatalog + ?Sized,
{
    let mut universe: Option<BTreeSet<AppId>> = None;
    let mut map = AppEnvMap::new();
    for restriction in restrictions {
        let app_ids = restriction
            .app_filter
            .resolve(universe.get_or_insert_with(|| catalog.app_ids()));
        for app_id in app_ids {
            let env_ids = restriction.env_filter.resolve(&catalog.environments(&app_id));
            map.entry(app_id).or_default().extend(env_ids);
        }
    }
    map
}

/// Returns true when `child` grants nothing beyond `parent`.
///
/// Absent or empty `child` is always a subset; absent `parent` contains nothing.
#[must_use]
pub fn is_usage_restrictions_subset<C>(
    child: Option<&UsageRestrictions>,
    parent: Option<&UsageRestrictions>,
    catalog: &C,
) -> bool
where
    C: EnvironmentCatalog + ?Sized,
{
    let Some(child) = child.filter(|r| !r.is_empty()) else {
        return true;
    };
    let Some(parent) = parent else {
        return false;
    };
    let child_map = app_env_map(child, catalog);
    let parent_map = app_env_map(parent, catalog);
    is_subset_of_map(child, &child_map, parent, &parent_map)
}

/// Returns true when the actor may change an entity carrying these restrictions.
///
/// Account-scoped entities need an administrator or all-environment access.
/// Otherwise the entity's restrictions must lie within the actor's update
/// scope, unless the actor is an administrator.
#[must_use]
pub fn user_has_permissions_to_change<C>(
    scoped_to_account: bool,
    is_account_admin: bool,
    entity: Option<&UsageRestrictions>,
    principal: Option<&PrincipalRestrictions>,
    catalog: &C,
) -> bool
where
    C: EnvironmentCatalog + ?Sized,
{
    if scoped_to_account {
        return is_account_admin
            || principal.is_some_and(|principal| principal.restrictions.has_all_env_access());
    }
    let Some(entity) = entity.filter(|r| !r.is_empty()) else {
        return true;
    };
    if is_account_admin {
        return true;
    }
    let Some(principal) = principal.filter(|p| !p.restrictions.is_empty()) else {
        return false;
    };
    let entity_map = app_env_map(entity, catalog);
    is_subset_of_map(entity, &entity_map, &principal.restrictions, &principal.app_env_map)
}

/// Compares expanded maps, falling back to type coverage for empty env sets.
fn is_subset_of_map(
    child: &UsageRestrictions,
    child_map: &AppEnvMap,
    parent: &UsageRestrictions,
    parent_map: &AppEnvMap,
) -> bool {
    if child_map.is_empty() {
        return has_all_common_env(None, child, parent);
    }
    child_map.iter().all(|(app_id, child_envs)| {
        let Some(parent_envs) = parent_map.get(app_id) else {
            return false;
        };
        if child_envs.is_empty() {
            return has_all_common_env(Some(app_id), child, parent);
        }
        !parent_envs.is_empty() && child_envs.is_subset(parent_envs)
    })
}

// ============================================================================
// SECTION: Type Coverage
// ============================================================================

/// Returns true when the restrictions grant the tag for the app (or all apps).
fn covers_type(
    restrictions: &UsageRestrictions,
    app_id: Option<&AppId>,
    filter_type: EnvFilterType,
) -> bool {
    app_id.map_or_else(
        || restrictions.has_account_wide_access_of_type(filter_type),
        |app_id| restrictions.has_all_env_access_of_type(app_id, filter_type),
    )
}

/// Returns true when both sides wholesale-grant a common environment type.
fn has_any_common_env(
    app_id: Option<&AppId>,
    entity: &UsageRestrictions,
    principal: &UsageRestrictions,
) -> bool {
    [EnvFilterType::Prod, EnvFilterType::NonProd].into_iter().any(|filter_type| {
        covers_type(entity, app_id, filter_type) && covers_type(principal, app_id, filter_type)
    })
}

/// Returns true when every type the child grants wholesale, the parent also grants.
///
/// A child granting no type wholesale is not covered.
fn has_all_common_env(
    app_id: Option<&AppId>,
    child: &UsageRestrictions,
    parent: &UsageRestrictions,
) -> bool {
    let granted: Vec<EnvFilterType> = [EnvFilterType::Prod, EnvFilterType::NonProd]
        .into_iter()
        .filter(|filter_type| covers_type(child, app_id, *filter_type))
        .collect();
    !granted.is_empty()
        && granted.into_iter().all(|filter_type| covers_type(parent, app_id, filter_type))
}
