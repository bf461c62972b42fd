// crates/usage-restrictions-core/src/runtime/aggregator.rs
// ============================================================================
// Module: Permission Aggregator
// Description: Derives restriction sets from principal permissions.
// Purpose: Express what a principal may touch in restriction-set form.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Every application permission granting the requested action contributes
//! restriction pairs of its own. Fragments are kept as granted: a principal
//! with separate PROD and NON_PROD grants holds two pairs, not one merged pair.
//!
//! - `EXCLUDE_SELECTED` application filters are resolved against the
//!   inventory into `SELECTED` filters.
//! - `ALL_APP_ENTITIES` permissions contribute one PROD pair and one
//!   NON_PROD pair.
//! - Environment and workflow entity filters contribute one pair; workflow
//!   filters lose their templates tag.
//! - Permissions without an application filter or an environment projection
//!   contribute nothing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::core::AccountId;
use crate::core::Action;
use crate::core::AppEnvMap;
use crate::core::AppEnvRestriction;
use crate::core::AppFilter;
use crate::core::AppId;
use crate::core::AppPermission;
use crate::core::EntityFilter;
use crate::core::EnvFilter;
use crate::core::EnvFilterType;
use crate::core::EnvId;
use crate::core::PermissionSnapshot;
use crate::core::PermissionType;
use crate::core::PrincipalContext;
use crate::core::PrincipalRestrictions;
use crate::core::ServiceId;
use crate::core::UsageRestrictions;
use crate::core::UserGroup;
use crate::interfaces::AppInventory;

// ============================================================================
// SECTION: Restrictions From Permissions
// ============================================================================

/// Builds the restriction set implied by the groups' permissions for `action`.
///
/// Returns an empty set when no permission grants the action.
#[must_use]
pub fn restrictions_from_user_groups<I>(
    action: Action,
    groups: &[UserGroup],
    inventory: &I,
) -> UsageRestrictions
where
    I: AppInventory + ?Sized,
{
    let mut universe: Option<BTreeSet<AppId>> = None;
    let mut restrictions = UsageRestrictions::new();
    for permission in groups.iter().flat_map(|group| group.app_permissions.iter()) {
        if !permission.grants(action) {
            continue;
        }
        let Some(app_filter) = permission.app_filter.clone() else {
            continue;
        };
        let app_filter = match app_filter {
            AppFilter::ExcludeSelected(_) => {
                app_filter.into_inclusive(universe.get_or_insert_with(|| inventory.app_ids()))
            }
            other => other,
        };
        for env_filter in permission_env_filters(permission) {
            restrictions.insert(AppEnvRestriction::new(app_filter.clone(), env_filter));
        }
    }
    restrictions
}

/// Returns the environment filters a permission contributes.
fn permission_env_filters(permission: &AppPermission) -> Vec<EnvFilter> {
    if permission.permission_type == PermissionType::AllAppEntities {
        return vec![
            EnvFilter::of_types([EnvFilterType::Prod]),
            EnvFilter::of_types([EnvFilterType::NonProd]),
        ];
    }
    permission.entity_filter.as_ref().and_then(EntityFilter::env_filter).into_iter().collect()
}

// ============================================================================
// SECTION: Snapshot Projections
// ============================================================================

/// Projects a snapshot onto application to environment ids for `action`.
///
/// Every application in the snapshot becomes a key, even without environments.
#[must_use]
pub fn app_env_map_from_permissions(snapshot: &PermissionSnapshot, action: Action) -> AppEnvMap {
    snapshot
        .app_permissions
        .iter()
        .map(|(app_id, summary)| {
            let env_ids: BTreeSet<EnvId> = summary
                .env_permissions
                .get(&action)
                .map(|envs| envs.iter().map(|env| env.env_id.clone()).collect())
                .unwrap_or_default();
            (app_id.clone(), env_ids)
        })
        .collect()
}

/// Projects a snapshot onto application to service ids for `action`.
#[must_use]
pub fn app_service_map_from_permissions(
    snapshot: &PermissionSnapshot,
    action: Action,
) -> BTreeMap<AppId, BTreeSet<ServiceId>> {
    snapshot
        .app_permissions
        .iter()
        .map(|(app_id, summary)| {
            let services = summary.service_permissions.get(&action).cloned().unwrap_or_default();
            (app_id.clone(), services)
        })
        .collect()
}

// ============================================================================
// SECTION: Principal Views
// ============================================================================

/// Builds the principal's restrictions and concrete map for one action.
#[must_use]
pub fn principal_restrictions<I>(
    action: Action,
    groups: &[UserGroup],
    snapshot: &PermissionSnapshot,
    inventory: &I,
) -> PrincipalRestrictions
where
    I: AppInventory + ?Sized,
{
    PrincipalRestrictions {
        restrictions: restrictions_from_user_groups(action, groups, inventory),
        app_env_map: app_env_map_from_permissions(snapshot, action),
    }
}

/// Builds the full actor context with read and update views.
#[must_use]
pub fn principal_context<I>(
    account_id: AccountId,
    is_account_admin: bool,
    groups: &[UserGroup],
    snapshot: &PermissionSnapshot,
    inventory: &I,
) -> PrincipalContext
where
    I: AppInventory + ?Sized,
{
    PrincipalContext {
        account_id,
        is_account_admin,
        read: principal_restrictions(Action::Read, groups, snapshot, inventory),
        update: principal_restrictions(Action::Update, groups, snapshot, inventory),
    }
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Returns the environment filters the groups grant for updates on one application.
#[must_use]
pub fn env_filters_for_app(groups: &[UserGroup], app_id: &AppId) -> BTreeSet<EnvFilter> {
    groups
        .iter()
        .flat_map(|group| group.app_permissions.iter())
        .filter(|permission| permission.grants(Action::Update))
        .filter(|permission| {
            permission.app_filter.as_ref().is_some_and(|filter| filter.matches(app_id))
        })
        .filter_map(|permission| {
            if permission.permission_type == PermissionType::AllAppEntities {
                Some(EnvFilter::all_types())
            } else {
                permission.entity_filter.as_ref().and_then(EntityFilter::env_filter)
            }
        })
        .collect()
}

/// Proposes restrictions for a new entity created in the given context.
///
/// - Application and environment: exactly that pair.
/// - Application only: the principal's update filters for the application,
///   or `None` when it holds none.
/// - Neither: the principal's update restrictions.
#[must_use]
pub fn default_usage_restrictions<I>(
    app_id: Option<&AppId>,
    env_id: Option<&EnvId>,
    groups: &[UserGroup],
    inventory: &I,
) -> Option<UsageRestrictions>
where
    I: AppInventory + ?Sized,
{
    let Some(app_id) = app_id else {
        return Some(restrictions_from_user_groups(Action::Update, groups, inventory));
    };
    let app_filter = AppFilter::selected([app_id.clone()]);
    if let Some(env_id) = env_id {
        let pair = AppEnvRestriction::new(app_filter, EnvFilter::selected([env_id.clone()]));
        return Some(std::iter::once(pair).collect());
    }
    let env_filters = env_filters_for_app(groups, app_id);
    if env_filters.is_empty() {
        return None;
    }
    Some(
        env_filters
            .into_iter()
            .map(|env_filter| AppEnvRestriction::new(app_filter.clone(), env_filter))
            .collect(),
    )
}
