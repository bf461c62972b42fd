// crates/usage-restrictions-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared fixtures for usage-restrictions-core tests.
// Purpose: Provide a reusable account topology and restriction builders.
// Dependencies: usage-restrictions-core
// ============================================================================

//! ## Overview
//! Three applications with one environment each: `APP_ID_1`/`ENV_ID_1`
//! (production), `APP_ID_2`/`ENV_ID_2` (non-production), and
//! `APP_ID_3`/`ENV_ID_3` (production). Ids outside the topology (`APP_ID`,
//! `ENV_ID`) exist only to probe unknown targets.

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use usage_restrictions_core::AccountId;
use usage_restrictions_core::AccountTopology;
use usage_restrictions_core::Action;
use usage_restrictions_core::AppEnvRestriction;
use usage_restrictions_core::AppFilter;
use usage_restrictions_core::AppId;
use usage_restrictions_core::AppInventory;
use usage_restrictions_core::AppPermission;
use usage_restrictions_core::AppPermissionSummary;
use usage_restrictions_core::AppRecord;
use usage_restrictions_core::EntityFilter;
use usage_restrictions_core::EnvFilter;
use usage_restrictions_core::EnvFilterType;
use usage_restrictions_core::EnvId;
use usage_restrictions_core::EnvInfo;
use usage_restrictions_core::EnvironmentRecord;
use usage_restrictions_core::EnvironmentType;
use usage_restrictions_core::EnvironmentTypeResolver;
use usage_restrictions_core::PermissionSnapshot;
use usage_restrictions_core::PermissionType;
use usage_restrictions_core::UsageRestrictions;
use usage_restrictions_core::UserGroup;

// ============================================================================
// SECTION: Identifiers
// ============================================================================

pub const ACCOUNT_ID: &str = "ACCOUNT_ID";
pub const APP_ID: &str = "APP_ID";
pub const APP_ID_1: &str = "APP_ID_1";
pub const APP_ID_2: &str = "APP_ID_2";
pub const APP_ID_3: &str = "APP_ID_3";
pub const ENV_ID: &str = "ENV_ID";
pub const ENV_ID_1: &str = "ENV_ID_1";
pub const ENV_ID_2: &str = "ENV_ID_2";
pub const ENV_ID_3: &str = "ENV_ID_3";

pub fn account() -> AccountId {
    AccountId::new(ACCOUNT_ID)
}

pub fn app(id: &str) -> AppId {
    AppId::new(id)
}

pub fn env(id: &str) -> EnvId {
    EnvId::new(id)
}

// ============================================================================
// SECTION: Topology
// ============================================================================

/// Returns the three-application topology used across suites.
pub fn topology() -> AccountTopology {
    AccountTopology::new(ACCOUNT_ID)
        .with_app(
            AppRecord::new(APP_ID_1, "app one").with_environment(EnvironmentRecord::new(
                ENV_ID_1,
                "env one",
                EnvironmentType::Prod,
            )),
        )
        .with_app(
            AppRecord::new(APP_ID_2, "app two").with_environment(EnvironmentRecord::new(
                ENV_ID_2,
                "env two",
                EnvironmentType::NonProd,
            )),
        )
        .with_app(
            AppRecord::new(APP_ID_3, "app three").with_environment(EnvironmentRecord::new(
                ENV_ID_3,
                "env three",
                EnvironmentType::Prod,
            )),
        )
}

/// Application ids known to [`numeric_resolver`].
pub const NUMERIC_APP_IDS: [&str; 5] = ["111", "222", "333", "444", "777"];

/// Environment type lookup and application inventory backed by plain maps.
pub struct MapResolver {
    pub env_types: BTreeMap<EnvId, EnvironmentType>,
    pub apps: BTreeSet<AppId>,
}

impl MapResolver {
    pub fn new(entries: &[(&str, EnvironmentType)]) -> Self {
        Self {
            env_types: entries.iter().map(|(id, env_type)| (EnvId::new(*id), *env_type)).collect(),
            apps: BTreeSet::new(),
        }
    }

    pub fn with_apps(mut self, apps: &[&str]) -> Self {
        self.apps = apps.iter().map(|id| AppId::new(*id)).collect();
        self
    }
}

impl EnvironmentTypeResolver for MapResolver {
    fn environment_type(&self, env_id: &EnvId) -> Option<EnvironmentType> {
        self.env_types.get(env_id).copied()
    }
}

impl AppInventory for MapResolver {
    fn app_ids(&self) -> BTreeSet<AppId> {
        self.apps.clone()
    }
}

/// Resolver for the numeric ids used by intersection suites.
pub fn numeric_resolver() -> MapResolver {
    MapResolver::new(&[
        ("222", EnvironmentType::Prod),
        ("333", EnvironmentType::Prod),
        ("444", EnvironmentType::NonProd),
        ("555", EnvironmentType::NonProd),
        ("666", EnvironmentType::Prod),
    ])
    .with_apps(&NUMERIC_APP_IDS)
}

// ============================================================================
// SECTION: Restriction Builders
// ============================================================================

pub fn pair(app_filter: AppFilter, env_filter: EnvFilter) -> AppEnvRestriction {
    AppEnvRestriction::new(app_filter, env_filter)
}

pub fn restrictions<I>(pairs: I) -> UsageRestrictions
where
    I: IntoIterator<Item = AppEnvRestriction>,
{
    pairs.into_iter().collect()
}

/// All applications with the given environment type tags.
pub fn all_apps_with_types(types: &[EnvFilterType]) -> UsageRestrictions {
    restrictions([pair(AppFilter::All, EnvFilter::of_types(types.iter().copied()))])
}

/// Selected applications paired with selected environments.
pub fn selected_apps_and_envs(app_ids: &[&str], env_ids: &[&str]) -> UsageRestrictions {
    restrictions([pair(
        AppFilter::selected(app_ids.iter().copied()),
        EnvFilter::selected(env_ids.iter().copied()),
    )])
}

// ============================================================================
// SECTION: Permission Builders
// ============================================================================

pub fn actions(actions: &[Action]) -> BTreeSet<Action> {
    actions.iter().copied().collect()
}

pub fn env_permission(
    app_filter: AppFilter,
    granted: &[Action],
    env_filter: EnvFilter,
) -> AppPermission {
    AppPermission {
        permission_type: PermissionType::Env,
        app_filter: Some(app_filter),
        actions: actions(granted),
        entity_filter: Some(EntityFilter::Env(env_filter)),
    }
}

pub fn group(permissions: Vec<AppPermission>) -> UserGroup {
    UserGroup {
        name: "group".to_string(),
        app_permissions: permissions,
    }
}

/// Snapshot granting `granted` on the listed environments of each app.
pub fn snapshot(
    entries: &[(&str, Vec<(&str, EnvironmentType)>)],
    granted: &[Action],
) -> PermissionSnapshot {
    let app_permissions = entries
        .iter()
        .map(|(app_id, envs)| {
            let env_infos: BTreeSet<EnvInfo> = envs
                .iter()
                .map(|(env_id, env_type)| EnvInfo {
                    env_id: EnvId::new(*env_id),
                    env_type: *env_type,
                })
                .collect();
            let env_permissions =
                granted.iter().map(|action| (*action, env_infos.clone())).collect();
            (
                AppId::new(*app_id),
                AppPermissionSummary {
                    env_permissions,
                    service_permissions: BTreeMap::new(),
                },
            )
        })
        .collect();
    PermissionSnapshot {
        app_permissions,
    }
}
