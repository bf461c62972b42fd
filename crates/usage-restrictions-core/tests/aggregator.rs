// crates/usage-restrictions-core/tests/aggregator.rs
// ============================================================================
// Module: Permission Aggregator Tests
// Description: Restrictions and maps derived from user groups and snapshots.
// ============================================================================
//! ## Overview
//! Checks how group permissions become restriction pairs and how defaults
//! for new entities are proposed.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use common::APP_ID_1;
use common::APP_ID_2;
use common::APP_ID_3;
use common::ENV_ID_1;
use common::ENV_ID_2;
use common::actions;
use common::app;
use common::env;
use common::env_permission;
use common::group;
use common::pair;
use common::restrictions;
use common::snapshot;
use common::topology;
use usage_restrictions_core::Action;
use usage_restrictions_core::AppFilter;
use usage_restrictions_core::AppPermission;
use usage_restrictions_core::AppPermissionSummary;
use usage_restrictions_core::EntityFilter;
use usage_restrictions_core::EnvFilter;
use usage_restrictions_core::EnvFilterType;
use usage_restrictions_core::EnvironmentType;
use usage_restrictions_core::PermissionSnapshot;
use usage_restrictions_core::PermissionType;
use usage_restrictions_core::ServiceId;
use usage_restrictions_core::UsageRestrictions;
use usage_restrictions_core::WorkflowFilter;
use usage_restrictions_core::WorkflowFilterType;
use usage_restrictions_core::runtime::app_env_map_from_permissions;
use usage_restrictions_core::runtime::app_service_map_from_permissions;
use usage_restrictions_core::runtime::default_usage_restrictions;
use usage_restrictions_core::runtime::env_filters_for_app;
use usage_restrictions_core::runtime::principal_context;
use usage_restrictions_core::runtime::restrictions_from_user_groups;

const ALL_ACTIONS: [Action; 5] =
    [Action::Create, Action::Read, Action::Update, Action::Delete, Action::Execute];

fn all_app_entities(app_filter: AppFilter, granted: &[Action]) -> AppPermission {
    AppPermission {
        permission_type: PermissionType::AllAppEntities,
        app_filter: Some(app_filter),
        actions: actions(granted),
        entity_filter: None,
    }
}

fn prod_and_non_prod_pairs() -> UsageRestrictions {
    restrictions([
        pair(AppFilter::All, EnvFilter::of_types([EnvFilterType::Prod])),
        pair(AppFilter::All, EnvFilter::of_types([EnvFilterType::NonProd])),
    ])
}

// ============================================================================
// SECTION: Restrictions From Groups
// ============================================================================

#[test]
fn multiple_groups_collapse_to_distinct_pairs() {
    let groups = [group(vec![
        all_app_entities(AppFilter::All, &ALL_ACTIONS),
        env_permission(AppFilter::All, &ALL_ACTIONS, EnvFilter::of_types([EnvFilterType::Prod])),
        env_permission(
            AppFilter::All,
            &ALL_ACTIONS,
            EnvFilter::of_types([EnvFilterType::NonProd]),
        ),
    ])];
    let derived = restrictions_from_user_groups(Action::Update, &groups, &topology());
    assert_eq!(derived, prod_and_non_prod_pairs());
    assert!(derived.has_all_env_access());
}

#[test]
fn permissions_without_the_action_are_ignored() {
    let groups = [group(vec![env_permission(
        AppFilter::All,
        &[Action::Read],
        EnvFilter::of_types([EnvFilterType::Prod]),
    )])];
    assert!(restrictions_from_user_groups(Action::Update, &groups, &topology()).is_empty());
    assert_eq!(restrictions_from_user_groups(Action::Read, &groups, &topology()).len(), 1);
    assert!(restrictions_from_user_groups(Action::Read, &[], &topology()).is_empty());
}

#[test]
fn excluded_apps_resolve_against_the_inventory() {
    let groups = [group(vec![env_permission(
        AppFilter::exclude_selected([APP_ID_1]),
        &[Action::Read],
        EnvFilter::of_types([EnvFilterType::Prod]),
    )])];
    let derived = restrictions_from_user_groups(Action::Read, &groups, &topology());
    let expected = restrictions([pair(
        AppFilter::selected([APP_ID_2, APP_ID_3]),
        EnvFilter::of_types([EnvFilterType::Prod]),
    )]);
    assert_eq!(derived, expected);
}

#[test]
fn workflow_filters_project_onto_environments() {
    let permission = AppPermission {
        permission_type: PermissionType::Workflow,
        app_filter: Some(AppFilter::selected([APP_ID_1])),
        actions: actions(&[Action::Execute]),
        entity_filter: Some(EntityFilter::Workflow(WorkflowFilter {
            filter_types: [WorkflowFilterType::NonProd, WorkflowFilterType::Templates]
                .into_iter()
                .collect(),
            ids: [env(ENV_ID_1)].into_iter().collect(),
        })),
    };
    let generic = AppPermission {
        permission_type: PermissionType::Service,
        app_filter: Some(AppFilter::All),
        actions: actions(&[Action::Execute]),
        entity_filter: Some(EntityFilter::Generic),
    };
    let derived =
        restrictions_from_user_groups(Action::Execute, &[group(vec![permission, generic])], &topology());
    let expected = restrictions([pair(
        AppFilter::selected([APP_ID_1]),
        EnvFilter::of_types([EnvFilterType::NonProd]),
    )]);
    assert_eq!(derived, expected);
}

#[test]
fn permissions_without_app_filter_are_skipped() {
    let permission = AppPermission {
        permission_type: PermissionType::Env,
        app_filter: None,
        actions: actions(&ALL_ACTIONS),
        entity_filter: Some(EntityFilter::Env(EnvFilter::all_types())),
    };
    assert!(
        restrictions_from_user_groups(Action::Read, &[group(vec![permission])], &topology())
            .is_empty()
    );
}

// ============================================================================
// SECTION: Snapshot Projections
// ============================================================================

#[test]
fn snapshot_projection_keeps_apps_without_environments() {
    let snapshot = snapshot(
        &[
            (APP_ID_1, vec![(ENV_ID_1, EnvironmentType::Prod)]),
            (APP_ID_2, vec![]),
        ],
        &[Action::Read],
    );
    let map = app_env_map_from_permissions(&snapshot, Action::Read);
    assert_eq!(map.get(&app(APP_ID_1)), Some(&[env(ENV_ID_1)].into_iter().collect()));
    assert_eq!(map.get(&app(APP_ID_2)), Some(&BTreeSet::new()));

    let update_map = app_env_map_from_permissions(&snapshot, Action::Update);
    assert_eq!(update_map.len(), 2);
    assert!(update_map.values().all(BTreeSet::is_empty));
}

#[test]
fn service_projection_reads_service_permissions() {
    let summary = AppPermissionSummary {
        env_permissions: BTreeMap::new(),
        service_permissions: [(Action::Read, [ServiceId::new("svc")].into_iter().collect())]
            .into_iter()
            .collect(),
    };
    let snapshot = PermissionSnapshot {
        app_permissions: [(app(APP_ID_1), summary)].into_iter().collect(),
    };
    let map = app_service_map_from_permissions(&snapshot, Action::Read);
    assert_eq!(map.get(&app(APP_ID_1)).map(BTreeSet::len), Some(1));
    let map = app_service_map_from_permissions(&snapshot, Action::Update);
    assert_eq!(map.get(&app(APP_ID_1)).map(BTreeSet::len), Some(0));
}

#[test]
fn principal_context_carries_read_and_update_views() {
    let groups = [group(vec![
        env_permission(AppFilter::All, &[Action::Read], EnvFilter::all_types()),
        env_permission(
            AppFilter::selected([APP_ID_2]),
            &[Action::Update],
            EnvFilter::selected([ENV_ID_2]),
        ),
    ])];
    let snapshot = snapshot(&[(APP_ID_2, vec![(ENV_ID_2, EnvironmentType::NonProd)])], &[
        Action::Read,
        Action::Update,
    ]);
    let context =
        principal_context(common::account(), false, &groups, &snapshot, &topology());
    assert!(context.read.restrictions.has_all_env_access());
    assert!(!context.update.restrictions.has_all_env_access());
    assert!(!context.can_scope_to_account());
    assert_eq!(context.update.app_env_map.len(), 1);
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

#[test]
fn default_restrictions_without_context_use_update_scope() {
    let groups = [group(vec![
        all_app_entities(AppFilter::All, &ALL_ACTIONS),
        env_permission(AppFilter::All, &ALL_ACTIONS, EnvFilter::of_types([EnvFilterType::Prod])),
    ])];
    let defaults = default_usage_restrictions(None, None, &groups, &topology());
    assert_eq!(defaults, Some(prod_and_non_prod_pairs()));
}

#[test]
fn default_restrictions_with_app_and_env_pin_both() {
    let defaults =
        default_usage_restrictions(Some(&app(APP_ID_1)), Some(&env(ENV_ID_1)), &[], &topology());
    let expected = restrictions([pair(AppFilter::selected([APP_ID_1]), EnvFilter::selected([ENV_ID_1]))]);
    assert_eq!(defaults, Some(expected));
}

#[test]
fn default_restrictions_with_app_only_use_matching_filters() {
    let groups = [group(vec![
        env_permission(
            AppFilter::selected([APP_ID_1]),
            &[Action::Update],
            EnvFilter::of_types([EnvFilterType::NonProd]),
        ),
        env_permission(
            AppFilter::selected([APP_ID_2]),
            &[Action::Update],
            EnvFilter::of_types([EnvFilterType::Prod]),
        ),
        all_app_entities(AppFilter::selected([APP_ID_3]), &[Action::Update]),
    ])];
    let defaults = default_usage_restrictions(Some(&app(APP_ID_1)), None, &groups, &topology());
    let expected = restrictions([pair(
        AppFilter::selected([APP_ID_1]),
        EnvFilter::of_types([EnvFilterType::NonProd]),
    )]);
    assert_eq!(defaults, Some(expected));

    let filters = env_filters_for_app(&groups, &app(APP_ID_3));
    assert_eq!(filters, [EnvFilter::all_types()].into_iter().collect());

    assert_eq!(default_usage_restrictions(Some(&app("unknown")), None, &groups, &topology()), None);
}
