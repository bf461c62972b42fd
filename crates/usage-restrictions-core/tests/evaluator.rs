// crates/usage-restrictions-core/tests/evaluator.rs
// ============================================================================
// Module: Access Evaluator Tests
// Description: Access decisions for app, account, and new-app targets.
// ============================================================================
//! ## Overview
//! Exercises every evaluation path against the shared three-application
//! topology, plus subset checks and edit permission checks.

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

use std::collections::BTreeSet;

use common::APP_ID;
use common::APP_ID_1;
use common::APP_ID_2;
use common::APP_ID_3;
use common::ENV_ID;
use common::ENV_ID_1;
use common::ENV_ID_2;
use common::ENV_ID_3;
use common::account;
use common::all_apps_with_types;
use common::app;
use common::env;
use common::env_permission;
use common::group;
use common::pair;
use common::restrictions;
use common::selected_apps_and_envs;
use common::snapshot;
use common::topology;
use serde_json::json;
use usage_restrictions_core::AccessRequest;
use usage_restrictions_core::AccountId;
use usage_restrictions_core::Action;
use usage_restrictions_core::AppEnvMap;
use usage_restrictions_core::AppFilter;
use usage_restrictions_core::AppId;
use usage_restrictions_core::EnvFilter;
use usage_restrictions_core::EnvFilterType;
use usage_restrictions_core::EnvId;
use usage_restrictions_core::EnvironmentType;
use usage_restrictions_core::PrincipalRestrictions;
use usage_restrictions_core::UsageRestrictions;
use usage_restrictions_core::UsageRestrictionsDocument;
use usage_restrictions_core::runtime::app_env_map;
use usage_restrictions_core::runtime::evaluate_access;
use usage_restrictions_core::runtime::has_access;
use usage_restrictions_core::runtime::is_usage_restrictions_subset;
use usage_restrictions_core::runtime::principal_restrictions;
use usage_restrictions_core::runtime::user_has_permissions_to_change;

const ALL_ACTIONS: [Action; 5] =
    [Action::Create, Action::Read, Action::Update, Action::Delete, Action::Execute];

/// Principal holding every action on `APP_ID_1`/`ENV_ID_1` only.
fn app_one_principal(action: Action) -> PrincipalRestrictions {
    let groups = [group(vec![env_permission(
        AppFilter::selected([APP_ID_1]),
        &ALL_ACTIONS,
        EnvFilter::selected([ENV_ID_1]),
    )])];
    let snapshot = snapshot(&[(APP_ID_1, vec![(ENV_ID_1, EnvironmentType::Prod)])], &ALL_ACTIONS);
    principal_restrictions(action, &groups, &snapshot, &topology())
}

struct Check<'a> {
    account_id: &'a AccountId,
    is_account_admin: bool,
    entity: Option<&'a UsageRestrictions>,
    principal: &'a PrincipalRestrictions,
}

impl Check<'_> {
    fn allows(&self, app_id: Option<&str>, env_id: Option<&str>) -> bool {
        let app_id = app_id.map(AppId::new);
        let env_id = env_id.map(EnvId::new);
        let request = AccessRequest {
            is_account_admin: self.is_account_admin,
            app_id: app_id.as_ref(),
            env_id: env_id.as_ref(),
            entity_restrictions: self.entity,
            ..AccessRequest::new(self.account_id)
        }
        .with_principal(self.principal);
        has_access(&request, &topology())
    }
}

// ============================================================================
// SECTION: Application Targets
// ============================================================================

#[test]
fn entity_restrictions_gate_app_and_env_targets() {
    let account_id = account();
    let entity = all_apps_with_types(&[EnvFilterType::Prod]);
    let check = Check {
        account_id: &account_id,
        is_account_admin: true,
        entity: Some(&entity),
        principal: &app_one_principal(Action::Update),
    };
    assert!(check.allows(Some(APP_ID_1), Some(ENV_ID_1)));
    assert!(check.allows(Some(APP_ID_1), None));
    assert!(!check.allows(Some(APP_ID), Some(ENV_ID_1)));
    assert!(!check.allows(Some(APP_ID_1), Some(ENV_ID)));
    assert!(!check.allows(Some(APP_ID_2), Some(ENV_ID_2)), "non-prod env is outside PROD");

    let check = Check {
        principal: &app_one_principal(Action::Read),
        ..check
    };
    assert!(check.allows(None, None));
}

#[test]
fn admin_without_entity_restrictions_only_passes_account_level() {
    let account_id = account();
    let principal = app_one_principal(Action::Update);
    let check = Check {
        account_id: &account_id,
        is_account_admin: true,
        entity: None,
        principal: &principal,
    };
    assert!(!check.allows(Some(APP_ID_1), Some(ENV_ID_1)));
    assert!(!check.allows(Some(APP_ID_1), None));
    assert!(!check.allows(Some(APP_ID), Some(ENV_ID_1)));
    assert!(!check.allows(Some(APP_ID_1), Some(ENV_ID)));
    assert!(check.allows(None, None));
}

#[test]
fn non_admin_without_entity_restrictions_is_denied_everywhere() {
    let account_id = account();
    let principal = app_one_principal(Action::Read);
    let check = Check {
        account_id: &account_id,
        is_account_admin: false,
        entity: None,
        principal: &principal,
    };
    assert!(!check.allows(Some(APP_ID_1), Some(ENV_ID_1)));
    assert!(!check.allows(Some(APP_ID_1), None));
    assert!(!check.allows(None, None));
}

#[test]
fn empty_entity_restrictions_deny_like_absent_ones() {
    let account_id = account();
    let entity = UsageRestrictions::new();
    let principal = app_one_principal(Action::Read);
    let check = Check {
        account_id: &account_id,
        is_account_admin: false,
        entity: Some(&entity),
        principal: &principal,
    };
    assert!(!check.allows(Some(APP_ID_1), Some(ENV_ID_1)));
    assert!(!check.allows(None, None));
}

#[test]
fn lenient_exclusion_without_ids_denies_every_target() {
    let account_id = account();
    let document: UsageRestrictionsDocument = serde_json::from_value(json!({
        "appEnvRestrictions": [{
            "appFilter": {"filterType": "EXCLUDE_SELECTED"},
            "envFilter": {"filterTypes": ["PROD", "NON_PROD"]}
        }]
    }))
    .expect("document");
    let principal = app_one_principal(Action::Read);
    for entity in [
        document.to_restrictions_lenient(),
        restrictions([pair(AppFilter::ExcludeSelected(BTreeSet::new()), EnvFilter::all_types())]),
    ] {
        let check = Check {
            account_id: &account_id,
            is_account_admin: true,
            entity: Some(&entity),
            principal: &principal,
        };
        assert!(!check.allows(Some(APP_ID_1), Some(ENV_ID_1)));
        assert!(!check.allows(Some(APP_ID_2), None));
        assert!(!has_access(
            &AccessRequest {
                for_new_app: true,
                entity_restrictions: Some(&entity),
                ..AccessRequest::new(&account_id)
            },
            &topology()
        ));
    }
}

#[test]
fn global_app_sentinel_is_treated_as_account_level() {
    let account_id = account();
    let entity = all_apps_with_types(&[EnvFilterType::Prod, EnvFilterType::NonProd]);
    let principal = PrincipalRestrictions::default();
    let check = Check {
        account_id: &account_id,
        is_account_admin: false,
        entity: Some(&entity),
        principal: &principal,
    };
    assert!(check.allows(Some(usage_restrictions_core::GLOBAL_APP_ID), None));
}

// ============================================================================
// SECTION: Account-Level Targets
// ============================================================================

#[test]
fn account_level_access_requires_overlap_with_principal_map() {
    let account_id = account();
    let principal = app_one_principal(Action::Read);
    let reachable = selected_apps_and_envs(&[APP_ID_1], &[ENV_ID_1]);
    let unreachable = selected_apps_and_envs(&[APP_ID_2], &[ENV_ID_2]);
    let mut request = AccessRequest::new(&account_id).with_principal(&principal);

    request.entity_restrictions = Some(&reachable);
    let decision = evaluate_access(&request, &topology());
    assert!(decision.allowed);
    assert_eq!(decision.reason, "app_env_overlap");

    request.entity_restrictions = Some(&unreachable);
    let decision = evaluate_access(&request, &topology());
    assert!(!decision.allowed);
    assert_eq!(decision.reason, "no_app_env_overlap");
}

#[test]
fn account_wide_entity_is_visible_to_everyone() {
    let account_id = account();
    let entity = all_apps_with_types(&[EnvFilterType::Prod, EnvFilterType::NonProd]);
    let principal = PrincipalRestrictions::default();
    let request = AccessRequest {
        entity_restrictions: Some(&entity),
        ..AccessRequest::new(&account_id)
    }
    .with_principal(&principal);
    assert_eq!(evaluate_access(&request, &topology()).reason, "entity_all_env_access");
}

#[test]
fn principal_without_permissions_is_denied_at_account_level() {
    let account_id = account();
    let entity = all_apps_with_types(&[EnvFilterType::Prod]);
    let request = AccessRequest {
        entity_restrictions: Some(&entity),
        ..AccessRequest::new(&account_id)
    };
    let decision = evaluate_access(&request, &topology());
    assert!(!decision.allowed);
    assert_eq!(decision.reason, "principal_no_permissions");
}

#[test]
fn account_scoped_entities_need_admin_or_all_env_access() {
    let account_id = account();
    let full = PrincipalRestrictions {
        restrictions: all_apps_with_types(&[EnvFilterType::Prod, EnvFilterType::NonProd]),
        app_env_map: AppEnvMap::new(),
    };
    let partial = app_one_principal(Action::Read);
    let base = AccessRequest {
        scoped_to_account: true,
        ..AccessRequest::new(&account_id)
    };

    let admin = AccessRequest {
        is_account_admin: true,
        ..base
    };
    assert!(has_access(&admin, &topology()));
    assert!(has_access(&base.with_principal(&full), &topology()));
    assert!(!has_access(&base.with_principal(&partial), &topology()));

    let app_id = app(APP_ID_1);
    let app_target = AccessRequest {
        app_id: Some(&app_id),
        ..admin
    };
    assert!(!has_access(&app_target, &topology()), "scoped entities have no app scope");
}

// ============================================================================
// SECTION: New Applications
// ============================================================================

#[test]
fn new_app_access_depends_on_entity_app_filter_only() {
    let account_id = account();
    let all_apps = restrictions([pair(AppFilter::All, EnvFilter::default())]);
    let no_ids = restrictions([pair(AppFilter::Selected(BTreeSet::new()), EnvFilter::default())]);
    let request = AccessRequest {
        for_new_app: true,
        ..AccessRequest::new(&account_id)
    };

    assert!(has_access(
        &AccessRequest {
            entity_restrictions: Some(&all_apps),
            ..request
        },
        &topology()
    ));
    assert!(!has_access(
        &AccessRequest {
            entity_restrictions: Some(&no_ids),
            ..request
        },
        &topology()
    ));
    assert!(!has_access(&request, &topology()));
    assert!(!has_access(
        &AccessRequest {
            entity_restrictions: Some(&all_apps),
            scoped_to_account: true,
            ..request
        },
        &topology()
    ));
}

// ============================================================================
// SECTION: Expansion and Subsets
// ============================================================================

#[test]
fn app_env_map_expands_filters_over_the_topology() {
    let map = app_env_map(&all_apps_with_types(&[EnvFilterType::Prod]), &topology());
    let expected: AppEnvMap = [
        (app(APP_ID_1), [env(ENV_ID_1)].into_iter().collect()),
        (app(APP_ID_2), BTreeSet::new()),
        (app(APP_ID_3), [env(ENV_ID_3)].into_iter().collect()),
    ]
    .into_iter()
    .collect();
    assert_eq!(map, expected);

    let excluded = restrictions([pair(
        AppFilter::exclude_selected([APP_ID_1, APP_ID_3]),
        EnvFilter::all_types(),
    )]);
    let map = app_env_map(&excluded, &topology());
    assert_eq!(map.keys().collect::<Vec<_>>(), vec![&app(APP_ID_2)]);
}

#[test]
fn subset_checks_compare_expanded_maps() {
    let topology = topology();
    let everything = all_apps_with_types(&[EnvFilterType::Prod, EnvFilterType::NonProd]);
    let prod = all_apps_with_types(&[EnvFilterType::Prod]);
    let app_one = selected_apps_and_envs(&[APP_ID_1], &[ENV_ID_1]);

    assert!(is_usage_restrictions_subset(None, None, &topology));
    assert!(is_usage_restrictions_subset(Some(&UsageRestrictions::new()), None, &topology));
    assert!(!is_usage_restrictions_subset(Some(&prod), None, &topology));
    assert!(is_usage_restrictions_subset(Some(&prod), Some(&everything), &topology));
    assert!(!is_usage_restrictions_subset(Some(&everything), Some(&prod), &topology));
    assert!(is_usage_restrictions_subset(Some(&app_one), Some(&prod), &topology));
    assert!(!is_usage_restrictions_subset(Some(&prod), Some(&app_one), &topology));
}

#[test]
fn subset_falls_back_to_type_coverage_without_applications() {
    let empty_topology = usage_restrictions_core::AccountTopology::new("empty");
    let prod = all_apps_with_types(&[EnvFilterType::Prod]);
    let everything = all_apps_with_types(&[EnvFilterType::Prod, EnvFilterType::NonProd]);
    assert!(is_usage_restrictions_subset(Some(&prod), Some(&everything), &empty_topology));
    assert!(!is_usage_restrictions_subset(Some(&everything), Some(&prod), &empty_topology));
}

// ============================================================================
// SECTION: Edit Permissions
// ============================================================================

#[test]
fn non_prod_only_principal_cannot_edit_all_env_entity() {
    let groups = [group(vec![env_permission(
        AppFilter::All,
        &ALL_ACTIONS,
        EnvFilter::of_types([EnvFilterType::NonProd]),
    )])];
    let snapshot = snapshot(
        &[
            (APP_ID_1, vec![]),
            (APP_ID_2, vec![(ENV_ID_2, EnvironmentType::NonProd)]),
            (APP_ID_3, vec![]),
        ],
        &[Action::Update],
    );
    let principal = principal_restrictions(Action::Update, &groups, &snapshot, &topology());
    let entity = all_apps_with_types(&[EnvFilterType::Prod, EnvFilterType::NonProd]);
    assert!(!user_has_permissions_to_change(
        false,
        false,
        Some(&entity),
        Some(&principal),
        &topology()
    ));
    let non_prod = all_apps_with_types(&[EnvFilterType::NonProd]);
    assert!(user_has_permissions_to_change(
        false,
        false,
        Some(&non_prod),
        Some(&principal),
        &topology()
    ));
}

#[test]
fn single_app_principal_cannot_edit_all_app_entity() {
    let groups = [group(vec![env_permission(
        AppFilter::selected([APP_ID_1]),
        &ALL_ACTIONS,
        EnvFilter::of_types([EnvFilterType::NonProd]),
    )])];
    let snapshot = snapshot(&[(APP_ID_1, vec![(ENV_ID_1, EnvironmentType::Prod)])], &[Action::Update]);
    let principal = principal_restrictions(Action::Update, &groups, &snapshot, &topology());
    let entity = all_apps_with_types(&[EnvFilterType::Prod, EnvFilterType::NonProd]);
    assert!(!user_has_permissions_to_change(
        false,
        false,
        Some(&entity),
        Some(&principal),
        &topology()
    ));
}

#[test]
fn edit_permission_shortcuts() {
    let topology = topology();
    let entity = all_apps_with_types(&[EnvFilterType::Prod]);
    assert!(user_has_permissions_to_change(false, false, None, None, &topology));
    assert!(user_has_permissions_to_change(false, true, Some(&entity), None, &topology));
    assert!(!user_has_permissions_to_change(false, false, Some(&entity), None, &topology));
    assert!(user_has_permissions_to_change(true, true, None, None, &topology));
    assert!(!user_has_permissions_to_change(true, false, None, None, &topology));
}
