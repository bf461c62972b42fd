// crates/usage-restrictions-core/src/runtime/summary.rs
// ============================================================================
// Module: Restrictions Summary
// Description: Per-application view of a principal's update restrictions.
// Purpose: Tell a UI which scopes a principal may grant on new entities.
// Dependencies: serde, crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Summarizes a principal's update scope: account-wide flags plus, for each
//! application in the principal's map, the concrete environments and whether
//! every production or non-production environment is covered.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

use crate::core::AppId;
use crate::core::EnvFilterType;
use crate::core::PrincipalRestrictions;
use crate::interfaces::EnvironmentCatalog;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Named reference to an application or environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityReference {
    /// Entity identifier.
    pub id: String,
    /// Display name when known.
    pub name: Option<String>,
    /// Owning application.
    pub app_id: AppId,
}

/// Summary for one application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppRestrictionsSummary {
    /// The application.
    pub application: EntityReference,
    /// Environments the principal may act on.
    pub environments: Vec<EntityReference>,
    /// True when every production environment of the app is covered.
    pub has_all_prod_env_access: bool,
    /// True when every non-production environment of the app is covered.
    pub has_all_non_prod_env_access: bool,
}

/// Summary of a principal's update scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestrictionsSummary {
    /// True when some pair admits every application.
    pub has_all_app_access: bool,
    /// True when every production environment of every app is covered.
    pub has_all_prod_env_access: bool,
    /// True when every non-production environment of every app is covered.
    pub has_all_non_prod_env_access: bool,
    /// Per-application summaries.
    pub applications: Vec<AppRestrictionsSummary>,
}

// ============================================================================
// SECTION: Summary
// ============================================================================

/// Builds the summary of a principal's update scope.
///
/// Without a principal nothing is granted. An account without applications
/// reports full access, since there is nothing to restrict.
#[must_use]
pub fn restrictions_summary<C>(
    principal: Option<&PrincipalRestrictions>,
    catalog: &C,
) -> RestrictionsSummary
where
    C: EnvironmentCatalog + ?Sized,
{
    let Some(principal) = principal else {
        return RestrictionsSummary::default();
    };
    if catalog.app_ids().is_empty() {
        return RestrictionsSummary {
            has_all_app_access: true,
            has_all_prod_env_access: true,
            has_all_non_prod_env_access: true,
            applications: Vec::new(),
        };
    }
    let restrictions = &principal.restrictions;
    let applications = principal
        .app_env_map
        .iter()
        .map(|(app_id, env_ids)| {
            let environments = catalog.environments(app_id);
            AppRestrictionsSummary {
                application: EntityReference {
                    id: app_id.as_str().to_string(),
                    name: catalog.app_name(app_id),
                    app_id: app_id.clone(),
                },
                environments: env_ids
                    .iter()
                    .map(|env_id| EntityReference {
                        id: env_id.as_str().to_string(),
                        name: environments
                            .iter()
                            .find(|env| &env.env_id == env_id)
                            .map(|env| env.name.clone()),
                        app_id: app_id.clone(),
                    })
                    .collect(),
                has_all_prod_env_access: restrictions
                    .has_all_env_access_of_type(app_id, EnvFilterType::Prod),
                has_all_non_prod_env_access: restrictions
                    .has_all_env_access_of_type(app_id, EnvFilterType::NonProd),
            }
        })
        .collect();
    RestrictionsSummary {
        has_all_app_access: restrictions.has_all_app_access(),
        has_all_prod_env_access: restrictions.has_account_wide_access_of_type(EnvFilterType::Prod),
        has_all_non_prod_env_access: restrictions
            .has_account_wide_access_of_type(EnvFilterType::NonProd),
        applications,
    }
}
