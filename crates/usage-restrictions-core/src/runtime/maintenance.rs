// crates/usage-restrictions-core/src/runtime/maintenance.rs
// ============================================================================
// Module: Restriction Maintenance
// Description: Reference cleanup and reference summaries for restriction sets.
// Purpose: Keep stored restrictions consistent when apps or environments go away.
// Dependencies: serde, crate::core
// ============================================================================

//! ## Overview
//! When an application or environment is deleted, restrictions naming it by
//! id must be rewritten. The functions here never mutate their input; they
//! return the rewritten set plus the number of removed id references.
//!
//! Only explicit ids are touched: `SELECTED` application ids and `SELECTED`
//! environment ids. A pair whose selection becomes empty is dropped, since an
//! empty selection admits nothing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::AppEnvRestriction;
use crate::core::AppFilter;
use crate::core::AppId;
use crate::core::EnvFilter;
use crate::core::EnvFilterType;
use crate::core::EnvId;
use crate::core::UsageRestrictions;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Result of a cleanup pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupOutcome {
    /// Rewritten restrictions.
    pub restrictions: UsageRestrictions,
    /// Number of removed id references.
    pub removed: usize,
}

/// Kind of entity carrying restrictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestrictedEntityKind {
    /// Connector or cloud provider setting.
    Setting,
    /// Encrypted secret or file.
    Secret,
}

/// Entity carrying restrictions, as listed for reference summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestrictedEntity {
    /// Entity identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Entity kind.
    pub kind: RestrictedEntityKind,
    /// Restrictions attached to the entity.
    #[serde(default)]
    pub restrictions: UsageRestrictions,
}

/// Identifier and name of a referencing entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdNameReference {
    /// Entity identifier.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// Entities whose restrictions name an application or environment by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceSummary {
    /// Total number of referencing entities.
    pub total: usize,
    /// Number of referencing settings.
    pub num_of_settings: usize,
    /// Number of referencing secrets.
    pub num_of_secrets: usize,
    /// Referencing settings.
    pub settings: Vec<IdNameReference>,
    /// Referencing secrets.
    pub secrets: Vec<IdNameReference>,
}

// ============================================================================
// SECTION: Cleanup
// ============================================================================

/// Removes references to a deleted application or environment.
///
/// With `env_id` only the environment id is removed; otherwise the
/// application id is removed.
#[must_use]
pub fn remove_app_env_references(
    restrictions: &UsageRestrictions,
    app_id: &AppId,
    env_id: Option<&EnvId>,
) -> CleanupOutcome {
    rewrite(restrictions, |pair, removed| match env_id {
        Some(env_id) => {
            let env_filter = retain_env_ids(&pair.env_filter, |id| id != env_id, removed);
            Some(AppEnvRestriction::new(pair.app_filter.clone(), env_filter?))
        }
        None => {
            let app_filter = retain_app_ids(&pair.app_filter, |id| id != app_id, removed);
            Some(AppEnvRestriction::new(app_filter?, pair.env_filter.clone()))
        }
    })
}

/// Removes ids of applications and environments that no longer exist.
#[must_use]
pub fn purge_dangling_references(
    restrictions: &UsageRestrictions,
    existing_apps: &BTreeSet<AppId>,
    existing_envs: &BTreeSet<EnvId>,
) -> CleanupOutcome {
    rewrite(restrictions, |pair, removed| {
        let app_filter = retain_app_ids(&pair.app_filter, |id| existing_apps.contains(id), removed)?;
        let env_filter = retain_env_ids(&pair.env_filter, |id| existing_envs.contains(id), removed)?;
        Some(AppEnvRestriction::new(app_filter, env_filter))
    })
}

/// Applies a per-pair rewrite, counting removed references.
fn rewrite<F>(restrictions: &UsageRestrictions, mut rewrite_pair: F) -> CleanupOutcome
where
    F: FnMut(&AppEnvRestriction, &mut usize) -> Option<AppEnvRestriction>,
{
    let mut removed = 0;
    let rewritten = restrictions.iter().filter_map(|pair| rewrite_pair(pair, &mut removed)).collect();
    CleanupOutcome {
        restrictions: rewritten,
        removed,
    }
}

/// Keeps `SELECTED` application ids passing `keep`; `None` when none remain.
fn retain_app_ids<F>(filter: &AppFilter, keep: F, removed: &mut usize) -> Option<AppFilter>
where
    F: Fn(&AppId) -> bool,
{
    let AppFilter::Selected(ids) = filter else {
        return Some(filter.clone());
    };
    let kept: BTreeSet<AppId> = ids.iter().filter(|id| keep(id)).cloned().collect();
    *removed += ids.len() - kept.len();
    if kept.is_empty() { None } else { Some(AppFilter::Selected(kept)) }
}

/// Keeps `SELECTED` environment ids passing `keep`; `None` when nothing remains.
fn retain_env_ids<F>(filter: &EnvFilter, keep: F, removed: &mut usize) -> Option<EnvFilter>
where
    F: Fn(&EnvId) -> bool,
{
    if !filter.has_type(EnvFilterType::Selected) {
        return Some(filter.clone());
    }
    let kept: BTreeSet<EnvId> = filter.ids.iter().filter(|id| keep(id)).cloned().collect();
    *removed += filter.ids.len() - kept.len();
    let mut filter_types = filter.filter_types.clone();
    if kept.is_empty() {
        filter_types.remove(&EnvFilterType::Selected);
    }
    let rewritten = EnvFilter {
        filter_types,
        ids: kept,
    };
    if rewritten.is_empty() { None } else { Some(rewritten) }
}

// ============================================================================
// SECTION: Reference Summaries
// ============================================================================

/// Lists entities whose restrictions select the application by id.
#[must_use]
pub fn reference_summary_for_app(entities: &[RestrictedEntity], app_id: &AppId) -> ReferenceSummary {
    summarize(entities, |pair| {
        matches!(&pair.app_filter, AppFilter::Selected(ids) if ids.contains(app_id))
    })
}

/// Lists entities whose restrictions select the environment by id.
#[must_use]
pub fn reference_summary_for_env(entities: &[RestrictedEntity], env_id: &EnvId) -> ReferenceSummary {
    summarize(entities, |pair| {
        pair.env_filter.has_type(EnvFilterType::Selected) && pair.env_filter.ids.contains(env_id)
    })
}

/// Collects entities having at least one pair accepted by `references`.
fn summarize<F>(entities: &[RestrictedEntity], references: F) -> ReferenceSummary
where
    F: Fn(&AppEnvRestriction) -> bool,
{
    let mut summary = ReferenceSummary::default();
    for entity in entities.iter().filter(|entity| entity.restrictions.iter().any(&references)) {
        let reference = IdNameReference {
            id: entity.id.clone(),
            name: entity.name.clone(),
        };
        match entity.kind {
            RestrictedEntityKind::Setting => summary.settings.push(reference),
            RestrictedEntityKind::Secret => summary.secrets.push(reference),
        }
    }
    summary.num_of_settings = summary.settings.len();
    summary.num_of_secrets = summary.secrets.len();
    summary.total = summary.num_of_settings + summary.num_of_secrets;
    summary
}
