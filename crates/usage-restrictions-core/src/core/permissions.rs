// crates/usage-restrictions-core/src/core/permissions.rs
// ============================================================================
// Module: Principal Permission Model
// Description: User groups, application permissions, and permission snapshots.
// Purpose: Describe what a principal may do so restrictions can be derived.
// Dependencies: serde, crate::core::{filters, identifiers, restrictions}
// ============================================================================

//! ## Overview
//! A principal holds permissions through user groups. Each group grants
//! application permissions: an action set, an application filter, and an
//! optional entity filter narrowing the environments or workflows covered.
//!
//! A [`PermissionSnapshot`] is the precomputed per-application view of the
//! same permissions, listing concrete environments per action. The
//! aggregator turns both into [`PrincipalRestrictions`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::filters::AppFilter;
use crate::core::filters::EnvFilter;
use crate::core::filters::EnvFilterType;
use crate::core::filters::EnvironmentType;
use crate::core::identifiers::AccountId;
use crate::core::identifiers::AppId;
use crate::core::identifiers::EnvId;
use crate::core::identifiers::ServiceId;
use crate::core::restrictions::AppEnvMap;
use crate::core::restrictions::UsageRestrictions;

// ============================================================================
// SECTION: Actions and Permission Types
// ============================================================================

/// Action granted by an application permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Create entities.
    Create,
    /// Read or use entities.
    Read,
    /// Update entities.
    Update,
    /// Delete entities.
    Delete,
    /// Execute workflows and pipelines.
    Execute,
}

impl Action {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Read => "READ",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Execute => "EXECUTE",
        }
    }
}

/// Entity family covered by an application permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionType {
    /// Every entity of the application, in every environment.
    AllAppEntities,
    /// Environments.
    Env,
    /// Services.
    Service,
    /// Workflows.
    Workflow,
    /// Pipelines.
    Pipeline,
    /// Deployments.
    Deployment,
    /// Infrastructure provisioners.
    Provisioner,
}

// ============================================================================
// SECTION: Entity Filters
// ============================================================================

/// Workflow filter tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowFilterType {
    /// Workflows of production environments.
    Prod,
    /// Workflows of non-production environments.
    NonProd,
    /// Workflows of the listed environments.
    Selected,
    /// Workflow templates (not tied to an environment).
    Templates,
}

/// Workflow filter: an environment filter plus the templates tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowFilter {
    /// Type tags.
    #[serde(default)]
    pub filter_types: BTreeSet<WorkflowFilterType>,
    /// Environment ids paired with `Selected`.
    #[serde(default)]
    pub ids: BTreeSet<EnvId>,
}

impl WorkflowFilter {
    /// Projects the filter onto environments, dropping the templates tag.
    #[must_use]
    pub fn to_env_filter(&self) -> EnvFilter {
        let filter_types: BTreeSet<EnvFilterType> = self
            .filter_types
            .iter()
            .filter_map(|filter_type| match filter_type {
                WorkflowFilterType::Prod => Some(EnvFilterType::Prod),
                WorkflowFilterType::NonProd => Some(EnvFilterType::NonProd),
                WorkflowFilterType::Selected => Some(EnvFilterType::Selected),
                WorkflowFilterType::Templates => None,
            })
            .collect();
        let ids = if filter_types.contains(&EnvFilterType::Selected) {
            self.ids.clone()
        } else {
            BTreeSet::new()
        };
        EnvFilter {
            filter_types,
            ids,
        }
    }
}

/// Entity filter attached to an application permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityFilter {
    /// Environment filter.
    Env(EnvFilter),
    /// Workflow filter.
    Workflow(WorkflowFilter),
    /// Filter over entities without environment scope (services, provisioners).
    Generic,
}

impl EntityFilter {
    /// Returns the environment projection, if the filter has one.
    #[must_use]
    pub fn env_filter(&self) -> Option<EnvFilter> {
        match self {
            Self::Env(filter) => Some(filter.clone()),
            Self::Workflow(filter) => Some(filter.to_env_filter()),
            Self::Generic => None,
        }
    }
}

// ============================================================================
// SECTION: Groups
// ============================================================================

/// Permission granted by a user group over applications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppPermission {
    /// Entity family covered.
    pub permission_type: PermissionType,
    /// Applications covered; absent permissions are ignored.
    #[serde(default)]
    pub app_filter: Option<AppFilter>,
    /// Actions granted.
    #[serde(default)]
    pub actions: BTreeSet<Action>,
    /// Optional entity narrowing.
    #[serde(default)]
    pub entity_filter: Option<EntityFilter>,
}

impl AppPermission {
    /// Returns true when the permission grants the action.
    #[must_use]
    pub fn grants(&self, action: Action) -> bool {
        self.actions.contains(&action)
    }
}

/// User group carrying application permissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGroup {
    /// Group display name.
    #[serde(default)]
    pub name: String,
    /// Application permissions.
    #[serde(default)]
    pub app_permissions: Vec<AppPermission>,
}

// ============================================================================
// SECTION: Snapshots
// ============================================================================

/// Concrete environment reference inside a permission snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvInfo {
    /// Environment identifier.
    pub env_id: EnvId,
    /// Environment type.
    pub env_type: EnvironmentType,
}

/// Per-application permission summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppPermissionSummary {
    /// Environments covered per action.
    #[serde(default)]
    pub env_permissions: BTreeMap<Action, BTreeSet<EnvInfo>>,
    /// Services covered per action.
    #[serde(default)]
    pub service_permissions: BTreeMap<Action, BTreeSet<ServiceId>>,
}

/// Precomputed permission view of one principal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSnapshot {
    /// Summaries keyed by application.
    #[serde(default)]
    pub app_permissions: BTreeMap<AppId, AppPermissionSummary>,
}

// ============================================================================
// SECTION: Principal Views
// ============================================================================

/// Restrictions and concrete app/env map a principal holds for one action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalRestrictions {
    /// Restrictions implied by the principal's permissions.
    #[serde(default)]
    pub restrictions: UsageRestrictions,
    /// Concrete environments per application.
    #[serde(default)]
    pub app_env_map: AppEnvMap,
}

/// Actor context for evaluation and validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalContext {
    /// Account the principal acts in.
    pub account_id: AccountId,
    /// True for account administrators.
    #[serde(default)]
    pub is_account_admin: bool,
    /// View for the read action.
    #[serde(default)]
    pub read: PrincipalRestrictions,
    /// View for the update action.
    #[serde(default)]
    pub update: PrincipalRestrictions,
}

impl PrincipalContext {
    /// Returns the view for an action, if one is tracked.
    #[must_use]
    pub const fn for_action(&self, action: Action) -> Option<&PrincipalRestrictions> {
        match action {
            Action::Read => Some(&self.read),
            Action::Update => Some(&self.update),
            Action::Create | Action::Delete | Action::Execute => None,
        }
    }

    /// Returns true when the principal may update every environment of every application.
    #[must_use]
    pub fn has_all_env_access(&self) -> bool {
        self.update.restrictions.has_all_env_access()
    }

    /// Returns true when the principal may scope entities to the whole account.
    #[must_use]
    pub fn can_scope_to_account(&self) -> bool {
        self.is_account_admin || self.has_all_env_access()
    }
}
