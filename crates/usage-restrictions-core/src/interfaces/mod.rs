// crates/usage-restrictions-core/src/interfaces/mod.rs
// ============================================================================
// Module: Usage Restrictions Interfaces
// Description: Capability traits for account topology lookups.
// Purpose: Inject application and environment metadata into pure evaluators.
// Dependencies: serde, crate::core
// ============================================================================

//! ## Overview
//! Evaluators never query storage. They receive account topology through
//! three narrow capabilities:
//! - [`EnvironmentTypeResolver`] classifies a single environment.
//! - [`AppInventory`] lists the account's applications.
//! - [`EnvironmentCatalog`] lists an application's environments.
//!
//! [`AccountTopology`] is an in-memory implementation of all three, suitable
//! for request-scoped snapshots and tests.
//!
//! Security posture: lookups that miss return `None` or empty collections,
//! and evaluators treat missing metadata as "not admitted".

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::AccountId;
use crate::core::AppId;
use crate::core::EnvId;
use crate::core::EnvironmentType;

// ============================================================================
// SECTION: Records
// ============================================================================

/// Environment metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentRecord {
    /// Environment identifier.
    pub env_id: EnvId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Environment classification.
    pub env_type: EnvironmentType,
}

impl EnvironmentRecord {
    /// Creates an environment record.
    #[must_use]
    pub fn new(env_id: impl Into<EnvId>, name: impl Into<String>, env_type: EnvironmentType) -> Self {
        Self {
            env_id: env_id.into(),
            name: name.into(),
            env_type,
        }
    }
}

/// Application metadata with its environments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppRecord {
    /// Application identifier.
    pub app_id: AppId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Environments owned by the application.
    #[serde(default)]
    pub environments: Vec<EnvironmentRecord>,
}

impl AppRecord {
    /// Creates an application record without environments.
    #[must_use]
    pub fn new(app_id: impl Into<AppId>, name: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            name: name.into(),
            environments: Vec::new(),
        }
    }

    /// Adds an environment to the record.
    #[must_use]
    pub fn with_environment(mut self, environment: EnvironmentRecord) -> Self {
        self.environments.push(environment);
        self
    }
}

// ============================================================================
// SECTION: Capabilities
// ============================================================================

/// Classifies environments by id.
pub trait EnvironmentTypeResolver {
    /// Returns the environment's type, or `None` when unknown.
    fn environment_type(&self, env_id: &EnvId) -> Option<EnvironmentType>;
}

/// Lists an account's applications.
pub trait AppInventory {
    /// Returns every application id of the account.
    fn app_ids(&self) -> BTreeSet<AppId>;
}

/// Lists environments per application.
pub trait EnvironmentCatalog: AppInventory {
    /// Returns the application's environments (empty when unknown).
    fn environments(&self, app_id: &AppId) -> Vec<EnvironmentRecord>;

    /// Returns the application's display name.
    fn app_name(&self, _app_id: &AppId) -> Option<String> {
        None
    }
}

// ============================================================================
// SECTION: In-Memory Topology
// ============================================================================

/// In-memory account topology implementing every capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountTopology {
    /// Owning account.
    pub account_id: AccountId,
    /// Applications with their environments.
    #[serde(default)]
    pub apps: Vec<AppRecord>,
}

impl AccountTopology {
    /// Creates an empty topology for an account.
    #[must_use]
    pub fn new(account_id: impl Into<AccountId>) -> Self {
        Self {
            account_id: account_id.into(),
            apps: Vec::new(),
        }
    }

    /// Adds an application record.
    #[must_use]
    pub fn with_app(mut self, app: AppRecord) -> Self {
        self.apps.push(app);
        self
    }

    /// Returns the application record, if present.
    #[must_use]
    pub fn app(&self, app_id: &AppId) -> Option<&AppRecord> {
        self.apps.iter().find(|app| &app.app_id == app_id)
    }

    /// Returns the environment record and its owning application id.
    #[must_use]
    pub fn environment(&self, env_id: &EnvId) -> Option<(&AppId, &EnvironmentRecord)> {
        self.apps.iter().find_map(|app| {
            app.environments.iter().find(|env| &env.env_id == env_id).map(|env| (&app.app_id, env))
        })
    }

    /// Returns every environment id of the account.
    #[must_use]
    pub fn env_ids(&self) -> BTreeSet<EnvId> {
        self.apps
            .iter()
            .flat_map(|app| app.environments.iter().map(|env| env.env_id.clone()))
            .collect()
    }
}

impl EnvironmentTypeResolver for AccountTopology {
    fn environment_type(&self, env_id: &EnvId) -> Option<EnvironmentType> {
        self.environment(env_id).map(|(_, env)| env.env_type)
    }
}

impl AppInventory for AccountTopology {
    fn app_ids(&self) -> BTreeSet<AppId> {
        self.apps.iter().map(|app| app.app_id.clone()).collect()
    }
}

impl EnvironmentCatalog for AccountTopology {
    fn environments(&self, app_id: &AppId) -> Vec<EnvironmentRecord> {
        self.app(app_id).map(|app| app.environments.clone()).unwrap_or_default()
    }

    fn app_name(&self, app_id: &AppId) -> Option<String> {
        self.app(app_id).map(|app| app.name.clone())
    }
}
