// crates/usage-restrictions-core/src/core/restrictions.rs
// ============================================================================
// Module: Usage Restriction Sets
// Description: App/environment restriction pairs and their disjunction.
// Purpose: Provide the canonical restriction set with membership queries.
// Dependencies: serde, crate::core::{document, filters, identifiers}
// ============================================================================

//! ## Overview
//! A [`UsageRestrictions`] value is a set of [`AppEnvRestriction`] pairs read
//! as a disjunction: a target is admitted when any pair admits it. Each pair
//! is the conjunction of its application filter and environment filter.
//!
//! An empty set and an absent set both mean "no restrictions were granted".
//! Whether that denies or defers to account scope is decided by the
//! evaluator, never by this type.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::document::UsageRestrictionsDocument;
use crate::core::filters::AppFilter;
use crate::core::filters::EnvFilter;
use crate::core::filters::EnvFilterType;
use crate::core::identifiers::AppId;
use crate::core::identifiers::EnvId;
use crate::interfaces::EnvironmentTypeResolver;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Concrete application to environment-id expansion of a restriction set.
pub type AppEnvMap = BTreeMap<AppId, BTreeSet<EnvId>>;

/// One conjunctive restriction: an application filter and an environment filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AppEnvRestriction {
    /// Applications admitted by this pair.
    pub app_filter: AppFilter,
    /// Environments admitted by this pair.
    pub env_filter: EnvFilter,
}

impl AppEnvRestriction {
    /// Creates a restriction pair.
    #[must_use]
    pub const fn new(app_filter: AppFilter, env_filter: EnvFilter) -> Self {
        Self {
            app_filter,
            env_filter,
        }
    }

    /// Returns true when the pair admits the target.
    ///
    /// Without an environment id the pair admits the application when its
    /// environment filter admits anything.
    #[must_use]
    pub fn matches<R>(&self, app_id: &AppId, env_id: Option<&EnvId>, resolver: &R) -> bool
    where
        R: EnvironmentTypeResolver + ?Sized,
    {
        if !self.app_filter.matches(app_id) {
            return false;
        }
        env_id.map_or_else(
            || !self.env_filter.is_empty(),
            |env_id| self.env_filter.matches(env_id, resolver),
        )
    }

    /// Returns true when the pair admits nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.app_filter.names_any_application() || self.env_filter.is_empty()
    }
}

/// Disjunction of restriction pairs attached to an entity or principal.
///
/// # Invariants
/// - Pairs are deduplicated by value and iterate in a stable order.
/// - Serialized through [`UsageRestrictionsDocument`]; deserialization is strict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UsageRestrictionsDocument", into = "UsageRestrictionsDocument")]
pub struct UsageRestrictions {
    /// Restriction pairs.
    app_env_restrictions: BTreeSet<AppEnvRestriction>,
}

impl UsageRestrictions {
    /// Creates an empty restriction set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            app_env_restrictions: BTreeSet::new(),
        }
    }

    /// Adds a pair, returning false when an equal pair was already present.
    pub fn insert(&mut self, restriction: AppEnvRestriction) -> bool {
        self.app_env_restrictions.insert(restriction)
    }

    /// Iterates restriction pairs in stable order.
    pub fn iter(&self) -> impl Iterator<Item = &AppEnvRestriction> {
        self.app_env_restrictions.iter()
    }

    /// Returns the number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.app_env_restrictions.len()
    }

    /// Returns true when the set carries no pair.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.app_env_restrictions.is_empty()
    }

    /// Returns true when any pair admits the target.
    #[must_use]
    pub fn matches<R>(&self, app_id: &AppId, env_id: Option<&EnvId>, resolver: &R) -> bool
    where
        R: EnvironmentTypeResolver + ?Sized,
    {
        self.iter().any(|restriction| restriction.matches(app_id, env_id, resolver))
    }

    /// Returns true when some pair admits the application and carries the tag.
    #[must_use]
    pub fn has_all_env_access_of_type(&self, app_id: &AppId, filter_type: EnvFilterType) -> bool {
        self.iter().any(|restriction| {
            restriction.app_filter.matches(app_id) && restriction.env_filter.has_type(filter_type)
        })
    }

    /// Returns true when some all-applications pair carries the tag.
    #[must_use]
    pub fn has_account_wide_access_of_type(&self, filter_type: EnvFilterType) -> bool {
        self.iter().any(|restriction| {
            restriction.app_filter == AppFilter::All && restriction.env_filter.has_type(filter_type)
        })
    }

    /// Returns true when every environment of every application is admitted.
    #[must_use]
    pub fn has_all_env_access(&self) -> bool {
        self.has_account_wide_access_of_type(EnvFilterType::Prod)
            && self.has_account_wide_access_of_type(EnvFilterType::NonProd)
    }

    /// Returns true when some pair admits every application.
    #[must_use]
    pub fn has_all_app_access(&self) -> bool {
        self.iter().any(|restriction| restriction.app_filter == AppFilter::All)
    }
}

impl FromIterator<AppEnvRestriction> for UsageRestrictions {
    fn from_iter<I: IntoIterator<Item = AppEnvRestriction>>(iter: I) -> Self {
        Self {
            app_env_restrictions: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for UsageRestrictions {
    type Item = AppEnvRestriction;
    type IntoIter = std::collections::btree_set::IntoIter<AppEnvRestriction>;

    fn into_iter(self) -> Self::IntoIter {
        self.app_env_restrictions.into_iter()
    }
}

impl<'a> IntoIterator for &'a UsageRestrictions {
    type Item = &'a AppEnvRestriction;
    type IntoIter = std::collections::btree_set::Iter<'a, AppEnvRestriction>;

    fn into_iter(self) -> Self::IntoIter {
        self.app_env_restrictions.iter()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns true when restrictions are absent or carry no pair.
#[must_use]
pub fn has_no_restrictions(restrictions: Option<&UsageRestrictions>) -> bool {
    restrictions.is_none_or(UsageRestrictions::is_empty)
}
