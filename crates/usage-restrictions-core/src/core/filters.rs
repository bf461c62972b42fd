// crates/usage-restrictions-core/src/core/filters.rs
// ============================================================================
// Module: Usage Restrictions Filters
// Description: Application and environment filters with their set algebra.
// Purpose: Provide the two halves of an app/environment restriction pair.
// Dependencies: serde, crate::interfaces
// ============================================================================

//! ## Overview
//! An [`AppFilter`] selects applications; an [`EnvFilter`] selects
//! environments by type tag or by explicit id. Both filters know how to match
//! a single target, expand into concrete ids against an inventory, and
//! intersect with another filter of the same kind.
//!
//! Environment type tags admit environments of that type and environments
//! typed [`EnvironmentType::All`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::AppId;
use crate::core::identifiers::EnvId;
use crate::interfaces::EnvironmentRecord;
use crate::interfaces::EnvironmentTypeResolver;

// ============================================================================
// SECTION: Environment Types
// ============================================================================

/// Classification of a concrete environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnvironmentType {
    /// Production environment.
    Prod,
    /// Non-production environment.
    NonProd,
    /// Environment that satisfies every type check.
    All,
}

impl EnvironmentType {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prod => "PROD",
            Self::NonProd => "NON_PROD",
            Self::All => "ALL",
        }
    }
}

/// Environment filter tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnvFilterType {
    /// Every production environment.
    Prod,
    /// Every non-production environment.
    NonProd,
    /// The environments listed in [`EnvFilter::ids`].
    Selected,
}

impl EnvFilterType {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prod => "PROD",
            Self::NonProd => "NON_PROD",
            Self::Selected => "SELECTED",
        }
    }

    /// Parses a wire label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PROD" => Some(Self::Prod),
            "NON_PROD" => Some(Self::NonProd),
            "SELECTED" => Some(Self::Selected),
            _ => None,
        }
    }

    /// Returns the environment type this tag grants wholesale.
    #[must_use]
    pub const fn environment_type(self) -> Option<EnvironmentType> {
        match self {
            Self::Prod => Some(EnvironmentType::Prod),
            Self::NonProd => Some(EnvironmentType::NonProd),
            Self::Selected => None,
        }
    }
}

// ============================================================================
// SECTION: Application Filter
// ============================================================================

/// Application selector of a restriction pair.
///
/// # Invariants
/// - `Selected` and `ExcludeSelected` with empty ids name no application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "filterType", content = "ids", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppFilter {
    /// Every application of the account.
    All,
    /// Only the listed applications.
    Selected(BTreeSet<AppId>),
    /// Every application except the listed ones.
    ExcludeSelected(BTreeSet<AppId>),
}

impl AppFilter {
    /// Builds a `Selected` filter from ids.
    #[must_use]
    pub fn selected<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<AppId>,
    {
        Self::Selected(ids.into_iter().map(Into::into).collect())
    }

    /// Builds an `ExcludeSelected` filter from ids.
    #[must_use]
    pub fn exclude_selected<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<AppId>,
    {
        Self::ExcludeSelected(ids.into_iter().map(Into::into).collect())
    }

    /// Returns the stable wire label of the filter type.
    #[must_use]
    pub const fn type_label(&self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Selected(_) => "SELECTED",
            Self::ExcludeSelected(_) => "EXCLUDE_SELECTED",
        }
    }

    /// Returns the listed ids, if the filter carries any.
    #[must_use]
    pub const fn ids(&self) -> Option<&BTreeSet<AppId>> {
        match self {
            Self::All => None,
            Self::Selected(ids) | Self::ExcludeSelected(ids) => Some(ids),
        }
    }

    /// Returns true when the filter admits the application.
    #[must_use]
    pub fn matches(&self, app_id: &AppId) -> bool {
        match self {
            Self::All => true,
            Self::Selected(ids) => ids.contains(app_id),
            Self::ExcludeSelected(ids) => !ids.is_empty() && !ids.contains(app_id),
        }
    }

    /// Returns true when the filter names at least one application.
    #[must_use]
    pub fn names_any_application(&self) -> bool {
        match self {
            Self::All => true,
            Self::Selected(ids) | Self::ExcludeSelected(ids) => !ids.is_empty(),
        }
    }

    /// Expands the filter into concrete application ids.
    ///
    /// `Selected` ids are returned as listed, even when absent from `universe`.
    #[must_use]
    pub fn resolve(&self, universe: &BTreeSet<AppId>) -> BTreeSet<AppId> {
        match self {
            Self::All => universe.clone(),
            Self::Selected(ids) => ids.clone(),
            Self::ExcludeSelected(ids) if ids.is_empty() => BTreeSet::new(),
            Self::ExcludeSelected(ids) => universe.difference(ids).cloned().collect(),
        }
    }

    /// Rewrites `ExcludeSelected` as `Selected` against the given universe.
    #[must_use]
    pub fn into_inclusive(self, universe: &BTreeSet<AppId>) -> Self {
        match self {
            Self::ExcludeSelected(_) => Self::Selected(self.resolve(universe)),
            other => other,
        }
    }

    /// Returns the filter admitting exactly the applications both filters admit.
    ///
    /// Returns `None` when the intersection is provably empty.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        if !self.names_any_application() || !other.names_any_application() {
            return None;
        }
        let common = match (self, other) {
            (Self::All, filter) | (filter, Self::All) => filter.clone(),
            (Self::Selected(left), Self::Selected(right)) => {
                Self::Selected(left.intersection(right).cloned().collect())
            }
            (Self::Selected(included), Self::ExcludeSelected(excluded))
            | (Self::ExcludeSelected(excluded), Self::Selected(included)) => {
                Self::Selected(included.difference(excluded).cloned().collect())
            }
            (Self::ExcludeSelected(left), Self::ExcludeSelected(right)) => {
                Self::ExcludeSelected(left.union(right).cloned().collect())
            }
        };
        match &common {
            Self::Selected(ids) if ids.is_empty() => None,
            _ => Some(common),
        }
    }
}

// ============================================================================
// SECTION: Environment Filter
// ============================================================================

/// Environment selector of a restriction pair.
///
/// # Invariants
/// - `ids` are meaningful only when `filter_types` contains `Selected`.
/// - Empty `filter_types` admits no environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvFilter {
    /// Type tags granted by this filter.
    #[serde(default)]
    pub filter_types: BTreeSet<EnvFilterType>,
    /// Explicit environment ids (paired with `Selected`).
    #[serde(default)]
    pub ids: BTreeSet<EnvId>,
}

impl EnvFilter {
    /// Builds a filter from tags and ids.
    #[must_use]
    pub fn new<T, I>(filter_types: T, ids: I) -> Self
    where
        T: IntoIterator<Item = EnvFilterType>,
        I: IntoIterator<Item = EnvId>,
    {
        Self {
            filter_types: filter_types.into_iter().collect(),
            ids: ids.into_iter().collect(),
        }
    }

    /// Builds a tag-only filter.
    #[must_use]
    pub fn of_types<T>(filter_types: T) -> Self
    where
        T: IntoIterator<Item = EnvFilterType>,
    {
        Self::new(filter_types, [])
    }

    /// Builds a filter granting every production and non-production environment.
    #[must_use]
    pub fn all_types() -> Self {
        Self::of_types([EnvFilterType::Prod, EnvFilterType::NonProd])
    }

    /// Builds a `Selected` filter over explicit ids.
    #[must_use]
    pub fn selected<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<EnvId>,
    {
        Self::new([EnvFilterType::Selected], ids.into_iter().map(Into::into))
    }

    /// Returns true when the filter carries the tag.
    #[must_use]
    pub fn has_type(&self, filter_type: EnvFilterType) -> bool {
        self.filter_types.contains(&filter_type)
    }

    /// Returns true when the filter admits no environment at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let wholesale = self.has_type(EnvFilterType::Prod) || self.has_type(EnvFilterType::NonProd);
        !wholesale && (!self.has_type(EnvFilterType::Selected) || self.ids.is_empty())
    }

    /// Returns true when a type tag admits environments of the given type.
    #[must_use]
    pub fn admits_type(&self, env_type: EnvironmentType) -> bool {
        match env_type {
            EnvironmentType::Prod => self.has_type(EnvFilterType::Prod),
            EnvironmentType::NonProd => self.has_type(EnvFilterType::NonProd),
            EnvironmentType::All => {
                self.has_type(EnvFilterType::Prod) || self.has_type(EnvFilterType::NonProd)
            }
        }
    }

    /// Returns true when the filter admits the environment.
    ///
    /// Environments unknown to the resolver match only by explicit id.
    #[must_use]
    pub fn matches<R>(&self, env_id: &EnvId, resolver: &R) -> bool
    where
        R: EnvironmentTypeResolver + ?Sized,
    {
        if self.has_type(EnvFilterType::Selected) && self.ids.contains(env_id) {
            return true;
        }
        resolver.environment_type(env_id).is_some_and(|env_type| self.admits_type(env_type))
    }

    /// Expands the filter over one application's environments.
    #[must_use]
    pub fn resolve(&self, environments: &[EnvironmentRecord]) -> BTreeSet<EnvId> {
        let selected = self.has_type(EnvFilterType::Selected);
        environments
            .iter()
            .filter(|env| {
                (selected && self.ids.contains(&env.env_id)) || self.admits_type(env.env_type)
            })
            .map(|env| env.env_id.clone())
            .collect()
    }

    /// Returns the filter admitting exactly the environments both filters admit.
    ///
    /// Explicit ids on either side survive when the other side admits them by
    /// id or by type. Returns `None` when nothing survives.
    #[must_use]
    pub fn intersect<R>(&self, other: &Self, resolver: &R) -> Option<Self>
    where
        R: EnvironmentTypeResolver + ?Sized,
    {
        let mut filter_types: BTreeSet<EnvFilterType> = self
            .filter_types
            .intersection(&other.filter_types)
            .copied()
            .filter(|filter_type| *filter_type != EnvFilterType::Selected)
            .collect();
        let mut ids: BTreeSet<EnvId> = BTreeSet::new();
        if self.has_type(EnvFilterType::Selected) && other.has_type(EnvFilterType::Selected) {
            ids.extend(self.ids.intersection(&other.ids).cloned());
        }
        ids.extend(self.selected_ids_admitted_by(other, resolver));
        ids.extend(other.selected_ids_admitted_by(self, resolver));
        if !ids.is_empty() {
            filter_types.insert(EnvFilterType::Selected);
        }
        if filter_types.is_empty() {
            return None;
        }
        Some(Self {
            filter_types,
            ids,
        })
    }

    /// Returns the explicit ids of this filter that `other` admits by type.
    fn selected_ids_admitted_by<R>(&self, other: &Self, resolver: &R) -> Vec<EnvId>
    where
        R: EnvironmentTypeResolver + ?Sized,
    {
        if !self.has_type(EnvFilterType::Selected) {
            return Vec::new();
        }
        self.ids
            .iter()
            .filter(|env_id| {
                resolver.environment_type(env_id).is_some_and(|env_type| other.admits_type(env_type))
            })
            .cloned()
            .collect()
    }
}
