// crates/usage-restrictions-core/src/runtime/intersect.rs
// ============================================================================
// Module: Restriction Intersector
// Description: Computes the common part of two restriction sets.
// Purpose: Narrow restrictions to what two parties both admit.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The intersection of two disjunctions is the disjunction of pairwise
//! intersections. A pair survives when its application filter intersects to
//! at least one application of the account and its environment filter
//! intersects to something non-empty.
//!
//! The operation is pure: inputs are borrowed and never modified. It is
//! commutative up to set equality because explicit environment ids are
//! resolved symmetrically (see [`EnvFilter::intersect`]).
//!
//! [`EnvFilter::intersect`]: crate::core::EnvFilter::intersect

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::AppEnvRestriction;
use crate::core::PrincipalRestrictions;
use crate::core::UsageRestrictions;
use crate::interfaces::AppInventory;
use crate::interfaces::EnvironmentTypeResolver;

// ============================================================================
// SECTION: Intersection
// ============================================================================

/// Returns the restrictions admitted by both `left` and `right`.
///
/// `All` and `ExcludeSelected` results are checked against the catalog's
/// applications; pairs that admit none of them are dropped.
#[must_use]
pub fn common_restrictions<C>(
    left: &UsageRestrictions,
    right: &UsageRestrictions,
    catalog: &C,
) -> UsageRestrictions
where
    C: AppInventory + EnvironmentTypeResolver + ?Sized,
{
    let mut common = UsageRestrictions::new();
    let mut universe = None;
    for left_pair in left {
        for right_pair in right {
            let Some(app_filter) = left_pair.app_filter.intersect(&right_pair.app_filter) else {
                continue;
            };
            if app_filter.resolve(universe.get_or_insert_with(|| catalog.app_ids())).is_empty() {
                continue;
            }
            let Some(env_filter) = left_pair.env_filter.intersect(&right_pair.env_filter, catalog)
            else {
                continue;
            };
            common.insert(AppEnvRestriction::new(app_filter, env_filter));
        }
    }
    common
}

/// Narrows entity restrictions to what the principal may grant.
///
/// Absent or empty entity restrictions are returned unchanged. A principal
/// without update restrictions narrows everything away.
#[must_use]
pub fn maximum_allowed_restrictions<C>(
    entity: Option<&UsageRestrictions>,
    principal: Option<&PrincipalRestrictions>,
    catalog: &C,
) -> Option<UsageRestrictions>
where
    C: AppInventory + EnvironmentTypeResolver + ?Sized,
{
    let entity = entity?;
    if entity.is_empty() {
        return Some(entity.clone());
    }
    let Some(principal) = principal.filter(|p| !p.restrictions.is_empty()) else {
        return Some(UsageRestrictions::new());
    };
    Some(common_restrictions(entity, &principal.restrictions, catalog))
}
