// crates/usage-restrictions-core/src/core/document.rs
// ============================================================================
// Module: Usage Restriction Documents
// Description: Persisted wire form of restriction sets and its conversions.
// Purpose: Separate untrusted stored input from the typed restriction model.
// Dependencies: serde, crate::core::{error, filters, identifiers, restrictions}
// ============================================================================

//! ## Overview
//! Stored and submitted restrictions arrive as loosely typed JSON documents:
//! every field may be missing and filter types are free-form strings. Two
//! conversions lift a document into [`UsageRestrictions`]:
//! - [`UsageRestrictionsDocument::to_restrictions`] is strict and fails with
//!   [`RestrictionError::InvalidUsageRestriction`]. Used on the save path.
//! - [`UsageRestrictionsDocument::to_restrictions_lenient`] drops malformed
//!   pairs, which can only narrow access. Used on the read path.
//!
//! Security posture: documents are untrusted; size limits apply on save.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::error::RestrictionError;
use crate::core::filters::AppFilter;
use crate::core::filters::EnvFilter;
use crate::core::filters::EnvFilterType;
use crate::core::identifiers::AppId;
use crate::core::identifiers::EnvId;
use crate::core::restrictions::AppEnvRestriction;
use crate::core::restrictions::UsageRestrictions;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Default maximum number of restriction pairs per document.
pub const DEFAULT_MAX_APP_ENV_RESTRICTIONS: usize = 256;
/// Default maximum number of ids per filter.
pub const DEFAULT_MAX_FILTER_IDS: usize = 1024;

/// Hard limits applied by strict document validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestrictionLimits {
    /// Maximum number of restriction pairs.
    pub max_app_env_restrictions: usize,
    /// Maximum number of ids in a single filter.
    pub max_filter_ids: usize,
}

impl Default for RestrictionLimits {
    fn default() -> Self {
        Self {
            max_app_env_restrictions: DEFAULT_MAX_APP_ENV_RESTRICTIONS,
            max_filter_ids: DEFAULT_MAX_FILTER_IDS,
        }
    }
}

// ============================================================================
// SECTION: Document Types
// ============================================================================

/// Persisted restriction set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRestrictionsDocument {
    /// Restriction pairs; absent means no restrictions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_env_restrictions: Option<Vec<AppEnvRestrictionDocument>>,
}

/// Persisted restriction pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppEnvRestrictionDocument {
    /// Application filter.
    #[serde(default)]
    pub app_filter: Option<AppFilterDocument>,
    /// Environment filter.
    #[serde(default)]
    pub env_filter: Option<EnvFilterDocument>,
}

/// Persisted application filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppFilterDocument {
    /// Filter type label (`ALL`, `SELECTED`, `EXCLUDE_SELECTED`).
    #[serde(default)]
    pub filter_type: Option<String>,
    /// Application ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
}

/// Persisted environment filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvFilterDocument {
    /// Filter type labels (`PROD`, `NON_PROD`, `SELECTED`).
    #[serde(default)]
    pub filter_types: Option<Vec<String>>,
    /// Environment ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
}

// ============================================================================
// SECTION: Conversions
// ============================================================================

impl UsageRestrictionsDocument {
    /// Returns true when the document lists at least one pair.
    #[must_use]
    pub fn has_restrictions(&self) -> bool {
        self.app_env_restrictions.as_ref().is_some_and(|pairs| !pairs.is_empty())
    }

    /// Converts the document, rejecting any malformed pair.
    ///
    /// # Errors
    ///
    /// Returns [`RestrictionError::InvalidUsageRestriction`] when a filter is
    /// missing, carries an unknown type, lacks required ids, or exceeds limits.
    pub fn to_restrictions(
        &self,
        limits: &RestrictionLimits,
    ) -> Result<UsageRestrictions, RestrictionError> {
        let pairs = self.app_env_restrictions.as_deref().unwrap_or_default();
        if pairs.len() > limits.max_app_env_restrictions {
            return Err(invalid(format!(
                "restriction count {} exceeds limit {}",
                pairs.len(),
                limits.max_app_env_restrictions
            )));
        }
        let mut restrictions = UsageRestrictions::new();
        for pair in pairs {
            let app_filter = pair
                .app_filter
                .as_ref()
                .ok_or_else(|| invalid("app filter must be present".to_string()))
                .and_then(|filter| strict_app_filter(filter, limits))?;
            let env_filter = pair
                .env_filter
                .as_ref()
                .ok_or_else(|| invalid("environment filter must be present".to_string()))
                .and_then(|filter| strict_env_filter(filter, limits))?;
            restrictions.insert(AppEnvRestriction::new(app_filter, env_filter));
        }
        Ok(restrictions)
    }

    /// Converts the document, silently dropping malformed pairs.
    #[must_use]
    pub fn to_restrictions_lenient(&self) -> UsageRestrictions {
        self.app_env_restrictions
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter_map(|pair| {
                let app_filter = lenient_app_filter(pair.app_filter.as_ref()?)?;
                let env_filter = lenient_env_filter(pair.env_filter.as_ref()?)?;
                Some(AppEnvRestriction::new(app_filter, env_filter))
            })
            .collect()
    }
}

impl TryFrom<UsageRestrictionsDocument> for UsageRestrictions {
    type Error = RestrictionError;

    fn try_from(document: UsageRestrictionsDocument) -> Result<Self, Self::Error> {
        document.to_restrictions(&RestrictionLimits::default())
    }
}

impl From<&UsageRestrictions> for UsageRestrictionsDocument {
    fn from(restrictions: &UsageRestrictions) -> Self {
        let pairs = restrictions
            .iter()
            .map(|restriction| AppEnvRestrictionDocument {
                app_filter: Some(AppFilterDocument {
                    filter_type: Some(restriction.app_filter.type_label().to_string()),
                    ids: restriction
                        .app_filter
                        .ids()
                        .map(|ids| ids.iter().map(|id| id.as_str().to_string()).collect()),
                }),
                env_filter: Some(EnvFilterDocument {
                    filter_types: Some(
                        restriction
                            .env_filter
                            .filter_types
                            .iter()
                            .map(|filter_type| filter_type.as_str().to_string())
                            .collect(),
                    ),
                    ids: if restriction.env_filter.ids.is_empty() {
                        None
                    } else {
                        Some(
                            restriction
                                .env_filter
                                .ids
                                .iter()
                                .map(|id| id.as_str().to_string())
                                .collect(),
                        )
                    },
                }),
            })
            .collect();
        Self {
            app_env_restrictions: Some(pairs),
        }
    }
}

impl From<UsageRestrictions> for UsageRestrictionsDocument {
    fn from(restrictions: UsageRestrictions) -> Self {
        Self::from(&restrictions)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds an invalid-restriction error.
const fn invalid(message: String) -> RestrictionError {
    RestrictionError::InvalidUsageRestriction(message)
}

/// Validates a non-empty id list with no blank entries.
fn strict_ids(
    label: &str,
    ids: Option<&Vec<String>>,
    limits: &RestrictionLimits,
) -> Result<Vec<String>, RestrictionError> {
    let ids = ids.filter(|ids| !ids.is_empty()).ok_or_else(|| {
        invalid(format!("{label} ids must be non-empty for SELECTED filters"))
    })?;
    if ids.len() > limits.max_filter_ids {
        return Err(invalid(format!(
            "{label} id count {} exceeds limit {}",
            ids.len(),
            limits.max_filter_ids
        )));
    }
    if ids.iter().any(|id| id.trim().is_empty()) {
        return Err(invalid(format!("{label} ids must not contain empty values")));
    }
    Ok(ids.clone())
}

/// Strictly converts an application filter document.
fn strict_app_filter(
    document: &AppFilterDocument,
    limits: &RestrictionLimits,
) -> Result<AppFilter, RestrictionError> {
    let filter_type = document
        .filter_type
        .as_deref()
        .ok_or_else(|| invalid("app filter type must be present".to_string()))?;
    match filter_type {
        "ALL" => Ok(AppFilter::All),
        "SELECTED" => Ok(AppFilter::selected(strict_ids("app", document.ids.as_ref(), limits)?)),
        "EXCLUDE_SELECTED" => {
            Ok(AppFilter::exclude_selected(strict_ids("app", document.ids.as_ref(), limits)?))
        }
        other => Err(invalid(format!("unknown app filter type: {other}"))),
    }
}

/// Strictly converts an environment filter document.
fn strict_env_filter(
    document: &EnvFilterDocument,
    limits: &RestrictionLimits,
) -> Result<EnvFilter, RestrictionError> {
    let labels = document
        .filter_types
        .as_ref()
        .filter(|labels| !labels.is_empty())
        .ok_or_else(|| invalid("environment filter types must be non-empty".to_string()))?;
    let mut filter_types = BTreeSet::new();
    for label in labels {
        let filter_type = EnvFilterType::parse(label)
            .ok_or_else(|| invalid(format!("unknown environment filter type: {label}")))?;
        filter_types.insert(filter_type);
    }
    if !filter_types.contains(&EnvFilterType::Selected) {
        return Ok(EnvFilter::new(filter_types, []));
    }
    if filter_types.len() > 1 {
        return Err(invalid(
            "SELECTED environment filter cannot be combined with other types".to_string(),
        ));
    }
    let ids = strict_ids("environment", document.ids.as_ref(), limits)?;
    Ok(EnvFilter::new(filter_types, ids.into_iter().map(EnvId::new)))
}

/// Leniently converts an application filter document.
fn lenient_app_filter(document: &AppFilterDocument) -> Option<AppFilter> {
    let ids = || -> BTreeSet<AppId> {
        document
            .ids
            .iter()
            .flatten()
            .filter(|id| !id.trim().is_empty())
            .map(|id| AppId::new(id.as_str()))
            .collect()
    };
    let filter = match document.filter_type.as_deref()? {
        "ALL" => AppFilter::All,
        "SELECTED" => AppFilter::Selected(ids()),
        "EXCLUDE_SELECTED" => AppFilter::ExcludeSelected(ids()),
        _ => return None,
    };
    filter.names_any_application().then_some(filter)
}

/// Leniently converts an environment filter document.
fn lenient_env_filter(document: &EnvFilterDocument) -> Option<EnvFilter> {
    let mut filter_types = BTreeSet::new();
    for label in document.filter_types.iter().flatten() {
        filter_types.insert(EnvFilterType::parse(label)?);
    }
    let ids = if filter_types.contains(&EnvFilterType::Selected) {
        document
            .ids
            .iter()
            .flatten()
            .filter(|id| !id.trim().is_empty())
            .map(|id| EnvId::new(id.as_str()))
            .collect()
    } else {
        BTreeSet::new()
    };
    Some(EnvFilter {
        filter_types,
        ids,
    })
}
