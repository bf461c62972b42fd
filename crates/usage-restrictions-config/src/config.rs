// crates/usage-restrictions-config/src/config.rs
// ============================================================================
// Module: Usage Restrictions Configuration
// Description: Configuration loading and validation for the restriction engine.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: usage-restrictions-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing or invalid configuration fails closed. Every section is optional;
//! an empty file yields stderr auditing and the core default limits.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use usage_restrictions_core::DEFAULT_MAX_APP_ENV_RESTRICTIONS;
use usage_restrictions_core::DEFAULT_MAX_FILTER_IDS;
use usage_restrictions_core::FileAuditSink;
use usage_restrictions_core::NoopAuditSink;
use usage_restrictions_core::RestrictionAuditSink;
use usage_restrictions_core::RestrictionLimits;
use usage_restrictions_core::StderrAuditSink;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "usage-restrictions.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "USAGE_RESTRICTIONS_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Upper bound for `limits.max_app_env_restrictions`.
pub const MAX_APP_ENV_RESTRICTIONS_LIMIT: usize = 4096;
/// Upper bound for `limits.max_filter_ids`.
pub const MAX_FILTER_IDS_LIMIT: usize = 65_536;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the file failed.
    #[error("config io error: {0}")]
    Io(String),
    /// The file is not valid TOML for this model.
    #[error("config parse error: {0}")]
    Parse(String),
    /// The parsed configuration violates a constraint.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Root configuration for the usage restriction engine.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UsageRestrictionsConfig {
    /// Audit event routing.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Structural limits for strict document validation.
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl UsageRestrictionsConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order: explicit `path`, then `USAGE_RESTRICTIONS_CONFIG`,
    /// then `usage-restrictions.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config = Self::from_toml_str(content)?;
        Ok(config)
    }

    /// Parses and validates configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.audit.validate()?;
        self.limits.validate()?;
        Ok(())
    }

    /// Returns the core limits described by this configuration.
    #[must_use]
    pub const fn limits(&self) -> RestrictionLimits {
        RestrictionLimits {
            max_app_env_restrictions: self.limits.max_app_env_restrictions,
            max_filter_ids: self.limits.max_filter_ids,
        }
    }

    /// Builds the audit sink selected by `[audit]`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configured audit file cannot be opened.
    pub fn build_audit_sink(&self) -> Result<Arc<dyn RestrictionAuditSink>, ConfigError> {
        match self.audit.sink {
            AuditSinkKind::Stderr => Ok(Arc::new(StderrAuditSink)),
            AuditSinkKind::None => Ok(Arc::new(NoopAuditSink)),
            AuditSinkKind::File => {
                let path = self.audit.path.as_deref().ok_or_else(|| {
                    ConfigError::Invalid("audit.path is required for file sink".to_string())
                })?;
                let sink = FileAuditSink::new(Path::new(path.trim()))
                    .map_err(|err| ConfigError::Io(err.to_string()))?;
                Ok(Arc::new(sink))
            }
        }
    }
}

/// Audit sink selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to `audit.path`.
    File,
    /// Discard audit events.
    None,
}

/// Audit logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Where audit events are written.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Audit log path (JSON lines); required for the file sink.
    #[serde(default)]
    pub path: Option<String>,
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("audit.path is required for file sink".to_string()))
            }
            (AuditSinkKind::File, Some(path)) => validate_path_string("audit.path", path),
            (_, Some(_)) => {
                Err(ConfigError::Invalid("audit.path is only valid for file sink".to_string()))
            }
            (_, None) => Ok(()),
        }
    }
}

/// Structural limits for restriction documents.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum app/env pairs in one restriction set.
    #[serde(default = "default_max_app_env_restrictions")]
    pub max_app_env_restrictions: usize,
    /// Maximum ids in a single app or env filter.
    #[serde(default = "default_max_filter_ids")]
    pub max_filter_ids: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_app_env_restrictions: default_max_app_env_restrictions(),
            max_filter_ids: default_max_filter_ids(),
        }
    }
}

impl LimitsConfig {
    /// Validates limit ranges.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_limit_range(
            "limits.max_app_env_restrictions",
            self.max_app_env_restrictions,
            MAX_APP_ENV_RESTRICTIONS_LIMIT,
        )?;
        validate_limit_range("limits.max_filter_ids", self.max_filter_ids, MAX_FILTER_IDS_LIMIT)
    }
}

/// Default pair limit.
const fn default_max_app_env_restrictions() -> usize {
    DEFAULT_MAX_APP_ENV_RESTRICTIONS
}

/// Default filter id limit.
const fn default_max_filter_ids() -> usize {
    DEFAULT_MAX_FILTER_IDS
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a limit lies within `1..=max`.
fn validate_limit_range(field: &str, value: usize, max: usize) -> Result<(), ConfigError> {
    if value == 0 || value > max {
        return Err(ConfigError::Invalid(format!("{field} must be between 1 and {max}")));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
