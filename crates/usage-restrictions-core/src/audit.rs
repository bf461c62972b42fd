// crates/usage-restrictions-core/src/audit.rs
// ============================================================================
// Module: Usage Restrictions Audit Logging
// Description: Structured audit events for access checks and validations.
// Purpose: Emit decision logs without hard dependencies on a logging stack.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! This module defines audit event payloads and sinks for restriction
//! decisions. Events are serialized as JSON lines so deployments can route
//! them to their preferred logging pipeline. Sinks swallow write failures:
//! auditing never changes a decision.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Labels
// ============================================================================

/// Validation entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationOperation {
    /// Entity creation.
    Save,
    /// Entity update.
    Update,
    /// Scope change guarded by setup usages.
    SetupUsages,
}

/// Maintenance entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceOperation {
    /// Removal of a deleted application or environment.
    RemoveReferences,
    /// Purge of ids that no longer exist.
    PurgeDangling,
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// Access decision audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct AccessAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Account identifier.
    pub account_id: String,
    /// Target application when provided.
    pub app_id: Option<String>,
    /// Target environment when provided.
    pub env_id: Option<String>,
    /// True when the target is a new application.
    pub for_new_app: bool,
    /// True when the entity is scoped to the account.
    pub scoped_to_account: bool,
    /// True when the principal is an account administrator.
    pub is_account_admin: bool,
    /// Whether access was allowed.
    pub allowed: bool,
    /// Decision reason label.
    pub reason: &'static str,
}

/// Validation audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Account identifier.
    pub account_id: String,
    /// Validation entry point.
    pub operation: ValidationOperation,
    /// True when the entity is scoped to the account.
    pub scoped_to_account: bool,
    /// Number of accepted restriction pairs.
    pub restriction_count: usize,
    /// Whether the restrictions were accepted.
    pub accepted: bool,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
}

/// Maintenance audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Account identifier.
    pub account_id: String,
    /// Maintenance entry point.
    pub operation: MaintenanceOperation,
    /// Application being removed, if any.
    pub app_id: Option<String>,
    /// Environment being removed, if any.
    pub env_id: Option<String>,
    /// Number of removed id references.
    pub removed: usize,
}

/// Inputs required to construct an access audit event.
pub struct AccessAuditEventParams {
    /// Account identifier.
    pub account_id: String,
    /// Target application when provided.
    pub app_id: Option<String>,
    /// Target environment when provided.
    pub env_id: Option<String>,
    /// True when the target is a new application.
    pub for_new_app: bool,
    /// True when the entity is scoped to the account.
    pub scoped_to_account: bool,
    /// True when the principal is an account administrator.
    pub is_account_admin: bool,
    /// Whether access was allowed.
    pub allowed: bool,
    /// Decision reason label.
    pub reason: &'static str,
}

/// Inputs required to construct a validation audit event.
pub struct ValidationAuditEventParams {
    /// Account identifier.
    pub account_id: String,
    /// Validation entry point.
    pub operation: ValidationOperation,
    /// True when the entity is scoped to the account.
    pub scoped_to_account: bool,
    /// Number of accepted restriction pairs.
    pub restriction_count: usize,
    /// Normalized error kind label, when rejected.
    pub error_kind: Option<&'static str>,
}

/// Inputs required to construct a maintenance audit event.
pub struct MaintenanceAuditEventParams {
    /// Account identifier.
    pub account_id: String,
    /// Maintenance entry point.
    pub operation: MaintenanceOperation,
    /// Application being removed, if any.
    pub app_id: Option<String>,
    /// Environment being removed, if any.
    pub env_id: Option<String>,
    /// Number of removed id references.
    pub removed: usize,
}

/// Returns the current time in milliseconds since the epoch.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

impl AccessAuditEvent {
    /// Creates a new access audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: AccessAuditEventParams) -> Self {
        Self {
            event: "usage_restrictions_access",
            timestamp_ms: now_ms(),
            account_id: params.account_id,
            app_id: params.app_id,
            env_id: params.env_id,
            for_new_app: params.for_new_app,
            scoped_to_account: params.scoped_to_account,
            is_account_admin: params.is_account_admin,
            allowed: params.allowed,
            reason: params.reason,
        }
    }
}

impl ValidationAuditEvent {
    /// Creates a new validation audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: ValidationAuditEventParams) -> Self {
        Self {
            event: "usage_restrictions_validation",
            timestamp_ms: now_ms(),
            account_id: params.account_id,
            operation: params.operation,
            scoped_to_account: params.scoped_to_account,
            restriction_count: params.restriction_count,
            accepted: params.error_kind.is_none(),
            error_kind: params.error_kind,
        }
    }
}

impl MaintenanceAuditEvent {
    /// Creates a new maintenance audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: MaintenanceAuditEventParams) -> Self {
        Self {
            event: "usage_restrictions_maintenance",
            timestamp_ms: now_ms(),
            account_id: params.account_id,
            operation: params.operation,
            app_id: params.app_id,
            env_id: params.env_id,
            removed: params.removed,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for restriction decisions.
pub trait RestrictionAuditSink: Send + Sync {
    /// Record an access decision.
    fn record_access(&self, event: &AccessAuditEvent);

    /// Record a validation outcome.
    fn record_validation(&self, _event: &ValidationAuditEvent) {}

    /// Record a maintenance pass.
    fn record_maintenance(&self, _event: &MaintenanceAuditEvent) {}
}

/// Writes one serialized event as a JSON line.
fn write_json_line<W: Write, T: Serialize>(writer: &mut W, event: &T) {
    if let Ok(payload) = serde_json::to_string(event) {
        let _ = writeln!(writer, "{payload}");
    }
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl RestrictionAuditSink for StderrAuditSink {
    fn record_access(&self, event: &AccessAuditEvent) {
        write_json_line(&mut io::stderr(), event);
    }

    fn record_validation(&self, event: &ValidationAuditEvent) {
        write_json_line(&mut io::stderr(), event);
    }

    fn record_maintenance(&self, event: &MaintenanceAuditEvent) {
        write_json_line(&mut io::stderr(), event);
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one event under the file lock.
    fn append<T: Serialize>(&self, event: &T) {
        if let Ok(mut guard) = self.file.lock() {
            write_json_line(&mut *guard, event);
        }
    }
}

impl RestrictionAuditSink for FileAuditSink {
    fn record_access(&self, event: &AccessAuditEvent) {
        self.append(event);
    }

    fn record_validation(&self, event: &ValidationAuditEvent) {
        self.append(event);
    }

    fn record_maintenance(&self, event: &MaintenanceAuditEvent) {
        self.append(event);
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl RestrictionAuditSink for NoopAuditSink {
    fn record_access(&self, _event: &AccessAuditEvent) {}
}
