// crates/usage-restrictions-core/src/runtime/service.rs
// ============================================================================
// Module: Usage Restriction Service
// Description: Account-bound façade over evaluation, validation, and cleanup.
// Purpose: Bind topology, limits, and auditing to the pure restriction functions.
// Dependencies: crate::{audit, core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! [`UsageRestrictionService`] holds one account's topology snapshot, the
//! configured limits, and an audit sink. Each method delegates to the pure
//! functions of this crate and records one audit event for decisions,
//! validations, and maintenance passes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::audit::AccessAuditEvent;
use crate::audit::AccessAuditEventParams;
use crate::audit::MaintenanceAuditEvent;
use crate::audit::MaintenanceAuditEventParams;
use crate::audit::MaintenanceOperation;
use crate::audit::NoopAuditSink;
use crate::audit::RestrictionAuditSink;
use crate::audit::ValidationAuditEvent;
use crate::audit::ValidationAuditEventParams;
use crate::audit::ValidationOperation;
use crate::core::AccountId;
use crate::core::Action;
use crate::core::AppEnvMap;
use crate::core::AppId;
use crate::core::EnvId;
use crate::core::PermissionSnapshot;
use crate::core::PrincipalContext;
use crate::core::RestrictionError;
use crate::core::RestrictionLimits;
use crate::core::UsageRestrictions;
use crate::core::UsageRestrictionsDocument;
use crate::core::UserGroup;
use crate::interfaces::EnvironmentCatalog;
use crate::interfaces::EnvironmentTypeResolver;
use crate::runtime::aggregator;
use crate::runtime::evaluator;
use crate::runtime::evaluator::AccessDecision;
use crate::runtime::evaluator::AccessRequest;
use crate::runtime::intersect;
use crate::runtime::maintenance;
use crate::runtime::maintenance::CleanupOutcome;
use crate::runtime::summary;
use crate::runtime::summary::RestrictionsSummary;
use crate::runtime::validator;
use crate::runtime::validator::SaveRequest;
use crate::runtime::validator::UpdateRequest;

// ============================================================================
// SECTION: Service
// ============================================================================

/// Restriction service bound to one account.
pub struct UsageRestrictionService<C> {
    /// Account served.
    account_id: AccountId,
    /// Topology snapshot of the account.
    catalog: C,
    /// Validation limits.
    limits: RestrictionLimits,
    /// Audit sink.
    audit: Arc<dyn RestrictionAuditSink>,
}

impl<C> UsageRestrictionService<C>
where
    C: EnvironmentCatalog + EnvironmentTypeResolver,
{
    /// Creates a service with default limits and no auditing.
    #[must_use]
    pub fn new(account_id: AccountId, catalog: C) -> Self {
        Self {
            account_id,
            catalog,
            limits: RestrictionLimits::default(),
            audit: Arc::new(NoopAuditSink),
        }
    }

    /// Replaces the validation limits.
    #[must_use]
    pub const fn with_limits(mut self, limits: RestrictionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Replaces the audit sink.
    #[must_use]
    pub fn with_audit_sink(mut self, audit: Arc<dyn RestrictionAuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Returns the account served.
    #[must_use]
    pub const fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// Returns the topology snapshot.
    #[must_use]
    pub const fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Returns the validation limits.
    #[must_use]
    pub const fn limits(&self) -> &RestrictionLimits {
        &self.limits
    }

    // ------------------------------------------------------------------------
    // Evaluation
    // ------------------------------------------------------------------------

    /// Evaluates and audits an access request.
    #[must_use]
    pub fn evaluate_access(&self, request: &AccessRequest<'_>) -> AccessDecision {
        let decision = evaluator::evaluate_access(request, &self.catalog);
        self.audit.record_access(&AccessAuditEvent::new(AccessAuditEventParams {
            account_id: request.account_id.to_string(),
            app_id: request.app_id.map(ToString::to_string),
            env_id: request.env_id.map(ToString::to_string),
            for_new_app: request.for_new_app,
            scoped_to_account: request.scoped_to_account,
            is_account_admin: request.is_account_admin,
            allowed: decision.allowed,
            reason: decision.reason,
        }));
        decision
    }

    /// Evaluates an access request for an actor against an entity's restrictions.
    #[must_use]
    pub fn has_access(
        &self,
        actor: &PrincipalContext,
        target: (Option<&AppId>, Option<&EnvId>),
        entity: Option<&UsageRestrictions>,
        scoped_to_account: bool,
    ) -> bool {
        let (app_id, env_id) = target;
        let request = AccessRequest {
            account_id: &self.account_id,
            is_account_admin: actor.is_account_admin,
            app_id,
            env_id,
            for_new_app: false,
            entity_restrictions: entity,
            principal_restrictions: None,
            principal_app_env_map: None,
            scoped_to_account,
        }
        .with_principal(&actor.read);
        self.evaluate_access(&request).allowed
    }

    /// Returns true when `child` grants nothing beyond `parent`.
    #[must_use]
    pub fn is_subset(
        &self,
        child: Option<&UsageRestrictions>,
        parent: Option<&UsageRestrictions>,
    ) -> bool {
        evaluator::is_usage_restrictions_subset(child, parent, &self.catalog)
    }

    // ------------------------------------------------------------------------
    // Aggregation
    // ------------------------------------------------------------------------

    /// Builds the restrictions implied by groups for an action.
    #[must_use]
    pub fn restrictions_from_user_groups(
        &self,
        action: Action,
        groups: &[UserGroup],
    ) -> UsageRestrictions {
        aggregator::restrictions_from_user_groups(action, groups, &self.catalog)
    }

    /// Builds an actor context for this account.
    #[must_use]
    pub fn principal_context(
        &self,
        is_account_admin: bool,
        groups: &[UserGroup],
        snapshot: &PermissionSnapshot,
    ) -> PrincipalContext {
        aggregator::principal_context(
            self.account_id.clone(),
            is_account_admin,
            groups,
            snapshot,
            &self.catalog,
        )
    }

    /// Proposes restrictions for a new entity.
    #[must_use]
    pub fn default_usage_restrictions(
        &self,
        app_id: Option<&AppId>,
        env_id: Option<&EnvId>,
        groups: &[UserGroup],
    ) -> Option<UsageRestrictions> {
        aggregator::default_usage_restrictions(app_id, env_id, groups, &self.catalog)
    }

    /// Summarizes the actor's update scope.
    #[must_use]
    pub fn restrictions_summary(&self, actor: Option<&PrincipalContext>) -> RestrictionsSummary {
        summary::restrictions_summary(actor.map(|actor| &actor.update), &self.catalog)
    }

    // ------------------------------------------------------------------------
    // Intersection
    // ------------------------------------------------------------------------

    /// Returns the restrictions both sets admit.
    #[must_use]
    pub fn common_restrictions(
        &self,
        left: &UsageRestrictions,
        right: &UsageRestrictions,
    ) -> UsageRestrictions {
        intersect::common_restrictions(left, right, &self.catalog)
    }

    /// Narrows entity restrictions to what the actor may grant.
    #[must_use]
    pub fn maximum_allowed_restrictions(
        &self,
        entity: Option<&UsageRestrictions>,
        actor: Option<&PrincipalContext>,
    ) -> Option<UsageRestrictions> {
        let Some(actor) = actor else {
            return entity.cloned();
        };
        intersect::maximum_allowed_restrictions(entity, Some(&actor.update), &self.catalog)
    }

    // ------------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------------

    /// Validates and audits restrictions submitted with a new entity.
    ///
    /// # Errors
    ///
    /// Returns [`RestrictionError`] for the first failed check.
    pub fn validate_on_save(
        &self,
        scoped_to_account: bool,
        restrictions: Option<&UsageRestrictionsDocument>,
        actor: Option<&PrincipalContext>,
    ) -> Result<Option<UsageRestrictions>, RestrictionError> {
        let request = SaveRequest {
            account_id: &self.account_id,
            scoped_to_account,
            restrictions,
            actor,
        };
        let result = validator::validate_on_save(&request, &self.limits, &self.catalog);
        self.record_validation(ValidationOperation::Save, scoped_to_account, &result);
        result
    }

    /// Validates and audits restrictions submitted with an entity update.
    ///
    /// # Errors
    ///
    /// Returns [`RestrictionError`] for the first failed check.
    pub fn validate_on_update(
        &self,
        scoped_to_account: bool,
        old_restrictions: Option<&UsageRestrictions>,
        new_restrictions: Option<&UsageRestrictionsDocument>,
        actor: Option<&PrincipalContext>,
    ) -> Result<Option<UsageRestrictions>, RestrictionError> {
        let request = UpdateRequest {
            account_id: &self.account_id,
            scoped_to_account,
            old_restrictions,
            new_restrictions,
            actor,
        };
        let result = validator::validate_on_update(&request, &self.limits, &self.catalog);
        self.record_validation(ValidationOperation::Update, scoped_to_account, &result);
        result
    }

    /// Validates and audits a scope change against current setup usages.
    ///
    /// # Errors
    ///
    /// Returns [`RestrictionError`] when a usage falls outside the new scope.
    pub fn validate_setup_usages(
        &self,
        setup_usages: &AppEnvMap,
        new_restrictions: Option<&UsageRestrictions>,
    ) -> Result<(), RestrictionError> {
        let result =
            validator::validate_setup_usages(setup_usages, new_restrictions, &self.catalog);
        let count = new_restrictions.map_or(0, UsageRestrictions::len);
        self.audit.record_validation(&ValidationAuditEvent::new(ValidationAuditEventParams {
            account_id: self.account_id.to_string(),
            operation: ValidationOperation::SetupUsages,
            scoped_to_account: false,
            restriction_count: count,
            error_kind: result.as_ref().err().map(RestrictionError::kind),
        }));
        result
    }

    /// Records a validation outcome.
    fn record_validation(
        &self,
        operation: ValidationOperation,
        scoped_to_account: bool,
        result: &Result<Option<UsageRestrictions>, RestrictionError>,
    ) {
        let (restriction_count, error_kind) = match result {
            Ok(restrictions) => (restrictions.as_ref().map_or(0, UsageRestrictions::len), None),
            Err(err) => (0, Some(err.kind())),
        };
        self.audit.record_validation(&ValidationAuditEvent::new(ValidationAuditEventParams {
            account_id: self.account_id.to_string(),
            operation,
            scoped_to_account,
            restriction_count,
            error_kind,
        }));
    }

    // ------------------------------------------------------------------------
    // Maintenance
    // ------------------------------------------------------------------------

    /// Removes and audits references to a deleted application or environment.
    #[must_use]
    pub fn remove_app_env_references(
        &self,
        restrictions: &UsageRestrictions,
        app_id: &AppId,
        env_id: Option<&EnvId>,
    ) -> CleanupOutcome {
        let outcome = maintenance::remove_app_env_references(restrictions, app_id, env_id);
        self.record_maintenance(
            MaintenanceOperation::RemoveReferences,
            Some(app_id),
            env_id,
            outcome.removed,
        );
        outcome
    }

    /// Purges and audits ids no longer present in the topology.
    #[must_use]
    pub fn purge_dangling_references(&self, restrictions: &UsageRestrictions) -> CleanupOutcome {
        let existing_apps = self.catalog.app_ids();
        let existing_envs: BTreeSet<EnvId> = existing_apps
            .iter()
            .flat_map(|app_id| self.catalog.environments(app_id))
            .map(|env| env.env_id)
            .collect();
        let outcome =
            maintenance::purge_dangling_references(restrictions, &existing_apps, &existing_envs);
        self.record_maintenance(MaintenanceOperation::PurgeDangling, None, None, outcome.removed);
        outcome
    }

    /// Records a maintenance pass.
    fn record_maintenance(
        &self,
        operation: MaintenanceOperation,
        app_id: Option<&AppId>,
        env_id: Option<&EnvId>,
        removed: usize,
    ) {
        self.audit.record_maintenance(&MaintenanceAuditEvent::new(MaintenanceAuditEventParams {
            account_id: self.account_id.to_string(),
            operation,
            app_id: app_id.map(ToString::to_string),
            env_id: env_id.map(ToString::to_string),
            removed,
        }));
    }
}
