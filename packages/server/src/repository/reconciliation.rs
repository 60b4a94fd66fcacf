use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::provisioning_failure;

/// Result of attempting to resolve a provisioning failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveResult {
    Resolved,
    NotFound,
    AlreadyResolved,
}

/// An orphaned identity to be recorded.
#[derive(Debug, Clone)]
pub struct FailureReport<'r> {
    pub workflow: &'r str,
    pub identity_id: Uuid,
    pub email: &'r str,
    pub failed_step: &'r str,
    pub error_message: String,
}

/// Reconciliation log of identities left behind by failed provisioning.
pub struct ReconciliationService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> ReconciliationService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn record(
        &self,
        report: FailureReport<'_>,
    ) -> Result<provisioning_failure::Model, DbErr> {
        provisioning_failure::ActiveModel {
            workflow: Set(report.workflow.to_string()),
            identity_id: Set(report.identity_id),
            email: Set(report.email.to_string()),
            failed_step: Set(report.failed_step.to_string()),
            error_message: Set(report.error_message),
            resolved: Set(false),
            resolved_at: Set(None),
            resolved_by: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.conn)
        .await
    }

    pub async fn list(
        &self,
        resolved: Option<bool>,
    ) -> Result<Vec<provisioning_failure::Model>, DbErr> {
        let mut query = provisioning_failure::Entity::find();
        if let Some(resolved) = resolved {
            query = query.filter(provisioning_failure::Column::Resolved.eq(resolved));
        }
        query
            .order_by_desc(provisioning_failure::Column::CreatedAt)
            .all(self.conn)
            .await
    }

    pub async fn count_unresolved(&self) -> Result<u64, DbErr> {
        provisioning_failure::Entity::find()
            .filter(provisioning_failure::Column::Resolved.eq(false))
            .count(self.conn)
            .await
    }

    /// Mark a failure as handled by `resolved_by`.
    pub async fn resolve(&self, id: i32, resolved_by: Uuid) -> Result<ResolveResult, DbErr> {
        let Some(failure) = provisioning_failure::Entity::find_by_id(id)
            .one(self.conn)
            .await?
        else {
            return Ok(ResolveResult::NotFound);
        };
        if failure.resolved {
            return Ok(ResolveResult::AlreadyResolved);
        }

        let mut active = failure.into_active_model();
        active.resolved = Set(true);
        active.resolved_at = Set(Some(Utc::now()));
        active.resolved_by = Set(Some(resolved_by));
        active.update(self.conn).await?;
        Ok(ResolveResult::Resolved)
    }
}
