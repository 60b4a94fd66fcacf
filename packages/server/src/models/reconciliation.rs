use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::provisioning_failure;

#[derive(Deserialize, utoipa::IntoParams)]
pub struct ReconciliationQuery {
    /// Defaults to unresolved entries only.
    pub resolved: Option<bool>,
}

/// An auth identity left without its profile rows.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ProvisioningFailureResponse {
    pub id: i32,
    #[schema(example = "add_student")]
    pub workflow: String,
    pub identity_id: Uuid,
    pub email: String,
    #[schema(example = "insert_user")]
    pub failed_step: String,
    pub error_message: String,
    pub resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<provisioning_failure::Model> for ProvisioningFailureResponse {
    fn from(m: provisioning_failure::Model) -> Self {
        Self {
            id: m.id,
            workflow: m.workflow,
            identity_id: m.identity_id,
            email: m.email,
            failed_step: m.failed_step,
            error_message: m.error_message,
            resolved: m.resolved,
            resolved_at: m.resolved_at,
            resolved_by: m.resolved_by,
            created_at: m.created_at,
        }
    }
}
