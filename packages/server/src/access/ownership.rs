//! Row-level checks for callers who already passed the route guard.

use crate::entity::{class, subject};
use crate::error::AppError;
use crate::identity::Identity;

/// Whether the caller coordinates `class`.
pub fn coordinates(identity: &Identity, class: &class::Model) -> bool {
    class.batch_coordinator_id == Some(identity.user_id)
}

/// HOD or the class's batch coordinator.
pub fn ensure_class_manager(identity: &Identity, class: &class::Model) -> Result<(), AppError> {
    if identity.is_hod() || coordinates(identity, class) {
        Ok(())
    } else {
        Err(AppError::PermissionDenied)
    }
}

/// HOD, the subject's assigned faculty, or the coordinator of its class.
pub fn ensure_subject_writer(
    identity: &Identity,
    subject: &subject::Model,
    class: &class::Model,
) -> Result<(), AppError> {
    let teaches = identity.faculty().is_some() && subject.faculty_id == Some(identity.user_id);
    if identity.is_hod() || teaches || coordinates(identity, class) {
        Ok(())
    } else {
        Err(AppError::PermissionDenied)
    }
}
