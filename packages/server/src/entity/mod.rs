pub mod assignment;
pub mod assignment_submission;
pub mod attendance;
pub mod auth_identity;
pub mod auth_session;
pub mod class;
pub mod faculty;
pub mod internal_marks;
pub mod provisioning_failure;
pub mod student;
pub mod subject;
pub mod user;
