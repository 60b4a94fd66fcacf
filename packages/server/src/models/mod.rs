pub mod assignment;
pub mod attendance;
pub mod auth;
pub mod class;
pub mod faculty;
pub mod marks;
pub mod reconciliation;
pub mod shared;
pub mod student;
pub mod subject;
pub mod user;
