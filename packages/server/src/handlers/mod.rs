pub mod assignments;
pub mod attendance;
pub mod auth;
pub mod classes;
pub mod dashboard;
pub mod faculty;
pub mod marks;
pub mod me;
pub mod reconciliation;
pub mod students;
pub mod subjects;
pub mod users;
