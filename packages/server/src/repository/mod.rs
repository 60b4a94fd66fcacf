//! Entity repositories. Every list is filtered by foreign key only.

pub mod assignments;
pub mod attendance;
pub mod classes;
pub mod faculty;
pub mod marks;
pub mod reconciliation;
pub mod students;
pub mod subjects;
pub mod users;
