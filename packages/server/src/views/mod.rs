//! Read-only compositions of repository data for dashboards and reports.

pub mod dashboard;
pub mod performance;
