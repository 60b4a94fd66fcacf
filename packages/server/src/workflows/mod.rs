//! Compound operations: provisioning and merge-upsert saves.

pub mod attendance;
pub mod marks;
pub mod provisioning;
