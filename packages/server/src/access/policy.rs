//! Required role sets, one per route family.

use crate::identity::Role;

pub const HOD: &[Role] = &[Role::Hod];

/// Faculty pages. Coordinators are faculty too.
pub const FACULTY: &[Role] = &[Role::Faculty, Role::BatchCoordinator];

pub const COORDINATOR: &[Role] = &[Role::BatchCoordinator];

/// Coordinator pages an HOD may also act on.
pub const ROSTER: &[Role] = &[Role::Hod, Role::BatchCoordinator];

pub const STUDENT: &[Role] = &[Role::Student];

/// Anyone on the teaching side.
pub const STAFF: &[Role] = &[Role::Hod, Role::Faculty, Role::BatchCoordinator];

pub const ANY: &[Role] = &Role::ALL;
