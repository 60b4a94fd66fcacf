use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed set of roles. Every role string read from or written to the store
/// goes through this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Hod,
    Faculty,
    BatchCoordinator,
    Student,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Hod,
        Role::Faculty,
        Role::BatchCoordinator,
        Role::Student,
    ];

    /// Canonical storage form.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Hod => "hod",
            Role::Faculty => "faculty",
            Role::BatchCoordinator => "batch_coordinator",
            Role::Student => "student",
        }
    }

    /// Normalise a role string from any call site.
    ///
    /// Case, surrounding whitespace and `-`/space/`_` separators are ignored, so
    /// `HOD`, `Batch Coordinator`, `BatchCoordinator` and `batch-coordinator` all parse.
    /// Anything else is `None`, which callers must treat as unauthorized.
    pub fn parse(raw: &str) -> Option<Role> {
        let folded: String = raw
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match folded.as_str() {
            "hod" | "headofdepartment" => Some(Role::Hod),
            "faculty" => Some(Role::Faculty),
            "batchcoordinator" => Some(Role::BatchCoordinator),
            "student" => Some(Role::Student),
            _ => None,
        }
    }

    /// Dashboard a signed-in user of this role lands on.
    pub fn landing_route(self) -> &'static str {
        match self {
            Role::Hod => "/hod/dashboard",
            Role::Faculty => "/faculty/dashboard",
            Role::BatchCoordinator => "/batch-coordinator/dashboard",
            Role::Student => "/student/dashboard",
        }
    }

    /// Whether the role needs a `faculty` profile row.
    pub fn is_staff_profile(self) -> bool {
        matches!(self, Role::Faculty | Role::BatchCoordinator)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
