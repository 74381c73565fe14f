// src/models/role.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Closed set of platform roles. Stored as TEXT in `user_roles`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Student,
    Instructor,
    Admin,
}

/// What a route requires of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Enroll, learn, take quizzes, open tickets.
    Participate,
    /// Create and edit courses, lessons, questions, quizzes, assignments.
    Author,
    /// User administration and platform-wide content.
    Administer,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::Instructor, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "STUDENT",
            Role::Instructor => "INSTRUCTOR",
            Role::Admin => "ADMIN",
        }
    }

    pub fn grants(&self, capability: Capability) -> bool {
        match capability {
            Capability::Participate => true,
            Capability::Author => matches!(self, Role::Instructor | Role::Admin),
            Capability::Administer => matches!(self, Role::Admin),
        }
    }
}

/// True if any of the roles grants the capability.
pub fn has_capability(roles: &[Role], capability: Capability) -> bool {
    roles.iter().any(|r| r.grants(capability))
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        let normalized = normalized.strip_prefix("ROLE_").unwrap_or(&normalized);
        match normalized {
            "STUDENT" => Ok(Role::Student),
            "INSTRUCTOR" => Ok(Role::Instructor),
            "ADMIN" => Ok(Role::Admin),
            other => Err(format!("Unknown role '{}'", other)),
        }
    }
}
