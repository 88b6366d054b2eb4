// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles for authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::Profile;

/// User roles for authorization.
///
/// ## Role Hierarchy
///
/// - `Admin` - Manages questions and reads stats, plus everything an attendee can do
/// - `Attendee` - Plays the game with their own profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Attendee,
}

impl Role {
    /// Role granted by a saved profile.
    pub fn of(profile: &Profile) -> Role {
        if profile.is_admin {
            Role::Admin
        } else {
            Role::Attendee
        }
    }

    /// Check if this role has at least the privileges of the required role.
    pub fn has_privilege(&self, required: Role) -> bool {
        matches!(
            (self, required),
            (Role::Admin, _) | (Role::Attendee, Role::Attendee)
        )
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Attendee
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Attendee => write!(f, "attendee"),
        }
    }
}
