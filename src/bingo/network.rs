// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Network view: the distinct attendees a user has scanned.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::storage::{BingoDatabase, DbResult, ProfileRepository, ScanRepository};
use crate::text::initials;

/// One scanned attendee in a user's network.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct NetworkProfile {
    pub id: String,
    pub full_name: String,
    pub initials: String,
    pub linkedin_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    /// When this attendee was most recently scanned by the user.
    pub last_scanned_at: DateTime<Utc>,
}

/// Distinct profiles scanned by `user_id`, most recently scanned first.
pub fn get_network(db: &BingoDatabase, user_id: &str) -> DbResult<Vec<NetworkProfile>> {
    let scans = ScanRepository::new(db).list_by_scanner(user_id)?;
    let profiles = ProfileRepository::new(db);

    let mut seen = HashSet::new();
    let mut network = Vec::new();
    for scan in scans {
        if !seen.insert(scan.scanned_id.clone()) {
            continue;
        }
        let Some(profile) = profiles.get(&scan.scanned_id)? else {
            tracing::warn!(scanned_id = %scan.scanned_id, "Scan references a missing profile");
            continue;
        };
        network.push(NetworkProfile {
            initials: initials(&profile.full_name),
            id: profile.id,
            full_name: profile.full_name,
            linkedin_url: profile.linkedin_url,
            github_url: profile.github_url,
            last_scanned_at: scan.created_at,
        });
    }
    Ok(network)
}
