// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use serde::Serialize;
use utoipa::ToSchema;

use crate::storage::{BingoDatabase, DbResult, ProfileRepository};
use crate::text::initials;

pub const DEFAULT_LEADERBOARD_LIMIT: usize = 50;
pub const MAX_LEADERBOARD_LIMIT: usize = 100;

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct LeaderboardEntry {
    /// 1-based position
    pub rank: usize,
    pub id: String,
    pub full_name: String,
    pub initials: String,
    pub xp: u64,
}

/// Top attendees by xp, ties broken by name.
pub fn leaderboard(db: &BingoDatabase, limit: usize) -> DbResult<Vec<LeaderboardEntry>> {
    let limit = limit.clamp(1, MAX_LEADERBOARD_LIMIT);
    let mut profiles = ProfileRepository::new(db).list_all()?;
    profiles.sort_by(|a, b| b.xp.cmp(&a.xp).then_with(|| a.full_name.cmp(&b.full_name)));

    Ok(profiles
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, p)| LeaderboardEntry {
            rank: i + 1,
            initials: initials(&p.full_name),
            id: p.id,
            full_name: p.full_name,
            xp: p.xp,
        })
        .collect())
}
