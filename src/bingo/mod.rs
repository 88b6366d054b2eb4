// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Bingo Game Logic
//!
//! - `scan` - token resolution and the check-in guard chain
//! - `network` - deduplicated list of scanned attendees
//! - `leaderboard` - attendees ranked by xp

pub mod leaderboard;
pub mod network;
pub mod scan;

pub use leaderboard::{
    leaderboard, LeaderboardEntry, DEFAULT_LEADERBOARD_LIMIT, MAX_LEADERBOARD_LIMIT,
};
pub use network::{get_network, NetworkProfile};
pub use scan::{record_scan, resolve_token, ScanError, ScanReceipt, XP_PER_SCAN};
