// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Networking Bingo - Conference check-in service
//!
//! Attendees scan each other's personal QR codes to complete bingo
//! challenges. Every completed challenge earns xp and adds the scanned
//! attendee to the scanner's network.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Accounts, sessions, login links and request extractors
//! - `bingo` - Scan recording, network and leaderboard
//! - `qr` - QR rendering, render cache and camera scan loop
//! - `reaper` - Background cleanup of expired sessions
//! - `storage` - Embedded ACID store (redb)

pub mod api;
pub mod auth;
pub mod bingo;
pub mod config;
pub mod error;
pub mod models;
pub mod qr;
pub mod reaper;
pub mod state;
pub mod storage;
pub mod text;
