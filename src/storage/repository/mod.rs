// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the game database.
//!
//! Each repository provides CRUD operations for a specific entity type,
//! using `BingoDatabase` transactions for all reads and writes.

pub mod accounts;
pub mod profiles;
pub mod questions;
pub mod scans;
pub mod sessions;

pub use accounts::{AccountRepository, StoredAccount};
pub use profiles::{generate_qr_token, Profile, ProfileFields, ProfileRepository};
pub use questions::{Question, QuestionPatch, QuestionRepository};
pub use scans::{RecordOutcome, Scan, ScanRepository};
pub use sessions::{LoginLinkRepository, SessionRepository, StoredLoginLink, StoredSession};
