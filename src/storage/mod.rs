// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent state lives in a single redb file under `DATA_DIR`. This is
//! the identity store: accounts, sessions, profiles, questions and scans.
//!
//! ## Guarantees
//!
//! - Every write is one ACID transaction
//! - A scan, its uniqueness guard and the scanner's xp commit together
//! - Tokens resolve to at most one profile
//! - Scans and profiles are never deleted

pub mod database;
pub mod repository;

pub use database::{BingoDatabase, DbError, DbResult, DB_FILE_NAME};
pub use repository::{
    generate_qr_token, AccountRepository, LoginLinkRepository, Profile, ProfileFields,
    ProfileRepository, Question, QuestionPatch, QuestionRepository, RecordOutcome, Scan,
    ScanRepository, SessionRepository, StoredAccount, StoredLoginLink, StoredSession,
};
