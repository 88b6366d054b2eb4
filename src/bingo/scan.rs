// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Scan check-in workflow.
//!
//! `record_scan` is a guard chain that stops at the first violated rule:
//! unknown token, self-scan, already completed. The insert and the xp
//! credit are one storage transaction.

use axum::http::StatusCode;

use crate::storage::{
    BingoDatabase, DbError, Profile, ProfileRepository, RecordOutcome, Scan, ScanRepository,
};

/// Experience points credited to the scanner for each new scan.
pub const XP_PER_SCAN: u64 = 10;

/// Why a scan was rejected. Messages are shown to attendees as-is.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Invalid QR code – user not found.")]
    InvalidTarget,

    #[error("You can't scan yourself! 😄")]
    SelfScan,

    #[error("You already completed this challenge! ✅")]
    AlreadyCompleted,

    #[error("This challenge doesn't exist.")]
    UnknownQuestion,

    #[error("Scan failed. Please try again.")]
    Persistence(#[source] DbError),
}

impl ScanError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ScanError::InvalidTarget => "invalid_target",
            ScanError::SelfScan => "self_scan",
            ScanError::AlreadyCompleted => "already_completed",
            ScanError::UnknownQuestion => "unknown_question",
            ScanError::Persistence(_) => "persistence_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ScanError::InvalidTarget | ScanError::UnknownQuestion => StatusCode::NOT_FOUND,
            ScanError::SelfScan => StatusCode::UNPROCESSABLE_ENTITY,
            ScanError::AlreadyCompleted => StatusCode::CONFLICT,
            ScanError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A successful check-in.
#[derive(Debug, Clone)]
pub struct ScanReceipt {
    pub scan: Scan,
    /// The attendee who was scanned.
    pub scanned: Profile,
    pub xp_awarded: u64,
    /// Scanner's xp after the credit.
    pub scanner_xp: u64,
}

/// Resolve a scan token to its profile. Exact match, no normalisation.
pub fn resolve_token(db: &BingoDatabase, token: &str) -> Result<Option<Profile>, DbError> {
    ProfileRepository::new(db).get_by_token(token)
}

/// Record that `scanner_id` scanned the attendee owning `scanned_token`
/// for `question_id`.
pub fn record_scan(
    db: &BingoDatabase,
    scanner_id: &str,
    scanned_token: &str,
    question_id: u64,
) -> Result<ScanReceipt, ScanError> {
    let scanned = resolve_token(db, scanned_token)
        .map_err(ScanError::Persistence)?
        .ok_or(ScanError::InvalidTarget)?;

    if scanned.id == scanner_id {
        return Err(ScanError::SelfScan);
    }

    let outcome = ScanRepository::new(db)
        .record(scanner_id, &scanned.id, question_id, XP_PER_SCAN)
        .map_err(|e| {
            tracing::error!(
                scanner_id = %scanner_id,
                question_id,
                error = %e,
                "Scan insert failed"
            );
            ScanError::Persistence(e)
        })?;

    match outcome {
        RecordOutcome::Recorded { scan, scanner_xp } => {
            tracing::info!(
                scan_id = %scan.id,
                scanner_id = %scanner_id,
                scanned_id = %scanned.id,
                question_id,
                scanner_xp,
                "Scan recorded"
            );
            Ok(ScanReceipt {
                scan,
                scanned,
                xp_awarded: XP_PER_SCAN,
                scanner_xp,
            })
        }
        RecordOutcome::Duplicate => Err(ScanError::AlreadyCompleted),
        RecordOutcome::UnknownQuestion => Err(ScanError::UnknownQuestion),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bingo::testing::{seed_attendee, seeded_db};
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn scenario_scan_repeat_and_second_question() {
        let (db, _dir) = seeded_db();

        let receipt = record_scan(&db, "A", "tBBB", 1).expect("first scan succeeds");
        assert_eq!(receipt.scanned.id, "B");
        assert_eq!(receipt.xp_awarded, 10);
        assert_eq!(receipt.scanner_xp, 10);
        assert_eq!(receipt.scan.scanner_id, "A");
        assert_eq!(receipt.scan.question_id, 1);

        let repeat = record_scan(&db, "A", "tBBB", 1);
        assert!(matches!(repeat, Err(ScanError::AlreadyCompleted)));

        let second = record_scan(&db, "A", "tBBB", 2).expect("second question succeeds");
        assert_eq!(second.scanner_xp, 20);

        let scans = ScanRepository::new(&db);
        assert_eq!(scans.count().unwrap(), 2);
        assert_eq!(ProfileRepository::new(&db).get("B").unwrap().unwrap().xp, 0);
    }

    #[test]
    fn unknown_token_is_invalid_target() {
        let (db, _dir) = seeded_db();

        let result = record_scan(&db, "A", "tXXX", 1);
        assert!(matches!(result, Err(ScanError::InvalidTarget)));
        assert_eq!(ScanRepository::new(&db).count().unwrap(), 0);
    }

    #[test]
    fn self_scan_rejected_for_every_question() {
        let (db, _dir) = seeded_db();

        for question_id in [1, 2, 999] {
            let result = record_scan(&db, "A", "tAAA", question_id);
            assert!(matches!(result, Err(ScanError::SelfScan)));
        }
        assert_eq!(ScanRepository::new(&db).count().unwrap(), 0);
        assert_eq!(ProfileRepository::new(&db).get("A").unwrap().unwrap().xp, 0);
    }

    #[test]
    fn repeated_attempts_never_insert_twice() {
        let (db, _dir) = seeded_db();
        seed_attendee(&db, "C", "Linus", "tCCC");

        record_scan(&db, "A", "tBBB", 1).unwrap();
        for token in ["tBBB", "tCCC", "tBBB"] {
            let result = record_scan(&db, "A", token, 1);
            assert!(matches!(result, Err(ScanError::AlreadyCompleted)));
        }
        assert_eq!(ScanRepository::new(&db).count().unwrap(), 1);
        assert_eq!(ProfileRepository::new(&db).get("A").unwrap().unwrap().xp, 10);
    }

    #[test]
    fn racing_scans_for_one_question_complete_once() {
        let (db, _dir) = seeded_db();
        let tokens: Vec<String> = (0..16)
            .map(|i| {
                let token = format!("tRACE{i:02}");
                seed_attendee(&db, &format!("R{i:02}"), "Racer", &token);
                token
            })
            .collect();
        let start = Barrier::new(tokens.len());

        let results: Vec<_> = thread::scope(|s| {
            let handles: Vec<_> = tokens
                .iter()
                .map(|token| {
                    let (db, start) = (&db, &start);
                    s.spawn(move || {
                        start.wait();
                        record_scan(db, "A", token, 1)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().expect("scan thread panicked"))
                .collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, ScanError::AlreadyCompleted)));
        assert_eq!(ScanRepository::new(&db).count().unwrap(), 1);
        assert_eq!(ProfileRepository::new(&db).get("A").unwrap().unwrap().xp, 10);
    }

    #[test]
    fn unknown_question_is_rejected() {
        let (db, _dir) = seeded_db();
        let result = record_scan(&db, "A", "tBBB", 77);
        assert!(matches!(result, Err(ScanError::UnknownQuestion)));
    }

    #[test]
    fn scanner_without_profile_is_a_persistence_error() {
        let (db, _dir) = seeded_db();
        let result = record_scan(&db, "nobody", "tBBB", 1);
        assert!(matches!(result, Err(ScanError::Persistence(_))));
        assert_eq!(ScanRepository::new(&db).count().unwrap(), 0);
    }

    #[test]
    fn error_codes_and_statuses() {
        assert_eq!(ScanError::InvalidTarget.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ScanError::SelfScan.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(ScanError::AlreadyCompleted.status_code(), StatusCode::CONFLICT);
        assert_eq!(ScanError::AlreadyCompleted.error_code(), "already_completed");
        assert_eq!(
            ScanError::AlreadyCompleted.to_string(),
            "You already completed this challenge! ✅"
        );
    }
}
