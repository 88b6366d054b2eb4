// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Scan repository.
//!
//! A scan is an immutable edge: scanner → scanned, for one question.
//! Recording a scan writes the row, the (scanner, question) guard, the
//! scanner recency index and the scanner's xp in a single transaction.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::database::{
    next_sequence, scan_guard_key, scanner_index_bounds, scanner_index_key, QUESTIONS,
    SCANNER_INDEX, SCANS, SCAN_GUARD,
};
use super::super::{BingoDatabase, DbResult};
use super::profiles::credit_xp;

const SCAN_SEQUENCE: &str = "scan_seq";

/// A recorded check-in.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Scan {
    pub id: String,
    pub scanner_id: String,
    pub scanned_id: String,
    pub question_id: u64,
    pub created_at: DateTime<Utc>,
}

/// Result of a conditional scan insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Scan stored and xp credited.
    Recorded { scan: Scan, scanner_xp: u64 },
    /// The scanner already completed this question. Nothing was written.
    Duplicate,
    /// The question does not exist. Nothing was written.
    UnknownQuestion,
}

pub struct ScanRepository<'a> {
    db: &'a BingoDatabase,
}

impl<'a> ScanRepository<'a> {
    pub fn new(db: &'a BingoDatabase) -> Self {
        Self { db }
    }

    /// Insert a scan unless (scanner, question) is already taken, and credit
    /// `xp` to the scanner in the same transaction.
    ///
    /// redb serialises write transactions, so the guard lookup and the insert
    /// cannot interleave with a concurrent attempt for the same pair.
    pub fn record(
        &self,
        scanner_id: &str,
        scanned_id: &str,
        question_id: u64,
        xp: u64,
    ) -> DbResult<RecordOutcome> {
        let write_txn = self.db.begin_write()?;
        let guard_key = scan_guard_key(scanner_id, question_id);

        {
            let guard = write_txn.open_table(SCAN_GUARD)?;
            if guard.get(guard_key.as_str())?.is_some() {
                return Ok(RecordOutcome::Duplicate);
            }
        }
        {
            let questions = write_txn.open_table(QUESTIONS)?;
            if questions.get(question_id)?.is_none() {
                return Ok(RecordOutcome::UnknownQuestion);
            }
        }

        let seq = next_sequence(&write_txn, SCAN_SEQUENCE)?;
        let scan = Scan {
            id: uuid::Uuid::new_v4().to_string(),
            scanner_id: scanner_id.to_string(),
            scanned_id: scanned_id.to_string(),
            question_id,
            created_at: Utc::now(),
        };

        {
            let mut scans = write_txn.open_table(SCANS)?;
            let json = serde_json::to_vec(&scan)?;
            scans.insert(scan.id.as_str(), json.as_slice())?;

            let mut guard = write_txn.open_table(SCAN_GUARD)?;
            guard.insert(guard_key.as_str(), scan.id.as_str())?;

            let mut index = write_txn.open_table(SCANNER_INDEX)?;
            let key = scanner_index_key(scanner_id, seq, &scan.id);
            index.insert(key.as_slice(), scan.id.as_str())?;
        }

        let scanner_xp = credit_xp(&write_txn, scanner_id, xp)?;
        write_txn.commit()?;

        Ok(RecordOutcome::Recorded { scan, scanner_xp })
    }

    /// All scans by one scanner, most recent first.
    pub fn list_by_scanner(&self, scanner_id: &str) -> DbResult<Vec<Scan>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(SCANNER_INDEX)?;
        let scans = read_txn.open_table(SCANS)?;

        let (start, end) = scanner_index_bounds(scanner_id);
        let mut results = Vec::new();
        for entry in index.range(start.as_slice()..end.as_slice())? {
            let (_, scan_id) = entry?;
            if let Some(value) = scans.get(scan_id.value())? {
                results.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(results)
    }

    pub fn count(&self) -> DbResult<usize> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SCANS)?;
        let mut count = 0;
        for entry in table.iter()? {
            entry?;
            count += 1;
        }
        Ok(count)
    }
}
