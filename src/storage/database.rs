// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded game database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `accounts`: normalised email → serialized StoredAccount
//! - `sessions`: session id → serialized StoredSession
//! - `login_links`: HMAC digest of a passwordless token → serialized StoredLoginLink
//! - `profiles`: user id → serialized Profile
//! - `profile_tokens`: qr token → user id (unique)
//! - `questions`: question id → serialized Question
//! - `scans`: scan id → serialized Scan
//! - `scan_guard`: `scanner|question` → scan id (one scan per pair)
//! - `scanner_index`: `scanner|!seq|scan_id` → scanned id, newest first
//! - `counters`: name → u64 sequence value

use std::path::Path;

use redb::{
    Database, ReadTransaction, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};

// =============================================================================
// Table Definitions
// =============================================================================

pub(crate) const ACCOUNTS: TableDefinition<&str, &[u8]> = TableDefinition::new("accounts");

pub(crate) const SESSIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");

pub(crate) const LOGIN_LINKS: TableDefinition<&str, &[u8]> = TableDefinition::new("login_links");

pub(crate) const PROFILES: TableDefinition<&str, &[u8]> = TableDefinition::new("profiles");

/// Token index. A token maps to exactly one profile.
pub(crate) const PROFILE_TOKENS: TableDefinition<&str, &str> =
    TableDefinition::new("profile_tokens");

pub(crate) const QUESTIONS: TableDefinition<u64, &[u8]> = TableDefinition::new("questions");

pub(crate) const SCANS: TableDefinition<&str, &[u8]> = TableDefinition::new("scans");

/// Uniqueness key for (scanner, question). Presence means the challenge is done.
pub(crate) const SCAN_GUARD: TableDefinition<&str, &str> = TableDefinition::new("scan_guard");

/// Key format: `scanner_id | inverted_seq_be_bytes | scan_id` for newest-first range scans.
pub(crate) const SCANNER_INDEX: TableDefinition<&[u8], &str> =
    TableDefinition::new("scanner_index");

pub(crate) const COUNTERS: TableDefinition<&str, u64> = TableDefinition::new("counters");

/// File name of the database inside the data directory.
pub const DB_FILE_NAME: &str = "bingo.redb";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("conflict: {0}")]
    Conflict(String),
}

pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Build a composite key for the scanner_index table.
///
/// The inverted sequence number gives newest-first ordering when scanning forward.
pub(crate) fn scanner_index_key(scanner_id: &str, seq: u64, scan_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(scanner_id.len() + 1 + 8 + 1 + scan_id.len());
    key.extend_from_slice(scanner_id.as_bytes());
    key.push(b'|');
    key.extend_from_slice(&(!seq).to_be_bytes());
    key.push(b'|');
    key.extend_from_slice(scan_id.as_bytes());
    key
}

/// Range bounds covering every index entry of one scanner.
///
/// `}` is the byte right after `|`, so `[id|, id})` spans exactly that prefix.
pub(crate) fn scanner_index_bounds(scanner_id: &str) -> (Vec<u8>, Vec<u8>) {
    let mut start = Vec::with_capacity(scanner_id.len() + 1);
    start.extend_from_slice(scanner_id.as_bytes());
    let mut end = start.clone();
    start.push(b'|');
    end.push(b'}');
    (start, end)
}

/// Guard key for the (scanner, question) uniqueness table.
pub(crate) fn scan_guard_key(scanner_id: &str, question_id: u64) -> String {
    format!("{scanner_id}|{question_id}")
}

// =============================================================================
// BingoDatabase
// =============================================================================

/// Embedded ACID store for identities, sessions and game state.
pub struct BingoDatabase {
    db: Database,
}

impl BingoDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> DbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ACCOUNTS)?;
            let _ = write_txn.open_table(SESSIONS)?;
            let _ = write_txn.open_table(LOGIN_LINKS)?;
            let _ = write_txn.open_table(PROFILES)?;
            let _ = write_txn.open_table(PROFILE_TOKENS)?;
            let _ = write_txn.open_table(QUESTIONS)?;
            let _ = write_txn.open_table(SCANS)?;
            let _ = write_txn.open_table(SCAN_GUARD)?;
            let _ = write_txn.open_table(SCANNER_INDEX)?;
            let _ = write_txn.open_table(COUNTERS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Open the database file inside a data directory.
    pub fn open_in_dir(data_dir: &Path) -> DbResult<Self> {
        Self::open(&data_dir.join(DB_FILE_NAME))
    }

    pub(crate) fn begin_read(&self) -> DbResult<ReadTransaction> {
        Ok(self.db.begin_read()?)
    }

    pub(crate) fn begin_write(&self) -> DbResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    /// Verify the database answers a read transaction.
    pub fn health_check(&self) -> DbResult<()> {
        let read_txn = self.begin_read()?;
        let _ = read_txn.open_table(PROFILES)?;
        Ok(())
    }
}

/// Advance a named sequence inside an open write transaction.
///
/// Sequences start at 1.
pub(crate) fn next_sequence(txn: &WriteTransaction, name: &str) -> DbResult<u64> {
    let mut table = txn.open_table(COUNTERS)?;
    let next = table.get(name)?.map(|v| v.value()).unwrap_or(0) + 1;
    table.insert(name, next)?;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_creates_file_and_passes_health_check() {
        let dir = TempDir::new().unwrap();
        let db = BingoDatabase::open_in_dir(dir.path()).unwrap();
        assert!(dir.path().join(DB_FILE_NAME).exists());
        db.health_check().unwrap();
    }

    #[test]
    fn sequences_are_independent_and_start_at_one() {
        let dir = TempDir::new().unwrap();
        let db = BingoDatabase::open_in_dir(dir.path()).unwrap();

        let txn = db.begin_write().unwrap();
        assert_eq!(next_sequence(&txn, "a").unwrap(), 1);
        assert_eq!(next_sequence(&txn, "a").unwrap(), 2);
        assert_eq!(next_sequence(&txn, "b").unwrap(), 1);
        txn.commit().unwrap();

        let txn = db.begin_write().unwrap();
        assert_eq!(next_sequence(&txn, "a").unwrap(), 3);
        txn.commit().unwrap();
    }

    #[test]
    fn newer_index_keys_sort_first() {
        let older = scanner_index_key("user-a", 1, "scan-1");
        let newer = scanner_index_key("user-a", 2, "scan-2");
        assert!(newer < older);

        let (start, end) = scanner_index_bounds("user-a");
        assert!(start.as_slice() < newer.as_slice());
        assert!(older.as_slice() < end.as_slice());

        let other = scanner_index_key("user-ab", 1, "scan-3");
        assert!(other.as_slice() < start.as_slice());
    }
}
