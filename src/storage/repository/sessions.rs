// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session and login link repositories.
//!
//! Sessions back the signed session tokens: a token is only honoured while
//! its `sid` row exists. Login links are one-time passwordless tokens stored
//! by digest, never in clear.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};

use super::super::database::{LOGIN_LINKS, SESSIONS};
use super::super::{BingoDatabase, DbResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredSession {
    pub sid: String,
    pub user_id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredLoginLink {
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

pub struct SessionRepository<'a> {
    db: &'a BingoDatabase,
}

impl<'a> SessionRepository<'a> {
    pub fn new(db: &'a BingoDatabase) -> Self {
        Self { db }
    }

    pub fn insert(&self, session: &StoredSession) -> DbResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SESSIONS)?;
            let json = serde_json::to_vec(session)?;
            table.insert(session.sid.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get(&self, sid: &str) -> DbResult<Option<StoredSession>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SESSIONS)?;
        match table.get(sid)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Remove a session. Returns whether it existed.
    pub fn revoke(&self, sid: &str) -> DbResult<bool> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(SESSIONS)?;
            let removed = table.remove(sid)?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(removed)
    }

    /// Drop sessions that expired before `now`. Returns how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> DbResult<usize> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(SESSIONS)?;
            let mut expired = Vec::new();
            for entry in table.iter()? {
                let (key, value) = entry?;
                let session: StoredSession = serde_json::from_slice(value.value())?;
                if session.expires_at <= now {
                    expired.push(key.value().to_string());
                }
            }
            for sid in &expired {
                table.remove(sid.as_str())?;
            }
            expired.len()
        };
        write_txn.commit()?;
        Ok(removed)
    }
}

pub struct LoginLinkRepository<'a> {
    db: &'a BingoDatabase,
}

impl<'a> LoginLinkRepository<'a> {
    pub fn new(db: &'a BingoDatabase) -> Self {
        Self { db }
    }

    pub fn insert(&self, digest: &str, link: &StoredLoginLink) -> DbResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(LOGIN_LINKS)?;
            let json = serde_json::to_vec(link)?;
            table.insert(digest, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Remove and return a link. A link can be consumed once.
    pub fn consume(&self, digest: &str) -> DbResult<Option<StoredLoginLink>> {
        let write_txn = self.db.begin_write()?;
        let link = {
            let mut table = write_txn.open_table(LOGIN_LINKS)?;
            let removed = table.remove(digest)?.map(|v| v.value().to_vec());
            match removed {
                Some(bytes) => Some(serde_json::from_slice(&bytes)?),
                None => None,
            }
        };
        write_txn.commit()?;
        Ok(link)
    }

    pub fn purge_expired(&self, now: DateTime<Utc>) -> DbResult<usize> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(LOGIN_LINKS)?;
            let mut expired = Vec::new();
            for entry in table.iter()? {
                let (key, value) = entry?;
                let link: StoredLoginLink = serde_json::from_slice(value.value())?;
                if link.expires_at <= now {
                    expired.push(key.value().to_string());
                }
            }
            for digest in &expired {
                table.remove(digest.as_str())?;
            }
            expired.len()
        };
        write_txn.commit()?;
        Ok(removed)
    }
}
