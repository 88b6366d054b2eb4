// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account repository.
//!
//! Accounts are keyed by normalised email. Passwordless accounts have no
//! password hash and can only sign in through a login link.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};

use super::super::database::ACCOUNTS;
use super::super::{BingoDatabase, DbError, DbResult};

/// Credential record. Never serialised into API responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredAccount {
    pub user_id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StoredAccount {
    pub fn new(email: impl Into<String>, password_hash: Option<String>) -> Self {
        Self {
            user_id: uuid::Uuid::new_v4().to_string(),
            email: email.into(),
            password_hash,
            created_at: Utc::now(),
        }
    }
}

pub struct AccountRepository<'a> {
    db: &'a BingoDatabase,
}

impl<'a> AccountRepository<'a> {
    pub fn new(db: &'a BingoDatabase) -> Self {
        Self { db }
    }

    pub fn get(&self, email: &str) -> DbResult<Option<StoredAccount>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ACCOUNTS)?;
        match table.get(email)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Create an account. Fails if the email is taken.
    pub fn create(&self, account: &StoredAccount) -> DbResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(ACCOUNTS)?;
            if table.get(account.email.as_str())?.is_some() {
                return Err(DbError::AlreadyExists(format!("Account {}", account.email)));
            }
            let json = serde_json::to_vec(account)?;
            table.insert(account.email.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Return the account for `email`, creating a passwordless one if needed.
    pub fn get_or_create_passwordless(&self, email: &str) -> DbResult<StoredAccount> {
        let write_txn = self.db.begin_write()?;
        let account = {
            let mut table = write_txn.open_table(ACCOUNTS)?;
            let existing = table.get(email)?.map(|v| v.value().to_vec());
            match existing {
                Some(bytes) => serde_json::from_slice(&bytes)?,
                None => {
                    let account = StoredAccount::new(email, None);
                    let json = serde_json::to_vec(&account)?;
                    table.insert(email, json.as_slice())?;
                    account
                }
            }
        };
        write_txn.commit()?;
        Ok(account)
    }
}
