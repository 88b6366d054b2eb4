// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Profile repository.
//!
//! Profiles are keyed by user id. Every profile owns exactly one opaque
//! `qr_token`, indexed in `profile_tokens` so a scan can resolve it.

use chrono::{DateTime, Utc};
use redb::{ReadableTable, WriteTransaction};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::database::{PROFILES, PROFILE_TOKENS};
use super::super::{BingoDatabase, DbError, DbResult};

/// Attendee profile.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Profile {
    /// User ID (same as the account's user id)
    pub id: String,
    /// Display name
    pub full_name: String,
    /// LinkedIn profile URL
    pub linkedin_url: String,
    /// GitHub profile URL (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    /// Opaque token embedded in the attendee's QR code
    pub qr_token: String,
    /// Experience points
    pub xp: u64,
    /// Whether this attendee can manage questions
    #[serde(default)]
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields an attendee may edit on their own profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileFields {
    pub full_name: String,
    pub linkedin_url: String,
    pub github_url: Option<String>,
}

/// Generate a fresh opaque scan token.
pub fn generate_qr_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Add xp to a profile inside an open write transaction.
///
/// Returns the new total.
pub(crate) fn credit_xp(txn: &WriteTransaction, user_id: &str, amount: u64) -> DbResult<u64> {
    let mut table = txn.open_table(PROFILES)?;
    let existing = table
        .get(user_id)?
        .map(|v| v.value().to_vec())
        .ok_or_else(|| DbError::NotFound(format!("Profile {user_id}")))?;

    let mut profile: Profile = serde_json::from_slice(&existing)?;
    profile.xp = profile.xp.saturating_add(amount);
    profile.updated_at = Utc::now();

    let json = serde_json::to_vec(&profile)?;
    table.insert(user_id, json.as_slice())?;
    Ok(profile.xp)
}

/// Repository for profile operations.
pub struct ProfileRepository<'a> {
    db: &'a BingoDatabase,
}

impl<'a> ProfileRepository<'a> {
    pub fn new(db: &'a BingoDatabase) -> Self {
        Self { db }
    }

    /// Get a profile by user id.
    pub fn get(&self, user_id: &str) -> DbResult<Option<Profile>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROFILES)?;
        match table.get(user_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get the profile owning a scan token. Exact match only.
    pub fn get_by_token(&self, qr_token: &str) -> DbResult<Option<Profile>> {
        let read_txn = self.db.begin_read()?;
        let tokens = read_txn.open_table(PROFILE_TOKENS)?;
        let user_id = match tokens.get(qr_token)? {
            Some(v) => v.value().to_string(),
            None => return Ok(None),
        };

        let profiles = read_txn.open_table(PROFILES)?;
        match profiles.get(user_id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Insert or update the editable fields of a profile.
    ///
    /// A new profile gets a fresh token and zero xp. Existing profiles keep
    /// their token, xp and admin flag; `grant_admin` can only raise the flag.
    pub fn upsert(
        &self,
        user_id: &str,
        fields: ProfileFields,
        grant_admin: bool,
    ) -> DbResult<Profile> {
        let now = Utc::now();
        let write_txn = self.db.begin_write()?;
        let profile = {
            let mut profiles = write_txn.open_table(PROFILES)?;
            let mut tokens = write_txn.open_table(PROFILE_TOKENS)?;

            let existing = profiles.get(user_id)?.map(|v| v.value().to_vec());
            let profile = match existing {
                Some(bytes) => {
                    let mut profile: Profile = serde_json::from_slice(&bytes)?;
                    profile.full_name = fields.full_name;
                    profile.linkedin_url = fields.linkedin_url;
                    profile.github_url = fields.github_url;
                    profile.is_admin |= grant_admin;
                    profile.updated_at = now;
                    profile
                }
                None => {
                    let mut qr_token = generate_qr_token();
                    while tokens.get(qr_token.as_str())?.is_some() {
                        qr_token = generate_qr_token();
                    }
                    Profile {
                        id: user_id.to_string(),
                        full_name: fields.full_name,
                        linkedin_url: fields.linkedin_url,
                        github_url: fields.github_url,
                        qr_token,
                        xp: 0,
                        is_admin: grant_admin,
                        created_at: now,
                        updated_at: now,
                    }
                }
            };

            tokens.insert(profile.qr_token.as_str(), user_id)?;
            let json = serde_json::to_vec(&profile)?;
            profiles.insert(user_id, json.as_slice())?;
            profile
        };
        write_txn.commit()?;
        Ok(profile)
    }

    /// Replace a profile's scan token.
    ///
    /// The old token stops resolving immediately. Fails if another profile
    /// already owns `qr_token`.
    pub fn set_token(&self, user_id: &str, qr_token: &str) -> DbResult<Profile> {
        let write_txn = self.db.begin_write()?;
        let profile = {
            let mut profiles = write_txn.open_table(PROFILES)?;
            let mut tokens = write_txn.open_table(PROFILE_TOKENS)?;

            if let Some(owner) = tokens.get(qr_token)?.map(|v| v.value().to_string()) {
                if owner != user_id {
                    return Err(DbError::AlreadyExists("QR token".to_string()));
                }
            }

            let existing = profiles
                .get(user_id)?
                .map(|v| v.value().to_vec())
                .ok_or_else(|| DbError::NotFound(format!("Profile {user_id}")))?;
            let mut profile: Profile = serde_json::from_slice(&existing)?;

            tokens.remove(profile.qr_token.as_str())?;
            tokens.insert(qr_token, user_id)?;

            profile.qr_token = qr_token.to_string();
            profile.updated_at = Utc::now();
            let json = serde_json::to_vec(&profile)?;
            profiles.insert(user_id, json.as_slice())?;
            profile
        };
        write_txn.commit()?;
        Ok(profile)
    }

    /// List every profile (admin and leaderboard views).
    pub fn list_all(&self) -> DbResult<Vec<Profile>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROFILES)?;

        let mut profiles = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            profiles.push(serde_json::from_slice(value.value())?);
        }
        Ok(profiles)
    }

    /// Number of stored profiles.
    pub fn count(&self) -> DbResult<usize> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROFILES)?;
        let mut count = 0;
        for entry in table.iter()? {
            entry?;
            count += 1;
        }
        Ok(count)
    }
}
