// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Profile save for the signed-in user.

use super::events::{AuthEvent, AuthEvents};
use super::AuthenticatedUser;
use crate::storage::{BingoDatabase, DbError, Profile, ProfileFields, ProfileRepository};
use crate::text::{is_github_url, is_linkedin_url};

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Please enter your full name")]
    MissingName,

    #[error("Please enter a valid LinkedIn URL")]
    InvalidLinkedIn,

    #[error("Please enter a valid GitHub URL")]
    InvalidGithub,

    #[error("Failed to save profile")]
    Storage(#[from] DbError),
}

/// Trim and validate user input. An empty GitHub URL means "none".
pub fn validate_fields(
    full_name: &str,
    linkedin_url: &str,
    github_url: Option<&str>,
) -> Result<ProfileFields, ProfileError> {
    let full_name = full_name.trim();
    if full_name.is_empty() {
        return Err(ProfileError::MissingName);
    }

    let linkedin_url = linkedin_url.trim();
    if !is_linkedin_url(linkedin_url) {
        return Err(ProfileError::InvalidLinkedIn);
    }

    let github_url = github_url.map(str::trim).filter(|url| !url.is_empty());
    if let Some(url) = github_url {
        if !is_github_url(url) {
            return Err(ProfileError::InvalidGithub);
        }
    }

    Ok(ProfileFields {
        full_name: full_name.to_string(),
        linkedin_url: linkedin_url.to_string(),
        github_url: github_url.map(str::to_string),
    })
}

/// Upsert the caller's profile.
///
/// The first save creates the scan token. Later saves only touch the
/// editable fields. Emails listed in `admin_emails` are granted admin.
pub fn save_profile(
    db: &BingoDatabase,
    events: &AuthEvents,
    user: &AuthenticatedUser,
    fields: ProfileFields,
    admin_emails: &[String],
) -> Result<Profile, ProfileError> {
    let grant_admin = admin_emails.iter().any(|email| email == &user.email);
    let profile = ProfileRepository::new(db).upsert(&user.user_id, fields, grant_admin)?;

    tracing::info!(
        user_id = %user.user_id,
        is_admin = profile.is_admin,
        "Profile saved"
    );
    events.publish(AuthEvent::UserUpdated {
        user_id: user.user_id.clone(),
    });
    Ok(profile)
}
