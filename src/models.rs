// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies shared by the REST handlers. All types derive
//! `ToSchema` for the OpenAPI document.
//!
//! ## Model Categories
//!
//! - **Auth**: credentials in, session tokens out
//! - **Profile**: editable attendee fields and the QR image
//! - **Board**: questions and completed (question, attendee) pairs
//! - **Scans**: check-in requests and results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{IssuedSession, Role};
use crate::bingo::ScanReceipt;
use crate::storage::{Profile, Question, Scan};
use crate::text::{question_emoji, strip_emoji};

// =============================================================================
// Auth Models
// =============================================================================

/// Email + password credentials for sign-up and sign-in.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Request a passwordless login link.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginLinkRequest {
    pub email: String,
}

/// Redeem a login link.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct VerifyLoginLinkRequest {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginLinkResponse {
    /// When the link stops working.
    pub expires_at: DateTime<Utc>,
    /// The link itself. Only returned when the server runs without a mailer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// A newly created session.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionTokenResponse {
    /// Bearer token for the `Authorization` header.
    pub token: String,
    pub user_id: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

impl From<IssuedSession> for SessionTokenResponse {
    fn from(issued: IssuedSession) -> Self {
        Self {
            token: issued.token,
            user_id: issued.session.user_id,
            email: issued.session.email,
            expires_at: issued.session.expires_at,
        }
    }
}

/// The caller's session, if any, and where the client should go next.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub has_profile: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Page the client should show, when it is not where it belongs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
}

// =============================================================================
// Profile Models
// =============================================================================

/// Editable profile fields.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SaveProfileRequest {
    pub full_name: String,
    pub linkedin_url: String,
    #[serde(default)]
    pub github_url: Option<String>,
}

/// The caller's own profile. Includes the scan token.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub profile: Profile,
    pub initials: String,
    pub role: Role,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            initials: crate::text::initials(&profile.full_name),
            role: Role::of(&profile),
            profile,
        }
    }
}

/// The caller's QR code.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QrCodeResponse {
    pub qr_token: String,
    /// `data:image/svg+xml;base64,...`
    pub image: String,
}

// =============================================================================
// Board Models
// =============================================================================

/// A bingo challenge as shown on the board.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct QuestionView {
    pub id: u64,
    pub order_index: i32,
    /// Full question text as stored.
    pub text: String,
    /// Decorative emoji for the tile.
    pub emoji: String,
    /// Text without decorative emoji.
    pub label: String,
}

impl From<Question> for QuestionView {
    fn from(question: Question) -> Self {
        Self {
            id: question.id,
            order_index: question.order_index,
            emoji: question_emoji(&question.text),
            label: strip_emoji(&question.text),
            text: question.text,
        }
    }
}

/// A completed challenge on the caller's board.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct ScanPair {
    pub question_id: u64,
    pub scanned_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<Scan> for ScanPair {
    fn from(scan: Scan) -> Self {
        Self {
            question_id: scan.question_id,
            scanned_id: scan.scanned_id,
            created_at: scan.created_at,
        }
    }
}

// =============================================================================
// Scan Models
// =============================================================================

/// Check in with another attendee for one challenge.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ScanRequest {
    /// Token decoded from the other attendee's QR code.
    pub token: String,
    pub question_id: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScanResponse {
    pub scan: Scan,
    pub scanned_id: String,
    pub scanned_name: String,
    pub xp_awarded: u64,
    /// Caller's xp after this scan.
    pub xp: u64,
}

impl From<ScanReceipt> for ScanResponse {
    fn from(receipt: ScanReceipt) -> Self {
        Self {
            scan: receipt.scan,
            scanned_id: receipt.scanned.id,
            scanned_name: receipt.scanned.full_name,
            xp_awarded: receipt.xp_awarded,
            xp: receipt.scanner_xp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_view_splits_emoji() {
        let view = QuestionView::from(Question {
            id: 2,
            order_index: 2,
            text: "Find a speaker 🎤".to_string(),
            created_at: Utc::now(),
        });
        assert_eq!(view.emoji, "🎤");
        assert_eq!(view.label, "Find a speaker");
        assert_eq!(view.text, "Find a speaker 🎤");

        let plain = QuestionView::from(Question {
            id: 3,
            order_index: 3,
            text: "Swap stickers".to_string(),
            created_at: Utc::now(),
        });
        assert_eq!(plain.emoji, "🎯");
    }

    #[test]
    fn profile_response_flattens_profile() {
        let now = Utc::now();
        let response = ProfileResponse::from(Profile {
            id: "A".to_string(),
            full_name: "Ada Lovelace".to_string(),
            linkedin_url: "https://linkedin.com/in/ada".to_string(),
            github_url: None,
            qr_token: "tAAA".to_string(),
            xp: 20,
            is_admin: false,
            created_at: now,
            updated_at: now,
        });

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["id"], "A");
        assert_eq!(json["qr_token"], "tAAA");
        assert_eq!(json["initials"], "AL");
        assert_eq!(json["role"], "attendee");
    }
}
