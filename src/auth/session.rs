// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session token issuance and verification.
//!
//! Session tokens are HS256 JWTs signed with `SESSION_SECRET`. Each token
//! names a session row; verification fails once that row is gone, which is
//! how sign-out and the reaper revoke tokens early.
//!
//! Login link tokens are random and stored only as an HMAC-SHA256 digest
//! keyed with the same secret.

use std::sync::OnceLock;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use sha2::Sha256;
use unicode_normalization::UnicodeNormalization;

use super::claims::{AuthenticatedUser, SessionClaims, SESSION_ISSUER};
use super::AuthError;
use crate::storage::{
    BingoDatabase, LoginLinkRepository, SessionRepository, StoredLoginLink, StoredSession,
};

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Shortest password accepted at sign-up.
pub const MIN_PASSWORD_LEN: usize = 8;

type HmacSha256 = Hmac<Sha256>;

/// A freshly created session and its bearer token.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub session: StoredSession,
}

/// A freshly created login link token. Only the digest is persisted.
#[derive(Debug, Clone)]
pub struct IssuedLoginLink {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    link_secret: Vec<u8>,
    session_ttl: Duration,
    link_ttl: Duration,
}

impl SessionManager {
    pub fn new(secret: &[u8], session_ttl: Duration, link_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            link_secret: secret.to_vec(),
            session_ttl,
            link_ttl,
        }
    }

    /// Create a session row for `user_id` and sign a token for it.
    pub fn issue(
        &self,
        db: &BingoDatabase,
        user_id: &str,
        email: &str,
    ) -> Result<IssuedSession, AuthError> {
        let now = Utc::now();
        let session = StoredSession {
            sid: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            email: email.to_string(),
            created_at: now,
            expires_at: now + self.session_ttl,
        };

        let claims = SessionClaims {
            sub: session.user_id.clone(),
            sid: session.sid.clone(),
            email: session.email.clone(),
            iat: now.timestamp(),
            exp: session.expires_at.timestamp(),
            iss: SESSION_ISSUER.to_string(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InternalError(format!("Failed to sign session: {e}")))?;

        SessionRepository::new(db).insert(&session)?;
        Ok(IssuedSession { token, session })
    }

    /// Verify a bearer token and confirm its session is still live.
    pub fn verify(&self, db: &BingoDatabase, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.set_issuer(&[SESSION_ISSUER]);
        validation.validate_aud = false;

        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            })?;
        let claims = token_data.claims;

        let session = SessionRepository::new(db)
            .get(&claims.sid)?
            .ok_or(AuthError::SessionRevoked)?;
        if session.user_id != claims.sub {
            return Err(AuthError::SessionRevoked);
        }
        if session.expires_at <= Utc::now() {
            return Err(AuthError::TokenExpired);
        }

        Ok(AuthenticatedUser::from_claims(claims))
    }

    /// Delete a session. Returns whether it was still live.
    pub fn revoke(&self, db: &BingoDatabase, sid: &str) -> Result<bool, AuthError> {
        Ok(SessionRepository::new(db).revoke(sid)?)
    }

    /// Create a single-use login link for an already normalised email.
    pub fn create_login_link(
        &self,
        db: &BingoDatabase,
        email: &str,
    ) -> Result<IssuedLoginLink, AuthError> {
        let token = random_token();
        let now = Utc::now();
        let link = StoredLoginLink {
            email: email.to_string(),
            created_at: now,
            expires_at: now + self.link_ttl,
        };
        LoginLinkRepository::new(db).insert(&self.link_digest(&token)?, &link)?;
        Ok(IssuedLoginLink {
            token,
            expires_at: link.expires_at,
        })
    }

    /// Redeem a login link token, returning its email. Each token works once.
    pub fn consume_login_link(&self, db: &BingoDatabase, token: &str) -> Result<String, AuthError> {
        let link = LoginLinkRepository::new(db)
            .consume(&self.link_digest(token)?)?
            .ok_or(AuthError::LinkExpired)?;
        if link.expires_at <= Utc::now() {
            return Err(AuthError::LinkExpired);
        }
        Ok(link.email)
    }

    fn link_digest(&self, token: &str) -> Result<String, AuthError> {
        let mut mac = HmacSha256::new_from_slice(&self.link_secret)
            .map_err(|e| AuthError::InternalError(format!("Invalid link secret: {e}")))?;
        mac.update(token.as_bytes());
        Ok(Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes()))
    }
}

/// Two v4 UUIDs of randomness, URL-safe.
fn random_token() -> String {
    let mut bytes = [0u8; 32];
    bytes[..16].copy_from_slice(uuid::Uuid::new_v4().as_bytes());
    bytes[16..].copy_from_slice(uuid::Uuid::new_v4().as_bytes());
    Base64UrlUnpadded::encode_string(&bytes)
}

/// Canonical form of an email: NFKC, trimmed, lowercased.
pub fn normalize_email(raw: &str) -> Result<String, AuthError> {
    let email: String = raw.nfkc().collect::<String>().trim().to_lowercase();
    let well_formed = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if well_formed {
        Ok(email)
    } else {
        Err(AuthError::InvalidEmail)
    }
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword);
    }
    let salt = SaltString::encode_b64(uuid::Uuid::new_v4().as_bytes())
        .map_err(|e| AuthError::InternalError(format!("Salt generation failed: {e}")))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::InternalError(format!("Password hashing failed: {e}")))
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is unreadable");
            false
        }
    }
}

/// [`hash_password`] on the blocking thread pool.
pub async fn hash_password_blocking(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::InternalError(format!("Password hashing task failed: {e}")))?
}

/// [`verify_password`] on the blocking thread pool.
///
/// Without a stored hash the password is checked against a throwaway hash,
/// so unknown and passwordless accounts cost the same as a wrong password.
pub async fn verify_password_blocking(
    password: String,
    stored_hash: Option<String>,
) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || match stored_hash {
        Some(hash) => verify_password(&password, &hash),
        None => {
            if let Some(hash) = decoy_hash() {
                verify_password(&password, hash);
            }
            false
        }
    })
    .await
    .map_err(|e| AuthError::InternalError(format!("Password check task failed: {e}")))
}

fn decoy_hash() -> Option<&'static str> {
    static DECOY: OnceLock<Option<String>> = OnceLock::new();
    DECOY
        .get_or_init(|| hash_password(&random_token()).ok())
        .as_deref()
}
