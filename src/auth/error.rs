// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::storage::DbError;

/// Page the client is sent to when it has no session.
pub const SIGN_IN_REDIRECT: &str = "/";

/// Page the client is sent to when the session has no profile yet.
pub const ONBOARDING_REDIRECT: &str = "/onboarding.html";

/// Authentication error type.
#[derive(Debug)]
pub enum AuthError {
    /// No session token presented
    NotAuthenticated,
    /// Invalid authorization header format
    InvalidAuthHeader,
    /// Token is malformed
    MalformedToken,
    /// Token signature is invalid
    InvalidSignature,
    /// Token or session has expired
    TokenExpired,
    /// Session was signed out or purged
    SessionRevoked,
    /// Wrong email or password
    InvalidCredentials,
    /// Sign-up for an email that already has an account
    AccountExists,
    /// Email failed normalisation
    InvalidEmail,
    /// Password too short
    WeakPassword,
    /// Login link unknown, used or expired
    LinkExpired,
    /// Session is valid but no profile has been saved
    ProfileRequired,
    /// Insufficient permissions
    InsufficientPermissions,
    /// Internal error
    InternalError(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_to: Option<&'static str>,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::NotAuthenticated => "not_authenticated",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::SessionRevoked => "session_revoked",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::AccountExists => "account_exists",
            AuthError::InvalidEmail => "invalid_email",
            AuthError::WeakPassword => "weak_password",
            AuthError::LinkExpired => "link_expired",
            AuthError::ProfileRequired => "profile_required",
            AuthError::InsufficientPermissions => "insufficient_permissions",
            AuthError::InternalError(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::NotAuthenticated
            | AuthError::InvalidAuthHeader
            | AuthError::MalformedToken
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::SessionRevoked
            | AuthError::InvalidCredentials
            | AuthError::LinkExpired => StatusCode::UNAUTHORIZED,
            AuthError::AccountExists => StatusCode::CONFLICT,
            AuthError::InvalidEmail | AuthError::WeakPassword => StatusCode::BAD_REQUEST,
            AuthError::ProfileRequired | AuthError::InsufficientPermissions => {
                StatusCode::FORBIDDEN
            }
            AuthError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Where the client should navigate after this error, if anywhere.
    ///
    /// Missing or dead sessions go back to sign-in; a session without a
    /// profile goes to onboarding.
    pub fn redirect_to(&self) -> Option<&'static str> {
        match self {
            AuthError::NotAuthenticated
            | AuthError::InvalidAuthHeader
            | AuthError::MalformedToken
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::SessionRevoked => Some(SIGN_IN_REDIRECT),
            AuthError::ProfileRequired => Some(ONBOARDING_REDIRECT),
            _ => None,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::NotAuthenticated => write!(f, "Not authenticated"),
            AuthError::InvalidAuthHeader => {
                write!(f, "Invalid authorization header format (expected 'Bearer <token>')")
            }
            AuthError::MalformedToken => write!(f, "Token is malformed"),
            AuthError::InvalidSignature => write!(f, "Token signature is invalid"),
            AuthError::TokenExpired => write!(f, "Session has expired"),
            AuthError::SessionRevoked => write!(f, "Session has been signed out"),
            AuthError::InvalidCredentials => write!(f, "Invalid email or password"),
            AuthError::AccountExists => write!(f, "An account with this email already exists"),
            AuthError::InvalidEmail => write!(f, "Please enter a valid email address"),
            AuthError::WeakPassword => write!(
                f,
                "Password must be at least {} characters",
                super::session::MIN_PASSWORD_LEN
            ),
            AuthError::LinkExpired => write!(f, "This sign-in link is invalid or has expired"),
            AuthError::ProfileRequired => write!(f, "Please complete your profile first"),
            AuthError::InsufficientPermissions => {
                write!(f, "Insufficient permissions for this operation")
            }
            AuthError::InternalError(msg) => write!(f, "Internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<DbError> for AuthError {
    fn from(err: DbError) -> Self {
        AuthError::InternalError(err.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::InternalError(ref msg) = self {
            tracing::error!(error = %msg, "Authentication failed internally");
        }
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
            redirect_to: self.redirect_to(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: AuthError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body_bytes).unwrap())
    }

    #[tokio::test]
    async fn missing_session_redirects_to_sign_in() {
        let (status, body) = body_of(AuthError::NotAuthenticated).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error_code"], "not_authenticated");
        assert_eq!(body["redirect_to"], "/");
    }

    #[tokio::test]
    async fn missing_profile_redirects_to_onboarding() {
        let (status, body) = body_of(AuthError::ProfileRequired).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error_code"], "profile_required");
        assert_eq!(body["redirect_to"], "/onboarding.html");
    }

    #[tokio::test]
    async fn insufficient_permissions_has_no_redirect() {
        let (status, body) = body_of(AuthError::InsufficientPermissions).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body.get("redirect_to").is_none());
    }
}
