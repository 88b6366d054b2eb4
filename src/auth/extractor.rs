// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for authenticated users.
//!
//! ```rust,ignore
//! async fn my_handler(RequireProfile(user, profile): RequireProfile) -> impl IntoResponse {
//!     // user is AuthenticatedUser, profile is the caller's saved Profile
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::{AuthError, AuthenticatedUser, Role};
use crate::state::AppState;
use crate::storage::{Profile, ProfileRepository};

/// Extractor for a live session.
///
/// Reads `Authorization: Bearer <session token>` and checks the session
/// still exists. Rejects with 401 and a redirect to sign-in.
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(Auth(user));
        }

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::NotAuthenticated)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidAuthHeader)?;

        let user = state.sessions.verify(&state.db, token.trim())?;

        // Later extractors on the same request reuse the verified user.
        parts.extensions.insert(user.clone());
        Ok(Auth(user))
    }
}

/// Optional authentication extractor.
///
/// Returns `None` if no valid session is present, instead of rejecting.
pub struct OptionalAuth(pub Option<AuthenticatedUser>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match Auth::from_request_parts(parts, state).await {
            Ok(Auth(user)) => Ok(OptionalAuth(Some(user))),
            Err(_) => Ok(OptionalAuth(None)),
        }
    }
}

/// Extractor for a session whose user has saved a profile.
///
/// Rejects with 403 `profile_required` and a redirect to onboarding.
pub struct RequireProfile(pub AuthenticatedUser, pub Profile);

impl FromRequestParts<AppState> for RequireProfile {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Auth(user) = Auth::from_request_parts(parts, state).await?;
        let profile = ProfileRepository::new(&state.db)
            .get(&user.user_id)?
            .ok_or(AuthError::ProfileRequired)?;
        Ok(RequireProfile(user, profile))
    }
}

/// Extractor that requires an admin profile.
pub struct AdminOnly(pub AuthenticatedUser, pub Profile);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let RequireProfile(user, profile) = RequireProfile::from_request_parts(parts, state).await?;

        if !Role::of(&profile).has_privilege(Role::Admin) {
            return Err(AuthError::InsufficientPermissions);
        }

        Ok(AdminOnly(user, profile))
    }
}
