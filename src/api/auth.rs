// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sign-up, sign-in, login links, sign-out and session lookup.

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    auth::{
        Auth, AuthError, Credentials, OptionalAuth, Role, ONBOARDING_REDIRECT, SIGN_IN_REDIRECT,
    },
    models::{
        CredentialsRequest, LoginLinkRequest, LoginLinkResponse, SessionResponse,
        SessionTokenResponse, VerifyLoginLinkRequest,
    },
    state::AppState,
    storage::ProfileRepository,
};

fn credentials(state: &AppState) -> Credentials<'_> {
    Credentials::new(&state.db, &state.sessions, &state.events)
}

#[utoipa::path(
    post,
    path = "/v1/auth/signup",
    tag = "Auth",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "Account created and signed in", body = SessionTokenResponse),
        (status = 400, description = "Invalid email or weak password"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<SessionTokenResponse>), AuthError> {
    let issued = credentials(&state)
        .sign_up(&request.email, &request.password)
        .await?;
    Ok((StatusCode::CREATED, Json(issued.into())))
}

#[utoipa::path(
    post,
    path = "/v1/auth/signin",
    tag = "Auth",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionTokenResponse),
        (status = 401, description = "Invalid email or password")
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<SessionTokenResponse>, AuthError> {
    let issued = credentials(&state)
        .sign_in(&request.email, &request.password)
        .await?;
    Ok(Json(issued.into()))
}

/// Request a passwordless login link.
///
/// The link opens onboarding with the token attached. Without a mailer the
/// link is only returned when `EXPOSE_LOGIN_LINKS` is on.
#[utoipa::path(
    post,
    path = "/v1/auth/magic-link",
    tag = "Auth",
    request_body = LoginLinkRequest,
    responses(
        (status = 202, description = "Link issued", body = LoginLinkResponse),
        (status = 400, description = "Invalid email")
    )
)]
pub async fn request_login_link(
    State(state): State<AppState>,
    Json(request): Json<LoginLinkRequest>,
) -> Result<(StatusCode, Json<LoginLinkResponse>), AuthError> {
    let issued = credentials(&state).request_login_link(&request.email)?;

    let link = state.settings.expose_login_links.then(|| {
        format!(
            "{}{}?token={}",
            state.settings.public_url, ONBOARDING_REDIRECT, issued.token
        )
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(LoginLinkResponse {
            expires_at: issued.expires_at,
            link,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/v1/auth/magic-link/verify",
    tag = "Auth",
    request_body = VerifyLoginLinkRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionTokenResponse),
        (status = 401, description = "Link invalid, used or expired")
    )
)]
pub async fn verify_login_link(
    State(state): State<AppState>,
    Json(request): Json<VerifyLoginLinkRequest>,
) -> Result<Json<SessionTokenResponse>, AuthError> {
    let issued = credentials(&state).verify_login_link(request.token.trim())?;
    Ok(Json(issued.into()))
}

#[utoipa::path(
    post,
    path = "/v1/auth/signout",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Session revoked"),
        (status = 401, description = "No valid session")
    )
)]
pub async fn sign_out(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<StatusCode, AuthError> {
    credentials(&state).sign_out(&user)?;
    Ok(StatusCode::NO_CONTENT)
}

/// The caller's session and where the client should go next.
///
/// Never fails on a missing or dead session; it reports it instead.
#[utoipa::path(
    get,
    path = "/v1/session",
    tag = "Auth",
    responses(
        (status = 200, description = "Session state", body = SessionResponse)
    )
)]
pub async fn current_session(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<SessionResponse>, AuthError> {
    let Some(user) = user else {
        return Ok(Json(SessionResponse {
            authenticated: false,
            user_id: None,
            email: None,
            has_profile: false,
            role: None,
            redirect_to: Some(SIGN_IN_REDIRECT.to_string()),
        }));
    };

    let profile = ProfileRepository::new(&state.db).get(&user.user_id)?;
    Ok(Json(SessionResponse {
        authenticated: true,
        user_id: Some(user.user_id),
        email: Some(user.email),
        has_profile: profile.is_some(),
        role: profile.as_ref().map(Role::of),
        redirect_to: profile
            .is_none()
            .then(|| ONBOARDING_REDIRECT.to_string()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::{attendee, sign_up as signed_up, test_state};

    fn creds(email: &str) -> Json<CredentialsRequest> {
        Json(CredentialsRequest {
            email: email.to_string(),
            password: "correct horse battery".to_string(),
        })
    }

    #[tokio::test]
    async fn sign_up_returns_created_session() {
        let (state, _dir) = test_state();
        let (status, Json(body)) = sign_up(State(state.clone()), creds("ada@example.com"))
            .await
            .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body.email, "ada@example.com");
        assert!(state.sessions.verify(&state.db, &body.token).is_ok());
    }

    #[tokio::test]
    async fn sign_in_after_sign_up() {
        let (state, _dir) = test_state();
        sign_up(State(state.clone()), creds("ada@example.com")).await.unwrap();

        let Json(body) = sign_in(State(state.clone()), creds("ADA@example.com"))
            .await
            .unwrap();
        assert_eq!(body.email, "ada@example.com");
    }

    #[tokio::test]
    async fn login_link_round_trip() {
        let (state, _dir) = test_state();
        let (status, Json(body)) = request_login_link(
            State(state.clone()),
            Json(LoginLinkRequest {
                email: "grace@example.com".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);

        let link = body.link.expect("links are exposed in tests");
        let prefix = "https://bingo.test/onboarding.html?token=";
        assert!(link.starts_with(prefix));
        let token = link[prefix.len()..].to_string();

        let Json(session) = verify_login_link(
            State(state.clone()),
            Json(VerifyLoginLinkRequest { token: token.clone() }),
        )
        .await
        .unwrap();
        assert_eq!(session.email, "grace@example.com");

        let reused = verify_login_link(State(state), Json(VerifyLoginLinkRequest { token })).await;
        assert!(matches!(reused, Err(AuthError::LinkExpired)));
    }

    #[tokio::test]
    async fn session_reports_redirects() {
        let (state, _dir) = test_state();

        let Json(anonymous) = current_session(State(state.clone()), OptionalAuth(None))
            .await
            .unwrap();
        assert!(!anonymous.authenticated);
        assert_eq!(anonymous.redirect_to.as_deref(), Some("/"));

        let (_, newcomer) = signed_up(&state, "new@example.com");
        let Json(onboarding) = current_session(State(state.clone()), OptionalAuth(Some(newcomer)))
            .await
            .unwrap();
        assert!(onboarding.authenticated);
        assert!(!onboarding.has_profile);
        assert_eq!(onboarding.redirect_to.as_deref(), Some("/onboarding.html"));

        let (_, ada) = attendee(&state, "ada@example.com", "Ada", "tAAA");
        let Json(ready) = current_session(State(state), OptionalAuth(Some(ada)))
            .await
            .unwrap();
        assert!(ready.has_profile);
        assert_eq!(ready.role, Some(Role::Attendee));
        assert!(ready.redirect_to.is_none());
    }

    #[tokio::test]
    async fn sign_out_revokes_token() {
        let (state, _dir) = test_state();
        let (token, user) = signed_up(&state, "ada@example.com");

        let status = sign_out(State(state.clone()), Auth(user)).await.unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        assert!(matches!(
            state.sessions.verify(&state.db, &token),
            Err(AuthError::SessionRevoked)
        ));
    }
}
