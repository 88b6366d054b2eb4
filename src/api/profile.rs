// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Profile endpoints for the signed-in attendee.

use axum::{extract::State, Json};

use crate::{
    auth::{save_profile as save, validate_fields, Auth, RequireProfile},
    error::ApiError,
    models::{ProfileResponse, QrCodeResponse, SaveProfileRequest},
    state::AppState,
    storage::ProfileRepository,
};

/// The caller's profile, or `null` before onboarding.
#[utoipa::path(
    get,
    path = "/v1/profile/me",
    tag = "Profile",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Profile, or null if not saved yet", body = Option<ProfileResponse>),
        (status = 401, description = "No valid session")
    )
)]
pub async fn get_my_profile(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<Option<ProfileResponse>>, ApiError> {
    let profile = ProfileRepository::new(&state.db).get(&user.user_id)?;
    Ok(Json(profile.map(ProfileResponse::from)))
}

/// Create or update the caller's profile.
///
/// The scan token is created on first save and never changes afterwards.
#[utoipa::path(
    put,
    path = "/v1/profile",
    tag = "Profile",
    security(("bearer" = [])),
    request_body = SaveProfileRequest,
    responses(
        (status = 200, description = "Saved profile", body = ProfileResponse),
        (status = 400, description = "Missing name or invalid link"),
        (status = 401, description = "No valid session")
    )
)]
pub async fn save_profile(
    State(state): State<AppState>,
    Auth(user): Auth,
    Json(request): Json<SaveProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let fields = validate_fields(
        &request.full_name,
        &request.linkedin_url,
        request.github_url.as_deref(),
    )?;
    let profile = save(
        &state.db,
        &state.events,
        &user,
        fields,
        &state.settings.admin_emails,
    )?;
    Ok(Json(profile.into()))
}

/// The caller's personal QR code as an SVG data URL.
#[utoipa::path(
    get,
    path = "/v1/profile/me/qr",
    tag = "Profile",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "QR image", body = QrCodeResponse),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Profile not saved yet")
    )
)]
pub async fn get_my_qr(
    State(state): State<AppState>,
    RequireProfile(_user, profile): RequireProfile,
) -> Result<Json<QrCodeResponse>, ApiError> {
    let image = state
        .qr_cache
        .get_or_encode(&profile.qr_token)
        .ok_or_else(|| ApiError::internal("Could not render QR code"))?;
    Ok(Json(QrCodeResponse {
        qr_token: profile.qr_token,
        image,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qr::SVG_DATA_URL_PREFIX;
    use crate::state::testing::{attendee, sign_up, test_state};
    use axum::http::StatusCode;

    fn request(name: &str, linkedin: &str) -> Json<SaveProfileRequest> {
        Json(SaveProfileRequest {
            full_name: name.to_string(),
            linkedin_url: linkedin.to_string(),
            github_url: Some("https://github.com/ada".to_string()),
        })
    }

    #[tokio::test]
    async fn profile_is_null_before_onboarding() {
        let (state, _dir) = test_state();
        let (_, user) = sign_up(&state, "ada@example.com");

        let Json(profile) = get_my_profile(State(state), Auth(user)).await.unwrap();
        assert!(profile.is_none());
    }

    #[tokio::test]
    async fn save_then_read_back() {
        let (state, _dir) = test_state();
        let (_, user) = sign_up(&state, "ada@example.com");

        let Json(saved) = save_profile(
            State(state.clone()),
            Auth(user.clone()),
            request("Ada Lovelace", "https://linkedin.com/in/ada"),
        )
        .await
        .unwrap();
        assert_eq!(saved.profile.xp, 0);
        assert_eq!(saved.initials, "AL");

        let Json(again) = save_profile(
            State(state.clone()),
            Auth(user.clone()),
            request("Ada King", "https://linkedin.com/in/ada"),
        )
        .await
        .unwrap();
        assert_eq!(again.profile.qr_token, saved.profile.qr_token);

        let Json(read) = get_my_profile(State(state), Auth(user)).await.unwrap();
        assert_eq!(read.unwrap().profile.full_name, "Ada King");
    }

    #[tokio::test]
    async fn invalid_linkedin_is_bad_request() {
        let (state, _dir) = test_state();
        let (_, user) = sign_up(&state, "ada@example.com");

        let err = save_profile(
            State(state),
            Auth(user),
            request("Ada", "https://example.com/ada"),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Please enter a valid LinkedIn URL");
    }

    #[tokio::test]
    async fn qr_is_rendered_and_cached() {
        let (state, _dir) = test_state();
        let (_, user) = attendee(&state, "ada@example.com", "Ada", "tAAA");
        let profile = ProfileRepository::new(&state.db)
            .get(&user.user_id)
            .unwrap()
            .unwrap();

        let Json(qr) = get_my_qr(State(state.clone()), RequireProfile(user, profile))
            .await
            .unwrap();
        assert_eq!(qr.qr_token, "tAAA");
        assert!(qr.image.starts_with(SVG_DATA_URL_PREFIX));
        assert_eq!(state.qr_cache.get("tAAA"), Some(qr.image));
    }
}
