// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Game endpoints: board, check-ins, network and leaderboard.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    auth::{Auth, RequireProfile},
    bingo::{self, LeaderboardEntry, NetworkProfile, DEFAULT_LEADERBOARD_LIMIT},
    error::ApiError,
    models::{QuestionView, ScanPair, ScanRequest, ScanResponse},
    state::AppState,
    storage::{QuestionRepository, ScanRepository},
};

/// Query parameters for the leaderboard.
#[derive(Debug, Deserialize, IntoParams)]
pub struct LeaderboardParams {
    /// Maximum number of entries (default 50, max 100).
    pub limit: Option<usize>,
}

/// All challenges in board order.
#[utoipa::path(
    get,
    path = "/v1/questions",
    tag = "Bingo",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Questions ordered by order_index", body = Vec<QuestionView>),
        (status = 401, description = "No valid session")
    )
)]
pub async fn list_questions(
    State(state): State<AppState>,
    Auth(_user): Auth,
) -> Result<Json<Vec<QuestionView>>, ApiError> {
    let questions = QuestionRepository::new(&state.db).list()?;
    Ok(Json(questions.into_iter().map(QuestionView::from).collect()))
}

/// The caller's completed (question, attendee) pairs, newest first.
#[utoipa::path(
    get,
    path = "/v1/scans",
    tag = "Bingo",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Completed challenges", body = Vec<ScanPair>),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Profile not saved yet")
    )
)]
pub async fn list_my_scans(
    State(state): State<AppState>,
    RequireProfile(user, _): RequireProfile,
) -> Result<Json<Vec<ScanPair>>, ApiError> {
    let scans = ScanRepository::new(&state.db).list_by_scanner(&user.user_id)?;
    Ok(Json(scans.into_iter().map(ScanPair::from).collect()))
}

/// Check in with another attendee for one challenge.
///
/// Awards xp to the caller. Each challenge can be completed once.
#[utoipa::path(
    post,
    path = "/v1/scans",
    tag = "Bingo",
    security(("bearer" = [])),
    request_body = ScanRequest,
    responses(
        (status = 201, description = "Scan recorded", body = ScanResponse),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Profile not saved yet"),
        (status = 404, description = "Unknown QR token or question"),
        (status = 409, description = "Challenge already completed"),
        (status = 422, description = "Scanned own QR code")
    )
)]
pub async fn record_scan(
    State(state): State<AppState>,
    RequireProfile(user, _): RequireProfile,
    Json(request): Json<ScanRequest>,
) -> Result<(StatusCode, Json<ScanResponse>), ApiError> {
    let receipt = bingo::record_scan(
        &state.db,
        &user.user_id,
        &request.token,
        request.question_id,
    )?;
    state.events.publish(crate::auth::AuthEvent::UserUpdated {
        user_id: user.user_id,
    });
    Ok((StatusCode::CREATED, Json(receipt.into())))
}

/// Attendees the caller has scanned, most recent first, without duplicates.
#[utoipa::path(
    get,
    path = "/v1/network",
    tag = "Bingo",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Network", body = Vec<NetworkProfile>),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Profile not saved yet")
    )
)]
pub async fn get_network(
    State(state): State<AppState>,
    RequireProfile(user, _): RequireProfile,
) -> Result<Json<Vec<NetworkProfile>>, ApiError> {
    Ok(Json(bingo::get_network(&state.db, &user.user_id)?))
}

#[utoipa::path(
    get,
    path = "/v1/leaderboard",
    tag = "Bingo",
    security(("bearer" = [])),
    params(LeaderboardParams),
    responses(
        (status = 200, description = "Attendees ranked by xp", body = Vec<LeaderboardEntry>),
        (status = 401, description = "No valid session")
    )
)]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Auth(_user): Auth,
    Query(params): Query<LeaderboardParams>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT);
    Ok(Json(bingo::leaderboard(&state.db, limit)?))
}
