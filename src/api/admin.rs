// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin-only API endpoints for running the game.
//!
//! These endpoints require an admin profile and provide:
//! - Question management
//! - System statistics

use std::sync::OnceLock;
use std::time::Instant;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    auth::AdminOnly,
    error::ApiError,
    state::AppState,
    storage::{ProfileRepository, Question, QuestionPatch, QuestionRepository, ScanRepository},
};

/// Longest question text accepted.
const MAX_QUESTION_LEN: usize = 200;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateQuestionRequest {
    pub text: String,
    /// Board position. Defaults to after the last question.
    #[serde(default)]
    pub order_index: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateQuestionRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub order_index: Option<i32>,
}

/// System statistics response.
#[derive(Debug, Serialize, ToSchema)]
pub struct SystemStatsResponse {
    /// Attendees with a saved profile.
    pub total_profiles: usize,
    pub total_questions: usize,
    pub total_scans: usize,
    /// Sum of all attendees' xp.
    pub total_xp: u64,
    /// Server uptime information.
    pub uptime_seconds: u64,
    /// Current timestamp.
    pub timestamp: String,
}

// ============================================================================
// Server start time (for uptime calculation)
// ============================================================================

static SERVER_START: OnceLock<Instant> = OnceLock::new();

/// Record the server start time. Call this at startup.
pub fn init_server_start_time() {
    SERVER_START.get_or_init(Instant::now);
}

fn uptime_seconds() -> u64 {
    SERVER_START.get_or_init(Instant::now).elapsed().as_secs()
}

fn validated_text(text: &str) -> Result<String, ApiError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ApiError::bad_request("Question text is required"));
    }
    if text.chars().count() > MAX_QUESTION_LEN {
        return Err(ApiError::bad_request(format!(
            "Question text must be at most {MAX_QUESTION_LEN} characters"
        )));
    }
    Ok(text.to_string())
}

// ============================================================================
// Handlers
// ============================================================================

#[utoipa::path(
    get,
    path = "/v1/admin/questions",
    operation_id = "admin_list_questions",
    tag = "Admin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All questions in board order", body = Vec<Question>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn list_questions(
    AdminOnly(_user, _profile): AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<Vec<Question>>, ApiError> {
    Ok(Json(QuestionRepository::new(&state.db).list()?))
}

#[utoipa::path(
    post,
    path = "/v1/admin/questions",
    tag = "Admin",
    security(("bearer" = [])),
    request_body = CreateQuestionRequest,
    responses(
        (status = 201, description = "Question created", body = Question),
        (status = 400, description = "Empty or overlong text"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn create_question(
    AdminOnly(user, _): AdminOnly,
    State(state): State<AppState>,
    Json(request): Json<CreateQuestionRequest>,
) -> Result<(StatusCode, Json<Question>), ApiError> {
    let text = validated_text(&request.text)?;
    let repo = QuestionRepository::new(&state.db);

    let order_index = match request.order_index {
        Some(order_index) => order_index,
        None => repo
            .list()?
            .iter()
            .map(|q| q.order_index)
            .max()
            .map_or(1, |last| last.saturating_add(1)),
    };

    let question = repo.create(&text, order_index)?;
    tracing::info!(
        admin_id = %user.user_id,
        question_id = question.id,
        "Question created"
    );
    Ok((StatusCode::CREATED, Json(question)))
}

#[utoipa::path(
    put,
    path = "/v1/admin/questions/{question_id}",
    tag = "Admin",
    security(("bearer" = [])),
    params(("question_id" = u64, Path, description = "Question ID")),
    request_body = UpdateQuestionRequest,
    responses(
        (status = 200, description = "Question updated", body = Question),
        (status = 400, description = "Empty or overlong text"),
        (status = 403, description = "Not authorized (admin required)"),
        (status = 404, description = "Question not found")
    )
)]
pub async fn update_question(
    AdminOnly(user, _): AdminOnly,
    State(state): State<AppState>,
    Path(question_id): Path<u64>,
    Json(request): Json<UpdateQuestionRequest>,
) -> Result<Json<Question>, ApiError> {
    let patch = QuestionPatch {
        text: request.text.as_deref().map(validated_text).transpose()?,
        order_index: request.order_index,
    };
    let question = QuestionRepository::new(&state.db).update(question_id, patch)?;
    tracing::info!(admin_id = %user.user_id, question_id, "Question updated");
    Ok(Json(question))
}

/// Delete a question. Questions someone has completed cannot be deleted.
#[utoipa::path(
    delete,
    path = "/v1/admin/questions/{question_id}",
    tag = "Admin",
    security(("bearer" = [])),
    params(("question_id" = u64, Path, description = "Question ID")),
    responses(
        (status = 204, description = "Question deleted"),
        (status = 403, description = "Not authorized (admin required)"),
        (status = 404, description = "Question not found"),
        (status = 409, description = "Question already has scans")
    )
)]
pub async fn delete_question(
    AdminOnly(user, _): AdminOnly,
    State(state): State<AppState>,
    Path(question_id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    QuestionRepository::new(&state.db).delete(question_id)?;
    tracing::info!(admin_id = %user.user_id, question_id, "Question deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Get system statistics.
#[utoipa::path(
    get,
    path = "/v1/admin/stats",
    tag = "Admin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "System statistics", body = SystemStatsResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn get_system_stats(
    AdminOnly(_user, _profile): AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<SystemStatsResponse>, ApiError> {
    let profiles = ProfileRepository::new(&state.db).list_all()?;

    Ok(Json(SystemStatsResponse {
        total_profiles: profiles.len(),
        total_questions: QuestionRepository::new(&state.db).count()?,
        total_scans: ScanRepository::new(&state.db).count()?,
        total_xp: profiles.iter().map(|p| p.xp).sum(),
        uptime_seconds: uptime_seconds(),
        timestamp: Utc::now().to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bingo::record_scan;
    use crate::state::testing::{attendee, test_state, ADMIN_EMAIL};
    use crate::storage::ProfileRepository;

    fn admin(state: &AppState) -> AdminOnly {
        let (_, user) = attendee(state, ADMIN_EMAIL, "Admin", "tADM");
        let profile = ProfileRepository::new(&state.db)
            .get(&user.user_id)
            .unwrap()
            .unwrap();
        AdminOnly(user, profile)
    }

    fn create(text: &str, order_index: Option<i32>) -> Json<CreateQuestionRequest> {
        Json(CreateQuestionRequest {
            text: text.to_string(),
            order_index,
        })
    }

    #[tokio::test]
    async fn create_appends_after_last_question() {
        let (state, _dir) = test_state();
        let AdminOnly(user, profile) = admin(&state);

        let (status, Json(first)) = create_question(
            AdminOnly(user.clone(), profile.clone()),
            State(state.clone()),
            create("  Find a speaker 🎤 ", Some(5)),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(first.text, "Find a speaker 🎤");

        let (_, Json(second)) = create_question(
            AdminOnly(user.clone(), profile.clone()),
            State(state.clone()),
            create("Swap stickers", None),
        )
        .await
        .unwrap();
        assert_eq!(second.order_index, 6);

        let empty = create_question(AdminOnly(user, profile), State(state), create("   ", None))
            .await
            .unwrap_err();
        assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_and_delete_question() {
        let (state, _dir) = test_state();
        let AdminOnly(user, profile) = admin(&state);
        let id = QuestionRepository::new(&state.db).create("Old", 1).unwrap().id;

        let Json(updated) = update_question(
            AdminOnly(user.clone(), profile.clone()),
            State(state.clone()),
            Path(id),
            Json(UpdateQuestionRequest {
                text: Some("New".to_string()),
                order_index: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.text, "New");
        assert_eq!(updated.order_index, 1);

        let status = delete_question(
            AdminOnly(user.clone(), profile.clone()),
            State(state.clone()),
            Path(id),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let missing = delete_question(AdminOnly(user, profile), State(state), Path(id))
            .await
            .unwrap_err();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn completed_question_cannot_be_deleted() {
        let (state, _dir) = test_state();
        let AdminOnly(user, profile) = admin(&state);
        let (_, a) = attendee(&state, "a@example.com", "Ada", "tAAA");
        attendee(&state, "b@example.com", "Grace", "tBBB");
        let id = QuestionRepository::new(&state.db).create("Q", 1).unwrap().id;
        record_scan(&state.db, &a.user_id, "tBBB", id).unwrap();

        let err = delete_question(AdminOnly(user, profile), State(state), Path(id))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn stats_count_everything() {
        let (state, _dir) = test_state();
        let AdminOnly(user, profile) = admin(&state);
        let (_, a) = attendee(&state, "a@example.com", "Ada", "tAAA");
        attendee(&state, "b@example.com", "Grace", "tBBB");
        let id = QuestionRepository::new(&state.db).create("Q", 1).unwrap().id;
        record_scan(&state.db, &a.user_id, "tBBB", id).unwrap();

        let Json(stats) = get_system_stats(AdminOnly(user, profile), State(state))
            .await
            .unwrap();
        assert_eq!(stats.total_profiles, 3);
        assert_eq!(stats.total_questions, 1);
        assert_eq!(stats.total_scans, 1);
        assert_eq!(stats.total_xp, 10);
    }
}
