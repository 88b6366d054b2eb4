// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{AuthenticatedUser, Role},
    bingo::{LeaderboardEntry, NetworkProfile},
    models::{
        CredentialsRequest, LoginLinkRequest, LoginLinkResponse, ProfileResponse, QrCodeResponse,
        QuestionView, SaveProfileRequest, ScanPair, ScanRequest, ScanResponse, SessionResponse,
        SessionTokenResponse, VerifyLoginLinkRequest,
    },
    state::AppState,
    storage::{Profile, Question, Scan},
};

pub mod admin;
pub mod auth;
pub mod bingo;
pub mod health;
pub mod profile;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        // Auth
        .route("/auth/signup", post(auth::sign_up))
        .route("/auth/signin", post(auth::sign_in))
        .route("/auth/magic-link", post(auth::request_login_link))
        .route("/auth/magic-link/verify", post(auth::verify_login_link))
        .route("/auth/signout", post(auth::sign_out))
        .route("/session", get(auth::current_session))
        // Profile
        .route("/profile", put(profile::save_profile))
        .route("/profile/me", get(profile::get_my_profile))
        .route("/profile/me/qr", get(profile::get_my_qr))
        // Game
        .route("/questions", get(bingo::list_questions))
        .route(
            "/scans",
            get(bingo::list_my_scans).post(bingo::record_scan),
        )
        .route("/network", get(bingo::get_network))
        .route("/leaderboard", get(bingo::get_leaderboard))
        // Admin
        .route(
            "/admin/questions",
            get(admin::list_questions).post(admin::create_question),
        )
        .route(
            "/admin/questions/{question_id}",
            put(admin::update_question).delete(admin::delete_question),
        )
        .route("/admin/stats", get(admin::get_system_stats));

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

/// Registers the bearer scheme referenced by `security(("bearer" = []))`.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::sign_up,
        auth::sign_in,
        auth::request_login_link,
        auth::verify_login_link,
        auth::sign_out,
        auth::current_session,
        profile::get_my_profile,
        profile::save_profile,
        profile::get_my_qr,
        bingo::list_questions,
        bingo::list_my_scans,
        bingo::record_scan,
        bingo::get_network,
        bingo::get_leaderboard,
        admin::list_questions,
        admin::create_question,
        admin::update_question,
        admin::delete_question,
        admin::get_system_stats,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            AuthenticatedUser,
            Role,
            CredentialsRequest,
            LoginLinkRequest,
            VerifyLoginLinkRequest,
            LoginLinkResponse,
            SessionTokenResponse,
            SessionResponse,
            SaveProfileRequest,
            ProfileResponse,
            QrCodeResponse,
            Profile,
            Question,
            QuestionView,
            Scan,
            ScanPair,
            ScanRequest,
            ScanResponse,
            NetworkProfile,
            LeaderboardEntry,
            admin::CreateQuestionRequest,
            admin::UpdateQuestionRequest,
            admin::SystemStatsResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Auth", description = "Accounts, sessions and login links"),
        (name = "Profile", description = "Attendee profile and personal QR code"),
        (name = "Bingo", description = "Board, check-ins, network and leaderboard"),
        (name = "Admin", description = "Question management and statistics"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::{attendee, test_state};
    use crate::storage::QuestionRepository;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn send_json(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn health_is_ok_and_tagged_with_request_id() {
        let (state, _dir) = test_state();
        let response = router(state).oneshot(get("/health", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn missing_session_redirects_to_sign_in() {
        let (state, _dir) = test_state();
        let response = router(state)
            .oneshot(get("/v1/profile/me", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error_code"], "not_authenticated");
        assert_eq!(body["redirect_to"], "/");
    }

    #[tokio::test]
    async fn scanning_before_onboarding_redirects_to_onboarding() {
        let (state, _dir) = test_state();
        let (token, _) = crate::state::testing::sign_up(&state, "new@example.com");

        let response = router(state)
            .oneshot(get("/v1/network", Some(&token)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_json(response).await;
        assert_eq!(body["redirect_to"], "/onboarding.html");
    }

    #[tokio::test]
    async fn admin_routes_reject_attendees() {
        let (state, _dir) = test_state();
        let (token, _) = attendee(&state, "ada@example.com", "Ada", "tAAA");

        let response = router(state)
            .oneshot(get("/v1/admin/stats", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn sign_up_onboard_and_scan() {
        let (state, _dir) = test_state();
        attendee(&state, "grace@example.com", "Grace Hopper", "tGRACE");
        let question_id = QuestionRepository::new(&state.db)
            .create("Find someone who ships Rust 🦀", 1)
            .unwrap()
            .id;
        let app = router(state);

        let response = app
            .clone()
            .oneshot(send_json(
                "POST",
                "/v1/auth/signup",
                None,
                json!({ "email": "ada@example.com", "password": "analytical engine" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let token = body_json(response).await["token"]
            .as_str()
            .unwrap()
            .to_string();

        let response = app
            .clone()
            .oneshot(send_json(
                "PUT",
                "/v1/profile",
                Some(&token),
                json!({
                    "full_name": "Ada Lovelace",
                    "linkedin_url": "https://www.linkedin.com/in/ada"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["initials"], "AL");

        let response = app
            .clone()
            .oneshot(send_json(
                "POST",
                "/v1/scans",
                Some(&token),
                json!({ "token": "tGRACE", "question_id": question_id }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["scanned_name"], "Grace Hopper");
        assert_eq!(body["xp"], 10);

        let response = app
            .clone()
            .oneshot(get("/v1/leaderboard?limit=1", Some(&token)))
            .await
            .unwrap();
        let ranking = body_json(response).await;
        assert_eq!(ranking.as_array().unwrap().len(), 1);
        assert_eq!(ranking[0]["full_name"], "Ada Lovelace");
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let (state, _dir) = test_state();
        let response = router(state)
            .oneshot(get("/api-doc/openapi.json", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let doc = body_json(response).await;
        assert!(doc["paths"]["/v1/scans"].is_object());
        assert!(doc["components"]["securitySchemes"]["bearer"].is_object());
    }
}
