// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{AuthEvents, SessionManager};
use crate::config::{ServerConfig, DEFAULT_PUBLIC_URL};
use crate::qr::QrCache;
use crate::storage::{BingoDatabase, DbError};

/// Settings handlers read on every request.
#[derive(Debug, Clone)]
pub struct GameSettings {
    /// Base URL for links sent to attendees, without trailing slash.
    pub public_url: String,
    /// Normalised emails granted admin on profile save.
    pub admin_emails: Vec<String>,
    /// Return login links in API responses instead of relying on email.
    pub expose_login_links: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            admin_emails: Vec::new(),
            expose_login_links: false,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<BingoDatabase>,
    pub sessions: Arc<SessionManager>,
    pub events: AuthEvents,
    pub qr_cache: Arc<QrCache>,
    pub settings: Arc<GameSettings>,
}

impl AppState {
    pub fn new(db: BingoDatabase, sessions: SessionManager) -> Self {
        Self {
            db: Arc::new(db),
            sessions: Arc::new(sessions),
            events: AuthEvents::default(),
            qr_cache: Arc::new(QrCache::default()),
            settings: Arc::new(GameSettings::default()),
        }
    }

    /// Open the database under `config.data_dir` and wire everything up.
    pub fn from_config(config: &ServerConfig) -> Result<Self, DbError> {
        let db = BingoDatabase::open_in_dir(&config.data_dir)?;
        let sessions = SessionManager::new(
            &config.session_secret,
            config.session_ttl,
            config.login_link_ttl,
        );

        Ok(Self::new(db, sessions)
            .with_qr_cache(QrCache::new(config.qr_cache_capacity))
            .with_settings(GameSettings {
                public_url: config.public_url.clone(),
                admin_emails: config.admin_emails.clone(),
                expose_login_links: config.expose_login_links,
            }))
    }

    pub fn with_settings(mut self, settings: GameSettings) -> Self {
        self.settings = Arc::new(settings);
        self
    }

    pub fn with_qr_cache(mut self, cache: QrCache) -> Self {
        self.qr_cache = Arc::new(cache);
        self
    }
}

/// Throwaway state for handler and router tests.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    use crate::auth::session::{hash_password, normalize_email};
    use crate::auth::AuthenticatedUser;
    use crate::storage::{AccountRepository, ProfileRepository, StoredAccount};

    pub const ADMIN_EMAIL: &str = "admin@example.com";

    pub fn test_state() -> (AppState, TempDir) {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db = BingoDatabase::open_in_dir(dir.path()).expect("Failed to open db");
        let sessions = SessionManager::new(
            b"test-secret-test-secret-test-secret",
            Duration::hours(1),
            Duration::minutes(15),
        );
        let state = AppState::new(db, sessions).with_settings(GameSettings {
            public_url: "https://bingo.test".to_string(),
            admin_emails: vec![ADMIN_EMAIL.to_string()],
            expose_login_links: true,
        });
        (state, dir)
    }

    /// Create a password account for `email` and return a bearer token
    /// with its user. Runs outside a runtime, so it hashes inline.
    pub fn sign_up(state: &AppState, email: &str) -> (String, AuthenticatedUser) {
        let email = normalize_email(email).expect("valid email");
        let hash = hash_password("correct horse battery").expect("hash");
        let account = StoredAccount::new(email, Some(hash));
        AccountRepository::new(&state.db)
            .create(&account)
            .expect("create account");
        let issued = state
            .sessions
            .issue(&state.db, &account.user_id, &account.email)
            .expect("issue session");
        let user = state
            .sessions
            .verify(&state.db, &issued.token)
            .expect("fresh token verifies");
        (issued.token, user)
    }

    /// Sign up `email` and give the account a profile with `qr_token`.
    pub fn attendee(
        state: &AppState,
        email: &str,
        name: &str,
        qr_token: &str,
    ) -> (String, AuthenticatedUser) {
        let (token, user) = sign_up(state, email);
        crate::auth::save_profile(
            &state.db,
            &state.events,
            &user,
            crate::auth::validate_fields(name, "https://linkedin.com/in/someone", None)
                .expect("valid fields"),
            &state.settings.admin_emails,
        )
        .expect("save profile");
        ProfileRepository::new(&state.db)
            .set_token(&user.user_id, qr_token)
            .expect("set token");
        (token, user)
    }
}
