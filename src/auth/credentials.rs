// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential flows: sign-up, sign-in, passwordless links and sign-out.
//!
//! Every flow that creates or destroys a session publishes an [`AuthEvent`].

use super::events::{AuthEvent, AuthEvents};
use super::session::{
    hash_password_blocking, normalize_email, verify_password_blocking, IssuedLoginLink,
    IssuedSession, SessionManager,
};
use super::{AuthError, AuthenticatedUser};
use crate::storage::{AccountRepository, BingoDatabase, DbError, StoredAccount};

pub struct Credentials<'a> {
    db: &'a BingoDatabase,
    sessions: &'a SessionManager,
    events: &'a AuthEvents,
}

impl<'a> Credentials<'a> {
    pub fn new(db: &'a BingoDatabase, sessions: &'a SessionManager, events: &'a AuthEvents) -> Self {
        Self {
            db,
            sessions,
            events,
        }
    }

    /// Create a password account and sign it in.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<IssuedSession, AuthError> {
        let email = normalize_email(email)?;
        let hash = hash_password_blocking(password.to_string()).await?;
        let account = StoredAccount::new(email, Some(hash));

        match AccountRepository::new(self.db).create(&account) {
            Ok(()) => {}
            Err(DbError::AlreadyExists(_)) => return Err(AuthError::AccountExists),
            Err(e) => return Err(e.into()),
        }
        tracing::info!(user_id = %account.user_id, "Account created");

        self.open_session(&account)
    }

    /// Unknown emails and passwordless accounts still pay for one hash
    /// check, so a rejection takes as long as a wrong password.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<IssuedSession, AuthError> {
        let email = normalize_email(email).map_err(|_| AuthError::InvalidCredentials)?;
        let account = AccountRepository::new(self.db).get(&email)?;
        let stored_hash = account.as_ref().and_then(|a| a.password_hash.clone());

        let matches = verify_password_blocking(password.to_string(), stored_hash).await?;
        match account {
            Some(account) if matches => self.open_session(&account),
            _ => {
                tracing::debug!("Password sign-in rejected");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Issue a passwordless login link for `email`.
    ///
    /// The account is created when the link is redeemed, not here.
    pub fn request_login_link(&self, email: &str) -> Result<IssuedLoginLink, AuthError> {
        let email = normalize_email(email)?;
        let link = self.sessions.create_login_link(self.db, &email)?;
        tracing::info!(expires_at = %link.expires_at, "Login link issued");
        Ok(link)
    }

    /// Redeem a login link, creating a passwordless account on first use.
    pub fn verify_login_link(&self, token: &str) -> Result<IssuedSession, AuthError> {
        let email = self.sessions.consume_login_link(self.db, token)?;
        let account = AccountRepository::new(self.db).get_or_create_passwordless(&email)?;
        self.open_session(&account)
    }

    /// Revoke the caller's session.
    pub fn sign_out(&self, user: &AuthenticatedUser) -> Result<(), AuthError> {
        if self.sessions.revoke(self.db, &user.session_id)? {
            tracing::info!(user_id = %user.user_id, "Signed out");
            self.events.publish(AuthEvent::SignedOut {
                user_id: user.user_id.clone(),
                session_id: user.session_id.clone(),
            });
        }
        Ok(())
    }

    fn open_session(&self, account: &StoredAccount) -> Result<IssuedSession, AuthError> {
        let issued = self
            .sessions
            .issue(self.db, &account.user_id, &account.email)?;
        tracing::info!(
            user_id = %account.user_id,
            session_id = %issued.session.sid,
            "Signed in"
        );
        self.events.publish(AuthEvent::SignedIn {
            user_id: account.user_id.clone(),
            session_id: issued.session.sid.clone(),
        });
        Ok(issued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    struct Fixture {
        db: BingoDatabase,
        sessions: SessionManager,
        events: AuthEvents,
        _dir: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().expect("Failed to create temp dir");
            Self {
                db: BingoDatabase::open_in_dir(dir.path()).expect("Failed to open db"),
                sessions: SessionManager::new(b"secret", Duration::hours(1), Duration::minutes(15)),
                events: AuthEvents::default(),
                _dir: dir,
            }
        }

        fn credentials(&self) -> Credentials<'_> {
            Credentials::new(&self.db, &self.sessions, &self.events)
        }
    }

    #[tokio::test]
    async fn sign_up_then_sign_in() {
        let fx = Fixture::new();
        let mut sub = fx.events.subscribe();

        let issued = fx.credentials().sign_up("Ada@Example.com", "analytical").await.unwrap();
        assert_eq!(issued.session.email, "ada@example.com");
        assert!(matches!(sub.try_recv(), Some(AuthEvent::SignedIn { .. })));

        let again = fx.credentials().sign_in("ada@example.com", "analytical").await.unwrap();
        assert_eq!(again.session.user_id, issued.session.user_id);
        assert_ne!(again.session.sid, issued.session.sid);
    }

    /// Count scheduler turns until `done` is set.
    async fn ticks_until(done: &AtomicBool) -> u32 {
        let mut ticks = 0u32;
        while !done.load(Ordering::Acquire) {
            ticks += 1;
            tokio::task::yield_now().await;
        }
        ticks
    }

    #[tokio::test]
    async fn password_hashing_leaves_runtime_free() {
        let fx = Fixture::new();
        fx.credentials().sign_up("ada@example.com", "analytical").await.unwrap();

        // Single-threaded runtime: the counter only advances if sign-in
        // yields while Argon2 runs.
        let done = AtomicBool::new(false);
        let sign_in = async {
            let result = fx.credentials().sign_in("ada@example.com", "analytical").await;
            done.store(true, Ordering::Release);
            result
        };

        let (ticks, result) = tokio::join!(ticks_until(&done), sign_in);
        assert!(result.is_ok());
        assert!(ticks > 1, "runtime stalled during sign-in");

        done.store(false, Ordering::Release);
        let unknown = async {
            let result = fx.credentials().sign_in("nobody@example.com", "analytical").await;
            done.store(true, Ordering::Release);
            result
        };
        let (ticks, result) = tokio::join!(ticks_until(&done), unknown);
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        assert!(ticks > 1, "unknown email skipped the hash check");
    }

    #[tokio::test]
    async fn duplicate_sign_up_is_rejected() {
        let fx = Fixture::new();
        fx.credentials().sign_up("ada@example.com", "analytical").await.unwrap();
        assert!(matches!(
            fx.credentials().sign_up("ADA@example.com", "different-pass").await,
            Err(AuthError::AccountExists)
        ));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let fx = Fixture::new();
        fx.credentials().sign_up("ada@example.com", "analytical").await.unwrap();

        assert!(matches!(
            fx.credentials().sign_in("ada@example.com", "wrong-password").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            fx.credentials().sign_in("nobody@example.com", "analytical").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn login_link_creates_passwordless_account_once() {
        let fx = Fixture::new();
        let creds = fx.credentials();

        let link = creds.request_login_link("grace@example.com").unwrap();
        let first = creds.verify_login_link(&link.token).unwrap();
        assert!(matches!(
            creds.verify_login_link(&link.token),
            Err(AuthError::LinkExpired)
        ));

        let link = creds.request_login_link("grace@example.com").unwrap();
        let second = creds.verify_login_link(&link.token).unwrap();
        assert_eq!(first.session.user_id, second.session.user_id);

        // Passwordless accounts cannot use password sign-in.
        assert!(matches!(
            creds.sign_in("grace@example.com", "anything-at-all").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn sign_out_revokes_and_notifies() {
        let fx = Fixture::new();
        let creds = fx.credentials();
        let issued = creds.sign_up("ada@example.com", "analytical").await.unwrap();
        let user = fx.sessions.verify(&fx.db, &issued.token).unwrap();

        let mut sub = fx.events.subscribe();
        creds.sign_out(&user).unwrap();

        assert!(matches!(sub.try_recv(), Some(AuthEvent::SignedOut { .. })));
        assert!(matches!(
            fx.sessions.verify(&fx.db, &issued.token),
            Err(AuthError::SessionRevoked)
        ));

        // Signing out twice is harmless and silent.
        creds.sign_out(&user).unwrap();
        assert_eq!(sub.try_recv(), None);
    }
}
