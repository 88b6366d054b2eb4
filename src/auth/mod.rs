// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Accounts, sessions and the redirect policy for the bingo API.
//!
//! ## Auth Flow
//!
//! 1. Client signs up or in with email + password, or redeems a login link
//! 2. Server stores a session row and returns a signed session token
//! 3. Client sends `Authorization: Bearer <session token>`
//! 4. Server:
//!    - Verifies the HS256 signature, expiry and issuer
//!    - Checks the token's `sid` still names a live session
//!    - Loads the caller's profile when the route needs one
//!
//! ## Redirects
//!
//! - No or dead session → 401 with `redirect_to: "/"`
//! - Session without a profile → 403 with `redirect_to: "/onboarding.html"`

pub mod claims;
pub mod credentials;
pub mod error;
pub mod events;
pub mod extractor;
pub mod profile;
pub mod roles;
pub mod session;

pub use claims::{AuthenticatedUser, SessionClaims};
pub use credentials::Credentials;
pub use error::{AuthError, ONBOARDING_REDIRECT, SIGN_IN_REDIRECT};
pub use events::{AuthEvent, AuthEvents, Subscription};
pub use extractor::{AdminOnly, Auth, OptionalAuth, RequireProfile};
pub use profile::{save_profile, validate_fields, ProfileError};
pub use roles::Role;
pub use session::{IssuedLoginLink, IssuedSession, SessionManager};
