// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup. Unset values
//! fall back to defaults; malformed values are a [`ConfigError`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory holding the game database | `./data` |
//! | `PUBLIC_URL` | Base URL used to build login links | `http://localhost:8080` |
//! | `SESSION_SECRET` | HMAC key for session tokens and login link digests (min 32 bytes) | random per process |
//! | `SESSION_TTL_SECS` | Session lifetime | `604800` (7 days) |
//! | `LOGIN_LINK_TTL_SECS` | Login link lifetime | `900` (15 minutes) |
//! | `ADMIN_EMAILS` | Comma-separated emails granted admin on profile save | empty |
//! | `EXPOSE_LOGIN_LINKS` | Return login links in the API response (no mailer) | `false` |
//! | `QR_CACHE_CAPACITY` | Rendered QR images kept in memory | `512` |
//! | `TLS_CERT_PATH` | PEM certificate chain; enables HTTPS with `TLS_KEY_PATH` | unset |
//! | `TLS_KEY_PATH` | PEM private key | unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::Duration;

use crate::auth::session::normalize_email;
use crate::qr::DEFAULT_QR_CACHE_CAPACITY;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the data directory path.
///
/// The redb file `bingo.redb` is created inside it on first start.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const PUBLIC_URL_ENV: &str = "PUBLIC_URL";

/// Environment variable name for the session signing secret.
///
/// When unset a random secret is generated, so every restart signs all
/// users out.
pub const SESSION_SECRET_ENV: &str = "SESSION_SECRET";

pub const SESSION_TTL_ENV: &str = "SESSION_TTL_SECS";
pub const LOGIN_LINK_TTL_ENV: &str = "LOGIN_LINK_TTL_SECS";
pub const ADMIN_EMAILS_ENV: &str = "ADMIN_EMAILS";

/// Environment variable name for returning login links in API responses.
///
/// There is no outbound mailer; turn this on for local use and demos.
pub const EXPOSE_LOGIN_LINKS_ENV: &str = "EXPOSE_LOGIN_LINKS";

pub const QR_CACHE_CAPACITY_ENV: &str = "QR_CACHE_CAPACITY";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_PUBLIC_URL: &str = "http://localhost:8080";
pub const DEFAULT_SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;
pub const DEFAULT_LOGIN_LINK_TTL_SECS: i64 = 15 * 60;

const MIN_SECRET_LEN: usize = 32;
const MAX_TTL_SECS: i64 = 365 * 24 * 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be at least {min} bytes", min = MIN_SECRET_LEN)]
    WeakSecret(&'static str),

    #[error("TLS_CERT_PATH and TLS_KEY_PATH must be set together")]
    IncompleteTls,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// Read `LOG_FORMAT`. Anything other than `json` is pretty.
    pub fn from_env() -> Self {
        match std::env::var(LOG_FORMAT_ENV).as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub public_url: String,
    pub session_secret: Vec<u8>,
    pub session_ttl: Duration,
    pub login_link_ttl: Duration,
    /// Normalised emails
    pub admin_emails: Vec<String>,
    pub expose_login_links: bool,
    pub qr_cache_capacity: usize,
    pub tls: Option<TlsPaths>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get(PORT_ENV) {
            Some(raw) => parse_number(PORT_ENV, &raw)?,
            None => DEFAULT_PORT,
        };

        let data_dir = get(DATA_DIR_ENV).map(PathBuf::from).unwrap_or_else(|| {
            tracing::info!(default = DEFAULT_DATA_DIR, "{DATA_DIR_ENV} not set, using default");
            PathBuf::from(DEFAULT_DATA_DIR)
        });

        let public_url = match get(PUBLIC_URL_ENV) {
            Some(raw) => {
                url::Url::parse(&raw).map_err(|e| invalid(PUBLIC_URL_ENV, &raw, e))?;
                raw.trim_end_matches('/').to_string()
            }
            None => DEFAULT_PUBLIC_URL.to_string(),
        };

        let session_secret = match get(SESSION_SECRET_ENV) {
            Some(secret) if secret.len() >= MIN_SECRET_LEN => secret.into_bytes(),
            Some(_) => return Err(ConfigError::WeakSecret(SESSION_SECRET_ENV)),
            None => {
                tracing::warn!(
                    "{SESSION_SECRET_ENV} not set, generating a random secret; sessions will not survive restarts"
                );
                random_secret()
            }
        };

        let session_ttl = ttl(SESSION_TTL_ENV, get(SESSION_TTL_ENV), DEFAULT_SESSION_TTL_SECS)?;
        let login_link_ttl = ttl(
            LOGIN_LINK_TTL_ENV,
            get(LOGIN_LINK_TTL_ENV),
            DEFAULT_LOGIN_LINK_TTL_SECS,
        )?;

        let admin_emails = match get(ADMIN_EMAILS_ENV) {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|email| !email.is_empty())
                .map(|email| {
                    normalize_email(email).map_err(|e| invalid(ADMIN_EMAILS_ENV, email, e))
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        let expose_login_links = match get(EXPOSE_LOGIN_LINKS_ENV) {
            Some(raw) => parse_bool(EXPOSE_LOGIN_LINKS_ENV, &raw)?,
            None => false,
        };

        let qr_cache_capacity = match get(QR_CACHE_CAPACITY_ENV) {
            Some(raw) => parse_number(QR_CACHE_CAPACITY_ENV, &raw)?,
            None => DEFAULT_QR_CACHE_CAPACITY,
        };

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: PathBuf::from(cert),
                key: PathBuf::from(key),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteTls),
        };

        Ok(Self {
            host,
            port,
            data_dir,
            public_url,
            session_secret,
            session_ttl,
            login_link_ttl,
            admin_emails,
            expose_login_links,
            qr_cache_capacity,
            tls,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|e| invalid(HOST_ENV, &raw, e))
    }
}

fn invalid(var: &'static str, value: &str, reason: impl std::fmt::Display) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_number<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e| invalid(var, raw, e))
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(var, raw, "expected true or false")),
    }
}

fn ttl(var: &'static str, raw: Option<String>, default_secs: i64) -> Result<Duration, ConfigError> {
    let secs = match raw {
        Some(raw) => parse_number::<i64>(var, &raw)?,
        None => default_secs,
    };
    if !(1..=MAX_TTL_SECS).contains(&secs) {
        return Err(invalid(var, &secs.to_string(), "must be between 1 second and 1 year"));
    }
    Ok(Duration::seconds(secs))
}

fn random_secret() -> Vec<u8> {
    (0..4)
        .flat_map(|_| *uuid::Uuid::new_v4().as_bytes())
        .collect()
}
