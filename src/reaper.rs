// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Reaper
//!
//! Background task that periodically deletes expired sessions and login
//! links. Expired rows are already rejected on use; the reaper only keeps
//! the tables from growing for the length of the event.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::storage::{BingoDatabase, DbResult, LoginLinkRepository, SessionRepository};

/// Default interval between sweeps.
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Rows removed by one sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub sessions: usize,
    pub login_links: usize,
}

pub struct SessionReaper {
    db: Arc<BingoDatabase>,
    sweep_interval: Duration,
}

impl SessionReaper {
    pub fn new(db: Arc<BingoDatabase>) -> Self {
        Self {
            db,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    pub fn with_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }

    /// Run the sweep loop until the cancellation token is triggered.
    ///
    /// ```rust,ignore
    /// tokio::spawn(reaper.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.sweep_interval.as_secs(),
            "Session reaper starting"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("Session reaper shutting down");
                return;
            }

            match self.sweep() {
                Ok(report) if report != SweepReport::default() => {
                    info!(
                        sessions = report.sessions,
                        login_links = report.login_links,
                        "Session reaper: purged expired rows"
                    );
                }
                Ok(_) => debug!("Session reaper: nothing to purge"),
                Err(e) => warn!(error = %e, "Session reaper: sweep failed"),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.sweep_interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Session reaper shutting down");
                    return;
                }
            }
        }
    }

    /// Delete everything that expired before now.
    pub fn sweep(&self) -> DbResult<SweepReport> {
        let now = Utc::now();
        Ok(SweepReport {
            sessions: SessionRepository::new(&self.db).purge_expired(now)?,
            login_links: LoginLinkRepository::new(&self.db).purge_expired(now)?,
        })
    }
}
