// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Continuous QR scanning over an abstract camera.
//!
//! A [`Scanner`] owns at most one [`ScanSession`]. Starting a new session
//! stops the previous one and waits for its camera stream to be released
//! before the next stream is opened. Dropping the scanner or the session
//! cancels the frame loop.
//!
//! Frame capture and decoding are supplied through [`Camera`] and
//! [`FrameDecoder`]; this module only drives them. Both may block, so each
//! read and decode runs on the blocking thread pool.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Which camera to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    /// Rear camera
    Environment,
    /// Front camera
    User,
}

/// Region of the frame handed to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanBox {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScannerConfig {
    pub fps: u32,
    pub qrbox: ScanBox,
    pub aspect_ratio: f32,
    pub facing: Facing,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            fps: 10,
            qrbox: ScanBox {
                width: 250,
                height: 250,
            },
            aspect_ratio: 1.0,
            facing: Facing::Environment,
        }
    }
}

impl ScannerConfig {
    fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps))
    }

    fn validate(&self) -> Result<(), ScannerError> {
        if self.fps == 0 {
            return Err(ScannerError::InvalidConfig("fps must be positive".into()));
        }
        if self.qrbox.width == 0 || self.qrbox.height == 0 {
            return Err(ScannerError::InvalidConfig("qrbox must not be empty".into()));
        }
        if !(self.aspect_ratio > 0.0) {
            return Err(ScannerError::InvalidConfig(
                "aspect ratio must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// A captured camera frame (8-bit luma).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum ScannerError {
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),

    #[error("camera failure: {0}")]
    Camera(String),

    #[error("invalid scanner config: {0}")]
    InvalidConfig(String),
}

/// A frame without a readable code. Expected for most frames.
#[derive(Debug, thiserror::Error)]
#[error("no QR code found in frame")]
pub struct DecodeMiss;

/// Source of camera streams.
pub trait Camera: Send + Sync {
    type Stream: FrameStream;

    /// Acquire the camera for `target`. The stream holds the device until dropped.
    fn open(&self, target: &str, config: &ScannerConfig) -> Result<Self::Stream, ScannerError>;
}

pub trait FrameStream: Send + 'static {
    /// Next frame, or `None` once the stream has ended.
    fn next_frame(&mut self) -> Result<Option<Frame>, ScannerError>;
}

pub trait FrameDecoder: Send + Sync + 'static {
    fn decode(&self, frame: &Frame, region: &ScanBox) -> Result<String, DecodeMiss>;
}

/// A running scan. Stopping or dropping it releases the camera.
pub struct ScanSession {
    target: String,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ScanSession {
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Whether the frame loop is still running.
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop the frame loop and wait until the camera stream is dropped.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(target_element = %self.target, error = %e, "Scanner task ended abnormally");
            }
        }
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Drives one camera session at a time.
pub struct Scanner<C: Camera, D: FrameDecoder> {
    camera: C,
    decoder: Arc<D>,
    config: ScannerConfig,
    active: Option<ScanSession>,
}

impl<C: Camera, D: FrameDecoder> Scanner<C, D> {
    pub fn new(camera: C, decoder: D) -> Self {
        Self {
            camera,
            decoder: Arc::new(decoder),
            config: ScannerConfig::default(),
            active: None,
        }
    }

    pub fn with_config(mut self, config: ScannerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&ScanSession> {
        self.active.as_ref()
    }

    pub fn is_scanning(&self) -> bool {
        self.active.as_ref().is_some_and(ScanSession::is_active)
    }

    /// Start scanning into `target`.
    ///
    /// Any running session is stopped first. `on_decoded` runs for every
    /// decoded frame; frames without a code are skipped silently. A camera
    /// failure is passed to `on_error` and ends the session.
    pub async fn start<F, E>(
        &mut self,
        target: &str,
        on_decoded: F,
        on_error: E,
    ) -> Result<&ScanSession, ScannerError>
    where
        F: FnMut(String) + Send + 'static,
        E: FnMut(ScannerError) + Send + 'static,
    {
        self.stop().await;
        self.config.validate()?;

        let stream = self.camera.open(target, &self.config)?;
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_frames(
            stream,
            Arc::clone(&self.decoder),
            self.config.clone(),
            cancel.clone(),
            on_decoded,
            on_error,
        ));

        tracing::debug!(target_element = %target, fps = self.config.fps, "Scanner started");

        Ok(self.active.insert(ScanSession {
            target: target.to_string(),
            cancel,
            task: Some(task),
        }))
    }

    /// Stop the running session, if any, and release its camera.
    pub async fn stop(&mut self) {
        if let Some(session) = self.active.take() {
            tracing::debug!(target_element = %session.target, "Scanner stopping");
            session.stop().await;
        }
    }
}

async fn run_frames<S, D, F, E>(
    mut stream: S,
    decoder: Arc<D>,
    config: ScannerConfig,
    cancel: CancellationToken,
    mut on_decoded: F,
    mut on_error: E,
) where
    S: FrameStream,
    D: FrameDecoder,
    F: FnMut(String) + Send + 'static,
    E: FnMut(ScannerError) + Send + 'static,
{
    let mut ticker = tokio::time::interval(config.frame_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        // Camera reads and decoding block, so both run on the blocking pool.
        let frame_decoder = Arc::clone(&decoder);
        let region = config.qrbox;
        let mut read = tokio::task::spawn_blocking(move || {
            let decoded = stream
                .next_frame()
                .map(|frame| frame.map(|frame| frame_decoder.decode(&frame, &region).ok()));
            (stream, decoded)
        });

        let (returned, decoded) = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                // The stream is released once the in-flight read returns.
                drop(read.await);
                return;
            }
            joined = &mut read => match joined {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!(error = %e, "Frame reader task failed");
                    on_error(ScannerError::Camera(format!("frame reader failed: {e}")));
                    return;
                }
            },
        };
        stream = returned;

        match decoded {
            Ok(Some(Some(text))) => on_decoded(text),
            Ok(Some(None)) => {}
            Ok(None) => {
                tracing::debug!("Camera stream ended");
                break;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Camera stream failed");
                on_error(e);
                break;
            }
        }
    }
}
