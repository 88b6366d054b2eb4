// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # QR Codes
//!
//! - `encode` - render a scan token as an SVG data URL
//! - `cache` - LRU cache of rendered images keyed by token
//! - `scanner` - owned camera scan sessions

pub mod cache;
pub mod encode;
pub mod scanner;

pub use cache::{QrCache, DEFAULT_QR_CACHE_CAPACITY};
pub use encode::{encode, encode_with, render_svg, QrStyle, SVG_DATA_URL_PREFIX};
pub use scanner::{
    Camera, DecodeMiss, Facing, Frame, FrameDecoder, FrameStream, ScanBox, ScanSession, Scanner,
    ScannerConfig, ScannerError,
};
