// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! QR image generation.
//!
//! Tokens are encoded with the `qrcode` crate and rendered as an SVG data
//! URL so clients can drop the result straight into an `<img src>`.

use std::fmt::Write;

use base64ct::{Base64, Encoding};
use qrcode::types::QrError;
use qrcode::{Color, EcLevel, QrCode};

pub const SVG_DATA_URL_PREFIX: &str = "data:image/svg+xml;base64,";

/// Visual parameters of a rendered code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrStyle {
    /// Rendered width and height in pixels
    pub width: u32,
    /// Quiet zone around the code, in modules
    pub margin: u32,
    pub dark: &'static str,
    pub light: &'static str,
    pub ec_level: EcLevel,
}

impl Default for QrStyle {
    fn default() -> Self {
        Self {
            width: 280,
            margin: 2,
            dark: "#00ff88",
            light: "#0a0a0f",
            ec_level: EcLevel::H,
        }
    }
}

/// Encode a token with the default style.
///
/// Returns `None` if the token cannot be encoded; the failure is logged.
pub fn encode(token: &str) -> Option<String> {
    encode_with(token, &QrStyle::default())
}

pub fn encode_with(token: &str, style: &QrStyle) -> Option<String> {
    match render_svg(token, style) {
        Ok(svg) => Some(format!(
            "{SVG_DATA_URL_PREFIX}{}",
            Base64::encode_string(svg.as_bytes())
        )),
        Err(e) => {
            tracing::error!(error = %e, token_len = token.len(), "QR generation failed");
            None
        }
    }
}

/// Render a token as an SVG document.
pub fn render_svg(token: &str, style: &QrStyle) -> Result<String, QrError> {
    let code = QrCode::with_error_correction_level(token.as_bytes(), style.ec_level)?;
    let modules = code.width();
    let margin = style.margin as usize;
    let size = modules + 2 * margin;

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{w}" viewBox="0 0 {size} {size}" shape-rendering="crispEdges">"#,
        w = style.width,
    );
    let _ = write!(
        svg,
        r#"<rect width="{size}" height="{size}" fill="{}"/>"#,
        style.light
    );
    let _ = write!(svg, r#"<path fill="{}" d=""#, style.dark);
    for (i, color) in code.to_colors().into_iter().enumerate() {
        if color == Color::Dark {
            let x = i % modules + margin;
            let y = i / modules + margin;
            let _ = write!(svg, "M{x} {y}h1v1h-1z");
        }
    }
    svg.push_str(r#""/></svg>"#);
    Ok(svg)
}
