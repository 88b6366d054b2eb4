// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Small text helpers used to shape API responses and validate profile links.

use url::Url;

/// Emoji shown for questions that don't embed one.
pub const DEFAULT_QUESTION_EMOJI: &str = "🎯";

fn is_decorative_emoji(c: char) -> bool {
    matches!(c, '\u{1F300}'..='\u{1FAFF}' | '\u{2600}'..='\u{26FF}' | '\u{2700}'..='\u{27BF}')
}

/// Up to two uppercase initials from a display name.
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}

/// First decorative emoji in a question, or the default.
pub fn question_emoji(text: &str) -> String {
    text.chars()
        .find(|c| is_decorative_emoji(*c))
        .map(String::from)
        .unwrap_or_else(|| DEFAULT_QUESTION_EMOJI.to_string())
}

/// Question text with decorative emoji removed.
pub fn strip_emoji(text: &str) -> String {
    text.chars()
        .filter(|c| !is_decorative_emoji(*c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Absolute URL that parses.
pub fn is_valid_url(value: &str) -> bool {
    Url::parse(value).is_ok()
}

pub fn is_linkedin_url(value: &str) -> bool {
    is_valid_url(value) && value.contains("linkedin.com/")
}

pub fn is_github_url(value: &str) -> bool {
    is_valid_url(value) && value.contains("github.com/")
}
