// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Free-text clamping for anything that ends up in an LLM prompt.

pub const DEFAULT_MAX_INPUT_LEN: usize = 300;

/// Collapse whitespace runs to one space, trim, and cut to `max_len` chars.
///
/// `None` becomes the empty string.
pub fn sanitize_input(value: Option<&str>, max_len: usize) -> String {
    let Some(value) = value else {
        return String::new();
    };

    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(max_len)
        .collect()
}
