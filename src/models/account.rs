// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Account and profile models.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Login credentials, stored in `accounts` keyed by normalized email.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Normalized email (also used as document ID)
    pub email: String,
    /// Display username, unique case-insensitively
    pub username: String,
    /// Argon2 PHC string
    pub password_hash: String,
    /// When the account was created (ISO 8601)
    pub created_at: String,
}

/// Username reservation document, keyed by lowercase username.
///
/// Created with an insert-only write so two signups racing for the same
/// name cannot both succeed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsernameClaim {
    pub username: String,
    pub email: String,
}

/// Public profile, one per account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Free text, as entered at signup
    pub date_of_birth: String,
    #[serde(default)]
    pub bio: String,
    /// Relative path of the avatar image
    #[serde(default)]
    pub avatar: String,
    pub username: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Normalize an email for use as a document key.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
