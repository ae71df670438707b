// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Password reset tokens.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::time_utils::format_utc_rfc3339;

/// How long a reset link stays valid.
pub const RESET_TOKEN_TTL_HOURS: i64 = 1;

/// Stored in `password_reset_tokens`, keyed by the SHA-256 of the token.
///
/// The raw token only ever exists in the emailed link.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetToken {
    /// Hex SHA-256 of the emailed token
    pub token_hash: String,
    pub email: String,
    /// ISO 8601
    pub expires_at: String,
    pub used: bool,
    pub created_at: String,
}

impl PasswordResetToken {
    pub fn issue(token_hash: String, email: &str, now: DateTime<Utc>) -> Self {
        Self {
            token_hash,
            email: email.to_string(),
            expires_at: format_utc_rfc3339(now + Duration::hours(RESET_TOKEN_TTL_HOURS)),
            used: false,
            created_at: format_utc_rfc3339(now),
        }
    }

    /// Unused and not yet expired. An unparseable expiry counts as expired.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        if self.used {
            return false;
        }
        DateTime::parse_from_rfc3339(&self.expires_at)
            .map(|expires| expires.with_timezone(&Utc) > now)
            .unwrap_or(false)
    }
}
