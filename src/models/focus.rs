// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::time_utils::format_utc_rfc3339;

/// Completed focus timer, stored in `focus_sessions`. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusSession {
    pub id: String,
    /// Account the session belongs to (normalized email or client-provided id)
    pub user_id: String,
    pub duration_in_seconds: u32,
    #[serde(default)]
    pub ended_reason: Option<String>,
    pub started_at: String,
    pub ended_at: String,
}

impl FocusSession {
    /// A session that ended at `ended_at` after running `duration_in_seconds`.
    pub fn ending_at(
        id: String,
        user_id: String,
        duration_in_seconds: u32,
        ended_reason: Option<String>,
        ended_at: DateTime<Utc>,
    ) -> Self {
        let started_at = ended_at - Duration::seconds(i64::from(duration_in_seconds));
        Self {
            id,
            user_id,
            duration_in_seconds,
            ended_reason,
            started_at: format_utc_rfc3339(started_at),
            ended_at: format_utc_rfc3339(ended_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_start_is_derived_from_duration() {
        let end = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();
        let session = FocusSession::ending_at(
            "s1".to_string(),
            "a@b.com".to_string(),
            1500,
            Some("completed".to_string()),
            end,
        );

        assert_eq!(session.ended_at, "2026-05-01T12:00:00Z");
        assert_eq!(session.started_at, "2026-05-01T11:35:00Z");
    }
}
