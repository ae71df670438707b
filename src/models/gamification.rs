// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Pet and streak state, seeded at signup.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const DEFAULT_PET_NAME: &str = "Sprout";
const DEFAULT_PET_TYPE: &str = "plant";
const DEFAULT_PET_IMAGE: &str = "/pets/sprout.png";
const STREAK_DATE_FORMAT: &str = "%Y-%m-%d";

/// Virtual pet, stored in `pets` keyed by normalized email.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetData {
    pub email: String,
    pub pet_name: String,
    pub pet_type: String,
    pub pet_image: String,
    /// 0-100
    pub happiness: u8,
    /// 0-100
    pub health: u8,
}

impl PetData {
    pub fn starter(email: &str) -> Self {
        Self {
            email: email.to_string(),
            pet_name: DEFAULT_PET_NAME.to_string(),
            pet_type: DEFAULT_PET_TYPE.to_string(),
            pet_image: DEFAULT_PET_IMAGE.to_string(),
            happiness: 50,
            health: 100,
        }
    }
}

/// Logging streak, stored in `streaks` keyed by normalized email.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakData {
    pub email: String,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub longest_streak: u32,
    /// Local date of the last log, `YYYY-MM-DD`
    #[serde(default)]
    pub last_log_date: Option<String>,
}

impl StreakData {
    pub fn starter(email: &str) -> Self {
        Self {
            email: email.to_string(),
            current_streak: 0,
            longest_streak: 0,
            last_log_date: None,
        }
    }

    /// Record a log on `today`.
    ///
    /// Returns `true` if the streak changed. A second log on the same day is
    /// a no-op; a log the day after the last one extends the streak; any
    /// other gap (or an unreadable stored date) restarts it at 1.
    pub fn record_log(&mut self, today: NaiveDate) -> bool {
        let last = self
            .last_log_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, STREAK_DATE_FORMAT).ok());

        match last {
            Some(last) if last == today => return false,
            Some(last) if last.succ_opt() == Some(today) => self.current_streak += 1,
            _ => self.current_streak = 1,
        }

        self.longest_streak = self.longest_streak.max(self.current_streak);
        self.last_log_date = Some(today.format(STREAK_DATE_FORMAT).to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn test_first_log_starts_streak() {
        let mut streak = StreakData::starter("a@b.com");
        assert!(streak.record_log(day(1)));
        assert_eq!(streak.current_streak, 1);
        assert_eq!(streak.longest_streak, 1);
        assert_eq!(streak.last_log_date.as_deref(), Some("2026-03-01"));
    }

    #[test]
    fn test_same_day_is_idempotent() {
        let mut streak = StreakData::starter("a@b.com");
        streak.record_log(day(1));
        assert!(!streak.record_log(day(1)));
        assert_eq!(streak.current_streak, 1);
    }

    #[test]
    fn test_consecutive_days_extend_and_gap_resets() {
        let mut streak = StreakData::starter("a@b.com");
        streak.record_log(day(1));
        streak.record_log(day(2));
        streak.record_log(day(3));
        assert_eq!(streak.current_streak, 3);

        streak.record_log(day(5));
        assert_eq!(streak.current_streak, 1);
        assert_eq!(streak.longest_streak, 3);
    }

    #[test]
    fn test_garbage_stored_date_restarts() {
        let mut streak = StreakData::starter("a@b.com");
        streak.current_streak = 9;
        streak.longest_streak = 9;
        streak.last_log_date = Some("yesterday".to_string());

        streak.record_log(day(10));
        assert_eq!(streak.current_streak, 1);
        assert_eq!(streak.longest_streak, 9);
    }
}
