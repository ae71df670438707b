// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, Local, NaiveDate, SecondsFormat, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Last value handed out by [`now_sortable_rfc3339`], in ns since the epoch.
static LAST_SORTABLE_NANOS: AtomicI64 = AtomicI64::new(i64::MIN);

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current UTC time as RFC3339.
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}

/// Current UTC time as fixed-width RFC3339 with nanoseconds.
///
/// Strictly increasing within the process, so documents ordered by this
/// field sort in creation order even when created back to back.
pub fn now_sortable_rfc3339() -> String {
    let now = Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX);
    let previous = LAST_SORTABLE_NANOS
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last.saturating_add(1)))
        })
        .unwrap_or(now);
    let nanos = now.max(previous.saturating_add(1));
    DateTime::from_timestamp_nanos(nanos).to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Today's date in the server's local timezone.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Format a plan date as `MM/DD/YYYY`.
pub fn format_plan_date(date: NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}
