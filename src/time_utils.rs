// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Fixed-width RFC3339 timestamp (microseconds, `Z` suffix).
///
/// Stored `createdAt`/`updatedAt` fields use this form so that Firestore's
/// lexicographic string ordering matches chronological ordering.
pub fn sortable_timestamp(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time as a [`sortable_timestamp`].
pub fn now_sortable() -> String {
    sortable_timestamp(Utc::now())
}

/// Parse an ISO-8601 timestamp from client input.
///
/// Accepts full RFC3339 or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_utc(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
