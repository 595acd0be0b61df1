// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and calendar math.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a date as written by the admin panel or legacy rows.
///
/// Accepts RFC3339 timestamps, `datetime-local` inputs (`2024-02-15T10:00`),
/// naive timestamps and bare dates. Naive values are read as UTC.
pub fn parse_loose_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Number of UTC calendar days from `start` to `now`, counting the start day as day 1.
///
/// Times of day are ignored: a credential published at 23:59 UTC is on day 2
/// one minute later. Dates in the future yield values below 1.
pub fn utc_calendar_day(start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now.date_naive() - start.date_naive()).num_days() + 1
}
