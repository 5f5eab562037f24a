// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exponential half-life decay applied to scores by fragment age.

use chrono::{DateTime, NaiveDateTime, Utc};

const MS_PER_DAY: f64 = 86_400_000.0;

/// Parse a stored timestamp. Accepts RFC 3339 and SQLite's `YYYY-MM-DD HH:MM:SS` (UTC).
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Multiplier in `(0, 1]` for an item created at `created_at`, evaluated at `now`.
///
/// Returns 1.0 when `half_life_days <= 0` or the timestamp does not parse.
/// Items dated in the future are treated as brand new.
pub fn decay_multiplier_at(created_at: &str, half_life_days: f64, now: DateTime<Utc>) -> f64 {
    if half_life_days <= 0.0 {
        return 1.0;
    }
    let Some(created) = parse_timestamp(created_at) else {
        return 1.0;
    };
    let age_days = ((now - created).num_milliseconds() as f64 / MS_PER_DAY).max(0.0);
    (-std::f64::consts::LN_2 / half_life_days * age_days).exp()
}

/// [`decay_multiplier_at`] evaluated against the current time.
pub fn decay_multiplier(created_at: &str, half_life_days: f64) -> f64 {
    decay_multiplier_at(created_at, half_life_days, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;
    use recall_core::types::TIMESTAMP_FORMAT;

    fn days_ago(now: DateTime<Utc>, days: i64) -> String {
        (now - Duration::days(days)).format(TIMESTAMP_FORMAT).to_string()
    }

    #[test]
    fn halves_every_half_life() {
        let now = Utc::now();
        for (days, expected) in [(0, 1.0), (30, 0.5), (60, 0.25), (90, 0.125)] {
            let m = decay_multiplier_at(&days_ago(now, days), 30.0, now);
            assert!((m - expected).abs() < 1e-6, "{days} days: got {m}, want {expected}");
        }
    }

    #[test]
    fn non_positive_half_life_disables_decay() {
        let now = Utc::now();
        assert_eq!(decay_multiplier_at(&days_ago(now, 400), 0.0, now), 1.0);
        assert_eq!(decay_multiplier_at(&days_ago(now, 400), -5.0, now), 1.0);
    }

    #[test]
    fn unparseable_timestamp_is_neutral() {
        assert_eq!(decay_multiplier("yesterday-ish", 30.0), 1.0);
        assert_eq!(decay_multiplier("", 30.0), 1.0);
    }

    #[test]
    fn future_timestamps_do_not_boost() {
        let now = Utc::now();
        let future = (now + Duration::days(3)).format(TIMESTAMP_FORMAT).to_string();
        assert_eq!(decay_multiplier_at(&future, 30.0, now), 1.0);
    }

    #[test]
    fn sqlite_default_format_is_accepted() {
        let now = "2026-03-31T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let m = decay_multiplier_at("2026-03-01 00:00:00", 30.0, now);
        assert!((m - 0.5).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn strictly_decreasing_with_age(a in 0i64..3650, b in 0i64..3650, half_life in 1.0f64..365.0) {
            prop_assume!(a != b);
            let now = Utc::now();
            let (younger, older) = if a < b { (a, b) } else { (b, a) };
            let m_young = decay_multiplier_at(&days_ago(now, younger), half_life, now);
            let m_old = decay_multiplier_at(&days_ago(now, older), half_life, now);
            prop_assert!(m_young > m_old || m_old == 0.0);
        }
    }
}
