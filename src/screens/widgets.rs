// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Formatting helpers shared by several screens.

use chrono::{DateTime, Utc};

/// Scale a price series into the 0..=1 band a sparkline is drawn in.
///
/// A flat series sits in the middle of the band. Non-finite samples are
/// dropped.
pub fn sparkline(series: &[f64]) -> Vec<f64> {
    let points: Vec<f64> = series.iter().copied().filter(|v| v.is_finite()).collect();
    let Some(min) = points.iter().copied().reduce(f64::min) else {
        return Vec::new();
    };
    let max = points.iter().copied().fold(min, f64::max);
    let span = max - min;

    if span == 0.0 {
        return vec![0.5; points.len()];
    }
    points.into_iter().map(|v| (v - min) / span).collect()
}

/// "2.4M"-style abbreviation. Whole results drop the decimal ("3K").
pub fn compact_number(value: f64) -> String {
    const UNITS: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

    let magnitude = value.abs();
    for (scale, suffix) in UNITS {
        if magnitude >= scale {
            let scaled = format!("{:.1}", value / scale);
            return format!("{}{}", scaled.trim_end_matches(".0"), suffix);
        }
    }
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}

/// Share of the way to the next level, 0..=100.
pub fn xp_percent(xp: i64, xp_to_next_level: i64) -> u8 {
    if xp_to_next_level <= 0 {
        return 100;
    }
    let pct = xp.max(0).saturating_mul(100) / xp_to_next_level;
    pct.clamp(0, 100) as u8
}

/// "5m ago" / "3h ago" / "2d ago". Future times read as "Just now"; an
/// unparseable time gives an empty label.
pub fn time_ago(time: &str, now: DateTime<Utc>) -> String {
    let Ok(then) = DateTime::parse_from_rfc3339(time) else {
        return String::new();
    };
    let elapsed = now.signed_duration_since(then.with_timezone(&Utc));

    if elapsed.num_days() > 0 {
        format!("{}d ago", elapsed.num_days())
    } else if elapsed.num_hours() > 0 {
        format!("{}h ago", elapsed.num_hours())
    } else if elapsed.num_minutes() > 0 {
        format!("{}m ago", elapsed.num_minutes())
    } else {
        "Just now".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sparkline_normalises() {
        assert_eq!(sparkline(&[10.0, 15.0, 20.0]), vec![0.0, 0.5, 1.0]);
        assert_eq!(sparkline(&[7.0, 7.0]), vec![0.5, 0.5]);
        assert!(sparkline(&[]).is_empty());
        assert_eq!(sparkline(&[1.0, f64::NAN, 3.0]), vec![0.0, 1.0]);
    }

    #[test]
    fn test_compact_number() {
        assert_eq!(compact_number(2_400_000.0), "2.4M");
        assert_eq!(compact_number(1_000_000.0), "1M");
        assert_eq!(compact_number(3_000.0), "3K");
        assert_eq!(compact_number(1_260.0), "1.3K");
        assert_eq!(compact_number(-2_100_000_000.0), "-2.1B");
        assert_eq!(compact_number(950.0), "950");
    }

    #[test]
    fn test_xp_percent() {
        assert_eq!(xp_percent(300, 1000), 30);
        assert_eq!(xp_percent(1500, 1000), 100);
        assert_eq!(xp_percent(-5, 1000), 0);
        assert_eq!(xp_percent(10, 0), 100);
    }

    #[test]
    fn test_time_ago() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(time_ago("2026-03-10T11:58:30Z", now), "1m ago");
        assert_eq!(time_ago("2026-03-10T09:00:00Z", now), "3h ago");
        assert_eq!(time_ago("2026-03-08T12:00:00+03:00", now), "2d ago");
        assert_eq!(time_ago("2026-03-10T12:00:20Z", now), "Just now");
        assert_eq!(time_ago("yesterday", now), "");
    }
}
