//! Shared utility functions for the Ralph crate.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a timestamp as ISO-8601 UTC with millisecond precision, per §6.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Round a USD amount to four decimal places using banker's rounding
/// (round-half-to-even), per §4.3.
pub fn round_usd(value: f64) -> f64 {
    let scaled = value * 10_000.0;
    let floor = scaled.floor();
    let diff = scaled - floor;

    let rounded = if (diff - 0.5).abs() < f64::EPSILON {
        if (floor as i64) % 2 == 0 {
            floor
        } else {
            floor + 1.0
        }
    } else {
        scaled.round()
    };

    rounded / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_usd_rounds_half_to_even() {
        // 0.00005 -> nearest even at 4 decimals is 0.0000 (0 is even)
        assert_eq!(round_usd(0.00005), 0.0000);
        // 0.00015 -> nearest even at 4 decimals is 0.0002
        assert_eq!(round_usd(0.00015), 0.0002);
    }

    #[test]
    fn round_usd_handles_ordinary_values() {
        assert_eq!(round_usd(1.23456), 1.2346);
        assert_eq!(round_usd(0.0), 0.0);
    }

    #[test]
    fn format_timestamp_is_millisecond_precision_utc() {
        let ts = DateTime::parse_from_rfc3339("2026-01-23T12:00:00.123+00:00")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_timestamp(ts), "2026-01-23T12:00:00.123Z");
    }
}
