use anyhow::Context;
use chrono::{DateTime, Duration, NaiveDate, Utc};

pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Inclusive date range of usage requested from a billing source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Resolve the window ending at `end_date_arg` (YYYY-MM-DD), or at today's UTC date when absent.
pub fn resolve_usage_window(
    end_date_arg: Option<&str>,
    now_utc: DateTime<Utc>,
    days: i64,
) -> anyhow::Result<UsageWindow> {
    anyhow::ensure!(days >= 1, "usage window must be at least 1 day (got {days})");

    let end_date = match end_date_arg {
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .with_context(|| format!("invalid end date {s:?} (expected YYYY-MM-DD)"))?,
        None => now_utc.date_naive(),
    };

    let span = Duration::try_days(days)
        .with_context(|| format!("usage window of {days} days is out of range"))?;
    let start_date = end_date
        .checked_sub_signed(span)
        .with_context(|| format!("usage window of {days} days underflows from {end_date}"))?;

    Ok(UsageWindow {
        start_date,
        end_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn defaults_to_trailing_days_ending_today() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 23, 30, 0).unwrap();
        let w = resolve_usage_window(None, now, DEFAULT_WINDOW_DAYS).unwrap();
        assert_eq!(w.end_date, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(w.start_date, NaiveDate::from_ymd_opt(2026, 1, 30).unwrap());
    }

    #[test]
    fn explicit_end_date_wins_over_clock() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let w = resolve_usage_window(Some("2025-12-31"), now, 7).unwrap();
        assert_eq!(w.end_date, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
        assert_eq!(w.start_date, NaiveDate::from_ymd_opt(2025, 12, 24).unwrap());
    }

    #[test]
    fn rejects_empty_window_and_bad_dates() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        assert!(resolve_usage_window(None, now, 0).is_err());
        assert!(resolve_usage_window(Some("03/01/2026"), now, 30).is_err());
    }

    #[test]
    fn oversized_window_is_an_error() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        assert!(resolve_usage_window(None, now, i64::MAX / 2).is_err());
        // Representable as a duration but reaches before the earliest NaiveDate.
        assert!(resolve_usage_window(None, now, 1_000_000_000).is_err());
    }
}
