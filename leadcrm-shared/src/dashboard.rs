//! Dashboard aggregation helpers
//!
//! The summary endpoint recomputes everything from the lead table on each
//! request. The SQL lives in the lead model; this module owns the pure
//! calendar-month arithmetic so it can be tested without a database.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::Serialize;

/// Months covered by the trend series, including the current one
pub const TREND_MONTHS: usize = 5;

/// One point of the monthly trend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    /// Short English month name, e.g. "Aug"
    pub month: String,
    pub count: i64,
}

/// Truncates a timestamp to the first instant of its calendar month
pub fn month_start(at: DateTime<Utc>) -> DateTime<Utc> {
    // Valid by construction: day 1, midnight, of an existing year/month.
    Utc.with_ymd_and_hms(at.year(), at.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(at)
}

/// The starts of the trailing `TREND_MONTHS` calendar months, oldest first
///
/// The last element is the start of the month containing `now`.
pub fn trailing_month_starts(now: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let mut starts = Vec::with_capacity(TREND_MONTHS);
    let mut year = now.year();
    let mut month = now.month();

    for _ in 0..TREND_MONTHS {
        if let Some(start) = Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).single() {
            starts.push(start);
        }
        if month == 1 {
            month = 12;
            year -= 1;
        } else {
            month -= 1;
        }
    }

    starts.reverse();
    starts
}

/// Short English label for a month start, e.g. "Aug"
pub fn month_label(start: DateTime<Utc>) -> String {
    start.format("%b").to_string()
}

/// Buckets lead timestamps into the trailing-month series
///
/// Timestamps before the first month start are dropped; everything else
/// lands in the month it falls inside. The result always has exactly
/// `TREND_MONTHS` entries, zero-filled for empty months.
pub fn bucket_by_month(
    month_starts: &[DateTime<Utc>],
    timestamps: &[DateTime<Utc>],
) -> Vec<MonthCount> {
    let mut counts = vec![0i64; month_starts.len()];

    for &ts in timestamps {
        // Last bucket whose start is <= ts.
        let slot = month_starts
            .iter()
            .rposition(|&start| start <= ts);
        if let Some(i) = slot {
            counts[i] += 1;
        }
    }

    month_starts
        .iter()
        .zip(counts)
        .map(|(&start, count)| MonthCount {
            month: month_label(start),
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_month_start_truncates() {
        assert_eq!(month_start(at(2026, 8, 23, 14)), at(2026, 8, 1, 0));
        assert_eq!(month_start(at(2026, 8, 1, 0)), at(2026, 8, 1, 0));
    }

    #[test]
    fn test_trailing_months_within_year() {
        let starts = trailing_month_starts(at(2026, 8, 23, 10));
        assert_eq!(
            starts,
            vec![
                at(2026, 4, 1, 0),
                at(2026, 5, 1, 0),
                at(2026, 6, 1, 0),
                at(2026, 7, 1, 0),
                at(2026, 8, 1, 0),
            ]
        );
    }

    #[test]
    fn test_trailing_months_across_year_boundary() {
        let starts = trailing_month_starts(at(2026, 2, 10, 0));
        assert_eq!(
            starts,
            vec![
                at(2025, 10, 1, 0),
                at(2025, 11, 1, 0),
                at(2025, 12, 1, 0),
                at(2026, 1, 1, 0),
                at(2026, 2, 1, 0),
            ]
        );
    }

    #[test]
    fn test_month_labels() {
        let starts = trailing_month_starts(at(2026, 2, 10, 0));
        let labels: Vec<String> = starts.into_iter().map(month_label).collect();
        assert_eq!(labels, vec!["Oct", "Nov", "Dec", "Jan", "Feb"]);
    }

    #[test]
    fn test_bucket_empty_is_all_zeros() {
        let starts = trailing_month_starts(at(2026, 8, 23, 0));
        let series = bucket_by_month(&starts, &[]);

        assert_eq!(series.len(), TREND_MONTHS);
        assert!(series.iter().all(|p| p.count == 0));
        assert_eq!(series[4].month, "Aug");
    }

    #[test]
    fn test_bucket_counts_per_month() {
        let starts = trailing_month_starts(at(2026, 8, 23, 0));
        let timestamps = vec![
            at(2026, 8, 1, 0),
            at(2026, 8, 15, 12),
            at(2026, 6, 30, 23),
            at(2026, 4, 1, 0),
        ];

        let series = bucket_by_month(&starts, &timestamps);
        let counts: Vec<i64> = series.iter().map(|p| p.count).collect();
        assert_eq!(counts, vec![1, 0, 1, 0, 2]);
    }

    #[test]
    fn test_bucket_drops_timestamps_before_window() {
        let starts = trailing_month_starts(at(2026, 8, 23, 0));
        let series = bucket_by_month(&starts, &[at(2025, 12, 31, 23)]);
        assert!(series.iter().all(|p| p.count == 0));
    }
}
