//! Period classification: decides whether a timestamp falls inside a named
//! relative period or an explicit custom range.
//!
//! Every check is made against an explicit reference time (`now`). Only the
//! outermost caller reads the clock, so classification stays deterministic.

use chrono::{DateTime, Datelike, Duration, FixedOffset, Offset, Utc};

use backoffice_core::types::{CustomDateRange, DateFilter};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a fixed instant, for tests and report replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Classifies timestamps into reporting periods. Calendar comparisons
/// (day, month, quarter, year) are made in the reporting timezone, a fixed
/// offset that does not follow daylight-saving changes.
#[derive(Debug, Clone, Copy)]
pub struct PeriodClassifier {
    offset: FixedOffset,
}

impl Default for PeriodClassifier {
    fn default() -> Self {
        Self::utc()
    }
}

impl PeriodClassifier {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Whether `timestamp` lies in `period` as seen from `now`. Boundaries
    /// are inclusive. A `Custom` period without a range matches nothing.
    pub fn is_in_period(
        &self,
        timestamp: DateTime<Utc>,
        period: DateFilter,
        custom_range: Option<&CustomDateRange>,
        now: DateTime<Utc>,
    ) -> bool {
        let local = timestamp.with_timezone(&self.offset);
        let local_now = now.with_timezone(&self.offset);

        match period {
            DateFilter::Today => local.date_naive() == local_now.date_naive(),
            DateFilter::Week => timestamp >= now - Duration::days(7) && timestamp <= now,
            DateFilter::Month => local.year() == local_now.year() && local.month() == local_now.month(),
            DateFilter::Quarter => {
                local.year() == local_now.year() && local.month0() / 3 == local_now.month0() / 3
            }
            DateFilter::Year => local.year() == local_now.year(),
            DateFilter::All => true,
            DateFilter::Custom => custom_range.is_some_and(|range| range.contains(timestamp)),
        }
    }
}

/// [`PeriodClassifier::is_in_period`] in UTC.
pub fn is_in_period(
    timestamp: DateTime<Utc>,
    period: DateFilter,
    custom_range: Option<&CustomDateRange>,
    now: DateTime<Utc>,
) -> bool {
    PeriodClassifier::utc().is_in_period(timestamp, period, custom_range, now)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    const NOW: &str = "2024-05-17T10:30:00Z";

    #[test]
    fn test_today_is_calendar_day() {
        let now = utc(NOW);
        assert!(is_in_period(now, DateFilter::Today, None, now));
        assert!(is_in_period(utc("2024-05-17T00:00:00Z"), DateFilter::Today, None, now));
        assert!(!is_in_period(now - Duration::hours(25), DateFilter::Today, None, now));
        // Ten hours back is still the same calendar day.
        assert!(is_in_period(now - Duration::hours(10), DateFilter::Today, None, now));
        assert!(!is_in_period(utc("2024-05-16T23:59:59Z"), DateFilter::Today, None, now));
    }

    #[test]
    fn test_today_uses_reporting_timezone() {
        let now = utc("2024-05-17T23:30:00Z");
        let ts = utc("2024-05-17T22:00:00Z");
        assert!(is_in_period(ts, DateFilter::Today, None, now));

        // At UTC+1 `now` is already May 18th while `ts` is still the 17th.
        let paris = PeriodClassifier::new(FixedOffset::east_opt(3600).unwrap());
        assert!(!paris.is_in_period(ts, DateFilter::Today, None, now));
        assert!(paris.is_in_period(utc("2024-05-17T23:15:00Z"), DateFilter::Today, None, now));
    }

    #[test]
    fn test_week_is_rolling_seven_days() {
        let now = utc(NOW);
        assert!(is_in_period(now - Duration::days(3), DateFilter::Week, None, now));
        assert!(is_in_period(now - Duration::days(7), DateFilter::Week, None, now));
        assert!(!is_in_period(now - Duration::days(8), DateFilter::Week, None, now));
        assert!(!is_in_period(now - Duration::days(7) - Duration::seconds(1), DateFilter::Week, None, now));
        assert!(is_in_period(now, DateFilter::Week, None, now));
    }

    #[test]
    fn test_month_quarter_year() {
        let now = utc(NOW);
        assert!(is_in_period(utc("2024-05-01T00:00:00Z"), DateFilter::Month, None, now));
        assert!(!is_in_period(utc("2024-04-30T23:59:59Z"), DateFilter::Month, None, now));
        assert!(!is_in_period(utc("2023-05-17T10:30:00Z"), DateFilter::Month, None, now));

        assert!(is_in_period(utc("2024-04-01T00:00:00Z"), DateFilter::Quarter, None, now));
        assert!(is_in_period(utc("2024-06-30T12:00:00Z"), DateFilter::Quarter, None, now));
        assert!(!is_in_period(utc("2024-03-31T23:59:59Z"), DateFilter::Quarter, None, now));
        assert!(!is_in_period(utc("2023-04-15T00:00:00Z"), DateFilter::Quarter, None, now));

        assert!(is_in_period(utc("2024-01-01T00:00:00Z"), DateFilter::Year, None, now));
        assert!(!is_in_period(utc("2023-12-31T23:59:59Z"), DateFilter::Year, None, now));
    }

    #[test]
    fn test_all_matches_everything() {
        let now = utc(NOW);
        assert!(is_in_period(utc("1999-01-01T00:00:00Z"), DateFilter::All, None, now));
        assert!(is_in_period(utc("2099-01-01T00:00:00Z"), DateFilter::All, None, now));
    }

    #[test]
    fn test_custom_range_is_inclusive() {
        let now = utc(NOW);
        let start = utc("2024-03-01T00:00:00Z");
        let end = utc("2024-03-31T00:00:00Z");
        let range = CustomDateRange::new(start, end).unwrap();

        assert!(is_in_period(start, DateFilter::Custom, Some(&range), now));
        assert!(is_in_period(end, DateFilter::Custom, Some(&range), now));
        assert!(is_in_period(utc("2024-03-15T12:00:00Z"), DateFilter::Custom, Some(&range), now));
        assert!(!is_in_period(start - Duration::seconds(1), DateFilter::Custom, Some(&range), now));
        assert!(!is_in_period(end + Duration::seconds(1), DateFilter::Custom, Some(&range), now));
    }

    #[test]
    fn test_custom_without_range_matches_nothing() {
        let now = utc(NOW);
        assert!(!is_in_period(now, DateFilter::Custom, None, now));
        assert!(!is_in_period(utc("2024-01-01T00:00:00Z"), DateFilter::Custom, None, now));
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock(utc(NOW));
        assert_eq!(clock.now(), utc(NOW));
        assert!(SystemClock.now() > clock.now());
    }
}
