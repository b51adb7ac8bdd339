//! Period calculator: turns a logical reporting period into a concrete
//! instant range and assigns instants to sortable bucket keys.
//!
//! Day boundaries are taken in the calculator's configured UTC offset. All
//! ranges are inclusive on both ends, with `end` at `23:59:59.999` local.
//!
//! Two different week notions live here:
//! - the weekly *range* is week-to-date: from the most recent Sunday through
//!   the end of today;
//! - the weekly *bucket key* numbers weeks by their Sunday:
//!   `ceil(days between Jan 1 and that Sunday / 7)`, keyed under the Sunday's
//!   year.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    TimeZone, Utc,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::LedgerError;

/// Logical reporting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Custom,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Custom => "custom",
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Period {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            "custom" => Ok(Self::Custom),
            other => Err(LedgerError::InvalidPeriod(format!("unknown period '{}'", other))),
        }
    }
}

/// Inclusive instant range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodCalculator {
    offset: FixedOffset,
}

impl Default for PeriodCalculator {
    fn default() -> Self {
        Self::utc()
    }
}

impl PeriodCalculator {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    /// Build from an offset east of UTC in minutes. `None` if out of range.
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(Self::new)
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Resolve `period` against the current time.
    pub fn calculate_range(
        &self,
        period: Period,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<DateRange, LedgerError> {
        self.calculate_range_at(period, from, to, Utc::now())
    }

    /// Resolve `period` relative to `now`.
    pub fn calculate_range_at(
        &self,
        period: Period,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<DateRange, LedgerError> {
        let today = self.local_date(now);

        let (first, last) = match period {
            Period::Daily => (today, today),
            Period::Weekly => (sunday_of(today), today),
            Period::Monthly => (first_of_month(today), last_of_month(today)),
            Period::Yearly => (first_of_year(today), last_of_year(today)),
            Period::Custom => {
                let (from, to) = match (from, to) {
                    (Some(from), Some(to)) => (from, to),
                    _ => {
                        return Err(LedgerError::InvalidPeriod(
                            "missing date bounds".to_string(),
                        ))
                    }
                };
                let range = self.day_range(from, to).ok_or_else(|| {
                    LedgerError::InvalidPeriod(format!(
                        "bounds {} to {} are out of range",
                        from, to
                    ))
                })?;
                if range.start > range.end {
                    return Err(LedgerError::InvalidPeriod(format!(
                        "'from' ({}) is after 'to' ({})",
                        from, to
                    )));
                }
                return Ok(range);
            }
        };

        match (self.date_start(first), self.date_end(last)) {
            (Some(start), Some(end)) => Ok(DateRange { start, end }),
            _ => Err(LedgerError::InvalidPeriod(format!(
                "{} period around {} is out of range",
                period, now
            ))),
        }
    }

    /// Widen `[from, to]` to whole local days. `None` when a boundary falls
    /// outside the representable instant range.
    pub fn day_range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Option<DateRange> {
        Some(DateRange {
            start: self.start_of_day(from)?,
            end: self.end_of_day(to)?,
        })
    }

    pub fn start_of_day(&self, instant: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.date_start(self.local_date(instant))
    }

    pub fn end_of_day(&self, instant: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.date_end(self.local_date(instant))
    }

    /// Bucket key for `instant`. Keys sort lexicographically in
    /// chronological order. Custom periods bucket by day.
    pub fn format_bucket_key(&self, period: Period, instant: DateTime<Utc>) -> String {
        let date = self.local_date(instant);
        match period {
            Period::Daily | Period::Custom => date.format("%Y-%m-%d").to_string(),
            Period::Weekly => {
                let sunday = sunday_of(date);
                let days = (sunday - first_of_year(sunday)).num_days();
                let week = (days + 6) / 7;
                format!("{}-W{:02}", sunday.year(), week)
            }
            Period::Monthly => date.format("%Y-%m").to_string(),
            Period::Yearly => date.format("%Y").to_string(),
        }
    }

    fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    fn local_to_utc(&self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        let utc = local
            .checked_sub_signed(Duration::seconds(i64::from(self.offset.local_minus_utc())))?;
        Some(Utc.from_utc_datetime(&utc))
    }

    fn date_start(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        self.local_to_utc(date.and_time(NaiveTime::MIN))
    }

    fn date_end(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        self.local_to_utc(date.and_time(NaiveTime::from_hms_milli_opt(23, 59, 59, 999)?))
    }
}

fn sunday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

fn last_of_month(date: NaiveDate) -> NaiveDate {
    first_of_month(first_of_month(date) + Duration::days(31)) - Duration::days(1)
}

fn first_of_year(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.ordinal0()))
}

fn last_of_year(date: NaiveDate) -> NaiveDate {
    first_of_year(first_of_year(date) + Duration::days(366)) - Duration::days(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn end_ms(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        at(y, m, d, 23, 59) + Duration::seconds(59) + Duration::milliseconds(999)
    }

    #[test]
    fn test_daily_range_covers_today() {
        let calc = PeriodCalculator::utc();
        let range = calc
            .calculate_range_at(Period::Daily, None, None, at(2024, 3, 14, 15, 30))
            .unwrap();

        assert_eq!(range.start, at(2024, 3, 14, 0, 0));
        assert_eq!(range.end, end_ms(2024, 3, 14));
    }

    #[test]
    fn test_weekly_range_is_week_to_date() {
        // 2024-01-10 is a Wednesday
        let calc = PeriodCalculator::utc();
        let range = calc
            .calculate_range_at(Period::Weekly, None, None, at(2024, 1, 10, 9, 0))
            .unwrap();

        assert_eq!(range.start, at(2024, 1, 7, 0, 0));
        assert_eq!(range.end, end_ms(2024, 1, 10));
    }

    #[test]
    fn test_weekly_range_on_sunday_is_single_day() {
        let calc = PeriodCalculator::utc();
        let range = calc
            .calculate_range_at(Period::Weekly, None, None, at(2024, 1, 7, 9, 0))
            .unwrap();

        assert_eq!(range.start, at(2024, 1, 7, 0, 0));
        assert_eq!(range.end, end_ms(2024, 1, 7));
    }

    #[test]
    fn test_monthly_range_handles_leap_february() {
        let calc = PeriodCalculator::utc();
        let range = calc
            .calculate_range_at(Period::Monthly, None, None, at(2024, 2, 10, 9, 0))
            .unwrap();

        assert_eq!(range.start, at(2024, 2, 1, 0, 0));
        assert_eq!(range.end, end_ms(2024, 2, 29));
    }

    #[test]
    fn test_monthly_range_for_december() {
        let calc = PeriodCalculator::utc();
        let range = calc
            .calculate_range_at(Period::Monthly, None, None, at(2023, 12, 31, 23, 0))
            .unwrap();

        assert_eq!(range.start, at(2023, 12, 1, 0, 0));
        assert_eq!(range.end, end_ms(2023, 12, 31));
    }

    #[test]
    fn test_yearly_range() {
        let calc = PeriodCalculator::utc();
        for now in [at(2024, 6, 1, 0, 0), at(2023, 1, 1, 0, 0)] {
            let range = calc
                .calculate_range_at(Period::Yearly, None, None, now)
                .unwrap();
            assert_eq!(range.start, at(now.year(), 1, 1, 0, 0));
            assert_eq!(range.end, end_ms(now.year(), 12, 31));
        }
    }

    #[test]
    fn test_custom_without_dates_is_invalid_period() {
        let calc = PeriodCalculator::utc();
        let now = at(2024, 1, 1, 0, 0);

        let result = calc.calculate_range_at(Period::Custom, None, None, now);
        assert!(matches!(result, Err(LedgerError::InvalidPeriod(_))));

        let result = calc.calculate_range_at(Period::Custom, Some(now), None, now);
        assert!(matches!(result, Err(LedgerError::InvalidPeriod(_))));

        let result = calc.calculate_range_at(Period::Custom, None, Some(now), now);
        assert!(matches!(result, Err(LedgerError::InvalidPeriod(_))));
    }

    #[test]
    fn test_custom_is_normalized_to_day_bounds() {
        let calc = PeriodCalculator::utc();
        let range = calc
            .calculate_range_at(
                Period::Custom,
                Some(at(2024, 1, 5, 13, 45)),
                Some(at(2024, 1, 9, 2, 10)),
                at(2030, 1, 1, 0, 0),
            )
            .unwrap();

        assert_eq!(range.start, at(2024, 1, 5, 0, 0));
        assert_eq!(range.end, end_ms(2024, 1, 9));
    }

    #[test]
    fn test_custom_with_inverted_bounds_is_rejected() {
        let calc = PeriodCalculator::utc();
        let result = calc.calculate_range_at(
            Period::Custom,
            Some(at(2024, 2, 1, 0, 0)),
            Some(at(2024, 1, 1, 0, 0)),
            at(2030, 1, 1, 0, 0),
        );
        assert!(matches!(result, Err(LedgerError::InvalidPeriod(_))));
    }

    #[test]
    fn test_custom_bounds_at_the_edge_of_time_are_invalid_period() {
        let now = at(2024, 1, 1, 0, 0);

        // UTC-12:00: the local end of the last day is past the maximum instant
        let behind = PeriodCalculator::from_offset_minutes(-720).unwrap();
        let result = behind.calculate_range_at(
            Period::Custom,
            Some(now),
            Some(DateTime::<Utc>::MAX_UTC),
            now,
        );
        assert!(matches!(result, Err(LedgerError::InvalidPeriod(_))));

        // UTC+05:30: the local start of the first day is before the minimum instant
        let ahead = PeriodCalculator::from_offset_minutes(330).unwrap();
        let result = ahead.calculate_range_at(
            Period::Custom,
            Some(DateTime::<Utc>::MIN_UTC),
            Some(now),
            now,
        );
        assert!(matches!(result, Err(LedgerError::InvalidPeriod(_))));
    }

    #[test]
    fn test_extreme_bounds_in_utc_stay_representable() {
        let calc = PeriodCalculator::utc();
        let range = calc
            .day_range(DateTime::<Utc>::MIN_UTC, DateTime::<Utc>::MAX_UTC)
            .unwrap();

        assert_eq!(range.start, DateTime::<Utc>::MIN_UTC);
        assert!(range.end <= DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_day_bounds_follow_configured_offset() {
        // UTC+05:30: 2024-01-05 20:00Z is already 2024-01-06 locally
        let calc = PeriodCalculator::from_offset_minutes(330).unwrap();
        let instant = at(2024, 1, 5, 20, 0);

        assert_eq!(calc.start_of_day(instant), Some(at(2024, 1, 5, 18, 30)));
        assert_eq!(
            calc.end_of_day(instant),
            Some(at(2024, 1, 6, 18, 29) + Duration::seconds(59) + Duration::milliseconds(999))
        );
        assert_eq!(calc.format_bucket_key(Period::Daily, instant), "2024-01-06");
    }

    #[test]
    fn test_bucket_key_formats() {
        let calc = PeriodCalculator::utc();
        let instant = at(2024, 3, 14, 10, 0);

        assert_eq!(calc.format_bucket_key(Period::Daily, instant), "2024-03-14");
        assert_eq!(calc.format_bucket_key(Period::Monthly, instant), "2024-03");
        assert_eq!(calc.format_bucket_key(Period::Yearly, instant), "2024");
        assert_eq!(calc.format_bucket_key(Period::Custom, instant), "2024-03-14");
    }

    #[test]
    fn test_weekly_bucket_key_numbers_weeks_by_sunday() {
        let calc = PeriodCalculator::utc();

        // Sunday Jan 1 2023 starts week 00
        assert_eq!(calc.format_bucket_key(Period::Weekly, at(2023, 1, 1, 0, 0)), "2023-W00");
        assert_eq!(calc.format_bucket_key(Period::Weekly, at(2023, 1, 7, 0, 0)), "2023-W00");
        assert_eq!(calc.format_bucket_key(Period::Weekly, at(2023, 1, 8, 0, 0)), "2023-W01");

        // Monday Jan 1 2024 belongs to the week of Sunday Dec 31 2023
        assert_eq!(calc.format_bucket_key(Period::Weekly, at(2024, 1, 1, 0, 0)), "2023-W52");
        assert_eq!(calc.format_bucket_key(Period::Weekly, at(2024, 1, 7, 0, 0)), "2024-W01");
        assert_eq!(calc.format_bucket_key(Period::Weekly, at(2024, 1, 13, 0, 0)), "2024-W01");
        assert_eq!(calc.format_bucket_key(Period::Weekly, at(2024, 1, 14, 0, 0)), "2024-W02");
    }

    #[test]
    fn test_period_parsing() {
        assert_eq!("weekly".parse::<Period>().unwrap(), Period::Weekly);
        assert!(matches!(
            "hourly".parse::<Period>(),
            Err(LedgerError::InvalidPeriod(_))
        ));
    }
}
