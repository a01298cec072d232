//! Contribution Schedules
//!
//! Calendar generation for DCA cadences and forward-fill matching of
//! scheduled dates onto a sparse trading-day calendar. No holiday calendar
//! is applied: a "business day" is Monday through Friday, and a scheduled
//! date landing on a market holiday rolls forward via [`next_trading_day`].

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};

use crate::model::Frequency;

/// Scheduled contribution dates within `[start, end]`, inclusive.
pub fn schedule_dates(frequency: Frequency, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    if start > end {
        return Vec::new();
    }

    match frequency {
        Frequency::Daily => weekdays(start, end),
        Frequency::Weekly => mondays(start, end),
        Frequency::Monthly => month_starts(start, end),
    }
}

/// Index of the first trading date on or after `scheduled`.
///
/// `trading_dates` must be sorted ascending.
pub fn next_trading_day(trading_dates: &[NaiveDate], scheduled: NaiveDate) -> Option<usize> {
    let idx = trading_dates.partition_point(|d| *d < scheduled);
    (idx < trading_dates.len()).then_some(idx)
}

pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn weekdays(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| is_business_day(*d))
        .collect()
}

fn mondays(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let offset = u64::from(start.weekday().num_days_from_monday());
    let first = if offset == 0 {
        Some(start)
    } else {
        start.checked_add_days(Days::new(7 - offset))
    };

    first
        .into_iter()
        .flat_map(|monday| monday.iter_weeks())
        .take_while(|d| *d <= end)
        .collect()
}

fn month_starts(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut month = start.with_day(1);

    while let Some(first) = month {
        let business = first_business_day(first);
        if business > end {
            break;
        }
        if business >= start {
            dates.push(business);
        }
        month = first.checked_add_months(Months::new(1));
    }

    dates
}

fn first_business_day(first_of_month: NaiveDate) -> NaiveDate {
    first_of_month
        .iter_days()
        .find(|d| is_business_day(*d))
        .unwrap_or(first_of_month)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_monthly_first_business_day() {
        let dates = schedule_dates(Frequency::Monthly, date(2024, 5, 15), date(2024, 9, 30));

        // June 1 and September 1 2024 fall on a weekend
        assert_eq!(
            dates,
            vec![date(2024, 6, 3), date(2024, 7, 1), date(2024, 8, 1), date(2024, 9, 2)]
        );
    }

    #[test]
    fn test_monthly_range_is_inclusive() {
        let dates = schedule_dates(Frequency::Monthly, date(2024, 1, 1), date(2024, 2, 1));
        assert_eq!(dates, vec![date(2024, 1, 1), date(2024, 2, 1)]);
    }

    #[test]
    fn test_weekly_mondays() {
        // 2024-01-03 is a Wednesday
        let dates = schedule_dates(Frequency::Weekly, date(2024, 1, 3), date(2024, 1, 29));

        assert_eq!(
            dates,
            vec![date(2024, 1, 8), date(2024, 1, 15), date(2024, 1, 22), date(2024, 1, 29)]
        );
        assert!(dates.iter().all(|d| d.weekday() == Weekday::Mon));
    }

    #[test]
    fn test_daily_skips_weekends() {
        let dates = schedule_dates(Frequency::Daily, date(2024, 1, 5), date(2024, 1, 9));
        assert_eq!(dates, vec![date(2024, 1, 5), date(2024, 1, 8), date(2024, 1, 9)]);
    }

    #[test]
    fn test_reversed_range_is_empty() {
        assert!(schedule_dates(Frequency::Daily, date(2024, 2, 1), date(2024, 1, 1)).is_empty());
    }

    #[test]
    fn test_forward_fill_matching() {
        let trading = [date(2024, 1, 2), date(2024, 1, 3), date(2024, 1, 5)];

        // Before the series: first date
        assert_eq!(next_trading_day(&trading, date(2023, 12, 1)), Some(0));
        // Exact hit
        assert_eq!(next_trading_day(&trading, date(2024, 1, 3)), Some(1));
        // Holiday gap rolls forward
        assert_eq!(next_trading_day(&trading, date(2024, 1, 4)), Some(2));
        // After the series
        assert_eq!(next_trading_day(&trading, date(2024, 1, 8)), None);
        assert_eq!(next_trading_day(&[], date(2024, 1, 8)), None);
    }
}
