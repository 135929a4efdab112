//! Month-end trading calendar derived from the data's own dates.

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;

/// Last trading date of each calendar month present in `dates`.
///
/// `dates` need not be sorted or unique. The final month counts even when the
/// series stops before the calendar month ends.
pub fn month_end_dates(dates: &[NaiveDate]) -> BTreeSet<NaiveDate> {
    let sorted: BTreeSet<NaiveDate> = dates.iter().copied().collect();
    let mut ends = BTreeSet::new();
    let mut iter = sorted.iter().peekable();
    while let Some(date) = iter.next() {
        let last_in_month = match iter.peek() {
            Some(next) => (next.year(), next.month()) != (date.year(), date.month()),
            None => true,
        };
        if last_in_month {
            ends.insert(*date);
        }
    }
    ends
}

/// Sorted union of several date series.
pub fn union_dates<'a, I>(series: I) -> Vec<NaiveDate>
where
    I: IntoIterator<Item = &'a [NaiveDate]>,
{
    series
        .into_iter()
        .flat_map(|dates| dates.iter().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn picks_last_trading_day_per_month() {
        let dates = vec![
            d(2020, 1, 2),
            d(2020, 1, 30),
            d(2020, 1, 31),
            d(2020, 2, 3),
            d(2020, 2, 28),
            d(2020, 3, 2),
        ];
        let ends: Vec<_> = month_end_dates(&dates).into_iter().collect();
        assert_eq!(ends, vec![d(2020, 1, 31), d(2020, 2, 28), d(2020, 3, 2)]);
    }

    #[test]
    fn same_month_in_different_years_is_distinct() {
        let dates = vec![d(2019, 6, 28), d(2020, 6, 30)];
        assert_eq!(month_end_dates(&dates).len(), 2);
    }

    #[test]
    fn unsorted_input_is_handled() {
        let dates = vec![d(2020, 2, 3), d(2020, 1, 31), d(2020, 1, 2)];
        let ends: Vec<_> = month_end_dates(&dates).into_iter().collect();
        assert_eq!(ends, vec![d(2020, 1, 31), d(2020, 2, 3)]);
    }

    #[test]
    fn empty_series() {
        assert!(month_end_dates(&[]).is_empty());
    }

    #[test]
    fn union_merges_and_dedups() {
        let a = vec![d(2020, 1, 2), d(2020, 1, 3)];
        let b = vec![d(2020, 1, 3), d(2020, 1, 1)];
        assert_eq!(
            union_dates([a.as_slice(), b.as_slice()]),
            vec![d(2020, 1, 1), d(2020, 1, 2), d(2020, 1, 3)]
        );
    }
}
