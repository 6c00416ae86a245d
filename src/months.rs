use chrono::{Datelike, Months, NaiveDate};

use crate::error::{ExportError, Result};

/// An inclusive span of days. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}
impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(ExportError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Splits the range into calendar months, clipped to the range's own bounds.
    pub fn months(&self) -> MonthIter {
        MonthIter {
            cursor: Some(first_of_month(self.start)),
            start: self.start,
            end: self.end,
        }
    }
}

/// A slice of a `DateRange` that never crosses a month boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MonthRange {
    pub month_start: NaiveDate,
    pub month_end: NaiveDate,
}

/// Iterates over months in the supplied date range, yielding each month's
/// start and end. Fails up front if `end < start`.
pub fn iterate_months(start: NaiveDate, end: NaiveDate) -> Result<MonthIter> {
    Ok(DateRange::new(start, end)?.months())
}

/// First and last day of the month containing `date`.
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = first_of_month(date);
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX);
    (first, last)
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Lazy month walk. The cursor always sits on the first of a month, so stepping
/// by exactly one month can never skip past `end`.
#[derive(Debug, Clone)]
pub struct MonthIter {
    cursor: Option<NaiveDate>,
    start: NaiveDate,
    end: NaiveDate,
}

impl Iterator for MonthIter {
    type Item = MonthRange;

    fn next(&mut self) -> Option<MonthRange> {
        let cursor = self.cursor.filter(|c| *c <= self.end)?;
        let (first, last) = month_bounds(cursor);
        self.cursor = cursor.checked_add_months(Months::new(1));
        Some(MonthRange {
            month_start: self.start.max(first),
            month_end: self.end.min(last),
        })
    }
}

impl std::iter::FusedIterator for MonthIter {}

impl MonthRange {
    pub fn year(&self) -> i32 {
        self.month_start.year()
    }

    pub fn month(&self) -> u32 {
        self.month_start.month()
    }

    pub fn as_date_range(&self) -> DateRange {
        DateRange {
            start: self.month_start,
            end: self.month_end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn collect(start: NaiveDate, end: NaiveDate) -> Vec<MonthRange> {
        iterate_months(start, end).unwrap().collect()
    }

    fn assert_partition(start: NaiveDate, end: NaiveDate) {
        let ranges = collect(start, end);
        assert!(!ranges.is_empty());
        assert_eq!(ranges.first().unwrap().month_start, start);
        assert_eq!(ranges.last().unwrap().month_end, end);
        for r in &ranges {
            assert!(r.month_start <= r.month_end);
            assert_eq!(r.month_start.year(), r.month_end.year());
            assert_eq!(r.month_start.month(), r.month_end.month());
        }
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].month_end.succ_opt().unwrap(), pair[1].month_start);
        }
        let covered: i64 = ranges
            .iter()
            .map(|r| (r.month_end - r.month_start).num_days() + 1)
            .sum();
        assert_eq!(covered, (end - start).num_days() + 1);
    }

    #[test]
    fn rejects_end_before_start() {
        let err = iterate_months(d(2023, 1, 1), d(2022, 12, 31)).unwrap_err();
        assert!(matches!(err, ExportError::InvalidRange { .. }));
    }

    #[test]
    fn boundary_case_mid_month_to_mid_month() {
        // A cadence anchored on the 17th stops at 2022-10-17 here and loses November.
        let ranges = collect(d(2017, 6, 17), d(2022, 11, 12));
        assert_eq!(
            ranges.first().unwrap(),
            &MonthRange {
                month_start: d(2017, 6, 17),
                month_end: d(2017, 6, 30)
            }
        );
        assert_eq!(
            ranges.last().unwrap(),
            &MonthRange {
                month_start: d(2022, 11, 1),
                month_end: d(2022, 11, 12)
            }
        );
        // Jun 2017 ..= Nov 2022
        assert_eq!(ranges.len(), 66);
        assert_partition(d(2017, 6, 17), d(2022, 11, 12));
    }

    #[test]
    fn end_day_later_in_month_than_start_day() {
        let ranges = collect(d(2017, 6, 17), d(2022, 11, 17));
        assert_eq!(ranges.last().unwrap().month_start, d(2022, 11, 1));
        assert_eq!(ranges.last().unwrap().month_end, d(2022, 11, 17));
        assert_partition(d(2017, 6, 17), d(2022, 11, 17));
    }

    #[test]
    fn single_full_month() {
        let ranges = collect(d(2021, 6, 1), d(2021, 6, 30));
        assert_eq!(
            ranges,
            vec![MonthRange {
                month_start: d(2021, 6, 1),
                month_end: d(2021, 6, 30)
            }]
        );
    }

    #[test]
    fn single_day() {
        let ranges = collect(d(2020, 2, 29), d(2020, 2, 29));
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].month_start, ranges[0].month_end);
    }

    #[test]
    fn start_on_month_end_day_31() {
        // Jan 31 + 1 month would clamp to Feb 28; walking from the first avoids that.
        let ranges = collect(d(2021, 1, 31), d(2021, 4, 2));
        assert_eq!(ranges.len(), 4);
        assert_eq!(ranges[1].month_start, d(2021, 2, 1));
        assert_eq!(ranges[1].month_end, d(2021, 2, 28));
        assert_partition(d(2021, 1, 31), d(2021, 4, 2));
    }

    #[test]
    fn partitions_many_ranges() {
        let starts = [d(2019, 12, 31), d(2020, 1, 1), d(2016, 2, 15), d(2023, 7, 30)];
        for start in starts {
            for offset in [0, 1, 27, 28, 29, 30, 31, 59, 365, 366, 1000] {
                let end = start + chrono::Days::new(offset);
                assert_partition(start, end);
            }
        }
    }

    #[test]
    fn month_bounds_handles_leap_years_and_december() {
        assert_eq!(month_bounds(d(2024, 2, 10)), (d(2024, 2, 1), d(2024, 2, 29)));
        assert_eq!(month_bounds(d(2023, 2, 10)), (d(2023, 2, 1), d(2023, 2, 28)));
        assert_eq!(month_bounds(d(2022, 12, 31)), (d(2022, 12, 1), d(2022, 12, 31)));
    }

    #[test]
    fn iterator_is_lazy_and_restartable() {
        let range = DateRange::new(d(2021, 1, 5), d(2021, 12, 5)).unwrap();
        let mut months = range.months();
        assert_eq!(months.next().unwrap().month(), 1);
        assert_eq!(range.months().count(), 12);
    }
}
