use chrono::{Datelike, Days, Months, NaiveDate};

/// First day of the month `date` falls in.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

/// Whole calendar months from `from` to `to`; negative when `to` is earlier.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    (to.year() - from.year()) * 12 + to.month0() as i32 - from.month0() as i32
}

/// Every first-of-month date from `start` through `end`, inclusive.
pub fn month_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    std::iter::successors(Some(month_start(start)), |month| {
        month.checked_add_months(Months::new(1))
    })
    .take_while(|month| *month <= end)
    .collect()
}
