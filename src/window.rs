use tracing::{debug, warn};

use crate::config::GapPolicy;
use crate::error::{ForecastError, Result};
use crate::models::{MonthlySeries, TargetYear, TrainingWindow};

/// Monthly totals from January two years before `target_year` through
/// December of the previous year. Gaps are passed through as-is.
pub fn select_window(series: &MonthlySeries, target_year: TargetYear) -> TrainingWindow {
    let start = target_year.history_start();
    let end = target_year.history_end();
    let entries = series
        .iter()
        .filter(|entry| entry.month >= start && entry.month <= end)
        .copied()
        .collect();

    let window = TrainingWindow::new(start, end, entries);
    debug!(
        target_year = target_year.value(),
        observations = window.len(),
        "selected training window"
    );
    window
}

/// Same as [`select_window`] with an explicit policy for missing months.
pub fn select_window_with(
    series: &MonthlySeries,
    target_year: TargetYear,
    policy: GapPolicy,
) -> Result<TrainingWindow> {
    let window = select_window(series, target_year);
    let missing = window.missing_months();
    if missing.is_empty() {
        return Ok(window);
    }

    match policy {
        GapPolicy::Passthrough => {
            warn!(
                target_year = target_year.value(),
                missing = missing.len(),
                "training window has gaps; months are passed through unfilled"
            );
            Ok(window)
        }
        GapPolicy::ZeroFill => {
            debug!(missing = missing.len(), "zero-filling training window gaps");
            Ok(window.zero_filled())
        }
        GapPolicy::Error => Err(ForecastError::MissingMonths {
            target_year: target_year.value(),
            missing,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MonthlyTotal;
    use chrono::NaiveDate;

    fn month(year: i32, month: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, 1).unwrap()
    }

    fn series(from_year: i32, to_year: i32) -> MonthlySeries {
        let totals = (from_year..=to_year)
            .flat_map(|year| (1..=12).map(move |m| (year, m)))
            .enumerate()
            .map(|(index, (year, m))| MonthlyTotal {
                month: month(year, m),
                total_sales: 100.0 + index as f64,
            })
            .collect();
        MonthlySeries::from_totals(totals)
    }

    fn year(value: i32) -> TargetYear {
        TargetYear::try_from(value).unwrap()
    }

    #[test]
    fn keeps_two_prior_calendar_years() {
        let window = select_window(&series(2012, 2017), year(2016));
        assert_eq!(window.len(), 24);
        assert_eq!(window.entries()[0].month, month(2014, 1));
        assert_eq!(window.entries()[23].month, month(2015, 12));
    }

    #[test]
    fn every_month_within_bounds_and_at_most_24() {
        let data = series(2010, 2018);
        for target in 2009..=2021 {
            let window = select_window(&data, year(target));
            assert!(window.len() <= 24);
            for entry in window.entries() {
                assert!(entry.month >= month(target - 2, 1));
                assert!(entry.month <= month(target - 1, 12));
            }
        }
    }

    #[test]
    fn short_history_passes_through_silently() {
        let window = select_window(&series(2015, 2015), year(2016));
        assert_eq!(window.len(), 12);
        assert_eq!(window.missing_months().len(), 12);
    }

    #[test]
    fn gap_policies() {
        let data = series(2015, 2015);

        let passthrough = select_window_with(&data, year(2016), GapPolicy::Passthrough).unwrap();
        assert_eq!(passthrough.len(), 12);

        let filled = select_window_with(&data, year(2016), GapPolicy::ZeroFill).unwrap();
        assert_eq!(filled.len(), 24);
        assert_eq!(filled.entries()[0].total_sales, 0.0);
        assert_eq!(filled.entries()[12].total_sales, 100.0);

        match select_window_with(&data, year(2016), GapPolicy::Error) {
            Err(ForecastError::MissingMonths {
                target_year,
                missing,
            }) => {
                assert_eq!(target_year, 2016);
                assert_eq!(missing.len(), 12);
                assert_eq!(missing[0], month(2014, 1));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn complete_window_is_unaffected_by_policy() {
        let data = series(2014, 2015);
        let strict = select_window_with(&data, year(2016), GapPolicy::Error).unwrap();
        assert_eq!(strict, select_window(&data, year(2016)));
    }
}
