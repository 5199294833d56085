use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::calendar::month_start;
use crate::error::{ForecastError, Result};
use crate::models::{MonthlySeries, MonthlyTotal, RawSalesRecord};

/// Collapses transaction records into one total per calendar month, summed
/// across every store and item. Months without records are left out.
pub fn aggregate(records: &[RawSalesRecord]) -> Result<MonthlySeries> {
    let mut totals: HashMap<NaiveDate, f64> = HashMap::new();

    for (index, record) in records.iter().enumerate() {
        record
            .validate()
            .map_err(|reason| ForecastError::InvalidRecord {
                row: index + 1,
                reason,
            })?;

        *totals.entry(month_start(record.date)).or_insert(0.0) += record.sales;
    }

    let series = MonthlySeries::from_totals(
        totals
            .into_iter()
            .map(|(month, total_sales)| MonthlyTotal { month, total_sales })
            .collect(),
    );

    debug!(
        records = records.len(),
        months = series.len(),
        "aggregated sales records into monthly totals"
    );
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, store: &str, item: &str, sales: f64) -> RawSalesRecord {
        RawSalesRecord::parse(1, date, store, item, sales).unwrap()
    }

    #[test]
    fn sums_across_stores_and_items_per_month() {
        let records = vec![
            record("2014-01-03", "1", "1", 10.0),
            record("2014-01-28", "2", "1", 5.0),
            record("2014-01-15", "1", "9", 2.5),
            record("2014-02-01", "1", "1", 7.0),
        ];

        let series = aggregate(&records).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.entries()[0].month, NaiveDate::from_ymd_opt(2014, 1, 1).unwrap());
        assert_eq!(series.entries()[0].total_sales, 17.5);
        assert_eq!(series.entries()[1].total_sales, 7.0);
    }

    #[test]
    fn conserves_total_sales() {
        let records: Vec<RawSalesRecord> = (0..400)
            .map(|i| {
                let day = 1 + (i % 28) as u32;
                let month = 1 + (i % 12) as u32;
                let year = 2013 + (i % 3) as i32;
                RawSalesRecord {
                    date: NaiveDate::from_ymd_opt(year, month, day).unwrap(),
                    store: (i % 10).to_string(),
                    item: (i % 50).to_string(),
                    sales: (i % 37) as f64,
                }
            })
            .collect();

        let input_total: f64 = records.iter().map(|r| r.sales).sum();
        let series = aggregate(&records).unwrap();
        assert_eq!(series.total(), input_total);
    }

    #[test]
    fn output_is_unique_and_strictly_ascending() {
        let records = vec![
            record("2015-06-10", "1", "1", 1.0),
            record("2014-02-10", "1", "1", 1.0),
            record("2015-06-11", "1", "1", 1.0),
            record("2014-12-31", "1", "1", 1.0),
        ];
        let series = aggregate(&records).unwrap();
        assert_eq!(series.len(), 3);
        assert!(series
            .entries()
            .windows(2)
            .all(|pair| pair[0].month < pair[1].month));
    }

    #[test]
    fn gaps_are_not_zero_filled() {
        let records = vec![
            record("2014-01-10", "1", "1", 1.0),
            record("2014-04-10", "1", "1", 1.0),
        ];
        let series = aggregate(&records).unwrap();
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn rejects_negative_sales_with_row_number() {
        let mut records = vec![
            record("2014-01-10", "1", "1", 1.0),
            record("2014-01-11", "1", "1", 1.0),
        ];
        records[1].sales = -4.0;
        match aggregate(&records) {
            Err(ForecastError::InvalidRecord { row, .. }) => assert_eq!(row, 2),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn empty_input_yields_empty_series() {
        assert!(aggregate(&[]).unwrap().is_empty());
    }
}
