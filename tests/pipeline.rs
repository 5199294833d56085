use chrono::{Datelike, NaiveDate};
use sales_forecast::{
    aggregate, forecast, input, report, select_window, ForecastError, RawSalesRecord, TargetYear,
};

fn progression_records() -> Vec<RawSalesRecord> {
    (0..24)
        .map(|index: i32| RawSalesRecord {
            date: NaiveDate::from_ymd_opt(2014 + index / 12, (index % 12 + 1) as u32, 15).unwrap(),
            store: "1".to_string(),
            item: "1".to_string(),
            sales: 100.0 + 10.0 * f64::from(index),
        })
        .collect()
}

#[test]
fn linear_scenario_end_to_end() {
    let records = progression_records();
    let series = aggregate(&records).unwrap();
    let totals: Vec<f64> = series.iter().map(|entry| entry.total_sales).collect();
    assert_eq!(totals.len(), 24);
    assert_eq!(totals[0], 100.0);
    assert_eq!(totals[23], 330.0);

    let year: TargetYear = "2016".parse().unwrap();
    let window = select_window(&series, year);
    assert_eq!(window.entries(), series.entries());

    let timeline = forecast(&window, "linear", &series, year).unwrap();
    assert_eq!(timeline.rows.len(), 36);

    for (offset, row) in timeline.rows.iter().enumerate() {
        if row.date.year() < 2016 {
            assert_eq!(row.actual, Some(100.0 + 10.0 * offset as f64));
            assert_eq!(row.predicted, None);
        } else {
            assert_eq!(row.actual, None);
            let predicted = row.predicted.unwrap();
            assert!((predicted - (100.0 + 10.0 * offset as f64)).abs() < 1e-6);
        }
    }
    let first = timeline.rows[24].predicted.unwrap();
    let last = timeline.rows[35].predicted.unwrap();
    assert!((first - 340.0).abs() < 1e-6);
    assert!((last - 450.0).abs() < 1e-6);
}

#[test]
fn csv_input_through_arima_and_report() {
    let mut csv = String::from("date,store,item,sales\n");
    for index in 0..36 {
        let year = 2013 + index / 12;
        let month = index % 12 + 1;
        let seasonal = [3, 1, 4, 1, 5, 9, 2, 6, 5, 3, 5, 8][index % 12];
        for store in 1..=2 {
            csv.push_str(&format!(
                "{year}-{month:02}-0{store},{store},1,{}\n",
                50 + index * 2 + seasonal * store
            ));
        }
    }

    let records = input::read_records(csv.as_bytes()).unwrap();
    assert_eq!(records.len(), 72);
    let series = aggregate(&records).unwrap();
    assert_eq!(series.len(), 36);

    let year = TargetYear::try_from(2015).unwrap();
    let window = select_window(&series, year);
    let timeline = forecast(&window, "arima", &series, year).unwrap();
    assert_eq!(timeline.predicted_rows().count(), 11);
    assert!(timeline.rows[24].predicted.is_none());

    let markdown = report::build_report(&timeline, &series);
    assert!(markdown.contains("Seasonal ARIMA"));
    assert!(markdown.contains("Compared against 11 months of recorded 2015 sales"));
}

#[test]
fn unknown_model_is_rejected() {
    let series = aggregate(&progression_records()).unwrap();
    let year = TargetYear::try_from(2016).unwrap();
    let window = select_window(&series, year);
    let result = forecast(&window, "prophet", &series, year);
    assert!(matches!(result, Err(ForecastError::UnsupportedModel(_))));
}
