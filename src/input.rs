use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{ForecastError, Result};
use crate::models::RawSalesRecord;

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    store: String,
    item: String,
    sales: f64,
}

/// Reads `date,store,item,sales` rows. Extra columns are ignored.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<RawSalesRecord>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut records = Vec::new();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row_number = index + 1;
        let row = result.map_err(|err| ForecastError::InvalidRecord {
            row: row_number,
            reason: err.to_string(),
        })?;
        records.push(RawSalesRecord::parse(
            row_number, &row.date, &row.store, &row.item, row.sales,
        )?);
    }

    debug!(records = records.len(), "read sales records");
    Ok(records)
}

pub fn read_records_from_path(path: &Path) -> Result<Vec<RawSalesRecord>> {
    let file = std::fs::File::open(path).map_err(csv::Error::from)?;
    read_records(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;

    #[test]
    fn reads_kaggle_style_rows() {
        let data = "date,store,item,sales\n2013-01-01,1,1,13\n2013-01-02, 1 ,1, 11\n";
        let records = read_records(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].date, NaiveDate::from_ymd_opt(2013, 1, 2).unwrap());
        assert_eq!(records[1].store, "1");
        assert_eq!(records[1].sales, 11.0);
    }

    #[test]
    fn accepts_timestamps_and_extra_columns() {
        let data = "id,date,store,item,sales\n7,2013-01-01 00:00:00,2,9,4.5\n";
        let records = read_records(data.as_bytes()).unwrap();
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2013, 1, 1).unwrap());
        assert_eq!(records[0].item, "9");
    }

    #[test]
    fn reports_row_of_bad_date() {
        let data = "date,store,item,sales\n2013-01-01,1,1,3\nyesterday,1,1,3\n";
        match read_records(data.as_bytes()) {
            Err(ForecastError::InvalidRecord { row, reason }) => {
                assert_eq!(row, 2);
                assert!(reason.contains("yesterday"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn reports_non_numeric_sales() {
        let data = "date,store,item,sales\n2013-01-01,1,1,lots\n";
        assert!(matches!(
            read_records(data.as_bytes()),
            Err(ForecastError::InvalidRecord { row: 1, .. })
        ));
    }

    #[test]
    fn reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "date,store,item,sales").unwrap();
        writeln!(file, "2014-05-20,3,4,8").unwrap();
        let records = read_records_from_path(file.path()).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn missing_file_is_csv_error() {
        let result = read_records_from_path(Path::new("/nonexistent/historical_data.csv"));
        assert!(matches!(result, Err(ForecastError::Csv(_))));
    }
}
