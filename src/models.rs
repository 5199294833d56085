use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::error::{ForecastError, Result};

/// One transaction-level sales observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSalesRecord {
    pub date: NaiveDate,
    pub store: String,
    pub item: String,
    pub sales: f64,
}

impl RawSalesRecord {
    /// Builds a record from raw text fields. `row` is the 1-based position
    /// reported back in `InvalidRecord` errors.
    pub fn parse(row: usize, date: &str, store: &str, item: &str, sales: f64) -> Result<Self> {
        let date = parse_sales_date(date).ok_or_else(|| ForecastError::InvalidRecord {
            row,
            reason: format!("unparseable date '{}'", date.trim()),
        })?;
        let record = Self {
            date,
            store: store.trim().to_string(),
            item: item.trim().to_string(),
            sales,
        };
        record
            .validate()
            .map_err(|reason| ForecastError::InvalidRecord { row, reason })?;
        Ok(record)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.sales.is_finite() {
            return Err(format!("sales value {} is not a finite number", self.sales));
        }
        if self.sales < 0.0 {
            return Err(format!("sales value {} is negative", self.sales));
        }
        Ok(())
    }
}

/// Accepts `YYYY-MM-DD` or `YYYY/MM/DD`, optionally followed by a time part
/// separated by a space or `T`, which is ignored.
pub fn parse_sales_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw.split([' ', 'T']).next().unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%Y/%m/%d"))
        .ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    pub month: NaiveDate,
    pub total_sales: f64,
}

/// Monthly totals keyed by first-of-month date, strictly ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthlySeries {
    entries: Vec<MonthlyTotal>,
}

impl MonthlySeries {
    /// Sorts and merges duplicate months so the ordering invariant always holds.
    pub fn from_totals(mut totals: Vec<MonthlyTotal>) -> Self {
        totals.sort_by_key(|entry| entry.month);
        let mut entries: Vec<MonthlyTotal> = Vec::with_capacity(totals.len());
        for entry in totals {
            let month = calendar::month_start(entry.month);
            match entries.last_mut() {
                Some(last) if last.month == month => last.total_sales += entry.total_sales,
                _ => entries.push(MonthlyTotal {
                    month,
                    total_sales: entry.total_sales,
                }),
            }
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[MonthlyTotal] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &MonthlyTotal> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, month: NaiveDate) -> Option<f64> {
        self.entries
            .binary_search_by_key(&month, |entry| entry.month)
            .ok()
            .map(|index| self.entries[index].total_sales)
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|entry| entry.total_sales).sum()
    }
}

/// The two calendar years of monthly totals preceding a target year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingWindow {
    start: NaiveDate,
    end: NaiveDate,
    entries: Vec<MonthlyTotal>,
}

impl TrainingWindow {
    pub(crate) fn new(start: NaiveDate, end: NaiveDate, entries: Vec<MonthlyTotal>) -> Self {
        Self {
            start,
            end,
            entries,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn entries(&self) -> &[MonthlyTotal] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|entry| entry.total_sales).collect()
    }

    pub fn get(&self, month: NaiveDate) -> Option<f64> {
        self.entries
            .iter()
            .find(|entry| entry.month == month)
            .map(|entry| entry.total_sales)
    }

    /// Months inside the window bounds with no observation.
    pub fn missing_months(&self) -> Vec<NaiveDate> {
        calendar::month_range(self.start, self.end)
            .into_iter()
            .filter(|month| self.get(*month).is_none())
            .collect()
    }

    pub(crate) fn zero_filled(&self) -> Self {
        let entries = calendar::month_range(self.start, self.end)
            .into_iter()
            .map(|month| MonthlyTotal {
                month,
                total_sales: self.get(month).unwrap_or(0.0),
            })
            .collect();
        Self::new(self.start, self.end, entries)
    }
}

/// Forecasting model choice. Tokens are `linear` and `arima`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    #[serde(rename = "linear")]
    LinearTrend,
    #[serde(rename = "arima")]
    SeasonalArima,
}

impl ModelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelKind::LinearTrend => "linear",
            ModelKind::SeasonalArima => "arima",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ModelKind::LinearTrend => "Linear trend (OLS)",
            ModelKind::SeasonalArima => "Seasonal ARIMA (1,1,1)(1,1,1,12)",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = ForecastError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim() {
            "linear" => Ok(ModelKind::LinearTrend),
            "arima" => Ok(ModelKind::SeasonalArima),
            other => Err(ForecastError::UnsupportedModel(other.to_string())),
        }
    }
}

/// A validated four-digit forecast year with its precomputed calendar bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetYear {
    year: i32,
    history_start: NaiveDate,
    history_end: NaiveDate,
    forecast_start: NaiveDate,
    forecast_end: NaiveDate,
}

impl TargetYear {
    pub fn new(year: i32) -> Result<Self> {
        if !(1000..=9999).contains(&year) {
            return Err(ForecastError::InvalidTargetYear(year.to_string()));
        }
        let month = |year: i32, month: u32| {
            NaiveDate::from_ymd_opt(year, month, 1)
                .ok_or_else(|| ForecastError::InvalidTargetYear(year.to_string()))
        };
        Ok(Self {
            year,
            history_start: month(year - 2, 1)?,
            history_end: month(year - 1, 12)?,
            forecast_start: month(year, 1)?,
            forecast_end: month(year, 12)?,
        })
    }

    pub fn value(self) -> i32 {
        self.year
    }

    /// January of the year two before the target.
    pub fn history_start(self) -> NaiveDate {
        self.history_start
    }

    /// December of the year before the target.
    pub fn history_end(self) -> NaiveDate {
        self.history_end
    }

    pub fn forecast_start(self) -> NaiveDate {
        self.forecast_start
    }

    pub fn forecast_end(self) -> NaiveDate {
        self.forecast_end
    }

    pub fn forecast_months(self) -> Vec<NaiveDate> {
        calendar::month_range(self.forecast_start, self.forecast_end)
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year
    }
}

impl TryFrom<i32> for TargetYear {
    type Error = ForecastError;

    fn try_from(year: i32) -> Result<Self> {
        Self::new(year)
    }
}

impl FromStr for TargetYear {
    type Err = ForecastError;

    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if trimmed.len() != 4 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(ForecastError::InvalidTargetYear(trimmed.to_string()));
        }
        let year = trimmed
            .parse::<i32>()
            .map_err(|_| ForecastError::InvalidTargetYear(trimmed.to_string()))?;
        Self::new(year)
    }
}

impl fmt::Display for TargetYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.year)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub month: NaiveDate,
    pub predicted_sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub model: ModelKind,
    pub points: Vec<ForecastPoint>,
}

impl ForecastSeries {
    pub fn get(&self, month: NaiveDate) -> Option<f64> {
        self.points
            .iter()
            .find(|point| point.month == month)
            .map(|point| point.predicted_sales)
    }
}

/// One month of the reconciled output. Missing values stay `None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelineRow {
    pub date: NaiveDate,
    pub actual: Option<f64>,
    pub predicted: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedTimeline {
    pub target_year: i32,
    pub model: ModelKind,
    pub rows: Vec<TimelineRow>,
}

impl CombinedTimeline {
    pub fn predicted_rows(&self) -> impl Iterator<Item = &TimelineRow> {
        self.rows.iter().filter(|row| row.predicted.is_some())
    }

    pub fn actual_rows(&self) -> impl Iterator<Item = &TimelineRow> {
        self.rows.iter().filter(|row| row.actual.is_some())
    }
}
