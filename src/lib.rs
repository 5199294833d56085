//! Monthly sales forecasting.
//!
//! Three pure stages run in order:
//!
//! 1. [`aggregate`] collapses transaction records into monthly totals.
//! 2. [`select_window`] keeps the two calendar years before a target year.
//! 3. [`forecast`] fits a linear trend or a seasonal ARIMA model on that
//!    window and reconciles actual and predicted sales into one 36-month
//!    timeline.
//!
//! ```no_run
//! use sales_forecast::{aggregate, forecast, input, select_window, TargetYear};
//!
//! # fn main() -> sales_forecast::Result<()> {
//! let records = input::read_records_from_path("historical_data.csv".as_ref())?;
//! let series = aggregate(&records)?;
//! let year: TargetYear = "2016".parse()?;
//! let window = select_window(&series, year);
//! let timeline = forecast(&window, "linear", &series, year)?;
//! assert_eq!(timeline.rows.len(), 36);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod calendar;
pub mod config;
pub mod error;
pub mod forecast;
pub mod input;
pub mod linear;
pub mod models;
pub mod report;
pub mod sarima;
pub mod window;

pub use aggregate::aggregate;
pub use config::{GapPolicy, PipelineOptions, TimeAxis};
pub use error::{ForecastError, Result};
pub use forecast::{forecast, forecast_with};
pub use models::{
    CombinedTimeline, ForecastPoint, ForecastSeries, ModelKind, MonthlySeries, MonthlyTotal,
    RawSalesRecord, TargetYear, TimelineRow, TrainingWindow,
};
pub use window::{select_window, select_window_with};
