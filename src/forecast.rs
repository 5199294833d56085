use tracing::{debug, info};

use crate::calendar::month_range;
use crate::config::PipelineOptions;
use crate::error::{ForecastError, Result};
use crate::models::{
    CombinedTimeline, ForecastSeries, ModelKind, MonthlySeries, TargetYear, TimelineRow,
    TrainingWindow,
};
use crate::{linear, sarima};

/// Fits the model named by `kind` (`"linear"` or `"arima"`) on `window` and
/// returns the 36-month actual/predicted timeline for `target_year`.
///
/// Unknown model names fail with [`ForecastError::UnsupportedModel`] before
/// any fitting happens.
pub fn forecast(
    window: &TrainingWindow,
    kind: &str,
    full_series: &MonthlySeries,
    target_year: TargetYear,
) -> Result<CombinedTimeline> {
    let kind: ModelKind = kind.parse()?;
    forecast_with(
        window,
        kind,
        full_series,
        target_year,
        &PipelineOptions::default(),
    )
}

pub fn forecast_with(
    window: &TrainingWindow,
    kind: ModelKind,
    full_series: &MonthlySeries,
    target_year: TargetYear,
    options: &PipelineOptions,
) -> Result<CombinedTimeline> {
    let predictions = match kind {
        ModelKind::LinearTrend => linear::forecast_year(window, target_year, options.time_axis)?,
        ModelKind::SeasonalArima => sarima::forecast_year(window, target_year)?,
    };

    if let Some(point) = predictions
        .points
        .iter()
        .find(|point| !point.predicted_sales.is_finite())
    {
        return Err(ForecastError::Numerical(format!(
            "{kind} model produced a non-finite prediction for {}",
            point.month
        )));
    }

    // The full series never feeds the fit; it only tells us whether the
    // target year can be compared against real sales.
    let holdout_months = full_series
        .iter()
        .filter(|entry| target_year.contains(entry.month))
        .count();
    debug!(
        holdout_months,
        "target year actuals available for comparison"
    );

    let timeline = reconcile(window, &predictions, target_year);
    info!(
        model = %kind,
        target_year = target_year.value(),
        observations = window.len(),
        predicted_months = predictions.points.len(),
        "forecast complete"
    );
    Ok(timeline)
}

/// Left-joins window actuals and model predictions onto every month from
/// January two years before the target through December of the target.
pub fn reconcile(
    window: &TrainingWindow,
    predictions: &ForecastSeries,
    target_year: TargetYear,
) -> CombinedTimeline {
    let rows = month_range(target_year.history_start(), target_year.forecast_end())
        .into_iter()
        .map(|date| TimelineRow {
            date,
            actual: window.get(date),
            predicted: predictions.get(date),
        })
        .collect();

    CombinedTimeline {
        target_year: target_year.value(),
        model: predictions.model,
        rows,
    }
}
