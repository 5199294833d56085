//! Linear trend model.
//!
//! Fits `sales = intercept + slope * t` by ordinary least squares, where `t`
//! is either the observation's position within the training window or the
//! number of calendar months elapsed since the window start.

use tracing::debug;

use crate::calendar::months_between;
use crate::config::TimeAxis;
use crate::error::{ForecastError, Result};
use crate::models::{ForecastPoint, ForecastSeries, ModelKind, TargetYear, TrainingWindow};

pub const MIN_OBSERVATIONS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTrend {
    intercept: f64,
    slope: f64,
    r_squared: f64,
}

impl LinearTrend {
    pub fn fit(x: &[f64], y: &[f64]) -> Result<Self> {
        let observations = x.len().min(y.len());
        if observations < MIN_OBSERVATIONS {
            return Err(ForecastError::InsufficientWindow {
                model: ModelKind::LinearTrend,
                required: MIN_OBSERVATIONS,
                actual: observations,
            });
        }

        let n = observations as f64;
        let (x, y) = (&x[..observations], &y[..observations]);
        let sum_x: f64 = x.iter().sum();
        let sum_y: f64 = y.iter().sum();
        let sum_xx: f64 = x.iter().map(|v| v * v).sum();
        let sum_xy: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();

        let denominator = n * sum_xx - sum_x * sum_x;
        if denominator.abs() < 1e-10 {
            return Err(ForecastError::Numerical(
                "singular design in linear trend fit".to_string(),
            ));
        }

        let slope = (n * sum_xy - sum_x * sum_y) / denominator;
        let intercept = (sum_y - slope * sum_x) / n;

        let mean_y = sum_y / n;
        let ss_tot: f64 = y.iter().map(|v| (v - mean_y).powi(2)).sum();
        let ss_res: f64 = x
            .iter()
            .zip(y)
            .map(|(a, b)| (b - (intercept + slope * a)).powi(2))
            .sum();
        let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 1.0 };

        Ok(Self {
            intercept,
            slope,
            r_squared,
        })
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn r_squared(&self) -> f64 {
        self.r_squared
    }

    pub fn predict_at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Predicts all twelve months of `target_year`.
///
/// On the ordinal axis the forecasts continue at positions `len..len + 12`
/// regardless of gaps in the window; on the elapsed axis they sit at their
/// true calendar distance from the window start.
pub fn forecast_year(
    window: &TrainingWindow,
    target_year: TargetYear,
    axis: TimeAxis,
) -> Result<ForecastSeries> {
    let y = window.values();
    let (x, future): (Vec<f64>, Vec<f64>) = match axis {
        TimeAxis::Ordinal => (
            (0..y.len()).map(|i| i as f64).collect(),
            (y.len()..y.len() + 12).map(|i| i as f64).collect(),
        ),
        TimeAxis::ElapsedMonths => (
            window
                .entries()
                .iter()
                .map(|entry| f64::from(months_between(window.start(), entry.month)))
                .collect(),
            target_year
                .forecast_months()
                .iter()
                .map(|month| f64::from(months_between(window.start(), *month)))
                .collect(),
        ),
    };

    let model = LinearTrend::fit(&x, &y)?;
    debug!(
        intercept = model.intercept(),
        slope = model.slope(),
        r_squared = model.r_squared(),
        ?axis,
        "fitted linear trend"
    );

    let points = target_year
        .forecast_months()
        .into_iter()
        .zip(future)
        .map(|(month, t)| ForecastPoint {
            month,
            predicted_sales: model.predict_at(t),
        })
        .collect();

    Ok(ForecastSeries {
        model: ModelKind::LinearTrend,
        points,
    })
}
