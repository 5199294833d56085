//! Seasonal ARIMA model.
//!
//! The series is differenced `d` times at lag 1 and `D` times at the seasonal
//! lag, then an ARMA process with multiplicative seasonal polynomials
//!
//! ```text
//! (1 - φ(B)) (1 - Φ(B^s)) w_t = (1 + θ(B)) (1 + Θ(B^s)) e_t
//! ```
//!
//! is fitted by conditional sum of squares (pre-sample values and errors are
//! zero). Coefficients are estimated with Levenberg-Marquardt on a `tanh`
//! reparameterization so each one stays inside (-1, 1).

use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt};
use nalgebra::{DMatrix, DVector, Dyn, Owned};
use tracing::{debug, warn};

use crate::error::{ForecastError, Result};
use crate::models::{ForecastPoint, ForecastSeries, ModelKind, TargetYear, TrainingWindow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SarimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub seasonal_p: usize,
    pub seasonal_d: usize,
    pub seasonal_q: usize,
    pub period: usize,
}

impl SarimaOrder {
    /// (1,1,1)(1,1,1,12), the order used for monthly sales.
    pub const MONTHLY: SarimaOrder = SarimaOrder {
        p: 1,
        d: 1,
        q: 1,
        seasonal_p: 1,
        seasonal_d: 1,
        seasonal_q: 1,
        period: 12,
    };

    pub fn parameter_count(&self) -> usize {
        self.p + self.q + self.seasonal_p + self.seasonal_q
    }

    /// Observations lost to differencing plus one per estimated coefficient.
    pub fn min_observations(&self) -> usize {
        self.d + self.seasonal_d * self.period + self.parameter_count().max(1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalArima {
    order: SarimaOrder,
    ar: Vec<f64>,
    ma: Vec<f64>,
    seasonal_ar: Vec<f64>,
    seasonal_ma: Vec<f64>,
    history: Vec<f64>,
}

impl SeasonalArima {
    pub fn fit(order: SarimaOrder, data: &[f64]) -> Result<Self> {
        let required = order.min_observations();
        if data.len() < required {
            return Err(ForecastError::InsufficientWindow {
                model: ModelKind::SeasonalArima,
                required,
                actual: data.len(),
            });
        }
        if data.iter().any(|value| !value.is_finite()) {
            return Err(ForecastError::Numerical(
                "training data contains non-finite values".to_string(),
            ));
        }

        let stationary = stationary_series(order, data);
        let problem = CssProblem {
            order,
            series: stationary.clone(),
            params: initial_params(order, &stationary),
        };

        let (fitted, report) = LevenbergMarquardt::new().minimize(problem);
        if !report.termination.was_successful() {
            warn!(
                termination = ?report.termination,
                evaluations = report.number_of_evaluations,
                "seasonal ARIMA optimizer did not converge; using best parameters found"
            );
        }

        let coefficients = fitted.coefficients();
        if coefficients.iter().any(|value| !value.is_finite()) {
            return Err(ForecastError::Numerical(
                "seasonal ARIMA fit produced non-finite coefficients".to_string(),
            ));
        }

        let (ar, ma, seasonal_ar, seasonal_ma) = split_coefficients(order, &coefficients);
        debug!(
            ?ar,
            ?ma,
            ?seasonal_ar,
            ?seasonal_ma,
            objective = report.objective_function,
            "fitted seasonal ARIMA"
        );

        Ok(Self {
            order,
            ar,
            ma,
            seasonal_ar,
            seasonal_ma,
            history: data.to_vec(),
        })
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma
    }

    pub fn seasonal_ar_coefficients(&self) -> &[f64] {
        &self.seasonal_ar
    }

    pub fn seasonal_ma_coefficients(&self) -> &[f64] {
        &self.seasonal_ma
    }

    /// Forecasts `steps` values past the end of the training data.
    pub fn forecast(&self, steps: usize) -> Vec<f64> {
        if steps == 0 {
            return Vec::new();
        }

        // Keep every differencing level so forecasts can be integrated back.
        let mut levels = vec![self.history.clone()];
        let lags: Vec<usize> = std::iter::repeat(1)
            .take(self.order.d)
            .chain(std::iter::repeat(self.order.period).take(self.order.seasonal_d))
            .collect();
        for lag in &lags {
            let next = difference(levels.last().map_or(&[][..], Vec::as_slice), *lag);
            levels.push(next);
        }

        let ar_poly = ar_polynomial(&self.ar, &self.seasonal_ar, self.order.period);
        let ma_poly = ma_polynomial(&self.ma, &self.seasonal_ma, self.order.period);
        let stationary = levels.pop().unwrap_or_default();
        let mut extended = stationary.clone();
        let mut errors = residuals(&stationary, &ar_poly, &ma_poly);

        for _ in 0..steps {
            let t = extended.len();
            let mut next = 0.0;
            for (lag, coefficient) in ar_poly.iter().enumerate().skip(1) {
                if lag <= t {
                    next -= coefficient * extended[t - lag];
                }
            }
            for (lag, coefficient) in ma_poly.iter().enumerate().skip(1) {
                if lag <= t {
                    next += coefficient * errors[t - lag];
                }
            }
            extended.push(next);
            errors.push(0.0);
        }

        let mut forecasts = extended.split_off(stationary.len());
        for (level, lag) in levels.iter().rev().zip(lags.iter().rev()) {
            forecasts = integrate(level, &forecasts, *lag);
        }
        forecasts
    }
}

/// Fits the monthly seasonal model and predicts February through December of
/// `target_year`: twelve steps are forecast and the first is discarded.
pub fn forecast_year(window: &TrainingWindow, target_year: TargetYear) -> Result<ForecastSeries> {
    let model = SeasonalArima::fit(SarimaOrder::MONTHLY, &window.values())?;
    let forecasts = model.forecast(12);

    let points = target_year
        .forecast_months()
        .into_iter()
        .zip(forecasts)
        .skip(1)
        .map(|(month, predicted_sales)| ForecastPoint {
            month,
            predicted_sales,
        })
        .collect();

    Ok(ForecastSeries {
        model: ModelKind::SeasonalArima,
        points,
    })
}

struct CssProblem {
    order: SarimaOrder,
    series: Vec<f64>,
    /// Unconstrained parameters; coefficients are `tanh` of these.
    params: DVector<f64>,
}

impl CssProblem {
    fn coefficients(&self) -> Vec<f64> {
        self.params.iter().map(|value| value.tanh()).collect()
    }

    fn residuals_at(&self, params: &DVector<f64>) -> DVector<f64> {
        let coefficients: Vec<f64> = params.iter().map(|value| value.tanh()).collect();
        let (ar, ma, seasonal_ar, seasonal_ma) = split_coefficients(self.order, &coefficients);
        let ar_poly = ar_polynomial(&ar, &seasonal_ar, self.order.period);
        let ma_poly = ma_polynomial(&ma, &seasonal_ma, self.order.period);
        DVector::from_vec(residuals(&self.series, &ar_poly, &ma_poly))
    }
}

impl LeastSquaresProblem<f64, Dyn, Dyn> for CssProblem {
    type ParameterStorage = Owned<f64, Dyn>;
    type ResidualStorage = Owned<f64, Dyn>;
    type JacobianStorage = Owned<f64, Dyn, Dyn>;

    fn set_params(&mut self, p: &DVector<f64>) {
        self.params.copy_from(p);
    }

    fn params(&self) -> DVector<f64> {
        self.params.clone()
    }

    fn residuals(&self) -> Option<DVector<f64>> {
        let residuals = self.residuals_at(&self.params);
        residuals
            .iter()
            .all(|value| value.is_finite())
            .then_some(residuals)
    }

    fn jacobian(&self) -> Option<DMatrix<f64>> {
        // Forward differences; the recursion has no convenient closed form.
        let base = self.residuals()?;
        let mut jacobian = DMatrix::<f64>::zeros(base.len(), self.params.len());
        for column in 0..self.params.len() {
            let step = 1e-6 * self.params[column].abs().max(1.0);
            let mut shifted = self.params.clone();
            shifted[column] += step;
            let perturbed = self.residuals_at(&shifted);
            for row in 0..base.len() {
                jacobian[(row, column)] = (perturbed[row] - base[row]) / step;
            }
        }
        jacobian.iter().all(|value| value.is_finite()).then_some(jacobian)
    }
}

fn stationary_series(order: SarimaOrder, data: &[f64]) -> Vec<f64> {
    let mut series = data.to_vec();
    for _ in 0..order.d {
        series = difference(&series, 1);
    }
    for _ in 0..order.seasonal_d {
        series = difference(&series, order.period);
    }
    series
}

/// Starts the regular AR term at the lag-1 autocorrelation of the
/// differenced series and every other coefficient at zero.
fn initial_params(order: SarimaOrder, series: &[f64]) -> DVector<f64> {
    let mut params = DVector::<f64>::zeros(order.parameter_count());
    if order.p > 0 {
        params[0] = lag_one_autocorrelation(series).clamp(-0.9, 0.9).atanh();
    }
    params
}

fn lag_one_autocorrelation(series: &[f64]) -> f64 {
    let n = series.len();
    if n < 2 {
        return 0.0;
    }
    let mean = series.iter().sum::<f64>() / n as f64;
    let variance: f64 = series.iter().map(|x| (x - mean).powi(2)).sum();
    if variance.abs() < 1e-10 {
        return 0.0;
    }
    let covariance: f64 = series
        .windows(2)
        .map(|pair| (pair[1] - mean) * (pair[0] - mean))
        .sum();
    covariance / variance
}

fn split_coefficients(
    order: SarimaOrder,
    coefficients: &[f64],
) -> (Vec<f64>, Vec<f64>, Vec<f64>, Vec<f64>) {
    let (ar, rest) = coefficients.split_at(order.p);
    let (ma, rest) = rest.split_at(order.q);
    let (seasonal_ar, seasonal_ma) = rest.split_at(order.seasonal_p);
    (
        ar.to_vec(),
        ma.to_vec(),
        seasonal_ar.to_vec(),
        seasonal_ma[..order.seasonal_q].to_vec(),
    )
}

/// `[1, sign*c1, sign*c2, ...]` with coefficients placed every `spacing` lags.
fn lag_polynomial(coefficients: &[f64], spacing: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; coefficients.len() * spacing + 1];
    poly[0] = 1.0;
    for (index, coefficient) in coefficients.iter().enumerate() {
        poly[(index + 1) * spacing] = sign * coefficient;
    }
    poly
}

fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut product = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            product[i + j] += x * y;
        }
    }
    product
}

/// Expanded `(1 - φ(B))(1 - Φ(B^s))`.
fn ar_polynomial(ar: &[f64], seasonal_ar: &[f64], period: usize) -> Vec<f64> {
    multiply(
        &lag_polynomial(ar, 1, -1.0),
        &lag_polynomial(seasonal_ar, period, -1.0),
    )
}

/// Expanded `(1 + θ(B))(1 + Θ(B^s))`.
fn ma_polynomial(ma: &[f64], seasonal_ma: &[f64], period: usize) -> Vec<f64> {
    multiply(
        &lag_polynomial(ma, 1, 1.0),
        &lag_polynomial(seasonal_ma, period, 1.0),
    )
}

/// Conditional one-step errors `e_t = a(B) w_t - Σ m_j e_{t-j}`.
fn residuals(series: &[f64], ar_poly: &[f64], ma_poly: &[f64]) -> Vec<f64> {
    let mut errors = vec![0.0; series.len()];
    for t in 0..series.len() {
        let mut value = series[t];
        for (lag, coefficient) in ar_poly.iter().enumerate().skip(1) {
            if lag <= t {
                value += coefficient * series[t - lag];
            }
        }
        for (lag, coefficient) in ma_poly.iter().enumerate().skip(1) {
            if lag <= t {
                value -= coefficient * errors[t - lag];
            }
        }
        errors[t] = value;
    }
    errors
}

fn difference(data: &[f64], lag: usize) -> Vec<f64> {
    data.iter()
        .skip(lag)
        .zip(data.iter())
        .map(|(current, previous)| current - previous)
        .collect()
}

/// Reverses one lag-`lag` difference given the undifferenced history.
fn integrate(history: &[f64], forecasts: &[f64], lag: usize) -> Vec<f64> {
    let mut extended = history.to_vec();
    for forecast in forecasts {
        let base = if extended.len() >= lag {
            extended[extended.len() - lag]
        } else {
            0.0
        };
        extended.push(forecast + base);
    }
    extended.split_off(history.len())
}
