//! Additive trend + Fourier seasonality model.
//!
//! The bundled [`ForecastModel`]. The series is decomposed as
//!
//! ```text
//! y(t) = intercept + slope * t / span + sum_s sum_k (a_sk * sin(2πkt/P_s) + b_sk * cos(2πkt/P_s))
//! ```
//!
//! with `t` in days since the first observation. Coefficients are fitted by
//! least squares on max-abs scaled values with a ridge penalty on the seasonal
//! terms, which keeps the system solvable even when a component cannot be
//! identified from the data (e.g. daily seasonality on once-a-day sales).
//!
//! The uncertainty band is residual-based: `yhat ± z * sigma * sqrt(1 + k / n)`
//! where `k` is the number of days past the end of history.

use chrono::{DateTime, Duration, Utc};
use statrs::distribution::{ContinuousCDF, Normal};

use stockcast_sales::TimeSeries;

use crate::error::ModelFitError;
use crate::linalg;
use crate::provider::ForecastModel;
use crate::result::{ForecastPoint, ForecastResult};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// One periodic component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seasonality {
    pub name: &'static str,
    pub period_days: f64,
    pub fourier_order: usize,
}

impl Seasonality {
    pub const DAILY: Seasonality = Seasonality {
        name: "daily",
        period_days: 1.0,
        fourier_order: 4,
    };

    pub const WEEKLY: Seasonality = Seasonality {
        name: "weekly",
        period_days: 7.0,
        fourier_order: 3,
    };

    pub const YEARLY: Seasonality = Seasonality {
        name: "yearly",
        period_days: 365.25,
        fourier_order: 10,
    };
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalTrendModel {
    seasonalities: Vec<Seasonality>,
    ridge: f64,
    interval_z: f64,
}

impl Default for SeasonalTrendModel {
    /// Daily, weekly and yearly components with an 80% interval.
    fn default() -> Self {
        Self {
            seasonalities: vec![Seasonality::DAILY, Seasonality::WEEKLY, Seasonality::YEARLY],
            ridge: 1.0,
            interval_z: 1.2816,
        }
    }
}

impl SeasonalTrendModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trend only; seasonal components can be added with [`Self::with_seasonality`].
    pub fn trend_only() -> Self {
        Self {
            seasonalities: Vec::new(),
            ..Self::default()
        }
    }

    pub fn with_seasonality(mut self, seasonality: Seasonality) -> Self {
        self.seasonalities.push(seasonality);
        self
    }

    /// Ridge penalty on seasonal coefficients (values are scaled to `[-1, 1]`).
    pub fn with_ridge(mut self, ridge: f64) -> Self {
        self.ridge = ridge.max(0.0);
        self
    }

    /// Central coverage of the uncertainty interval, strictly between 0 and 1
    /// (e.g. 0.8, 0.95).
    pub fn with_interval_width(mut self, width: f64) -> Result<Self, ModelFitError> {
        if !(width > 0.0 && width < 1.0) {
            return Err(ModelFitError::InvalidParameter(format!(
                "interval width must be in (0, 1), got {width}"
            )));
        }
        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| ModelFitError::InvalidParameter(e.to_string()))?;
        self.interval_z = normal.inverse_cdf(0.5 + width / 2.0);
        Ok(self)
    }

    /// Half-width of the interval in residual standard deviations.
    pub fn interval_z(&self) -> f64 {
        self.interval_z
    }

    pub fn seasonalities(&self) -> &[Seasonality] {
        &self.seasonalities
    }

    fn n_features(&self) -> usize {
        2 + self
            .seasonalities
            .iter()
            .map(|s| 2 * s.fourier_order)
            .sum::<usize>()
    }

    fn features(&self, t_days: f64, span_days: f64, row: &mut Vec<f64>) {
        row.clear();
        row.push(1.0);
        row.push(t_days / span_days);
        for s in &self.seasonalities {
            for k in 1..=s.fourier_order {
                let angle = 2.0 * std::f64::consts::PI * k as f64 * t_days / s.period_days;
                row.push(angle.sin());
                row.push(angle.cos());
            }
        }
    }
}

fn days_between(origin: DateTime<Utc>, at: DateTime<Utc>) -> f64 {
    (at - origin).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY
}

impl ForecastModel for SeasonalTrendModel {
    fn name(&self) -> &'static str {
        "seasonal_trend"
    }

    fn fit_predict(
        &self,
        series: &TimeSeries,
        horizon: usize,
    ) -> Result<ForecastResult, ModelFitError> {
        let n = series.len();
        let (origin, last) = match (series.first_timestamp(), series.last_timestamp()) {
            (Some(first), Some(last)) if n >= 2 => (first, last),
            _ => {
                return Err(ModelFitError::InsufficientData {
                    required: 2,
                    actual: n,
                });
            }
        };

        let y = series.values_f64();
        if y.iter().any(|v| !v.is_finite()) {
            return Err(ModelFitError::NonFinite);
        }

        let scale = y.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        if scale == 0.0 {
            return Err(ModelFitError::Degenerate("all values are zero".to_string()));
        }
        let (min, max) = y
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
        if max - min == 0.0 {
            return Err(ModelFitError::Degenerate("constant series".to_string()));
        }

        let span = days_between(origin, last);
        if span <= 0.0 {
            return Err(ModelFitError::Degenerate("zero time span".to_string()));
        }

        // Normal equations: (X'X + ridge * D) beta = X'y, D = 0 on intercept and trend.
        let p = self.n_features();
        let mut xtx = vec![0.0; p * p];
        let mut xty = vec![0.0; p];
        let mut row = Vec::with_capacity(p);
        let mut design = Vec::with_capacity(n);

        for (point, value) in series.points().iter().zip(&y) {
            let t = days_between(origin, point.timestamp);
            self.features(t, span, &mut row);
            let ys = value / scale;
            for i in 0..p {
                xty[i] += row[i] * ys;
                for j in 0..p {
                    xtx[i * p + j] += row[i] * row[j];
                }
            }
            design.push(row.clone());
        }
        for i in 2..p {
            xtx[i * p + i] += self.ridge;
        }

        let beta = linalg::solve(xtx, xty, p)?;
        let predict = |features: &[f64]| -> f64 {
            features.iter().zip(&beta).map(|(x, b)| x * b).sum::<f64>() * scale
        };

        let sse: f64 = design
            .iter()
            .zip(&y)
            .map(|(features, actual)| {
                let r = actual - predict(features.as_slice());
                r * r
            })
            .sum();
        let sigma = (sse / n as f64).sqrt();
        if !sigma.is_finite() {
            return Err(ModelFitError::NonFinite);
        }

        let mut points = Vec::with_capacity(horizon);
        for k in 1..=horizon {
            let date = last + Duration::days(k as i64);
            self.features(days_between(origin, date), span, &mut row);
            let yhat = predict(row.as_slice());
            let half_width = self.interval_z * sigma * (1.0 + k as f64 / n as f64).sqrt();
            points.push(ForecastPoint {
                date,
                yhat,
                yhat_lower: yhat - half_width,
                yhat_upper: yhat + half_width,
            });
        }

        if points
            .iter()
            .any(|p| !(p.yhat.is_finite() && p.yhat_lower.is_finite() && p.yhat_upper.is_finite()))
        {
            return Err(ModelFitError::NonFinite);
        }

        Ok(ForecastResult::new(points))
    }
}
