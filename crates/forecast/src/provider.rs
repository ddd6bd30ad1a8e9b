//! Forecast capability and its degraded-confidence fallback.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use stockcast_sales::TimeSeries;

use crate::error::ModelFitError;
use crate::result::{ForecastPoint, ForecastResult};

/// Minimum number of observations before a statistical model is attempted.
pub const MIN_MODEL_HISTORY: usize = 3;

/// Produce a forecast of exactly `horizon` rows for a series.
///
/// Implementations never fail: short or ill-conditioned histories must still
/// yield a (degraded) forecast so that one unit cannot break a whole report.
pub trait ForecastProvider: Send + Sync {
    fn forecast(&self, series: &TimeSeries, horizon: usize) -> ForecastResult;
}

impl<T> ForecastProvider for Arc<T>
where
    T: ForecastProvider + ?Sized,
{
    fn forecast(&self, series: &TimeSeries, horizon: usize) -> ForecastResult {
        (**self).forecast(series, horizon)
    }
}

/// Pluggable statistical engine.
///
/// Fits the whole series and returns the `horizon` rows following the last
/// observation. Allowed to reject input it cannot model.
pub trait ForecastModel: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    fn fit_predict(
        &self,
        series: &TimeSeries,
        horizon: usize,
    ) -> Result<ForecastResult, ModelFitError>;
}

/// Mean-based forecast used when a model cannot (or should not) run.
///
/// `horizon` daily rows starting at `now`, each with the series mean as point
/// estimate (0 for an empty series) and both bounds fixed at 0.
pub fn degraded_forecast(series: &TimeSeries, horizon: usize, now: DateTime<Utc>) -> ForecastResult {
    let mean = series.mean();
    let points = (0..horizon)
        .map(|i| ForecastPoint {
            date: now + Duration::days(i as i64),
            yhat: mean,
            yhat_lower: 0.0,
            yhat_upper: 0.0,
        })
        .collect();
    ForecastResult::new(points)
}

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// [`ForecastProvider`] that guards a [`ForecastModel`].
///
/// - fewer than [`MIN_MODEL_HISTORY`] points: degraded forecast, model not called
/// - model error, wrong row count, unordered dates or non-finite values: logged,
///   degraded forecast for this unit only
pub struct GuardedForecaster<M> {
    model: M,
    clock: Clock,
}

impl<M: ForecastModel> GuardedForecaster<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            clock: Arc::new(Utc::now),
        }
    }

    /// Override the clock that anchors degraded forecasts (tests).
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    fn degraded(&self, series: &TimeSeries, horizon: usize) -> ForecastResult {
        degraded_forecast(series, horizon, (self.clock)())
    }
}

impl<M: ForecastModel> ForecastProvider for GuardedForecaster<M> {
    fn forecast(&self, series: &TimeSeries, horizon: usize) -> ForecastResult {
        if horizon == 0 {
            return ForecastResult::empty();
        }

        if series.len() < MIN_MODEL_HISTORY {
            debug!(points = series.len(), "history too short for model; using degraded forecast");
            return self.degraded(series, horizon);
        }

        match self.model.fit_predict(series, horizon) {
            Ok(result) if result.len() == horizon && result.is_well_formed() => result,
            Ok(result) => {
                warn!(
                    model = self.model.name(),
                    expected = horizon,
                    actual = result.len(),
                    well_formed = result.is_well_formed(),
                    "model returned malformed forecast; using degraded forecast"
                );
                self.degraded(series, horizon)
            }
            Err(e) => {
                warn!(
                    model = self.model.name(),
                    points = series.len(),
                    error = %e,
                    "model fit failed; using degraded forecast"
                );
                self.degraded(series, horizon)
            }
        }
    }
}
