//! Forecast output shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One forecast row: point estimate plus a two-sided uncertainty band.
///
/// Field names follow the report format consumers already read (`ds`, `yhat`,
/// `yhat_lower`, `yhat_upper`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    #[serde(rename = "ds")]
    pub date: DateTime<Utc>,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

/// Forecast for exactly `horizon` future dates, chronologically ordered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForecastResult {
    points: Vec<ForecastPoint>,
}

impl ForecastResult {
    /// Wrap points as produced; see [`Self::is_well_formed`].
    pub fn new(points: Vec<ForecastPoint>) -> Self {
        Self { points }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Zero-width bounds on every row: the mean-fallback forecast.
    ///
    /// This cannot tell "no data" from "flat forecast"; callers that care should
    /// look at the series length instead.
    pub fn is_degraded(&self) -> bool {
        !self.points.is_empty()
            && self
                .points
                .iter()
                .all(|p| p.yhat_lower == 0.0 && p.yhat_upper == 0.0)
    }

    /// Dates strictly ascending and every value finite.
    pub fn is_well_formed(&self) -> bool {
        self.points.windows(2).all(|w| w[0].date < w[1].date)
            && self
                .points
                .iter()
                .all(|p| p.yhat.is_finite() && p.yhat_lower.is_finite() && p.yhat_upper.is_finite())
    }

    /// Sum of point estimates over the horizon.
    pub fn expected_total(&self) -> f64 {
        self.points.iter().map(|p| p.yhat).sum()
    }

    /// Sample standard deviation (n-1) of the upper bounds; 0 for fewer than two rows.
    pub fn upper_bound_stddev(&self) -> f64 {
        let n = self.points.len();
        if n < 2 {
            return 0.0;
        }
        let mean = self.points.iter().map(|p| p.yhat_upper).sum::<f64>() / n as f64;
        let var = self
            .points
            .iter()
            .map(|p| {
                let d = p.yhat_upper - mean;
                d * d
            })
            .sum::<f64>()
            / (n - 1) as f64;
        var.sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn point(day: i64, yhat: f64, lower: f64, upper: f64) -> ForecastPoint {
        ForecastPoint {
            date: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap() + Duration::days(day),
            yhat,
            yhat_lower: lower,
            yhat_upper: upper,
        }
    }

    #[test]
    fn upper_bound_stddev_is_sample_stddev() {
        let result = ForecastResult::new(vec![
            point(0, 1.0, 0.0, 2.0),
            point(1, 1.0, 0.0, 4.0),
            point(2, 1.0, 0.0, 6.0),
        ]);
        // mean 4, squared deviations 4 + 0 + 4, divided by n-1 = 2.
        assert!((result.upper_bound_stddev() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn single_row_has_zero_spread() {
        let result = ForecastResult::new(vec![point(0, 3.0, 1.0, 5.0)]);
        assert_eq!(result.upper_bound_stddev(), 0.0);
        assert_eq!(result.expected_total(), 3.0);
    }

    #[test]
    fn degraded_means_zero_width_bounds_everywhere() {
        let flat = ForecastResult::new(vec![point(0, 2.0, 0.0, 0.0), point(1, 2.0, 0.0, 0.0)]);
        assert!(flat.is_degraded());

        let banded = ForecastResult::new(vec![point(0, 2.0, 1.0, 3.0)]);
        assert!(!banded.is_degraded());
        assert!(!ForecastResult::empty().is_degraded());
    }

    #[test]
    fn serializes_with_report_field_names() {
        let result = ForecastResult::new(vec![point(0, 2.5, 1.0, 4.0)]);
        let json = serde_json::to_value(&result).unwrap();
        let row = &json.as_array().unwrap()[0];
        assert!(row.get("ds").is_some());
        assert_eq!(row["yhat"], 2.5);
        assert_eq!(row["yhat_lower"], 1.0);
        assert_eq!(row["yhat_upper"], 4.0);
    }
}
