// File: regression.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

/// Simple linear regression updated one point at a time.
///
/// Means and co-moments are tracked with Welford updates so long runs of
/// large delays do not lose precision the way raw sums of squares do.
#[derive(Debug, Clone, Default)]
pub struct OnlineRegression {
    count: usize,
    mean_x: f64,
    mean_y: f64,
    m2_x: f64,
    m2_y: f64,
    c_xy: f64,
}

impl OnlineRegression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_point(&mut self, x: f64, y: f64) {
        self.count += 1;
        let n = self.count as f64;

        let dx = x - self.mean_x;
        let dy = y - self.mean_y;
        self.mean_x += dx / n;
        self.mean_y += dy / n;

        self.m2_x += dx * (x - self.mean_x);
        self.m2_y += dy * (y - self.mean_y);
        self.c_xy += dx * (y - self.mean_y);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean_x(&self) -> f64 {
        self.mean_x
    }

    pub fn mean_y(&self) -> f64 {
        self.mean_y
    }

    /// Least-squares slope of y over x. `None` with fewer than two points or
    /// when every x is identical.
    pub fn slope(&self) -> Option<f64> {
        if self.count < 2 || self.m2_x <= f64::EPSILON {
            return None;
        }
        Some(self.c_xy / self.m2_x)
    }

    pub fn intercept(&self) -> Option<f64> {
        self.slope().map(|m| self.mean_y - m * self.mean_x)
    }

    /// Pearson correlation coefficient, clamped to [-1, 1].
    pub fn correlation(&self) -> Option<f64> {
        if self.count < 2 || self.m2_x <= f64::EPSILON || self.m2_y <= f64::EPSILON {
            return None;
        }
        let r = self.c_xy / (self.m2_x * self.m2_y).sqrt();
        if r.is_finite() {
            Some(r.clamp(-1.0, 1.0))
        } else {
            None
        }
    }
}

impl FromIterator<(f64, f64)> for OnlineRegression {
    fn from_iter<I: IntoIterator<Item = (f64, f64)>>(iter: I) -> Self {
        let mut regression = Self::new();
        for (x, y) in iter {
            regression.add_point(x, y);
        }
        regression
    }
}

pub fn calculate_median(samples: &mut [f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.sort_unstable_by(|a, b| a.total_cmp(b));
    let len = samples.len();
    if len % 2 == 0 {
        (samples[len / 2 - 1] + samples[len / 2]) / 2.0
    } else {
        samples[len / 2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_perfect_line() {
        let regression: OnlineRegression =
            [(1.0, 3.0), (2.0, 5.0), (3.0, 7.0), (4.0, 9.0)].into_iter().collect();

        assert_eq!(regression.count(), 4);
        assert!(approx(regression.slope().unwrap(), 2.0));
        assert!(approx(regression.intercept().unwrap(), 1.0));
        assert!(approx(regression.correlation().unwrap(), 1.0));
    }

    #[test]
    fn test_negative_correlation() {
        let regression: OnlineRegression =
            [(1.0, 4.0), (2.0, 3.0), (3.0, 2.0)].into_iter().collect();
        assert!(approx(regression.correlation().unwrap(), -1.0));
        assert!(approx(regression.slope().unwrap(), -1.0));
    }

    #[test]
    fn test_matches_batch_formula() {
        let points = [(5.0, 5.05), (10.0, 10.1), (15.0, 15.0), (20.0, 20.2)];
        let regression: OnlineRegression = points.iter().copied().collect();

        let n = points.len() as f64;
        let sx: f64 = points.iter().map(|p| p.0).sum();
        let sy: f64 = points.iter().map(|p| p.1).sum();
        let sxx: f64 = points.iter().map(|p| p.0 * p.0).sum();
        let syy: f64 = points.iter().map(|p| p.1 * p.1).sum();
        let sxy: f64 = points.iter().map(|p| p.0 * p.1).sum();
        let slope = (n * sxy - sx * sy) / (n * sxx - sx * sx);
        let r = (n * sxy - sx * sy) / ((n * sxx - sx * sx) * (n * syy - sy * sy)).sqrt();

        assert!((regression.slope().unwrap() - slope).abs() < 1e-9);
        assert!((regression.correlation().unwrap() - r).abs() < 1e-9);
    }

    #[test]
    fn test_single_point_is_undefined() {
        let regression: OnlineRegression = [(5.0, 5.1)].into_iter().collect();
        assert!(regression.slope().is_none());
        assert!(regression.correlation().is_none());
        assert!(regression.intercept().is_none());
    }

    #[test]
    fn test_zero_variance_x_is_undefined() {
        let regression: OnlineRegression =
            [(5.0, 1.0), (5.0, 2.0), (5.0, 3.0)].into_iter().collect();
        assert!(regression.slope().is_none());
        assert!(regression.correlation().is_none());
    }

    #[test]
    fn test_zero_variance_y_has_slope_but_no_correlation() {
        let regression: OnlineRegression =
            [(5.0, 0.2), (10.0, 0.2), (15.0, 0.2)].into_iter().collect();
        assert!(approx(regression.slope().unwrap(), 0.0));
        assert!(regression.correlation().is_none());
    }

    #[test]
    fn test_median() {
        assert_eq!(calculate_median(&mut []), 0.0);
        assert_eq!(calculate_median(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_eq!(calculate_median(&mut [4.0, 1.0, 3.0, 2.0]), 2.5);
    }
}
