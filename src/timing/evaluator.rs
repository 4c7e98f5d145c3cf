// File: evaluator.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use serde::Serialize;

use super::sample::SampleSet;
use crate::config::DetectorConfig;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CorrelationResult {
    pub correlation: f64,
    pub slope: f64,
    pub intercept: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CorrelationVerdict {
    /// Fewer than two samples.
    Insufficient,
    /// Requested delays or observed times have no variance.
    Degenerate,
    Correlated(CorrelationResult),
    Uncorrelated(CorrelationResult),
}

impl CorrelationVerdict {
    pub fn is_injectable(&self) -> bool {
        matches!(self, CorrelationVerdict::Correlated(_))
    }

    pub fn result(&self) -> Option<CorrelationResult> {
        match self {
            CorrelationVerdict::Correlated(r) | CorrelationVerdict::Uncorrelated(r) => Some(*r),
            _ => None,
        }
    }
}

/// Decides whether observed elapsed times track the requested delays 1:1.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationEvaluator {
    min_correlation: f64,
    slope_error_range: f64,
}

impl CorrelationEvaluator {
    pub fn new(correlation_error_range: f64, slope_error_range: f64) -> Self {
        Self {
            min_correlation: 1.0 - correlation_error_range,
            slope_error_range,
        }
    }

    pub fn from_config(config: &DetectorConfig) -> Self {
        Self::new(config.correlation_error_range(), config.slope_error_range())
    }

    pub fn evaluate(&self, samples: &SampleSet) -> CorrelationVerdict {
        let regression = samples.regression();
        if regression.count() < 2 {
            return CorrelationVerdict::Insufficient;
        }

        let (slope, correlation, intercept) = match (
            regression.slope(),
            regression.correlation(),
            regression.intercept(),
        ) {
            (Some(m), Some(r), Some(b)) => (m, r, b),
            _ => return CorrelationVerdict::Degenerate,
        };

        let result = CorrelationResult {
            correlation,
            slope,
            intercept,
        };

        if correlation >= self.min_correlation && (slope - 1.0).abs() <= self.slope_error_range {
            CorrelationVerdict::Correlated(result)
        } else {
            CorrelationVerdict::Uncorrelated(result)
        }
    }

    pub fn is_injectable(&self, samples: &SampleSet) -> bool {
        self.evaluate(samples).is_injectable()
    }

    /// Observed times grow slower than the requested delays allow for a
    /// target that really sleeps. Only the slope counts here: a sleep
    /// primitive that always waits a fixed amount less than asked (`ping -n`)
    /// shifts the intercept and still tracks every extra second.
    pub fn is_hopeless(&self, samples: &SampleSet) -> bool {
        samples
            .regression()
            .slope()
            .is_some_and(|m| m < 1.0 - self.slope_error_range)
    }
}
