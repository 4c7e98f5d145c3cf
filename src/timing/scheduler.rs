// File: scheduler.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::config::DetectorConfig;

/// Largest delay ever requested, as a multiple of the base sleep.
pub const MAX_DELAY_MULTIPLIER: f64 = 4.0;

/// Probes a confirmation needs before the budget runs out.
pub const MIN_CONFIRMING_SAMPLES: usize = 3;

/// Probes that must be issued before any early exit.
pub const MIN_PROBES_BEFORE_EXIT: usize = 2;

/// Delay requested for each probe index.
///
/// Delays grow linearly from the base sleep. The step shrinks for large
/// budgets so the last probe never asks for more than
/// `MAX_DELAY_MULTIPLIER * base`, which keeps the cumulative injected delay
/// at most 2.5 times `base * request_limit`.
///
/// Whole-second primitives start from the base rounded up to a full second
/// and round later delays down. Repeated values are dropped, so such a
/// schedule can be shorter than the request limit but never leaves the
/// bounds above.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeSchedule {
    delays: Vec<f64>,
}

impl ProbeSchedule {
    pub fn new(config: &DetectorConfig) -> Self {
        let limit = config.request_limit();
        let whole_seconds = config.whole_seconds();
        let base = if whole_seconds {
            config.base_sleep_seconds().ceil()
        } else {
            config.base_sleep_seconds()
        };
        let step = if limit > 1 {
            ((MAX_DELAY_MULTIPLIER - 1.0) / (limit - 1) as f64).min(1.0)
        } else {
            1.0
        };

        let mut delays: Vec<f64> = Vec::with_capacity(limit);
        for i in 0..limit {
            let delay = base * (1.0 + i as f64 * step);
            if !whole_seconds {
                delays.push(delay);
                continue;
            }
            // absorb float error so 3.9999999 stays 4
            let delay = (delay + 1e-9).floor();
            if delays.last().map_or(true, |&previous| delay > previous) {
                delays.push(delay);
            }
        }

        Self { delays }
    }

    pub fn delays(&self) -> &[f64] {
        &self.delays
    }

    pub fn len(&self) -> usize {
        self.delays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delays.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.delays.iter().sum()
    }

    /// Samples needed before a positive decision may stop the loop early.
    pub fn confirming_samples(&self) -> usize {
        MIN_CONFIRMING_SAMPLES.min(self.delays.len()).max(2)
    }
}
