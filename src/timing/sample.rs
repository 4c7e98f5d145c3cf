// File: sample.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use serde::{Deserialize, Serialize};

use super::regression::OnlineRegression;

/// One successful probe: the delay we asked for and the time the round trip took.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbeSample {
    pub requested_delay: f64,
    pub observed_elapsed: f64,
}

impl ProbeSample {
    pub fn new(requested_delay: f64, observed_elapsed: f64) -> Self {
        Self {
            requested_delay,
            observed_elapsed,
        }
    }
}

/// Samples of one detection attempt in send order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SampleSet {
    samples: Vec<ProbeSample>,
    #[serde(skip)]
    regression: OnlineRegression,
}

impl SampleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: ProbeSample) {
        self.regression
            .add_point(sample.requested_delay, sample.observed_elapsed);
        self.samples.push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[ProbeSample] {
        &self.samples
    }

    pub fn regression(&self) -> &OnlineRegression {
        &self.regression
    }

    /// The sample with the largest requested delay, used as finding evidence.
    pub fn max_delay_sample(&self) -> Option<&ProbeSample> {
        self.samples
            .iter()
            .max_by(|a, b| a.requested_delay.total_cmp(&b.requested_delay))
    }
}

impl FromIterator<ProbeSample> for SampleSet {
    fn from_iter<I: IntoIterator<Item = ProbeSample>>(iter: I) -> Self {
        let mut set = Self::new();
        for sample in iter {
            set.push(sample);
        }
        set
    }
}
