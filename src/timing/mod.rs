// File: mod.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

//! Timing correlation detection for blind injection.
//!
//! A rule hands the detector a [`RequestSender`] that embeds a sleep of the
//! requested length into its payload and reports how long the round trip
//! took. The detector asks for growing delays and decides from a linear
//! regression over `(requested, observed)` pairs whether the target really
//! slept.

pub mod detector;
pub mod evaluator;
pub mod regression;
pub mod sample;
pub mod scheduler;

use crate::errors::ProbeError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use detector::{
    check_timing_dependence, AbortReason, DetectionOutcome, DetectionState, TimingDetector,
};
pub use evaluator::{CorrelationEvaluator, CorrelationResult, CorrelationVerdict};
pub use sample::{ProbeSample, SampleSet};
pub use scheduler::ProbeSchedule;

/// Performs one probe: sleep for `requested_delay` seconds on the target and
/// return the observed wall-clock seconds.
pub trait RequestSender {
    fn send(&mut self, requested_delay: f64) -> Result<f64, ProbeError>;
}

impl<F> RequestSender for F
where
    F: FnMut(f64) -> Result<f64, ProbeError>,
{
    fn send(&mut self, requested_delay: f64) -> Result<f64, ProbeError> {
        self(requested_delay)
    }
}

/// Cooperative cancellation shared between the host and running detectors.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}
