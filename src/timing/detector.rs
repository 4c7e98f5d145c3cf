// File: detector.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use log::{debug, info, warn};
use serde::Serialize;

use super::evaluator::{CorrelationEvaluator, CorrelationResult, CorrelationVerdict};
use super::sample::{ProbeSample, SampleSet};
use super::scheduler::{ProbeSchedule, MIN_PROBES_BEFORE_EXIT};
use super::{RequestSender, StopSignal};
use crate::config::DetectorConfig;
use crate::errors::ProbeError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AbortReason {
    Stopped,
    Unreachable(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DetectionState {
    /// Delays tracked the requested sleep.
    Confirmed,
    /// Budget spent without enough evidence.
    Exhausted,
    /// Observed times stopped short of following the requested delays.
    Rejected,
    Aborted(AbortReason),
}

#[derive(Debug, Clone, Serialize)]
pub struct DetectionOutcome {
    pub state: DetectionState,
    pub samples: SampleSet,
    pub probes_sent: usize,
    pub probes_failed: usize,
    pub correlation: Option<CorrelationResult>,
}

impl DetectionOutcome {
    pub fn injectable(&self) -> bool {
        self.state == DetectionState::Confirmed
    }

    pub fn max_delay_sample(&self) -> Option<&ProbeSample> {
        self.samples.max_delay_sample()
    }
}

/// Drives one detection attempt: schedule, send, record, evaluate.
#[derive(Debug, Clone)]
pub struct TimingDetector {
    config: DetectorConfig,
    schedule: ProbeSchedule,
    evaluator: CorrelationEvaluator,
}

impl TimingDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            schedule: ProbeSchedule::new(&config),
            evaluator: CorrelationEvaluator::from_config(&config),
            config,
        }
    }

    pub fn schedule(&self) -> &ProbeSchedule {
        &self.schedule
    }

    pub fn run<S>(&self, sender: &mut S, stop: &StopSignal) -> DetectionOutcome
    where
        S: RequestSender + ?Sized,
    {
        let mut samples = SampleSet::new();
        let mut sent = 0;
        let mut failed = 0;

        for &delay in self.schedule.delays() {
            if stop.is_stopped() {
                debug!("Stop requested after {} probes", sent);
                return self.finish(
                    DetectionState::Aborted(AbortReason::Stopped),
                    samples,
                    sent,
                    failed,
                );
            }

            sent += 1;
            match sender.send(delay) {
                Ok(elapsed) if elapsed.is_finite() && elapsed >= 0.0 => {
                    debug!("Probe {}: requested {:.3}s, observed {:.3}s", sent, delay, elapsed);
                    samples.push(ProbeSample::new(delay, elapsed));
                }
                Ok(elapsed) => {
                    debug!("Probe {} returned unusable elapsed time {}", sent, elapsed);
                    failed += 1;
                    continue;
                }
                Err(ProbeError::Timeout { elapsed }) if self.config.treat_timeout_as_elapsed() => {
                    debug!(
                        "Probe {} timed out after {:?}, recording it as observed time",
                        sent, elapsed
                    );
                    samples.push(ProbeSample::new(delay, elapsed.as_secs_f64()));
                }
                Err(e) if e.is_fatal() => {
                    warn!("Aborting timing check after {} probes: {}", sent, e);
                    failed += 1;
                    return self.finish(
                        DetectionState::Aborted(AbortReason::Unreachable(e.to_string())),
                        samples,
                        sent,
                        failed,
                    );
                }
                Err(e) => {
                    debug!("Probe {} skipped: {}", sent, e);
                    failed += 1;
                    continue;
                }
            }

            if self.config.early_exit() && sent >= MIN_PROBES_BEFORE_EXIT {
                if self.evaluator.is_hopeless(&samples) {
                    debug!("Observed times do not grow with the requested delay, giving up");
                    return self.finish(DetectionState::Rejected, samples, sent, failed);
                }
                if samples.len() >= self.schedule.confirming_samples()
                    && self.evaluator.is_injectable(&samples)
                {
                    return self.finish(DetectionState::Confirmed, samples, sent, failed);
                }
            }
        }

        let state = if self.evaluator.is_injectable(&samples) {
            DetectionState::Confirmed
        } else {
            DetectionState::Exhausted
        };
        self.finish(state, samples, sent, failed)
    }

    fn finish(
        &self,
        state: DetectionState,
        samples: SampleSet,
        sent: usize,
        failed: usize,
    ) -> DetectionOutcome {
        let verdict = self.evaluator.evaluate(&samples);
        let correlation = verdict.result();

        match &state {
            DetectionState::Confirmed => {
                if let Some(r) = correlation {
                    info!(
                        "Timing dependence confirmed after {} probes (r={:.3}, slope={:.3})",
                        sent, r.correlation, r.slope
                    );
                }
            }
            _ => {
                if verdict == CorrelationVerdict::Degenerate {
                    debug!("Sample set has no variance, correlation undefined");
                }
                debug!("Timing check ended {:?} after {} probes", state, sent);
            }
        }

        DetectionOutcome {
            state,
            samples,
            probes_sent: sent,
            probes_failed: failed,
            correlation,
        }
    }
}

/// Runs a single detection attempt with a fresh detector.
pub fn check_timing_dependence<S>(
    config: DetectorConfig,
    sender: &mut S,
    stop: &StopSignal,
) -> DetectionOutcome
where
    S: RequestSender + ?Sized,
{
    TimingDetector::new(config).run(sender, stop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use std::time::Duration;

    fn config(limit: usize) -> DetectorConfig {
        DetectorConfig::new(limit, 5.0).unwrap()
    }

    #[test]
    fn test_confirms_linear_target_early() {
        let mut requested = Vec::new();
        let mut sender = |delay: f64| -> Result<f64, ProbeError> {
            requested.push(delay);
            Ok(delay + 0.08)
        };

        let outcome = check_timing_dependence(config(4), &mut sender, &StopSignal::new());

        assert!(outcome.injectable());
        assert_eq!(requested, vec![5.0, 10.0, 15.0]);
        assert_eq!(outcome.probes_sent, 3);
        assert_eq!(outcome.max_delay_sample().unwrap().requested_delay, 15.0);
    }

    #[test]
    fn test_rejects_fast_target_after_two_requests() {
        let mut calls = 0;
        let mut sender = |_delay: f64| -> Result<f64, ProbeError> {
            calls += 1;
            Ok(0.2)
        };

        let outcome = check_timing_dependence(config(4), &mut sender, &StopSignal::new());

        assert_eq!(outcome.state, DetectionState::Rejected);
        assert!(!outcome.injectable());
        assert_eq!(calls, 2);
    }

    #[rstest]
    #[case(2.0)]
    #[case(3.0)]
    fn test_fixed_shortfall_is_confirmed_with_early_exit(#[case] base: f64) {
        // `ping -n N` style: always one second less than asked
        let mut requested = Vec::new();
        let mut sender = |delay: f64| -> Result<f64, ProbeError> {
            requested.push(delay);
            Ok(delay - 1.0 + 0.05)
        };
        let config = DetectorConfig::new(4, base).unwrap().with_whole_seconds(true);

        let outcome = check_timing_dependence(config, &mut sender, &StopSignal::new());

        assert_eq!(outcome.state, DetectionState::Confirmed);
        assert_eq!(requested, vec![base, 2.0 * base, 3.0 * base]);
        let r = outcome.correlation.unwrap();
        assert!((r.slope - 1.0).abs() < 1e-9);
        assert!((r.intercept + 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_half_speed_target() {
        let mut sender = |delay: f64| -> Result<f64, ProbeError> { Ok(0.5 * delay + 0.1) };

        let outcome = check_timing_dependence(config(4), &mut sender, &StopSignal::new());

        assert_eq!(outcome.state, DetectionState::Rejected);
        assert_eq!(outcome.probes_sent, 2);
    }

    #[test]
    fn test_without_early_exit_spends_full_budget() {
        let mut calls = 0;
        let mut sender = |delay: f64| -> Result<f64, ProbeError> {
            calls += 1;
            Ok(delay)
        };
        let detector = TimingDetector::new(config(4).with_early_exit(false));

        let outcome = detector.run(&mut sender, &StopSignal::new());

        assert!(outcome.injectable());
        assert_eq!(calls, 4);
    }

    #[test]
    fn test_single_request_budget_never_decides() {
        let mut sender = |delay: f64| -> Result<f64, ProbeError> { Ok(delay) };
        let outcome = check_timing_dependence(config(1), &mut sender, &StopSignal::new());
        assert_eq!(outcome.state, DetectionState::Exhausted);
        assert!(!outcome.injectable());
    }

    #[test]
    fn test_unreachable_aborts() {
        let mut calls = 0;
        let mut sender = |_delay: f64| -> Result<f64, ProbeError> {
            calls += 1;
            Err(ProbeError::Unreachable("dns failure".to_string()))
        };

        let outcome = check_timing_dependence(config(4), &mut sender, &StopSignal::new());

        assert!(matches!(
            outcome.state,
            DetectionState::Aborted(AbortReason::Unreachable(_))
        ));
        assert_eq!(calls, 1);
        assert!(!outcome.injectable());
    }

    #[test]
    fn test_transport_errors_exhaust_budget() {
        let mut calls = 0;
        let mut sender = |_delay: f64| -> Result<f64, ProbeError> {
            calls += 1;
            Err(ProbeError::Transport("connection reset".to_string()))
        };

        let outcome = check_timing_dependence(config(4), &mut sender, &StopSignal::new());

        assert_eq!(outcome.state, DetectionState::Exhausted);
        assert_eq!(calls, 4);
        assert_eq!(outcome.probes_failed, 4);
        assert!(outcome.samples.is_empty());
    }

    #[test]
    fn test_timeout_is_missing_sample_by_default() {
        let mut sender = |delay: f64| -> Result<f64, ProbeError> {
            if delay >= 15.0 {
                Err(ProbeError::Timeout {
                    elapsed: Duration::from_secs(12),
                })
            } else {
                Ok(delay + 0.1)
            }
        };

        let outcome = check_timing_dependence(config(4), &mut sender, &StopSignal::new());

        assert_eq!(outcome.samples.len(), 2);
        assert_eq!(outcome.probes_failed, 2);
    }

    #[test]
    fn test_timeout_recorded_when_requested() {
        let mut sender = |delay: f64| -> Result<f64, ProbeError> {
            if delay >= 20.0 {
                Err(ProbeError::Timeout {
                    elapsed: Duration::from_millis(20_300),
                })
            } else {
                Ok(delay + 0.1)
            }
        };
        let detector = TimingDetector::new(
            config(4).with_early_exit(false).with_timeout_as_elapsed(true),
        );

        let outcome = detector.run(&mut sender, &StopSignal::new());

        assert_eq!(outcome.samples.len(), 4);
        assert_eq!(outcome.max_delay_sample().unwrap().observed_elapsed, 20.3);
        assert!(outcome.injectable());
    }

    #[test]
    fn test_unusable_elapsed_is_skipped() {
        let mut sender = |delay: f64| -> Result<f64, ProbeError> {
            if delay == 5.0 {
                Ok(f64::NAN)
            } else {
                Ok(delay)
            }
        };
        let outcome = check_timing_dependence(config(4), &mut sender, &StopSignal::new());
        assert_eq!(outcome.probes_failed, 1);
        assert!(outcome.injectable());
    }

    #[test]
    fn test_stop_before_first_request() {
        let stop = StopSignal::new();
        stop.stop();
        let mut calls = 0;
        let mut sender = |delay: f64| -> Result<f64, ProbeError> {
            calls += 1;
            Ok(delay)
        };

        let outcome = check_timing_dependence(config(4), &mut sender, &stop);

        assert_eq!(outcome.state, DetectionState::Aborted(AbortReason::Stopped));
        assert_eq!(calls, 0);
    }
}
