// File: detector_properties.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rblind::config::DetectorConfig;
use rblind::errors::ProbeError;
use rblind::timing::{
    check_timing_dependence, AbortReason, CorrelationEvaluator, CorrelationVerdict,
    DetectionState, ProbeSample, SampleSet, StopSignal, TimingDetector,
};
use rstest::*;

fn detector(limit: usize, base: f64) -> TimingDetector {
    TimingDetector::new(DetectorConfig::new(limit, base).unwrap())
}

#[test]
fn test_documented_positive_scenario() {
    let observed = [5.05, 10.1, 15.0, 20.2];
    let mut calls = 0;
    let mut sender = |delay: f64| -> Result<f64, ProbeError> {
        let expected = [5.0, 10.0, 15.0, 20.0][calls];
        assert_eq!(delay, expected);
        let value = observed[calls];
        calls += 1;
        Ok(value)
    };

    let outcome = detector(4, 5.0).run(&mut sender, &StopSignal::new());

    assert!(outcome.injectable());
    assert!(outcome.probes_sent <= 4);
    let r = outcome.correlation.unwrap();
    assert!(r.correlation > 0.99);
    assert!((r.slope - 1.0).abs() < 0.05);
}

#[test]
fn test_documented_constant_scenario() {
    let observed = [0.2, 0.21, 0.19, 0.22];
    let mut calls = 0;
    let mut sender = |_: f64| -> Result<f64, ProbeError> {
        let value = observed[calls];
        calls += 1;
        Ok(value)
    };

    let outcome = detector(4, 5.0).run(&mut sender, &StopSignal::new());

    assert!(!outcome.injectable());
    assert_eq!(outcome.state, DetectionState::Rejected);
}

#[test]
fn test_transport_failure_then_positive_pattern() {
    let mut calls = 0;
    let mut sender = |delay: f64| -> Result<f64, ProbeError> {
        calls += 1;
        if calls == 1 {
            return Err(ProbeError::Transport("connection reset".to_string()));
        }
        Ok(match delay as u64 {
            10 => 10.1,
            15 => 15.0,
            _ => 20.2,
        })
    };

    let outcome = detector(4, 5.0).run(&mut sender, &StopSignal::new());

    assert!(outcome.injectable());
    assert_eq!(outcome.samples.len(), 3);
    assert_eq!(outcome.probes_failed, 1);
    assert_eq!(outcome.probes_sent, 4);
}

#[rstest]
#[case(1)]
#[case(7)]
#[case(42)]
#[case(1337)]
fn test_no_false_positive_under_noise(#[case] seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    for early_exit in [true, false] {
        for _ in 0..50 {
            let latency: f64 = rng.gen_range(0.05..2.0);
            let config = DetectorConfig::new(6, 1.0)
                .unwrap()
                .with_early_exit(early_exit);
            let mut sender = |_: f64| -> Result<f64, ProbeError> {
                Ok(latency + rng.gen_range(0.0..0.05))
            };
            let outcome = check_timing_dependence(config, &mut sender, &StopSignal::new());
            assert!(!outcome.injectable(), "latency {} early_exit {}", latency, early_exit);
        }
    }
}

#[rstest]
#[case(3)]
#[case(99)]
fn test_detects_sleep_plus_jitter(#[case] seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..20 {
        let latency: f64 = rng.gen_range(0.02..0.3);
        let mut sender = |delay: f64| -> Result<f64, ProbeError> {
            Ok(delay + latency + rng.gen_range(0.0..0.1))
        };
        let outcome = detector(4, 5.0).run(&mut sender, &StopSignal::new());
        assert!(outcome.injectable(), "latency {}", latency);
    }
}

#[test]
fn test_rejects_triple_slope() {
    let mut sender = |delay: f64| -> Result<f64, ProbeError> { Ok(3.0 * delay) };
    let outcome = detector(4, 5.0).run(&mut sender, &StopSignal::new());

    assert!(!outcome.injectable());
    assert_eq!(outcome.state, DetectionState::Exhausted);
    let r = outcome.correlation.unwrap();
    assert!((r.slope - 3.0).abs() < 1e-9);
}

#[rstest]
fn test_budget_is_never_exceeded(
    #[values(1, 2, 3, 4, 5, 8, 12, 100)] limit: usize,
    #[values(0, 1, 2, 3)] behaviour: usize,
    #[values(true, false)] early_exit: bool,
) {
    let config = DetectorConfig::new(limit, 0.5)
        .unwrap()
        .with_early_exit(early_exit);
    let mut calls = 0;
    let mut sender = |delay: f64| -> Result<f64, ProbeError> {
        calls += 1;
        match behaviour {
            0 => Ok(delay + 0.01),
            1 => Ok(0.1),
            2 => Err(ProbeError::Transport("reset".to_string())),
            _ => Ok(2.0 * delay),
        }
    };

    let outcome = check_timing_dependence(config, &mut sender, &StopSignal::new());

    assert!(calls <= limit);
    assert_eq!(outcome.probes_sent, calls);
    assert!(outcome.samples.len() <= outcome.probes_sent);
}

#[test]
fn test_total_requested_delay_is_bounded() {
    for limit in 1..=100 {
        let d = detector(limit, 2.0);
        let total = d.schedule().total();
        assert!(total <= 2.5 * 2.0 * limit as f64 + 1e-9, "limit {}", limit);
        assert!(d.schedule().delays().iter().all(|&x| x <= 4.0 * 2.0 + 1e-9));
    }
}

#[rstest]
fn test_whole_second_delays_are_bounded(#[values(0.5, 1.0, 2.0, 3.0, 5.0)] base: f64) {
    for limit in 1..=100 {
        let config = DetectorConfig::new(limit, base).unwrap().with_whole_seconds(true);
        let d = TimingDetector::new(config);
        let whole_base = base.ceil();
        let delays = d.schedule().delays();
        assert!(delays.len() <= limit, "limit {}", limit);
        assert!(d.schedule().total() <= 2.5 * whole_base * limit as f64 + 1e-9, "limit {}", limit);
        assert!(delays.iter().all(|&x| x <= 4.0 * whole_base), "limit {}", limit);
    }
}

#[test]
fn test_whole_second_budget_never_exceeded() {
    let config = DetectorConfig::new(100, 2.0)
        .unwrap()
        .with_whole_seconds(true)
        .with_early_exit(false);
    let mut requested = Vec::new();
    let mut sender = |delay: f64| -> Result<f64, ProbeError> {
        requested.push(delay);
        Ok(delay - 1.0)
    };

    let outcome = check_timing_dependence(config, &mut sender, &StopSignal::new());

    assert!(outcome.injectable());
    assert_eq!(requested, vec![2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
}

#[rstest]
fn test_stop_after_k_requests(#[values(0, 1, 2, 3)] k: usize) {
    let stop = StopSignal::new();
    let mut calls = 0;
    let mut sender = |delay: f64| -> Result<f64, ProbeError> {
        calls += 1;
        if calls == k {
            stop.stop();
        }
        Ok(delay + 0.05)
    };
    if k == 0 {
        stop.stop();
    }

    let config = DetectorConfig::new(4, 5.0).unwrap().with_early_exit(false);
    let outcome = check_timing_dependence(config, &mut sender, &stop);

    assert_eq!(calls, k);
    assert_eq!(outcome.probes_sent, k);
    assert!(!outcome.injectable());
    assert_eq!(outcome.state, DetectionState::Aborted(AbortReason::Stopped));
}

#[rstest]
#[case(vec![])]
#[case(vec![(5.0, 5.1)])]
#[case(vec![(5.0, 5.1), (5.0, 5.2), (5.0, 5.0)])]
#[case(vec![(5.0, 1.0), (10.0, 1.0), (15.0, 1.0)])]
fn test_degenerate_samples_never_injectable(#[case] points: Vec<(f64, f64)>) {
    let samples: SampleSet = points
        .into_iter()
        .map(|(x, y)| ProbeSample::new(x, y))
        .collect();
    let evaluator = CorrelationEvaluator::new(0.15, 0.30);
    let verdict = evaluator.evaluate(&samples);
    assert!(!verdict.is_injectable());
    assert!(!matches!(verdict, CorrelationVerdict::Correlated(_)));
}

#[test]
fn test_whole_second_schedule_for_fractional_base() {
    let config = DetectorConfig::new(4, 0.4).unwrap().with_whole_seconds(true);
    let d = TimingDetector::new(config);
    assert_eq!(d.schedule().delays(), &[1.0, 2.0, 3.0, 4.0]);
}
