// File: scanner.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::config::ScanConfig;
use crate::errors::{ConfigError, ScanError};
use crate::fingerprint::Baseline;
use crate::getstate::ScanState;
use crate::http::{Http, ProbeRequest};
use crate::injection::InjectionPoint;
use crate::report::Finding;
use crate::reports::ScanTotals;
use crate::rules::{RuleContext, RuleHandler};
use crate::sender::BlockingHttp;
use crate::timing::{ProbeSchedule, StopSignal};
use futures::stream::{FuturesUnordered, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use regex::Regex;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use url::Url;

/// A URL to test, with an optional urlencoded body for POST forms.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanTarget {
    pub url: Url,
    pub form_body: Option<String>,
}

impl ScanTarget {
    /// Accepts bare hosts the way the probe input does and assumes `http://`.
    pub fn parse(input: &str, form_body: Option<&str>) -> Result<Self, ScanError> {
        let trimmed = input.trim();
        let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("http://{}", trimmed)
        };
        let url = Url::parse(&candidate)
            .map_err(|e| ScanError::InvalidTarget(format!("{}: {}", trimmed, e)))?;
        if url.host_str().is_none() {
            return Err(ScanError::InvalidTarget(trimmed.to_string()));
        }
        Ok(Self {
            url,
            form_body: form_body.map(str::to_string),
        })
    }

    fn request(&self) -> ProbeRequest {
        match &self.form_body {
            Some(body) => ProbeRequest::post_form(self.url.clone(), body.clone()),
            None => ProbeRequest::get(self.url.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScanOutput {
    pub findings: Vec<Finding>,
    pub totals: ScanTotals,
}

struct Job {
    point: InjectionPoint,
    rule: usize,
    baseline: Arc<Baseline>,
}

pub struct Scanner {
    config: Arc<ScanConfig>,
    rules: Arc<RuleHandler>,
    state: Arc<ScanState>,
    http: Arc<Http>,
    param_filter: Option<Regex>,
    show_progress: bool,
}

impl Scanner {
    pub fn new(config: ScanConfig, rules: RuleHandler) -> Result<Self, ScanError> {
        config.validate()?;
        let param_filter = config
            .param_filter()
            .map(Regex::new)
            .transpose()
            .map_err(|e| ConfigError::InvalidPattern(e.to_string()))?;

        let longest = [false, true]
            .into_iter()
            .map(|whole| config.detector_config(whole).map(|c| ProbeSchedule::new(&c)))
            .collect::<Result<Vec<_>, _>>()?
            .iter()
            .flat_map(|s| s.delays().last().copied())
            .fold(0.0_f64, f64::max);
        if (config.timeout() as f64) <= longest {
            warn!(
                "Timeout of {}s is not above the longest requested delay of {:.1}s; \
                 late probes will be skipped",
                config.timeout(),
                longest
            );
        }

        let state = Arc::new(ScanState::new());
        let http = Arc::new(Http::new(state.clone(), &config)?);

        Ok(Self {
            config: Arc::new(config),
            rules: Arc::new(rules),
            state,
            http,
            param_filter,
            show_progress: false,
        })
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn state(&self) -> &Arc<ScanState> {
        &self.state
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.state.stop_signal().clone()
    }

    pub async fn run(&self, targets: Vec<ScanTarget>) -> ScanOutput {
        self.state.mark_start();

        let mut jobs = Vec::new();
        let mut injection_points = 0;
        for target in &targets {
            if self.state.is_stopped() {
                break;
            }
            let points = InjectionPoint::discover(
                &target.url,
                target.form_body.as_deref(),
                self.param_filter.as_ref(),
            );
            if points.is_empty() {
                info!("No parameters to test on {}", target.url);
                continue;
            }
            let Some(baseline) = self.baseline(target).await else {
                continue;
            };
            let baseline = Arc::new(baseline);
            injection_points += points.len();
            for point in points {
                for rule in 0..self.rules.len() {
                    jobs.push(Job {
                        point: point.clone(),
                        rule,
                        baseline: baseline.clone(),
                    });
                }
            }
        }

        let findings = self.run_jobs(jobs).await;
        self.state.mark_end();

        ScanOutput {
            findings,
            totals: ScanTotals {
                targets: targets.iter().map(|t| t.url.to_string()).collect(),
                injection_points,
                state: self.state.snapshot(),
                stopped: self.state.is_stopped(),
            },
        }
    }

    /// Untouched requests for latency and technology hints. `None` when
    /// the target cannot be reached at all.
    async fn baseline(&self, target: &ScanTarget) -> Option<Baseline> {
        let request = target.request();
        let mut responses = Vec::new();
        for _ in 0..self.config.baseline_samples() {
            match self.http.send(&request).await {
                Ok(response) => responses.push(response),
                Err(e) if e.is_fatal() => {
                    warn!("Skipping {}: {}", target.url, e);
                    return None;
                }
                Err(e) => debug!("Baseline request to {} failed: {}", target.url, e),
            }
        }
        let baseline = Baseline::from_responses(&responses);
        if let Some(ms) = baseline.median_ms {
            debug!("Baseline for {}: {:.0}ms", target.url, ms);
        }
        Some(baseline)
    }

    async fn run_jobs(&self, jobs: Vec<Job>) -> Vec<Finding> {
        let pb = if self.show_progress {
            let pb = ProgressBar::new(jobs.len() as u64);
            if let Ok(style) = ProgressStyle::default_bar().template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>7}/{len:7} {msg}",
            ) {
                pb.set_style(style.progress_chars("##-"));
            }
            pb
        } else {
            ProgressBar::hidden()
        };

        let semaphore = Arc::new(Semaphore::new(self.config.workers().max(1)));
        let mut handles = FuturesUnordered::new();

        for job in jobs {
            let semaphore = semaphore.clone();
            let rules = self.rules.clone();
            let config = self.config.clone();
            let transport = BlockingHttp::new(self.http.clone(), Handle::current());
            let stop = self.stop_signal();
            let pb = pb.clone();

            handles.push(tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return Vec::new();
                };
                if stop.is_stopped() {
                    pb.inc(1);
                    return Vec::new();
                }
                pb.set_message(format!(
                    "{} on {}",
                    rules.rules()[job.rule].id(),
                    job.point.name()
                ));

                let result = tokio::task::spawn_blocking(move || {
                    let ctx = RuleContext {
                        transport: &transport,
                        config: &config,
                        stop: &stop,
                        hints: &job.baseline.hints,
                        baseline_ms: job.baseline.median_ms,
                    };
                    rules.rules()[job.rule].scan(&ctx, &job.point)
                })
                .await;

                pb.inc(1);
                match result {
                    Ok(findings) => findings,
                    Err(e) => {
                        warn!("Rule job failed: {}", e);
                        Vec::new()
                    }
                }
            }));
        }

        let mut findings = Vec::new();
        while let Some(joined) = handles.next().await {
            match joined {
                Ok(found) => {
                    for finding in found {
                        self.state.add_finding();
                        pb.println(format!(
                            "[{}] {} {} '{}'",
                            finding.rule, finding.url, finding.location, finding.parameter
                        ));
                        findings.push(finding);
                    }
                }
                Err(e) => warn!("Task failed: {}", e),
            }
        }

        pb.finish_and_clear();
        findings
    }
}
