// File: config.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_BASE_SLEEP_SECONDS: f64 = 5.0;
pub const DEFAULT_CORRELATION_ERROR_RANGE: f64 = 0.15;
pub const DEFAULT_SLOPE_ERROR_RANGE: f64 = 0.30;
pub const DEFAULT_REQUEST_LIMIT: usize = 4;
pub const MAX_REQUEST_LIMIT: usize = 100;

/// How aggressive a scan is allowed to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AttackStrength {
    Low,
    #[default]
    Medium,
    High,
    Insane,
}

impl AttackStrength {
    /// Timing probes one payload may spend.
    pub fn request_limit(&self) -> usize {
        match self {
            AttackStrength::Low => 2,
            AttackStrength::Medium => DEFAULT_REQUEST_LIMIT,
            AttackStrength::High => 6,
            AttackStrength::Insane => 12,
        }
    }

    /// Payload templates tried per family.
    pub fn payloads_per_family(&self) -> usize {
        match self {
            AttackStrength::Low => 1,
            AttackStrength::Medium => 3,
            AttackStrength::High => 6,
            AttackStrength::Insane => usize::MAX,
        }
    }
}

impl fmt::Display for AttackStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttackStrength::Low => write!(f, "low"),
            AttackStrength::Medium => write!(f, "medium"),
            AttackStrength::High => write!(f, "high"),
            AttackStrength::Insane => write!(f, "insane"),
        }
    }
}

impl FromStr for AttackStrength {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(AttackStrength::Low),
            "medium" | "default" => Ok(AttackStrength::Medium),
            "high" => Ok(AttackStrength::High),
            "insane" => Ok(AttackStrength::Insane),
            other => Err(ConfigError::InvalidAttackStrength(other.to_string())),
        }
    }
}

/// Parameters of one timing detection attempt. Validated on construction and
/// never mutated while the attempt runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    request_limit: usize,
    base_sleep_seconds: f64,
    correlation_error_range: f64,
    slope_error_range: f64,
    whole_seconds: bool,
    early_exit: bool,
    treat_timeout_as_elapsed: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            request_limit: DEFAULT_REQUEST_LIMIT,
            base_sleep_seconds: DEFAULT_BASE_SLEEP_SECONDS,
            correlation_error_range: DEFAULT_CORRELATION_ERROR_RANGE,
            slope_error_range: DEFAULT_SLOPE_ERROR_RANGE,
            whole_seconds: false,
            early_exit: true,
            treat_timeout_as_elapsed: false,
        }
    }
}

impl DetectorConfig {
    pub fn new(request_limit: usize, base_sleep_seconds: f64) -> Result<Self, ConfigError> {
        validate_request_limit(request_limit)?;
        validate_base_sleep(base_sleep_seconds)?;
        Ok(Self {
            request_limit,
            base_sleep_seconds,
            ..Self::default()
        })
    }

    pub fn with_error_ranges(
        mut self,
        correlation_error_range: f64,
        slope_error_range: f64,
    ) -> Result<Self, ConfigError> {
        validate_error_range("correlation_error_range", correlation_error_range)?;
        validate_error_range("slope_error_range", slope_error_range)?;
        self.correlation_error_range = correlation_error_range;
        self.slope_error_range = slope_error_range;
        Ok(self)
    }

    pub fn with_whole_seconds(mut self, whole_seconds: bool) -> Self {
        self.whole_seconds = whole_seconds;
        self
    }

    pub fn with_early_exit(mut self, early_exit: bool) -> Self {
        self.early_exit = early_exit;
        self
    }

    pub fn with_timeout_as_elapsed(mut self, treat_timeout_as_elapsed: bool) -> Self {
        self.treat_timeout_as_elapsed = treat_timeout_as_elapsed;
        self
    }

    pub fn request_limit(&self) -> usize {
        self.request_limit
    }

    pub fn base_sleep_seconds(&self) -> f64 {
        self.base_sleep_seconds
    }

    pub fn correlation_error_range(&self) -> f64 {
        self.correlation_error_range
    }

    pub fn slope_error_range(&self) -> f64 {
        self.slope_error_range
    }

    pub fn whole_seconds(&self) -> bool {
        self.whole_seconds
    }

    pub fn early_exit(&self) -> bool {
        self.early_exit
    }

    pub fn treat_timeout_as_elapsed(&self) -> bool {
        self.treat_timeout_as_elapsed
    }
}

fn validate_request_limit(value: usize) -> Result<(), ConfigError> {
    if value == 0 || value > MAX_REQUEST_LIMIT {
        return Err(ConfigError::InvalidRequestLimit {
            value,
            max: MAX_REQUEST_LIMIT,
        });
    }
    Ok(())
}

fn validate_base_sleep(value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::InvalidBaseSleep(value));
    }
    Ok(())
}

fn validate_error_range(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::InvalidErrorRange { name, value });
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ScanConfig {
    timeout: u64,
    rate_limit: u32,
    workers: usize,
    attack_strength: AttackStrength,
    base_sleep_seconds: f64,
    correlation_error_range: f64,
    slope_error_range: f64,
    request_limit: Option<usize>,
    timeout_as_evidence: bool,
    early_exit: bool,
    baseline_samples: usize,
    tech: Vec<String>,
    rules: Vec<String>,
    param_filter: Option<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanConfig {
    pub fn new() -> Self {
        Self {
            timeout: 30,
            rate_limit: 10,
            workers: 4,
            attack_strength: AttackStrength::Medium,
            base_sleep_seconds: DEFAULT_BASE_SLEEP_SECONDS,
            correlation_error_range: DEFAULT_CORRELATION_ERROR_RANGE,
            slope_error_range: DEFAULT_SLOPE_ERROR_RANGE,
            request_limit: None,
            timeout_as_evidence: false,
            early_exit: true,
            baseline_samples: 3,
            tech: Vec::new(),
            rules: Vec::new(),
            param_filter: None,
        }
    }

    /// Builds the per-attempt detector configuration. `whole_seconds` is set
    /// for payload families that can only sleep in full seconds.
    pub fn detector_config(&self, whole_seconds: bool) -> Result<DetectorConfig, ConfigError> {
        let limit = self
            .request_limit
            .unwrap_or_else(|| self.attack_strength.request_limit());
        Ok(DetectorConfig::new(limit, self.base_sleep_seconds)?
            .with_error_ranges(self.correlation_error_range, self.slope_error_range)?
            .with_whole_seconds(whole_seconds)
            .with_early_exit(self.early_exit)
            .with_timeout_as_elapsed(self.timeout_as_evidence))
    }

    /// Checks every detector related setting once, before a scan starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.detector_config(false)?;
        if let Some(pattern) = &self.param_filter {
            regex::Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern(e.to_string()))?;
        }
        Ok(())
    }

    pub fn set_timeout(&mut self, timeout: u64) {
        self.timeout = timeout;
    }

    pub fn timeout(&self) -> u64 {
        self.timeout
    }

    pub fn set_rate_limit(&mut self, rate_limit: u32) {
        self.rate_limit = rate_limit;
    }

    pub fn rate_limit(&self) -> u32 {
        self.rate_limit
    }

    pub fn set_workers(&mut self, workers: usize) {
        self.workers = workers.max(1);
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn set_attack_strength(&mut self, attack_strength: AttackStrength) {
        self.attack_strength = attack_strength;
    }

    pub fn attack_strength(&self) -> AttackStrength {
        self.attack_strength
    }

    pub fn set_base_sleep_seconds(&mut self, base_sleep_seconds: f64) {
        self.base_sleep_seconds = base_sleep_seconds;
    }

    pub fn base_sleep_seconds(&self) -> f64 {
        self.base_sleep_seconds
    }

    pub fn set_correlation_error_range(&mut self, range: f64) {
        self.correlation_error_range = range;
    }

    pub fn correlation_error_range(&self) -> f64 {
        self.correlation_error_range
    }

    pub fn set_slope_error_range(&mut self, range: f64) {
        self.slope_error_range = range;
    }

    pub fn slope_error_range(&self) -> f64 {
        self.slope_error_range
    }

    pub fn set_request_limit(&mut self, request_limit: Option<usize>) {
        self.request_limit = request_limit;
    }

    pub fn request_limit(&self) -> Option<usize> {
        self.request_limit
    }

    pub fn set_timeout_as_evidence(&mut self, timeout_as_evidence: bool) {
        self.timeout_as_evidence = timeout_as_evidence;
    }

    pub fn timeout_as_evidence(&self) -> bool {
        self.timeout_as_evidence
    }

    pub fn set_early_exit(&mut self, early_exit: bool) {
        self.early_exit = early_exit;
    }

    pub fn early_exit(&self) -> bool {
        self.early_exit
    }

    pub fn set_baseline_samples(&mut self, baseline_samples: usize) {
        self.baseline_samples = baseline_samples.max(1);
    }

    pub fn baseline_samples(&self) -> usize {
        self.baseline_samples
    }

    pub fn set_tech(&mut self, tech: Vec<String>) {
        self.tech = tech.into_iter().map(|t| t.to_lowercase()).collect();
    }

    pub fn tech(&self) -> &[String] {
        &self.tech
    }

    pub fn set_rules(&mut self, rules: Vec<String>) {
        self.rules = rules;
    }

    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    pub fn set_param_filter(&mut self, param_filter: Option<String>) {
        self.param_filter = param_filter;
    }

    pub fn param_filter(&self) -> Option<&str> {
        self.param_filter.as_deref()
    }
}
