// File: report.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::injection::{InjectionPoint, Location};
use crate::sender::SentPayload;
use crate::timing::{CorrelationResult, DetectionOutcome, ProbeSample};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "Info"),
            Severity::Low => write!(f, "Low"),
            Severity::Medium => write!(f, "Medium"),
            Severity::High => write!(f, "High"),
            Severity::Critical => write!(f, "Critical"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Low => write!(f, "Low"),
            Confidence::Medium => write!(f, "Medium"),
            Confidence::High => write!(f, "High"),
        }
    }
}

/// What the timing check saw, kept for the audit trail of a finding.
#[derive(Debug, Clone, Serialize)]
pub struct TimingEvidence {
    pub samples: Vec<ProbeSample>,
    pub max_delay_sample: Option<ProbeSample>,
    pub correlation: Option<CorrelationResult>,
    pub probes_sent: usize,
    pub baseline_ms: Option<f64>,
    /// Every payload sent for this check, failed probes included.
    pub payloads: Vec<SentPayload>,
}

impl TimingEvidence {
    pub fn from_outcome(outcome: &DetectionOutcome, baseline_ms: Option<f64>) -> Self {
        Self {
            samples: outcome.samples.samples().to_vec(),
            max_delay_sample: outcome.max_delay_sample().copied(),
            correlation: outcome.correlation,
            probes_sent: outcome.probes_sent,
            baseline_ms,
            payloads: Vec::new(),
        }
    }

    pub fn with_payloads(mut self, payloads: Vec<SentPayload>) -> Self {
        self.payloads = payloads;
        self
    }

    /// The payload that asked for `requested_delay`, latest first.
    pub fn payload_for(&self, requested_delay: f64) -> Option<&str> {
        self.payloads
            .iter()
            .rev()
            .find(|p| (p.requested_delay - requested_delay).abs() < 1e-9)
            .map(|p| p.payload.as_str())
    }

    /// One line summary for the text and markdown reports.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(max) = &self.max_delay_sample {
            parts.push(format!(
                "observed {:.0}ms for a requested {:.0}ms delay",
                max.observed_elapsed * 1000.0,
                max.requested_delay * 1000.0
            ));
        }
        if let Some(baseline) = self.baseline_ms {
            parts.push(format!("baseline {:.0}ms", baseline));
        }
        if let Some(r) = &self.correlation {
            parts.push(format!("r={:.3} slope={:.3}", r.correlation, r.slope));
        }
        parts.join(", ")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub id: String,
    pub rule: String,
    pub family: String,
    pub cwe: u32,
    pub url: String,
    pub parameter: String,
    pub location: Location,
    pub payload: String,
    pub severity: Severity,
    pub confidence: Confidence,
    pub evidence: TimingEvidence,
    pub timestamp: DateTime<Utc>,
}

impl Finding {
    pub fn new(
        rule: &str,
        family: &str,
        cwe: u32,
        point: &InjectionPoint,
        payload: String,
        evidence: TimingEvidence,
    ) -> Self {
        Self {
            id: fingerprint(rule, point),
            rule: rule.to_string(),
            family: family.to_string(),
            cwe,
            url: point.target().to_string(),
            parameter: point.name().to_string(),
            location: point.location(),
            payload,
            severity: Severity::High,
            confidence: Confidence::Medium,
            evidence,
            timestamp: Utc::now(),
        }
    }
}

/// Stable id of a finding: the same rule on the same parameter yields the same id.
pub fn fingerprint(rule: &str, point: &InjectionPoint) -> String {
    let mut hasher = Sha256::new();
    hasher.update(rule.as_bytes());
    hasher.update(b"\0");
    hasher.update(point.target().as_str().as_bytes());
    hasher.update(b"\0");
    hasher.update(point.location().to_string().as_bytes());
    hasher.update(b"\0");
    hasher.update(point.name().as_bytes());
    let digest = hasher.finalize();
    digest.iter().take(8).map(|b| format!("{:02x}", b)).collect()
}
