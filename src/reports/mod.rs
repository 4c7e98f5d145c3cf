// File: mod.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use crate::getstate::StateSnapshot;
use crate::report::Finding;

pub mod json;
pub mod markdown;
pub mod text;

#[derive(Debug, Clone, Serialize)]
pub struct ReportData {
    pub generated_at: DateTime<Utc>,
    pub title: String,
    pub targets: Vec<String>,
    pub findings: Vec<Finding>,
    pub summary: ReportSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub total_targets: usize,
    pub injection_points: usize,
    pub probes_sent: u64,
    pub probes_failed: u64,
    pub total_findings: usize,
    pub affected_parameters: usize,
    pub findings_by_rule: BTreeMap<String, usize>,
    pub duration_ms: u64,
    pub stopped: bool,
}

/// Counters the scanner hands over once it is done.
#[derive(Debug, Clone)]
pub struct ScanTotals {
    pub targets: Vec<String>,
    pub injection_points: usize,
    pub state: StateSnapshot,
    pub stopped: bool,
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub include_samples: bool,
    pub sort_by: SortBy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    Timestamp,
    Url,
    Rule,
}

impl FromStr for SortBy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "time" | "timestamp" => Ok(SortBy::Timestamp),
            "url" => Ok(SortBy::Url),
            "rule" => Ok(SortBy::Rule),
            other => Err(anyhow::anyhow!("Unknown sort order: {}", other)),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_samples: true,
            sort_by: SortBy::Url,
        }
    }
}

pub trait ReportGenerator {
    fn generate(&self, data: &ReportData, config: &ReportConfig) -> Result<String>;
    fn file_extension(&self) -> &'static str;
    fn content_type(&self) -> &'static str;
}

pub struct ReportEngine;

impl Default for ReportEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn generate_report<P: AsRef<Path>>(
        &self,
        format: &str,
        data: &ReportData,
        config: &ReportConfig,
        output_path: Option<P>,
    ) -> Result<String> {
        let generator = self.get_generator(format)?;
        let content = generator.generate(data, config)?;

        if let Some(path) = output_path {
            std::fs::write(path, &content)?;
        }

        Ok(content)
    }

    pub fn create_report_data(
        &self,
        totals: ScanTotals,
        mut findings: Vec<Finding>,
        config: &ReportConfig,
    ) -> ReportData {
        match config.sort_by {
            SortBy::Timestamp => findings.sort_by_key(|f| f.timestamp),
            SortBy::Url => findings.sort_by(|a, b| {
                (&a.url, &a.parameter, &a.rule).cmp(&(&b.url, &b.parameter, &b.rule))
            }),
            SortBy::Rule => findings.sort_by(|a, b| (&a.rule, &a.url).cmp(&(&b.rule, &b.url))),
        }

        let summary = self.calculate_summary(&totals, &findings);

        ReportData {
            generated_at: Utc::now(),
            title: "rblind Timing Injection Report".to_string(),
            targets: totals.targets,
            findings,
            summary,
        }
    }

    fn get_generator(&self, format: &str) -> Result<Box<dyn ReportGenerator>> {
        match format.to_lowercase().as_str() {
            "json" => Ok(Box::new(json::JsonGenerator::new())),
            "text" | "txt" => Ok(Box::new(text::TextGenerator::new())),
            "markdown" | "md" => Ok(Box::new(markdown::MarkdownGenerator::new())),
            _ => Err(anyhow::anyhow!("Unsupported report format: {}", format)),
        }
    }

    fn calculate_summary(&self, totals: &ScanTotals, findings: &[Finding]) -> ReportSummary {
        let mut findings_by_rule = BTreeMap::new();
        for finding in findings {
            *findings_by_rule.entry(finding.rule.clone()).or_insert(0) += 1;
        }

        let affected_parameters = findings
            .iter()
            .map(|f| (f.url.as_str(), f.parameter.as_str()))
            .collect::<std::collections::HashSet<_>>()
            .len();

        ReportSummary {
            total_targets: totals.targets.len(),
            injection_points: totals.injection_points,
            probes_sent: totals.state.total_requests,
            probes_failed: totals.state.failed_requests,
            total_findings: findings.len(),
            affected_parameters,
            findings_by_rule,
            duration_ms: totals.state.duration_ms(),
            stopped: totals.stopped,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_summary_counts() {
        let data = report_data();
        assert_eq!(data.summary.total_targets, 2);
        assert_eq!(data.summary.probes_sent, 40);
        assert_eq!(data.summary.probes_failed, 2);
        assert_eq!(data.summary.total_findings, 2);
        assert_eq!(data.summary.affected_parameters, 2);
        assert_eq!(data.summary.duration_ms, 60_000);
        assert_eq!(data.summary.findings_by_rule.get("SQL Injection"), Some(&1));
    }

    #[test]
    fn test_findings_sorted_by_url() {
        let data = report_data();
        assert_eq!(data.findings[0].url, "http://a.test/?id=1");
    }

    #[test]
    fn test_sort_by_rule() {
        let config = ReportConfig {
            sort_by: SortBy::Rule,
            ..ReportConfig::default()
        };
        let data = ReportEngine::new().create_report_data(
            totals(),
            vec![
                finding("http://a.test/?id=1", "Template Injection"),
                finding("http://b.test/?q=x", "Command Injection"),
            ],
            &config,
        );
        assert_eq!(data.findings[0].rule, "Command Injection");
    }

    #[test]
    fn test_sort_by_timestamp() {
        let mut first = finding("http://b.test/?q=x", "SQL Injection");
        let second = finding("http://a.test/?id=1", "SQL Injection");
        first.timestamp = second.timestamp - chrono::Duration::seconds(5);
        let config = ReportConfig {
            sort_by: SortBy::Timestamp,
            ..ReportConfig::default()
        };
        let data = ReportEngine::new().create_report_data(totals(), vec![second, first], &config);
        assert_eq!(data.findings[0].url, "http://b.test/?q=x");
    }

    #[test]
    fn test_sort_by_from_str() {
        assert_eq!("URL".parse::<SortBy>().unwrap(), SortBy::Url);
        assert_eq!("rule".parse::<SortBy>().unwrap(), SortBy::Rule);
        assert_eq!("time".parse::<SortBy>().unwrap(), SortBy::Timestamp);
        assert!("severity".parse::<SortBy>().is_err());
    }

    #[test]
    fn test_unsupported_format() {
        let engine = ReportEngine::new();
        let result = engine.generate_report::<&str>(
            "pdf",
            &report_data(),
            &ReportConfig::default(),
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_report_written_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");
        let content = ReportEngine::new()
            .generate_report("json", &report_data(), &ReportConfig::default(), Some(&path))
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
    }
}
