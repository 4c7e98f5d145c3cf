// File: markdown.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use anyhow::Result;

use super::{ReportConfig, ReportData, ReportGenerator};
use crate::report::Severity;

pub struct MarkdownGenerator;

impl Default for MarkdownGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownGenerator {
    pub fn new() -> Self {
        Self
    }

    fn severity_badge(&self, severity: &Severity) -> &str {
        match severity {
            Severity::Critical => {
                "![Critical](https://img.shields.io/badge/CRITICAL-red?style=flat-square)"
            }
            Severity::High => "![High](https://img.shields.io/badge/HIGH-orange?style=flat-square)",
            Severity::Medium => {
                "![Medium](https://img.shields.io/badge/MEDIUM-yellow?style=flat-square)"
            }
            Severity::Low => "![Low](https://img.shields.io/badge/LOW-blue?style=flat-square)",
            Severity::Info => {
                "![Info](https://img.shields.io/badge/INFO-lightgrey?style=flat-square)"
            }
        }
    }

    fn escape_markdown(&self, text: &str) -> String {
        text.replace('|', "\\|")
            .replace('*', "\\*")
            .replace('_', "\\_")
            .replace('`', "\\`")
            .replace('#', "\\#")
            .replace('[', "\\[")
            .replace(']', "\\]")
    }
}

impl ReportGenerator for MarkdownGenerator {
    fn generate(&self, data: &ReportData, config: &ReportConfig) -> Result<String> {
        let mut md = String::new();

        md.push_str(&format!("# {}\n\n", data.title));
        md.push_str(&format!(
            "**Generated:** {} | **Tool:** rblind v{}\n\n",
            data.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            env!("CARGO_PKG_VERSION")
        ));
        md.push_str("---\n\n");

        let summary = &data.summary;
        md.push_str("## Executive Summary\n\n");
        md.push_str("| Metric | Value |\n");
        md.push_str("|--------|-------|\n");
        md.push_str(&format!("| Targets | {} |\n", summary.total_targets));
        md.push_str(&format!("| Injection Points | {} |\n", summary.injection_points));
        md.push_str(&format!("| Probes Sent | {} |\n", summary.probes_sent));
        md.push_str(&format!("| Probes Failed | {} |\n", summary.probes_failed));
        md.push_str(&format!("| Findings | {} |\n", summary.total_findings));
        md.push_str(&format!(
            "| Duration | {:.1}s |\n",
            summary.duration_ms as f64 / 1000.0
        ));
        md.push('\n');

        if summary.stopped {
            md.push_str("> **Note:** the scan was interrupted before all probes were sent.\n\n");
        }

        md.push_str("## Findings\n\n");
        if data.findings.is_empty() {
            md.push_str("✅ **No timing dependent parameters identified**\n\n");
        } else {
            md.push_str("| Rule | Count |\n");
            md.push_str("|------|-------|\n");
            for (rule, count) in &summary.findings_by_rule {
                md.push_str(&format!("| {} | {} |\n", rule, count));
            }
            md.push('\n');
        }

        for finding in &data.findings {
            md.push_str(&format!(
                "### {} in `{}`\n\n",
                self.escape_markdown(&finding.rule),
                finding.parameter
            ));
            md.push_str(&format!("{}\n\n", self.severity_badge(&finding.severity)));
            md.push_str(&format!("- **URL:** {}\n", self.escape_markdown(&finding.url)));
            md.push_str(&format!("- **Location:** {}\n", finding.location));
            md.push_str(&format!("- **Family:** {}\n", finding.family));
            md.push_str(&format!("- **Payload:** `{}`\n", finding.payload.replace('`', "'")));
            md.push_str(&format!("- **Confidence:** {}\n", finding.confidence));
            md.push_str(&format!("- **CWE:** CWE-{}\n", finding.cwe));
            md.push_str(&format!(
                "- **Evidence:** {}\n",
                self.escape_markdown(&finding.evidence.summary())
            ));
            md.push_str(&format!("- **ID:** `{}`\n\n", finding.id));

            if config.include_samples && !finding.evidence.samples.is_empty() {
                md.push_str("| Requested (s) | Observed (s) | Payload |\n");
                md.push_str("|---------------|--------------|---------|\n");
                for sample in &finding.evidence.samples {
                    let payload = finding
                        .evidence
                        .payload_for(sample.requested_delay)
                        .map(|p| format!("`{}`", p.replace('`', "'")))
                        .unwrap_or_default();
                    md.push_str(&format!(
                        "| {:.3} | {:.3} | {} |\n",
                        sample.requested_delay,
                        sample.observed_elapsed,
                        payload.replace('|', "\\|")
                    ));
                }
                md.push('\n');
            }
        }

        if !data.targets.is_empty() {
            md.push_str("## Targets\n\n");
            for target in &data.targets {
                md.push_str(&format!("- {}\n", self.escape_markdown(target)));
            }
            md.push('\n');
        }

        Ok(md)
    }

    fn file_extension(&self) -> &'static str {
        "md"
    }

    fn content_type(&self) -> &'static str {
        "text/markdown"
    }
}
