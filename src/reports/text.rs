// File: text.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use anyhow::Result;

use super::{ReportConfig, ReportData, ReportGenerator};
use crate::report::Severity;

const RULE: &str =
    "===============================================================================\n";

pub struct TextGenerator;

impl Default for TextGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TextGenerator {
    pub fn new() -> Self {
        Self
    }

    fn format_severity(&self, severity: &Severity) -> &str {
        match severity {
            Severity::Critical => "[CRITICAL]",
            Severity::High => "[HIGH]    ",
            Severity::Medium => "[MEDIUM]  ",
            Severity::Low => "[LOW]     ",
            Severity::Info => "[INFO]    ",
        }
    }
}

impl ReportGenerator for TextGenerator {
    fn generate(&self, data: &ReportData, config: &ReportConfig) -> Result<String> {
        let mut output = String::new();

        output.push_str(RULE);
        output.push_str(&format!(
            "                     {}\n",
            data.title.to_uppercase()
        ));
        output.push_str(RULE);
        output.push_str(&format!(
            "Generated: {}\n",
            data.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        output.push_str(&format!("Tool: rblind v{}\n", env!("CARGO_PKG_VERSION")));
        output.push_str(RULE);
        output.push('\n');

        let summary = &data.summary;
        output.push_str("EXECUTIVE SUMMARY\n");
        output.push_str("-----------------\n");
        output.push_str(&format!("Targets:              {}\n", summary.total_targets));
        output.push_str(&format!("Injection Points:     {}\n", summary.injection_points));
        output.push_str(&format!("Probes Sent:          {}\n", summary.probes_sent));
        output.push_str(&format!("Probes Failed:        {}\n", summary.probes_failed));
        output.push_str(&format!(
            "Duration:             {:.1}s\n",
            summary.duration_ms as f64 / 1000.0
        ));
        if summary.stopped {
            output.push_str("Scan was interrupted before all probes were sent\n");
        }

        output.push_str("\nFINDINGS\n");
        output.push_str("--------\n");
        if summary.total_findings == 0 {
            output.push_str("✓ No timing dependent parameters identified\n");
        } else {
            output.push_str(&format!(
                "Total Findings:       {}\n",
                summary.total_findings
            ));
            output.push_str(&format!(
                "Affected Parameters:  {}\n",
                summary.affected_parameters
            ));
            for (rule, count) in &summary.findings_by_rule {
                output.push_str(&format!("  {:<25} {}\n", rule, count));
            }
        }

        if !data.findings.is_empty() {
            output.push('\n');
            output.push_str(RULE);
            output.push_str("DETAILED FINDINGS\n");
            output.push_str(RULE);
            output.push('\n');
        }

        for (i, finding) in data.findings.iter().enumerate() {
            output.push_str(&format!(
                "{}. {} {} ({})\n",
                i + 1,
                self.format_severity(&finding.severity),
                finding.rule,
                finding.family
            ));
            output.push_str(&format!("   URL:        {}\n", finding.url));
            output.push_str(&format!(
                "   Parameter:  {} ({})\n",
                finding.parameter, finding.location
            ));
            output.push_str(&format!("   Payload:    {}\n", finding.payload));
            output.push_str(&format!("   Confidence: {}\n", finding.confidence));
            output.push_str(&format!("   CWE:        CWE-{}\n", finding.cwe));
            output.push_str(&format!("   Evidence:   {}\n", finding.evidence.summary()));
            output.push_str(&format!("   Finding ID: {}\n", finding.id));

            if config.include_samples && !finding.evidence.samples.is_empty() {
                output.push_str("   Requested    Observed  Payload\n");
                for sample in &finding.evidence.samples {
                    output.push_str(&format!(
                        "   {:>8.3}s  {:>9.3}s  {}\n",
                        sample.requested_delay,
                        sample.observed_elapsed,
                        finding
                            .evidence
                            .payload_for(sample.requested_delay)
                            .unwrap_or("-")
                    ));
                }
            }
            output.push('\n');
        }

        output.push_str(RULE);
        output.push_str("End of Report\n");
        output.push_str(RULE);

        Ok(output)
    }

    fn file_extension(&self) -> &'static str {
        "txt"
    }

    fn content_type(&self) -> &'static str {
        "text/plain"
    }
}
