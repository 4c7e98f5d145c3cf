// File: json.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use anyhow::Result;
use serde_json::Value;

use super::{ReportConfig, ReportData, ReportGenerator};

pub struct JsonGenerator;

impl Default for JsonGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl ReportGenerator for JsonGenerator {
    fn generate(&self, data: &ReportData, config: &ReportConfig) -> Result<String> {
        let mut value = serde_json::to_value(data)
            .map_err(|e| anyhow::anyhow!("Failed to serialize report to JSON: {}", e))?;

        if !config.include_samples {
            if let Some(findings) = value.get_mut("findings").and_then(Value::as_array_mut) {
                for finding in findings {
                    if let Some(evidence) = finding.get_mut("evidence").and_then(Value::as_object_mut) {
                        evidence.remove("samples");
                        evidence.remove("payloads");
                    }
                }
            }
        }

        let json = serde_json::to_string_pretty(&value)?;
        Ok(json)
    }

    fn file_extension(&self) -> &'static str {
        "json"
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }
}
