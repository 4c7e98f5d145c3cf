// File: payload.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

/// An attack string with a `{delay}` (seconds) or `{delay_ms}` placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PayloadTemplate(&'static str);

impl PayloadTemplate {
    pub const fn new(template: &'static str) -> Self {
        Self(template)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    pub fn render(&self, delay_seconds: f64) -> String {
        self.0
            .replace("{delay_ms}", &format_delay(delay_seconds * 1000.0))
            .replace("{delay}", &format_delay(delay_seconds))
    }
}

/// Payloads for one database, shell or template engine.
#[derive(Debug)]
pub struct PayloadFamily {
    pub name: &'static str,
    /// Technology tags used by `--tech` and fingerprint hints.
    pub tech: &'static [&'static str],
    /// The sleep primitive only accepts whole seconds.
    pub whole_seconds: bool,
    pub templates: &'static [PayloadTemplate],
}

impl PayloadFamily {
    pub fn matches_tech(&self, tech: &[String]) -> bool {
        tech.iter().any(|t| self.tech.contains(&t.as_str()))
    }
}

/// Whole numbers print without decimals, fractions with at most three.
pub fn format_delay(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{:.0}", value.round())
    } else {
        let formatted = format!("{:.3}", value);
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}
