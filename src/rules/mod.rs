// File: mod.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

pub mod command;
pub mod nosql;
pub mod payload;
pub mod sqli;
pub mod ssti;


use crate::config::ScanConfig;
use crate::errors::ConfigError;
use crate::fingerprint::TechHints;
use crate::injection::InjectionPoint;
use crate::report::{Finding, TimingEvidence};
use crate::sender::{PayloadSender, Transport};
use crate::timing::{DetectionState, StopSignal, TimingDetector};
use log::{debug, info, trace, warn};
use payload::PayloadFamily;

/// Everything a rule borrows from the running scan.
pub struct RuleContext<'a> {
    pub transport: &'a dyn Transport,
    pub config: &'a ScanConfig,
    pub stop: &'a StopSignal,
    pub hints: &'a TechHints,
    pub baseline_ms: Option<f64>,
}

pub trait Rule: Send + Sync {
    /// Short identifier accepted by `--rules`.
    fn id(&self) -> &'static str;
    fn name(&self) -> &'static str;
    fn cwe(&self) -> u32;
    fn families(&self) -> &'static [PayloadFamily];

    fn scan(&self, ctx: &RuleContext<'_>, point: &InjectionPoint) -> Vec<Finding> {
        scan_families(self.name(), self.cwe(), self.families(), ctx, point)
    }
}

/// Families to try, in order. `--tech` filters, fingerprint hints only
/// move matching families to the front.
pub fn ordered_families<'f>(
    families: &'f [PayloadFamily],
    tech: &[String],
    hints: &TechHints,
) -> Vec<&'f PayloadFamily> {
    let mut selected: Vec<&PayloadFamily> = families
        .iter()
        .filter(|family| tech.is_empty() || family.matches_tech(tech))
        .collect();
    selected.sort_by_key(|family| !hints.matches_any(family.tech));
    selected
}

/// Runs the timing detector for each payload until one is confirmed.
/// At most one finding per injection point is reported.
pub fn scan_families(
    rule: &str,
    cwe: u32,
    families: &[PayloadFamily],
    ctx: &RuleContext<'_>,
    point: &InjectionPoint,
) -> Vec<Finding> {
    let per_family = ctx.config.attack_strength().payloads_per_family();

    for family in ordered_families(families, ctx.config.tech(), ctx.hints) {
        let detector = match ctx.config.detector_config(family.whole_seconds) {
            Ok(config) => TimingDetector::new(config),
            Err(e) => {
                warn!("{}: invalid detector settings: {}", rule, e);
                return Vec::new();
            }
        };

        for template in family.templates.iter().take(per_family) {
            if ctx.stop.is_stopped() {
                return Vec::new();
            }
            trace!("{} [{}] on {}: {}", rule, family.name, point, template.as_str());

            let mut sender = PayloadSender::new(ctx.transport, point, *template);
            let outcome = detector.run(&mut sender, ctx.stop);

            match &outcome.state {
                DetectionState::Confirmed => {
                    info!("{} ({}) confirmed on {}", rule, family.name, point);
                    let evidence = TimingEvidence::from_outcome(&outcome, ctx.baseline_ms)
                        .with_payloads(sender.into_sent());
                    let payload = outcome
                        .max_delay_sample()
                        .and_then(|s| evidence.payload_for(s.requested_delay))
                        .unwrap_or(template.as_str())
                        .to_string();
                    return vec![Finding::new(rule, family.name, cwe, point, payload, evidence)];
                }
                DetectionState::Aborted(reason) => {
                    debug!("{} on {} aborted: {:?}", rule, point, reason);
                    return Vec::new();
                }
                DetectionState::Rejected | DetectionState::Exhausted => {}
            }
        }
    }

    Vec::new()
}

pub struct RuleHandler {
    rules: Vec<Box<dyn Rule>>,
}

impl Default for RuleHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleHandler {
    pub fn new() -> Self {
        let mut handler = Self { rules: Vec::new() };
        handler.register_known_rules();
        handler
    }

    pub fn register_known_rules(&mut self) {
        self.rules.push(Box::new(sqli::SqlInjectionRule));
        self.rules.push(Box::new(command::CommandInjectionRule));
        self.rules.push(Box::new(ssti::TemplateInjectionRule));
        self.rules.push(Box::new(nosql::NoSqlInjectionRule));
    }

    pub fn list(&self) -> Vec<String> {
        self.rules.iter().map(|rule| rule.name().to_string()).collect()
    }

    pub fn rules(&self) -> &[Box<dyn Rule>] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Keeps the rules named in `wanted`, matched by id or name. An empty
    /// list keeps everything.
    pub fn select(mut self, wanted: &[String]) -> Result<Self, ConfigError> {
        if wanted.is_empty() {
            return Ok(self);
        }
        for name in wanted {
            if !self.rules.iter().any(|rule| matches_rule(rule.as_ref(), name)) {
                return Err(ConfigError::UnknownRule(name.clone()));
            }
        }
        self.rules
            .retain(|rule| wanted.iter().any(|name| matches_rule(rule.as_ref(), name)));
        Ok(self)
    }

    pub fn run(&self, ctx: &RuleContext<'_>, point: &InjectionPoint) -> Vec<Finding> {
        self.rules
            .iter()
            .flat_map(|rule| rule.scan(ctx, point))
            .collect()
    }
}

fn matches_rule(rule: &dyn Rule, name: &str) -> bool {
    let name = name.trim();
    rule.id().eq_ignore_ascii_case(name) || rule.name().eq_ignore_ascii_case(name)
}
