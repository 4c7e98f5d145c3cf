// File: cli.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{
    AttackStrength, ScanConfig, DEFAULT_BASE_SLEEP_SECONDS, DEFAULT_CORRELATION_ERROR_RANGE,
    DEFAULT_SLOPE_ERROR_RANGE,
};
use crate::reports::SortBy;

#[derive(Parser, Debug)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = env!("CARGO_PKG_DESCRIPTION"),
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long = "log-level", default_value = "warn", global = true)]
    pub log_level: String,

    #[arg(
        short = 'v',
        long = "verbose",
        help = "Enable verbose output",
        global = true
    )]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long = "quiet",
        help = "Reduce output verbosity",
        global = true
    )]
    pub quiet: bool,

    #[arg(long = "no-color", help = "Disable colored output", global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Probe every parameter of the given targets for timing based injection
    Scan(ScanArgs),
    /// List the available rules and their payload families
    Rules,
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    #[arg(short = 'u', long = "url", help = "Target URL, may be repeated")]
    pub urls: Vec<String>,

    #[arg(short = 'i', long = "input-file", help = "File with one target per line")]
    pub input_file: Option<PathBuf>,

    #[arg(
        short = 'd',
        long = "data",
        help = "Urlencoded POST body; its fields become injection points"
    )]
    pub data: Option<String>,

    #[arg(
        short = 't',
        long = "timeout",
        default_value_t = 30,
        help = "HTTP request timeout in seconds"
    )]
    pub timeout: u64,

    #[arg(short = 'r', long = "rate-limit", default_value_t = 10)]
    pub rate_limit: u32,

    #[arg(short = 'w', long = "workers", default_value_t = 4)]
    pub workers: usize,

    #[arg(
        short = 's',
        long = "strength",
        default_value = "medium",
        help = "Attack strength: low, medium, high, insane"
    )]
    pub strength: AttackStrength,

    #[arg(long = "base-sleep", default_value_t = DEFAULT_BASE_SLEEP_SECONDS)]
    pub base_sleep: f64,

    #[arg(long = "correlation-range", default_value_t = DEFAULT_CORRELATION_ERROR_RANGE)]
    pub correlation_range: f64,

    #[arg(long = "slope-range", default_value_t = DEFAULT_SLOPE_ERROR_RANGE)]
    pub slope_range: f64,

    #[arg(
        long = "request-limit",
        help = "Timing probes per payload, overrides the attack strength"
    )]
    pub request_limit: Option<usize>,

    #[arg(
        long = "timeout-as-evidence",
        help = "Record client timeouts as observed elapsed time instead of skipping them"
    )]
    pub timeout_as_evidence: bool,

    #[arg(
        long = "no-early-exit",
        help = "Always send the full probe budget"
    )]
    pub no_early_exit: bool,

    #[arg(long = "baseline-samples", default_value_t = 3)]
    pub baseline_samples: usize,

    #[arg(
        long = "tech",
        value_delimiter = ',',
        help = "Only use payload families for these technologies (e.g. mysql,linux)"
    )]
    pub tech: Vec<String>,

    #[arg(
        long = "rules",
        value_delimiter = ',',
        help = "Only run these rules (id or name)"
    )]
    pub rules: Vec<String>,

    #[arg(long = "param", help = "Regex selecting parameter names to test")]
    pub param: Option<String>,

    #[arg(short = 'f', long = "format", default_value = "text")]
    pub format: String,

    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    #[arg(
        long = "sort",
        default_value = "url",
        help = "Order of findings in the report: url, rule, timestamp"
    )]
    pub sort: SortBy,

    #[arg(long = "no-samples", help = "Leave raw timing samples out of the report")]
    pub no_samples: bool,

    #[arg(long = "no-progress", help = "Hide the progress bar")]
    pub no_progress: bool,

    #[arg(
        long = "i-have-authorization",
        help = "Skip authorization prompt (requires explicit written permission)"
    )]
    pub i_have_authorization: bool,
}

impl ScanArgs {
    pub fn to_config(&self) -> ScanConfig {
        let mut config = ScanConfig::new();
        config.set_timeout(self.timeout);
        config.set_rate_limit(self.rate_limit);
        config.set_workers(self.workers);
        config.set_attack_strength(self.strength);
        config.set_base_sleep_seconds(self.base_sleep);
        config.set_correlation_error_range(self.correlation_range);
        config.set_slope_error_range(self.slope_range);
        config.set_request_limit(self.request_limit);
        config.set_timeout_as_evidence(self.timeout_as_evidence);
        config.set_early_exit(!self.no_early_exit);
        config.set_baseline_samples(self.baseline_samples);
        config.set_tech(self.tech.clone());
        config.set_rules(self.rules.clone());
        config.set_param_filter(self.param.clone());
        config
    }
}

impl Cli {
    pub fn log_level(&self) -> log::LevelFilter {
        if self.verbose {
            return log::LevelFilter::Debug;
        }
        if self.quiet {
            return log::LevelFilter::Error;
        }
        self.log_level.parse().unwrap_or(log::LevelFilter::Warn)
    }
}
