// File: errors.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use std::time::Duration;
use thiserror::Error;

/// Failure of a single timing probe.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProbeError {
    /// Connection reset, malformed redirect, broken body and similar.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The client gave up waiting. `elapsed` is how long it waited.
    #[error("Probe timed out after {elapsed:?}")]
    Timeout { elapsed: Duration },

    /// Name resolution or connect failure. The target is gone for this attempt.
    #[error("Target unreachable: {0}")]
    Unreachable(String),
}

impl ProbeError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Request limit must be between 1 and {max}, got {value}")]
    InvalidRequestLimit { value: usize, max: usize },

    #[error("Base sleep must be a positive number of seconds, got {0}")]
    InvalidBaseSleep(f64),

    #[error("{name} must be within [0, 1], got {value}")]
    InvalidErrorRange { name: &'static str, value: f64 },

    #[error("Unknown attack strength: {0}")]
    InvalidAttackStrength(String),

    #[error("Invalid parameter pattern: {0}")]
    InvalidPattern(String),

    #[error("Unknown rule: {0}")]
    UnknownRule(String),
}

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ScanResult<T> = Result<T, ScanError>;
