// File: lib.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::module_inception)]

pub mod cli;
pub mod config;
pub mod errors;
pub mod fingerprint;
pub mod getstate;
pub mod http;
pub mod httpinner;
pub mod injection;
pub mod report;
pub mod reports;
pub mod rules;
pub mod scanner;
pub mod sender;
pub mod timing;
