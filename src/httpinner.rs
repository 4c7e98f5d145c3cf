// File: httpinner.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use reqwest::header::HeaderMap;
use std::time::Duration;

/// One response as seen by a probe: what came back and how long it took.
#[derive(Debug, Clone)]
pub struct HttpInner {
    body: String,
    headers: HeaderMap,
    status: u16,
    url: String,
    elapsed: Duration,
}

impl HttpInner {
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    pub fn new() -> Self {
        HttpInner {
            body: String::new(),
            headers: HeaderMap::new(),
            status: 0,
            url: String::new(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn new_with_all(
        headers: HeaderMap,
        body: String,
        status: u16,
        url: String,
        elapsed: Duration,
    ) -> Self {
        HttpInner {
            body,
            headers,
            status,
            url,
            elapsed,
        }
    }
}

impl Default for HttpInner {
    fn default() -> Self {
        Self::new()
    }
}
