// File: common/mod.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

#![allow(dead_code)]

use rblind::config::ScanConfig;
use regex::Regex;
use std::collections::HashMap;
use std::time::Duration;
use wiremock::{MockServer, Request, Respond, ResponseTemplate};

pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

pub fn create_mock_response(status: u16, body: &str, headers: HashMap<&str, &str>) -> ResponseTemplate {
    let mut response = ResponseTemplate::new(status).set_body_string(body);
    for (key, value) in headers {
        response = response.append_header(key, value);
    }
    response
}

pub fn create_html_response(content: &str) -> ResponseTemplate {
    let mut headers = HashMap::new();
    headers.insert("content-type", "text/html");
    create_mock_response(200, content, headers)
}

/// A vulnerable endpoint: when `param` carries a sleep call that `pattern`
/// recognises, the response is held back for the captured amount times
/// `unit` seconds.
pub struct SleepResponder {
    param: &'static str,
    pattern: Regex,
    unit: f64,
}

impl SleepResponder {
    pub fn new(param: &'static str, pattern: &str, unit: f64) -> Self {
        Self {
            param,
            pattern: Regex::new(pattern).unwrap(),
            unit,
        }
    }

    fn requested_sleep(&self, request: &Request) -> Option<f64> {
        let from_query = request
            .url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()));
        let from_body = url::form_urlencoded::parse(&request.body)
            .map(|(k, v)| (k.into_owned(), v.into_owned()));

        from_query
            .chain(from_body)
            .filter(|(k, _)| k == self.param)
            .filter_map(|(_, v)| {
                let captures = self.pattern.captures(&v)?;
                captures.get(1)?.as_str().parse::<f64>().ok()
            })
            .next()
    }
}

impl Respond for SleepResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let response = create_html_response("<html><body>item</body></html>");
        match self.requested_sleep(request) {
            Some(seconds) => response.set_delay(Duration::from_secs_f64(seconds * self.unit)),
            None => response,
        }
    }
}

/// Short delays so a full timing run stays well under a few seconds.
pub fn fast_scan_config() -> ScanConfig {
    let mut config = ScanConfig::new();
    config.set_base_sleep_seconds(0.2);
    config.set_timeout(5);
    config.set_rate_limit(100);
    config.set_workers(2);
    config.set_baseline_samples(3);
    config
}
