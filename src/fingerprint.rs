// File: fingerprint.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::httpinner::HttpInner;
use crate::timing::regression::calculate_median;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;

static HEADER_HINTS: Lazy<Vec<(&'static str, Regex, &'static str)>> = Lazy::new(|| {
    vec![
        ("server", Regex::new(r"(?i)microsoft-iis").unwrap(), "windows"),
        ("server", Regex::new(r"(?i)\b(ubuntu|debian|centos|red hat|unix)\b").unwrap(), "linux"),
        ("server", Regex::new(r"(?i)\b(nginx|apache)\b").unwrap(), "linux"),
        ("x-powered-by", Regex::new(r"(?i)asp\.net").unwrap(), "windows"),
        ("x-powered-by", Regex::new(r"(?i)asp\.net").unwrap(), "mssql"),
        ("x-powered-by", Regex::new(r"(?i)\bphp\b").unwrap(), "mysql"),
        ("x-powered-by", Regex::new(r"(?i)express").unwrap(), "mongodb"),
        ("server", Regex::new(r"(?i)werkzeug|gunicorn").unwrap(), "jinja2"),
        ("server", Regex::new(r"(?i)werkzeug|gunicorn").unwrap(), "postgresql"),
        ("x-powered-by", Regex::new(r"(?i)phusion passenger|rails").unwrap(), "erb"),
    ]
});

static BODY_HINTS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (Regex::new(r"(?i)you have an error in your sql syntax|mysql_fetch").unwrap(), "mysql"),
        (Regex::new(r"(?i)pg_query\(\)|PSQLException|syntax error at or near").unwrap(), "postgresql"),
        (Regex::new(r"(?i)unclosed quotation mark|System\.Data\.SqlClient").unwrap(), "mssql"),
        (Regex::new(r"ORA-\d{5}").unwrap(), "oracle"),
        (Regex::new(r"(?i)SQLite3?::|SQLITE_ERROR").unwrap(), "sqlite"),
        (Regex::new(r"(?i)org\.hsqldb").unwrap(), "hypersql"),
        (Regex::new(r"(?i)jinja2\.exceptions").unwrap(), "jinja2"),
        (Regex::new(r"(?i)mako\.exceptions").unwrap(), "mako"),
        (Regex::new(r"(?i)freemarker\.core").unwrap(), "freemarker"),
        (Regex::new(r"(?i)MongoError|MongoServerError").unwrap(), "mongodb"),
    ]
});

/// Technologies that the baseline response suggests. Hints only change the
/// order in which payload families are tried.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TechHints {
    tags: BTreeSet<String>,
}

impl TechHints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_response(response: &HttpInner) -> Self {
        let mut hints = Self::new();
        for (header, pattern, tag) in HEADER_HINTS.iter() {
            if let Some(value) = response.header(header) {
                if pattern.is_match(value) {
                    hints.insert(tag);
                }
            }
        }
        for (pattern, tag) in BODY_HINTS.iter() {
            if pattern.is_match(response.body()) {
                hints.insert(tag);
            }
        }
        if !hints.is_empty() {
            debug!("Technology hints for {}: {:?}", response.url(), hints.tags);
        }
        hints
    }

    pub fn insert(&mut self, tag: &str) {
        self.tags.insert(tag.to_lowercase());
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn matches_any(&self, tags: &[&str]) -> bool {
        tags.iter().any(|t| self.contains(t))
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }
}

/// Baseline latency and hints for one target.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Baseline {
    pub median_ms: Option<f64>,
    pub samples_ms: Vec<f64>,
    pub hints: TechHints,
}

impl Baseline {
    pub fn from_responses(responses: &[HttpInner]) -> Self {
        let samples_ms: Vec<f64> = responses
            .iter()
            .map(|r| r.elapsed().as_secs_f64() * 1000.0)
            .collect();
        let median_ms = if samples_ms.is_empty() {
            None
        } else {
            Some(calculate_median(&mut samples_ms.clone()))
        };
        let mut hints = TechHints::new();
        for response in responses {
            for tag in TechHints::from_response(response).tags() {
                hints.insert(tag);
            }
        }
        Self {
            median_ms,
            samples_ms,
            hints,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};
    use rstest::*;
    use std::time::Duration;

    fn response(headers: Vec<(&'static str, &'static str)>, body: &str, ms: u64) -> HttpInner {
        let mut map = HeaderMap::new();
        for (k, v) in headers {
            map.insert(k, HeaderValue::from_static(v));
        }
        HttpInner::new_with_all(
            map,
            body.to_string(),
            200,
            "http://t.test/".to_string(),
            Duration::from_millis(ms),
        )
    }

    #[rstest]
    #[case(vec![("server", "Microsoft-IIS/10.0")], "", "windows")]
    #[case(vec![("x-powered-by", "PHP/8.1.2")], "", "mysql")]
    #[case(vec![("server", "Werkzeug/2.3 Python/3.11")], "", "jinja2")]
    #[case(vec![], "ORA-00933: SQL command not properly ended", "oracle")]
    #[case(vec![], "You have an error in your SQL syntax", "mysql")]
    #[case(vec![], "MongoServerError: bad query", "mongodb")]
    fn test_hints(
        #[case] headers: Vec<(&'static str, &'static str)>,
        #[case] body: &str,
        #[case] expected: &str,
    ) {
        let hints = TechHints::from_response(&response(headers, body, 10));
        assert!(hints.contains(expected), "{:?}", hints);
    }

    #[test]
    fn test_no_hints_on_plain_response() {
        let hints = TechHints::from_response(&response(vec![], "<html>hello</html>", 10));
        assert!(hints.is_empty());
    }

    #[test]
    fn test_baseline_median_and_merged_hints() {
        let responses = vec![
            response(vec![("server", "Microsoft-IIS/10.0")], "", 100),
            response(vec![], "ORA-01756", 300),
            response(vec![], "", 200),
        ];
        let baseline = Baseline::from_responses(&responses);
        assert_eq!(baseline.median_ms, Some(200.0));
        assert_eq!(baseline.samples_ms, vec![100.0, 300.0, 200.0]);
        assert!(baseline.hints.matches_any(&["oracle"]));
        assert!(baseline.hints.contains("windows"));
    }

    #[test]
    fn test_empty_baseline() {
        let baseline = Baseline::from_responses(&[]);
        assert_eq!(baseline.median_ms, None);
        assert!(baseline.hints.is_empty());
    }
}
