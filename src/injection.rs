// File: injection.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::http::ProbeRequest;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use url::form_urlencoded;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Location {
    Query,
    Form,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Query => write!(f, "query"),
            Location::Form => write!(f, "form"),
        }
    }
}

/// A single parameter of a request that a rule may tamper with.
#[derive(Debug, Clone, PartialEq)]
pub struct InjectionPoint {
    target: Url,
    form_body: Option<String>,
    location: Location,
    index: usize,
    name: String,
    original: String,
}

impl InjectionPoint {
    /// Lists every query parameter of `target` and, when a form body is
    /// given, every form field. `filter` keeps only matching parameter names.
    pub fn discover(target: &Url, form_body: Option<&str>, filter: Option<&Regex>) -> Vec<Self> {
        let keep = |name: &str| filter.map_or(true, |re| re.is_match(name));
        let mut points = Vec::new();

        for (index, (name, value)) in query_pairs(target).into_iter().enumerate() {
            if keep(name.as_str()) {
                points.push(Self {
                    target: target.clone(),
                    form_body: form_body.map(str::to_string),
                    location: Location::Query,
                    index,
                    name,
                    original: value,
                });
            }
        }

        if let Some(body) = form_body {
            for (index, (name, value)) in form_pairs(body).into_iter().enumerate() {
                if keep(name.as_str()) {
                    points.push(Self {
                        target: target.clone(),
                        form_body: Some(body.to_string()),
                        location: Location::Form,
                        index,
                        name,
                        original: value,
                    });
                }
            }
        }

        points
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    /// The request with `payload` appended to the original parameter value.
    pub fn request_with(&self, payload: &str) -> ProbeRequest {
        let value = format!("{}{}", self.original, payload);
        let mut url = self.target.clone();
        let mut body = self.form_body.clone();

        match self.location {
            Location::Query => {
                let pairs = replace_pair(query_pairs(&self.target), self.index, &value);
                url.query_pairs_mut().clear().extend_pairs(pairs);
            }
            Location::Form => {
                let original = self.form_body.as_deref().unwrap_or_default();
                let pairs = replace_pair(form_pairs(original), self.index, &value);
                body = Some(
                    form_urlencoded::Serializer::new(String::new())
                        .extend_pairs(pairs)
                        .finish(),
                );
            }
        }

        match body {
            Some(body) => ProbeRequest::post_form(url, body),
            None => ProbeRequest::get(url),
        }
    }
}

impl fmt::Display for InjectionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} '{}'", self.target, self.location, self.name)
    }
}

fn query_pairs(url: &Url) -> Vec<(String, String)> {
    url.query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn form_pairs(body: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(body.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn replace_pair(mut pairs: Vec<(String, String)>, index: usize, value: &str) -> Vec<(String, String)> {
    if let Some(pair) = pairs.get_mut(index) {
        pair.1 = value.to_string();
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_discover_query_parameters() {
        let points = InjectionPoint::discover(&url("http://t.test/p?id=1&name=bob"), None, None);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].name(), "id");
        assert_eq!(points[0].original(), "1");
        assert_eq!(points[1].name(), "name");
        assert_eq!(points[1].location(), Location::Query);
    }

    #[test]
    fn test_discover_with_filter() {
        let filter = Regex::new("^id$").unwrap();
        let points =
            InjectionPoint::discover(&url("http://t.test/p?id=1&name=bob"), None, Some(&filter));
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].name(), "id");
    }

    #[test]
    fn test_discover_none_without_parameters() {
        assert!(InjectionPoint::discover(&url("http://t.test/"), None, None).is_empty());
    }

    #[test]
    fn test_request_with_appends_payload_and_keeps_others() {
        let points = InjectionPoint::discover(&url("http://t.test/p?id=1&name=bob"), None, None);
        let request = points[0].request_with("' AND SLEEP(5)-- ");

        let pairs: Vec<(String, String)> = query_pairs(&request.url);
        assert_eq!(pairs[0], ("id".to_string(), "1' AND SLEEP(5)-- ".to_string()));
        assert_eq!(pairs[1], ("name".to_string(), "bob".to_string()));
        assert!(request.form_body.is_none());
    }

    #[test]
    fn test_duplicate_names_replace_only_their_own_slot() {
        let points = InjectionPoint::discover(&url("http://t.test/?a=1&a=2"), None, None);
        let request = points[1].request_with("x");
        let pairs = query_pairs(&request.url);
        assert_eq!(pairs[0].1, "1");
        assert_eq!(pairs[1].1, "2x");
    }

    #[test]
    fn test_form_points() {
        let points =
            InjectionPoint::discover(&url("http://t.test/login"), Some("user=a&pass=b"), None);
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].location(), Location::Form);

        let request = points[1].request_with(";sleep 5");
        let body = request.form_body.unwrap();
        let pairs = form_pairs(&body);
        assert_eq!(pairs[0], ("user".to_string(), "a".to_string()));
        assert_eq!(pairs[1], ("pass".to_string(), "b;sleep 5".to_string()));
    }

    #[test]
    fn test_query_point_keeps_form_body() {
        let points =
            InjectionPoint::discover(&url("http://t.test/?q=1"), Some("user=a"), None);
        let request = points[0].request_with("x");
        assert_eq!(request.form_body.as_deref(), Some("user=a"));
        assert_eq!(query_pairs(&request.url)[0].1, "1x");
    }

    #[test]
    fn test_display() {
        let points = InjectionPoint::discover(&url("http://t.test/p?id=1"), None, None);
        assert_eq!(points[0].to_string(), "http://t.test/p?id=1 query 'id'");
    }
}
