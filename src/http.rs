// File: http.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::config::ScanConfig;
use crate::errors::{ProbeError, ScanError};
use crate::getstate::ScanState;
use crate::httpinner::HttpInner;
use governor::{clock::DefaultClock, state::InMemoryState, state::NotKeyed, Quota, RateLimiter};
use log::trace;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

const MAX_REDIRECTS: usize = 5;

/// A request a probe sends: the target URL, and a form body for POST points.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeRequest {
    pub url: Url,
    pub form_body: Option<String>,
}

impl ProbeRequest {
    pub fn get(url: Url) -> Self {
        Self {
            url,
            form_body: None,
        }
    }

    pub fn post_form(url: Url, body: String) -> Self {
        Self {
            url,
            form_body: Some(body),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Http {
    state_ptr: Arc<ScanState>,
    rate_limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    client: reqwest::Client,
    timeout: Duration,
}

impl Http {
    pub fn new(state_ptr: Arc<ScanState>, config: &ScanConfig) -> Result<Self, ScanError> {
        let timeout = Duration::from_secs(config.timeout().max(1));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let rate_limit = NonZeroU32::new(config.rate_limit()).unwrap_or(NonZeroU32::MIN);

        Ok(Http {
            state_ptr,
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_second(rate_limit))),
            client,
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn state(&self) -> &Arc<ScanState> {
        &self.state_ptr
    }

    /// Sends one request and measures the wall-clock time from the moment the
    /// rate limiter lets it through until the body is read.
    pub async fn send(&self, request: &ProbeRequest) -> Result<HttpInner, ProbeError> {
        self.rate_limiter.until_ready().await;

        let builder = match &request.form_body {
            Some(body) => self
                .client
                .post(request.url.clone())
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(body.clone()),
            None => self.client.get(request.url.clone()),
        };

        let start = Instant::now();
        let response = builder.send().await;

        let result = match response {
            Ok(resp) => {
                let url = resp.url().to_string();
                let status = resp.status().as_u16();
                let headers: HeaderMap = resp.headers().clone();
                match resp.text().await {
                    Ok(body) => Ok(HttpInner::new_with_all(
                        headers,
                        body,
                        status,
                        url,
                        start.elapsed(),
                    )),
                    Err(e) => Err(classify_error(&e, start.elapsed())),
                }
            }
            Err(e) => Err(classify_error(&e, start.elapsed())),
        };

        match &result {
            Ok(inner) => {
                self.state_ptr.add_success();
                trace!("{} -> {} in {:?}", request.url, inner.status(), inner.elapsed());
            }
            Err(e) => {
                self.state_ptr.add_failure();
                trace!("{} failed: {}", request.url, e);
            }
        }
        result
    }

    pub async fn fetch(&self, url: &Url) -> Result<HttpInner, ProbeError> {
        self.send(&ProbeRequest::get(url.clone())).await
    }
}

/// Maps a client error onto the probe error taxonomy.
pub fn classify_error(error: &reqwest::Error, elapsed: Duration) -> ProbeError {
    if error.is_timeout() {
        ProbeError::Timeout { elapsed }
    } else if error.is_connect() {
        ProbeError::Unreachable(error.to_string())
    } else {
        ProbeError::Transport(error.to_string())
    }
}
