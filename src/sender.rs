// File: sender.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::errors::ProbeError;
use crate::http::{Http, ProbeRequest};
use crate::injection::InjectionPoint;
use crate::rules::payload::PayloadTemplate;
use crate::timing::RequestSender;
use log::trace;
use serde::Serialize;
use std::sync::Arc;
use tokio::runtime::Handle;

/// Performs one blocking round trip and reports elapsed seconds.
pub trait Transport: Send + Sync {
    fn round_trip(&self, request: &ProbeRequest) -> Result<f64, ProbeError>;
}

impl<F> Transport for F
where
    F: Fn(&ProbeRequest) -> Result<f64, ProbeError> + Send + Sync,
{
    fn round_trip(&self, request: &ProbeRequest) -> Result<f64, ProbeError> {
        self(request)
    }
}

/// Drives the async client from a blocking worker thread.
///
/// Must be used from `spawn_blocking` or a plain thread; `block_on` panics
/// inside an async task.
#[derive(Debug, Clone)]
pub struct BlockingHttp {
    http: Arc<Http>,
    handle: Handle,
}

impl BlockingHttp {
    pub fn new(http: Arc<Http>, handle: Handle) -> Self {
        Self { http, handle }
    }
}

impl Transport for BlockingHttp {
    fn round_trip(&self, request: &ProbeRequest) -> Result<f64, ProbeError> {
        let response = self.handle.block_on(self.http.send(request))?;
        Ok(response.elapsed_secs())
    }
}

/// A rendered payload and the delay it asked for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentPayload {
    pub requested_delay: f64,
    pub payload: String,
}

/// Binds a payload template to one injection point.
pub struct PayloadSender<'a> {
    transport: &'a dyn Transport,
    point: &'a InjectionPoint,
    template: PayloadTemplate,
    sent: Vec<SentPayload>,
}

impl<'a> PayloadSender<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        point: &'a InjectionPoint,
        template: PayloadTemplate,
    ) -> Self {
        Self {
            transport,
            point,
            template,
            sent: Vec::new(),
        }
    }

    /// Rendered payloads in send order, failed probes included.
    pub fn into_sent(self) -> Vec<SentPayload> {
        self.sent
    }
}

impl RequestSender for PayloadSender<'_> {
    fn send(&mut self, requested_delay: f64) -> Result<f64, ProbeError> {
        let payload = self.template.render(requested_delay);
        trace!("{}: sending {:?}", self.point, payload);
        let request = self.point.request_with(&payload);
        self.sent.push(SentPayload {
            requested_delay,
            payload,
        });
        self.transport.round_trip(&request)
    }
}
