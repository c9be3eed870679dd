// ripestat-text - In-Memory Data Service for Tests
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{ Value, json };

use super::DataService;
use super::types::{ DataResponse, check_version };
use crate::core::{ Query, StatError, StatResult };

#[derive(Clone)]
enum Outcome {
    Data(Value),
    Service(u16, Vec<String>),
    Malformed,
}

#[derive(Clone)]
struct CannedCall {
    delay: Duration,
    outcome: Outcome,
}

/// Canned responses per data call, each with an optional delay
#[derive(Default)]
pub struct MockService {
    calls: HashMap<String, CannedCall>,
    raw: HashMap<String, Vec<u8>>,
    seen: Mutex<Vec<String>>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to `call` with `data` wrapped in a version 1.0 envelope
    pub fn with_data(self, call: &str, data: Value) -> Self {
        self.with_delayed_data(call, Duration::ZERO, data)
    }

    pub fn with_delayed_data(mut self, call: &str, delay: Duration, data: Value) -> Self {
        let envelope =
            json!({
            "status": "ok",
            "version": "1.0",
            "data_call_name": call,
            "cached": false,
            "messages": [],
            "data": data,
        });
        self.calls.insert(call.to_string(), CannedCall { delay, outcome: Outcome::Data(envelope) });
        self
    }

    /// Respond with a full response body (metadata included)
    pub fn with_envelope(mut self, call: &str, envelope: Value) -> Self {
        self.calls.insert(call.to_string(), CannedCall {
            delay: Duration::ZERO,
            outcome: Outcome::Data(envelope),
        });
        self
    }

    pub fn with_service_error(mut self, call: &str, status: u16, messages: &[&str]) -> Self {
        let messages = messages
            .iter()
            .map(|m| m.to_string())
            .collect();
        self.calls.insert(call.to_string(), CannedCall {
            delay: Duration::ZERO,
            outcome: Outcome::Service(status, messages),
        });
        self
    }

    /// Respond with a payload that no widget can make sense of
    pub fn with_malformed(mut self, call: &str) -> Self {
        self.calls.insert(call.to_string(), CannedCall {
            delay: Duration::ZERO,
            outcome: Outcome::Malformed,
        });
        self
    }

    pub fn with_raw(mut self, path: &str, body: &str) -> Self {
        self.raw.insert(path.to_string(), body.as_bytes().to_vec());
        self
    }

    /// Data calls requested so far, in request order
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl DataService for MockService {
    async fn fetch_data(
        &self,
        call: &str,
        _query: &Query,
        expected_major: Option<u32>
    ) -> StatResult<DataResponse> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(call.to_string());
        }

        let Some(canned) = self.calls.get(call).cloned() else {
            return Err(StatError::Service {
                status: 404,
                messages: vec![format!("Unknown data call '{}'", call)],
            });
        };

        if !canned.delay.is_zero() {
            tokio::time::sleep(canned.delay).await;
        }

        match canned.outcome {
            Outcome::Data(envelope) => {
                let response = DataResponse::from_value(envelope)?;
                check_version(call, &response, expected_major)?;
                Ok(response)
            }
            Outcome::Service(status, messages) => Err(StatError::Service { status, messages }),
            Outcome::Malformed => {
                let response = DataResponse::from_value(json!({"version": "1.0", "data": {}}))?;
                Ok(response)
            }
        }
    }

    async fn fetch_raw(&self, path: &str, _query: Option<&Query>) -> StatResult<Vec<u8>> {
        self.raw.get(path).cloned().ok_or_else(|| StatError::Service {
            status: 404,
            messages: vec![format!("Not found: {}", path)],
        })
    }
}
