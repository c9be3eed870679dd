// ripestat-text - Data Service Types
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

use serde_json::{ Map, Value };

use crate::core::{ StatError, StatResult };

/// A data call response split into its `data` payload and everything else
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataResponse {
    pub data: Map<String, Value>,
    pub meta: Map<String, Value>,
}

impl DataResponse {
    pub fn from_value(value: Value) -> StatResult<Self> {
        let mut meta = match value {
            Value::Object(map) => map,
            other => {
                return Err(StatError::Render(format!("response is not an object: {}", other)));
            }
        };

        let data = match meta.remove("data") {
            Some(Value::Object(data)) => data,
            Some(Value::Null) | None => Map::new(),
            Some(other) => {
                return Err(StatError::Render(format!("response data is not an object: {}", other)));
            }
        };

        Ok(Self { data, meta })
    }

    /// Field of the payload, `Value::Null` when absent
    pub fn get(&self, key: &str) -> &Value {
        self.data.get(key).unwrap_or(&Value::Null)
    }

    /// `(level, text)` pairs from the `messages` metadata field
    pub fn messages(&self) -> Vec<(String, String)> {
        self.meta
            .get("messages")
            .and_then(Value::as_array)
            .map(|messages| {
                messages
                    .iter()
                    .filter_map(|m| {
                        let pair = m.as_array()?;
                        let level = pair.first()?.as_str()?;
                        let text = pair.get(1)?.as_str()?;
                        Some((level.to_string(), text.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_cached(&self) -> bool {
        self.meta.get("cached").and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn version(&self) -> Option<&str> {
        self.meta.get("version").and_then(Value::as_str)
    }

    /// Metadata with the payload put back under `data`
    pub fn into_full_value(self) -> Value {
        let mut full = self.meta;
        full.insert("data".to_string(), Value::Object(self.data));
        Value::Object(full)
    }
}

/// Fail with `VersionMismatch` unless the response major version matches
pub fn check_version(call: &str, response: &DataResponse, expected: Option<u32>) -> StatResult<()> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let actual = response.version().unwrap_or_default();
    let major = actual.split('.').next().and_then(|m| m.parse::<u32>().ok());
    if major == Some(expected) {
        Ok(())
    } else {
        Err(StatError::VersionMismatch {
            call: call.to_string(),
            expected,
            actual: actual.to_string(),
        })
    }
}

/// Error texts from a failed response body (`messages` entries at level error)
pub fn error_messages(body: &[u8]) -> Vec<String> {
    serde_json
        ::from_slice::<Value>(body)
        .ok()
        .and_then(|v| DataResponse::from_value(v).ok())
        .map(|response| {
            response
                .messages()
                .into_iter()
                .filter(|(level, _)| level.eq_ignore_ascii_case("error"))
                .map(|(_, text)| text)
                .collect()
        })
        .unwrap_or_default()
}
