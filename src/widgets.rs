// ripestat-text - Text Widgets
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Text widgets: small renderers that turn one data call into display lines
//!
//! Widgets are looked up by name in a static table. Any name without a
//! dedicated renderer falls back to [`data_call::render`], which shows the
//! raw payload of the data call with the same name.

pub mod announced_prefixes;
pub mod as_overview;
pub mod data_call;
pub mod geoloc;
pub mod object_browser;
pub mod prefix_overview;
pub mod registry;
pub mod resource_overview;
pub mod routing_history;
pub mod routing_status;

use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::api::{ DataResponse, DataService };
use crate::core::{ LineItem, Query, StatError, StatResult };

pub use registry::{ GROUPS, WidgetGroup, WidgetSpec, list_widgets, lookup, resolve };

pub type WidgetFuture = BoxFuture<'static, StatResult<WidgetOutput>>;
pub type WidgetFn = fn(Arc<dyn DataService>, Arc<Query>) -> WidgetFuture;

/// Lines produced by a widget plus the response they came from, which the
/// executor reads query times and metadata from
#[derive(Debug, Clone, Default)]
pub struct WidgetOutput {
    pub response: Option<DataResponse>,
    pub lines: Vec<LineItem>,
}

impl WidgetOutput {
    pub fn new(response: DataResponse, lines: Vec<LineItem>) -> Self {
        Self { response: Some(response), lines }
    }

    pub fn lines_only(lines: Vec<LineItem>) -> Self {
        Self { response: None, lines }
    }
}

/// A resolved widget, ready to run
#[derive(Clone)]
pub enum Widget {
    Builtin(WidgetFn),
    /// No dedicated renderer: show the data call of this name directly
    DataCall(String),
}

impl Widget {
    pub fn run(self, service: Arc<dyn DataService>, query: Arc<Query>) -> WidgetFuture {
        match self {
            Widget::Builtin(widget) => widget(service, query),
            Widget::DataCall(name) => Box::pin(data_call::render(name, service, query)),
        }
    }
}

/// Payload field that a widget cannot do without
pub(crate) fn field<'a>(response: &'a DataResponse, key: &str) -> StatResult<&'a Value> {
    match response.data.get(key) {
        Some(Value::Null) | None => Err(StatError::Render(format!("'{}' missing from response", key))),
        Some(value) => Ok(value),
    }
}

/// Walk nested keys below `value`
pub(crate) fn nested<'a>(value: &'a Value, keys: &[&str]) -> StatResult<&'a Value> {
    keys.iter().try_fold(value, |current, key| {
        current.get(*key).ok_or_else(|| StatError::Render(format!("'{}' missing from response", key)))
    })
}

pub(crate) fn number(value: &Value) -> StatResult<f64> {
    value.as_f64().ok_or_else(|| StatError::Render(format!("expected a number, got {}", value)))
}

pub(crate) fn array(value: &Value) -> StatResult<&Vec<Value>> {
    value.as_array().ok_or_else(|| StatError::Render(format!("expected a list, got {}", value)))
}

/// Truthiness in the loose sense the data API uses: null, false, 0, "" and
/// empty collections are all "not set"
pub(crate) fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
