// ripestat-text - Object Browser Widget
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Registry objects for a resource, backed by the object-relationships call

use std::sync::Arc;

use serde_json::Value;

use crate::api::DataService;
use crate::core::{ LineItem, Query, StatResult, value_to_text };

use super::{ WidgetFuture, WidgetOutput, array, field, nested };

pub fn widget(service: Arc<dyn DataService>, query: Arc<Query>) -> WidgetFuture {
    Box::pin(render(service, query))
}

pub async fn render(service: Arc<dyn DataService>, query: Arc<Query>) -> StatResult<WidgetOutput> {
    let response = service.fetch_data("object-relationships", &query, Some(0)).await?;

    let resource = value_to_text(field(&response, "resource")?);
    let mut lines = vec![LineItem::kv("object-browser", resource.clone())];

    if let Some(database) = response.data.get("database") {
        lines.push(LineItem::kv("database", value_to_text(database)));
    }

    let objects = array(field(&response, "objects")?)?;
    if let [object] = objects.as_slice() {
        lines.push(LineItem::kv("type", value_to_text(nested(object, &["type"])?)));
        for entry in array(nested(object, &["fields"])?)? {
            let value = value_to_text(&entry["value"]);
            if value == resource {
                continue;
            }
            lines.push(LineItem::kv(value_to_text(&entry["key"]), value));
        }
        lines.push(LineItem::kv("num-versions", value_to_text(response.get("num_versions"))));
        lines.push(
            LineItem::text(format!("The ref-by- fields show which objects refer to {}", resource))
        );
        for reference in response.get("backward_refs").as_array().into_iter().flatten() {
            let primary = nested(reference, &["primary"])?;
            lines.push(
                LineItem::kv(
                    format!("ref-by-{}", value_to_text(&primary["key"])),
                    value_to_text(&primary["value"])
                )
            );
        }
    } else {
        for suggestion in response.get("suggestions").as_array().into_iter().flatten() {
            let value = suggestion.pointer("/primary/value").unwrap_or(&Value::Null);
            lines.push(LineItem::kv("suggestion", value_to_text(value)));
        }
    }

    Ok(WidgetOutput::new(response, lines))
}
