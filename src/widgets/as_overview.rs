// ripestat-text - AS Overview Widget
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::sync::Arc;

use crate::api::DataService;
use crate::core::{ LineItem, Query, StatResult, value_to_text };

use super::{ WidgetFuture, WidgetOutput, field, is_set };

pub fn widget(service: Arc<dyn DataService>, query: Arc<Query>) -> WidgetFuture {
    Box::pin(render(service, query))
}

pub async fn render(service: Arc<dyn DataService>, query: Arc<Query>) -> StatResult<WidgetOutput> {
    let response = service.fetch_data("as-overview", &query, Some(0)).await?;

    let announced = if is_set(response.get("announced")) { "yes" } else { "no" };
    let mut lines = vec![
        LineItem::kv("as-overview", value_to_text(field(&response, "resource")?)),
        LineItem::kv("announced", announced)
    ];

    let holder = response.get("holder");
    if is_set(holder) {
        lines.push(LineItem::kv("description", value_to_text(holder)));
    }
    let block = response.get("block");
    if is_set(block) {
        lines.push(
            LineItem::kv(
                "part-of",
                format!("{}: {}", value_to_text(&block["resources"]), value_to_text(&block["name"]))
            )
        );
    }

    Ok(WidgetOutput::new(response, lines))
}
