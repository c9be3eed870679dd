// ripestat-text - Prefix Overview Widget
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
    let response = service.fetch_data("prefix-overview", &query, None).await?;

    let mut lines = vec![
        LineItem::kv("prefix-overview", value_to_text(field(&response, "resource")?))
    ];

    let block = response.get("block");
    if is_set(block) && is_set(&block["resources"]) {
        lines.push(
            LineItem::kv(
                "part-of",
                format!("{}: {}", value_to_text(&block["resources"]), value_to_text(&block["name"]))
            )
        );
    }

    if is_set(response.get("announced")) {
        let origin = format!(
            "{} [{}]",
            value_to_text(response.get("asn")),
            value_to_text(response.get("holder"))
        );
        lines.push(LineItem::kv("announced", "yes"));
        lines.push(LineItem::kv("announced-by", origin));
    } else {
        lines.push(LineItem::kv("announced", "no"));
    }

    Ok(WidgetOutput::new(response, lines))
}
