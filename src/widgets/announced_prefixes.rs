// ripestat-text - Announced Prefixes Widget
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::sync::Arc;

use crate::api::DataService;
use crate::core::{ LineItem, Query, StatResult, value_to_text };

use super::{ WidgetFuture, WidgetOutput, array, field, nested };

pub fn widget(service: Arc<dyn DataService>, query: Arc<Query>) -> WidgetFuture {
    Box::pin(render(service, query))
}

pub async fn render(service: Arc<dyn DataService>, query: Arc<Query>) -> StatResult<WidgetOutput> {
    let response = service.fetch_data("announced-prefixes", &query, Some(1)).await?;

    let mut prefixes = array(field(&response, "prefixes")?)?
        .iter()
        .map(|p| nested(p, &["prefix"]).map(value_to_text))
        .collect::<StatResult<Vec<_>>>()?;
    prefixes.sort();

    let mut lines = vec![
        LineItem::kv("announced-prefixes", value_to_text(field(&response, "resource")?))
    ];
    lines.extend(prefixes.into_iter().map(|p| LineItem::kv("prefix", p)));

    Ok(WidgetOutput::new(response, lines))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockService;
    use crate::widgets::test_support::{ kv, run };
    use serde_json::json;

    #[tokio::test]
    async fn test_prefixes_sorted() {
        let service = MockService::new().with_data(
            "announced-prefixes",
            json!({
                "resource": "3333",
                "prefixes": [
                    {"prefix": "2001:67c:2e8::/48", "timelines": []},
                    {"prefix": "193.0.0.0/21", "timelines": []}
                ]
            })
        );
        let output = run(widget, service, &["AS3333"]).await.unwrap();
        assert_eq!(
            output.lines,
            vec![
                kv("announced-prefixes", "3333"),
                kv("prefix", "193.0.0.0/21"),
                kv("prefix", "2001:67c:2e8::/48")
            ]
        );
    }
}
