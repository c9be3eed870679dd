// ripestat-text - Resource Overview Widget
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Prefix or AS overview, whichever fits the queried resource

use std::sync::Arc;

use crate::api::DataService;
use crate::core::{ LineItem, Query, ResourceType, StatResult };

use super::{ WidgetFuture, WidgetOutput, as_overview, prefix_overview };

pub fn widget(service: Arc<dyn DataService>, query: Arc<Query>) -> WidgetFuture {
    Box::pin(render(service, query))
}

pub async fn render(service: Arc<dyn DataService>, query: Arc<Query>) -> StatResult<WidgetOutput> {
    match query.resource_type() {
        Some(ResourceType::Asn) => as_overview::render(service, query).await,
        Some(ResourceType::Ip) => prefix_overview::render(service, query).await,
        _ => Ok(WidgetOutput::lines_only(vec![
            LineItem::text("This widget supports ASN and IP resources")
        ])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockService;
    use crate::widgets::test_support::run;
    use serde_json::json;

    #[tokio::test]
    async fn test_dispatches_on_resource_type() {
        let service = MockService::new().with_data(
            "prefix-overview",
            json!({"resource": "193.0.0.0/21", "announced": false})
        );
        let output = run(widget, service, &["193.0.0.0/21"]).await.unwrap();
        assert_eq!(output.lines[0], LineItem::kv("prefix-overview", "193.0.0.0/21"));
    }

    #[tokio::test]
    async fn test_unsupported_resource() {
        let output = run(widget, MockService::new(), &["ripe-ncc"]).await.unwrap();
        assert_eq!(
            output.lines,
            vec![LineItem::text("This widget supports ASN and IP resources")]
        );
        assert!(output.response.is_none());
    }
}
