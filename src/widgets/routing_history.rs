// ripestat-text - Routing History Widget
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::sync::Arc;

use crate::api::DataService;
use crate::core::{ LineItem, Query, StatError, StatResult, simple_table, value_to_text };

use super::{ WidgetFuture, WidgetOutput, array, field, nested };

pub fn widget(service: Arc<dyn DataService>, query: Arc<Query>) -> WidgetFuture {
    Box::pin(render(service, query))
}

pub async fn render(service: Arc<dyn DataService>, query: Arc<Query>) -> StatResult<WidgetOutput> {
    let response = service.fetch_data("routing-history", &query, Some(1)).await?;

    let mut routes: Vec<Vec<String>> = Vec::new();
    for origin in array(field(&response, "by_origin")?)? {
        let asn = value_to_text(nested(origin, &["origin"])?);

        // (prefix, starttime, endtime) of each prefix's most recent timeline
        let mut latest = Vec::new();
        for prefix in array(nested(origin, &["prefixes"])?)? {
            let timeline = array(nested(prefix, &["timelines"])?)?
                .last()
                .ok_or_else(|| StatError::Render("prefix without timelines".to_string()))?;
            latest.push((
                value_to_text(nested(prefix, &["prefix"])?),
                value_to_text(nested(timeline, &["starttime"])?),
                value_to_text(nested(timeline, &["endtime"])?),
            ));
        }
        latest.sort_by(|a, b| b.2.cmp(&a.2));

        routes.extend(
            latest
                .into_iter()
                .map(|(prefix, start, end)| vec![asn.clone(), prefix, start, "to".to_string(), end])
        );
    }

    let mut lines = vec![
        LineItem::kv("routing-history", value_to_text(field(&response, "resource")?))
    ];
    lines.extend(
        simple_table(&routes)
            .into_iter()
            .map(|row| LineItem::kv("route", row))
    );

    Ok(WidgetOutput::new(response, lines))
}
