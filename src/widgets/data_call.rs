// ripestat-text - Default Data Call Widget
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Fallback for widget names without a dedicated renderer: a direct
//! key/value translation of the data call response

use std::sync::Arc;

use crate::api::DataService;
use crate::core::{ LineItem, Query, RESOURCE_KEY, StatResult, flatten_value, value_to_text };

use super::WidgetOutput;

const CONTRIBUTE_URL: &str = "https://github.com/RIPE-NCC/ripestat-text";

pub async fn render(
    name: String,
    service: Arc<dyn DataService>,
    query: Arc<Query>
) -> StatResult<WidgetOutput> {
    let response = service.fetch_data(&name, &query, None).await?;

    let mut lines = vec![
        LineItem::text(
            format!(
                "% '{}' doesn't have a command-line widget yet. Below is a direct translation of the data response.",
                name
            )
        ),
        LineItem::text(format!("% You can contribute a widget at {}", CONTRIBUTE_URL))
    ];

    let mut data = response.data.clone();
    if let Some(resource) = data.remove(RESOURCE_KEY) {
        let resource = value_to_text(&resource);
        if !resource.is_empty() {
            lines.push(LineItem::kv(name.as_str(), resource));
        }
    }

    let mut entries: Vec<_> = data.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    for (key, value) in &entries {
        lines.extend(flatten_value(key, value));
    }

    Ok(WidgetOutput::new(response, lines))
}
