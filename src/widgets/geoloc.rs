// ripestat-text - Geolocation Widget
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::cmp::Ordering;
use std::sync::Arc;

use crate::api::DataService;
use crate::core::{ LineItem, Query, StatResult, simple_table, value_to_text };

use super::{ WidgetFuture, WidgetOutput, array, field, number };

pub fn widget(service: Arc<dyn DataService>, query: Arc<Query>) -> WidgetFuture {
    Box::pin(render(service, query))
}

pub async fn render(service: Arc<dyn DataService>, query: Arc<Query>) -> StatResult<WidgetOutput> {
    let response = service.fetch_data("geoloc", &query, Some(1)).await?;

    let mut locations = Vec::new();
    for location in array(field(&response, "locations")?)? {
        let percent = number(&location["covered_percentage"])?;
        let city = value_to_text(&location["city"]);
        let country = value_to_text(&location["country"]);
        locations.push((percent, city, country));
    }
    locations.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    let rows: Vec<Vec<String>> = locations
        .into_iter()
        .map(|(percent, city, country)| {
            let mut row = vec![
                if percent >= 0.1 { format!("{:4.1}%", percent) } else { "<0.1%".to_string() }
            ];
            match (city.is_empty(), country.is_empty()) {
                (false, false) => row.push(format!("{}, {}", city, country)),
                (false, true) => row.push(city),
                (true, false) => row.push(country),
                (true, true) => {}
            }
            row
        })
        .collect();

    let mut lines = vec![LineItem::kv("geoloc", value_to_text(field(&response, "resource")?))];
    lines.extend(
        simple_table(&rows)
            .into_iter()
            .map(|row| LineItem::kv("location", row))
    );

    Ok(WidgetOutput::new(response, lines))
}
