// ripestat-text - Routing Status Widget
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::sync::Arc;

use crate::api::DataService;
use crate::core::{ LineItem, Query, StatResult, value_to_text };

use super::{ WidgetFuture, WidgetOutput, field, nested, number };

pub fn widget(service: Arc<dyn DataService>, query: Arc<Query>) -> WidgetFuture {
    Box::pin(render(service, query))
}

pub async fn render(service: Arc<dyn DataService>, query: Arc<Query>) -> StatResult<WidgetOutput> {
    let response = service.fetch_data("routing-status", &query, Some(1)).await?;
    let data = |key: &str| field(&response, key).map(value_to_text);

    let visibility = field(&response, "visibility")?;
    let seeing = number(nested(visibility, &["ris_peers_seeing"])?)?;
    let total = number(nested(visibility, &["total_ris_peers"])?)?;
    let percent = if total > 0.0 { (seeing / total) * 100.0 } else { 0.0 };

    let v6_48s = number(field(&response, "announced_v6_48s")?)?;
    let plural = if v6_48s > 1.0 { "s" } else { "" };

    let lines = vec![
        LineItem::kv("routing-status", data("resource")?),
        LineItem::kv(
            "visibility",
            format!(
                "{:.0}%    {} of {} full peers",
                percent,
                value_to_text(&visibility["ris_peers_seeing"]),
                value_to_text(&visibility["total_ris_peers"])
            )
        ),
        LineItem::kv(
            "first-seen",
            value_to_text(nested(field(&response, "first_seen")?, &["time"])?)
        ),
        LineItem::kv(
            "announced-v4",
            format!(
                "{} prefixes; {} IPs",
                data("announced_v4_prefixes")?,
                data("announced_v4_ips")?
            )
        ),
        LineItem::kv(
            "announced-v6",
            format!(
                "{} prefixes; equivalent to {} /48{}",
                data("announced_v6_prefixes")?,
                data("announced_v6_48s")?,
                plural
            )
        ),
        LineItem::kv("bgp-neighbours", value_to_text(response.get("observed_neighbours")))
    ];

    Ok(WidgetOutput::new(response, lines))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockService;
    use crate::widgets::test_support::{ kv, run };
    use serde_json::{ Value, json };

    fn payload(seeing: u32, total: u32, v6_48s: u32) -> Value {
        json!({
            "resource": "193.0.0.0/21",
            "visibility": {"ris_peers_seeing": seeing, "total_ris_peers": total},
            "first_seen": {"time": "2000-08-18T08:00:00", "origin": "3333"},
            "announced_v4_prefixes": 1,
            "announced_v4_ips": 2048,
            "announced_v6_prefixes": 0,
            "announced_v6_48s": v6_48s,
            "observed_neighbours": 112
        })
    }

    #[tokio::test]
    async fn test_routing_status_lines() {
        let service = MockService::new().with_data("routing-status", payload(98, 100, 0));
        let output = run(widget, service, &["193.0.0.0/21"]).await.unwrap();
        assert_eq!(
            output.lines,
            vec![
                kv("routing-status", "193.0.0.0/21"),
                kv("visibility", "98%    98 of 100 full peers"),
                kv("first-seen", "2000-08-18T08:00:00"),
                kv("announced-v4", "1 prefixes; 2048 IPs"),
                kv("announced-v6", "0 prefixes; equivalent to 0 /48"),
                kv("bgp-neighbours", "112")
            ]
        );
    }

    #[tokio::test]
    async fn test_no_peers_and_plural_48s() {
        let service = MockService::new().with_data("routing-status", payload(0, 0, 65536));
        let output = run(widget, service, &["AS3333"]).await.unwrap();
        assert_eq!(output.lines[1], kv("visibility", "0%    0 of 0 full peers"));
        assert_eq!(output.lines[4], kv("announced-v6", "0 prefixes; equivalent to 65536 /48s"));
    }
}
