// ripestat-text - Whois-Style Text Rendering
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Fixed-column "key: value" rendering used for every widget block

use serde_json::Value;

/// One display line produced by a widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineItem {
    PlainText(String),
    KeyValue(String, String),
}

impl LineItem {
    pub fn text(text: impl Into<String>) -> Self {
        LineItem::PlainText(text.into())
    }

    pub fn kv(key: impl Into<String>, value: impl Into<String>) -> Self {
        LineItem::KeyValue(key.into(), value.into())
    }

    pub fn blank() -> Self {
        LineItem::PlainText(String::new())
    }
}

/// Extra columns between the longest key and the value column
const KEY_PADDING: usize = 4;

/// Render items into column-aligned lines.
///
/// The value column starts at `max(longest key, min_key_width) + 4`.
pub fn render_block(items: &[LineItem], min_key_width: Option<usize>) -> Vec<String> {
    let longest_key = items
        .iter()
        .filter_map(|item| {
            match item {
                LineItem::KeyValue(key, _) => Some(key.chars().count()),
                LineItem::PlainText(_) => None,
            }
        })
        .max()
        .unwrap_or(0)
        .max(min_key_width.unwrap_or(0));

    let width = longest_key + KEY_PADDING;
    items
        .iter()
        .map(|item| {
            match item {
                LineItem::PlainText(text) => text.clone(),
                LineItem::KeyValue(key, value) => {
                    format!("{:<width$}{}", format!("{}:", key), value, width = width)
                }
            }
        })
        .collect()
}

/// Text form of a JSON scalar as it should appear in a value column
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Flatten a nested value into dotted `parent.key.0` key/value lines.
///
/// Empty maps and lists produce nothing, and list indexes only count
/// entries that produced output.
pub fn flatten_value(parent: &str, value: &Value) -> Vec<LineItem> {
    let join = |key: &str| {
        if parent.is_empty() { key.to_string() } else { format!("{}.{}", parent, key) }
    };

    match value {
        Value::Object(map) => map
            .iter()
            .flat_map(|(k, v)| flatten_value(&join(k), v))
            .collect(),
        Value::Array(items) => {
            let mut lines = Vec::new();
            let mut non_empty = 0;
            for item in items {
                let more = flatten_value(&join(&non_empty.to_string()), item);
                if !more.is_empty() {
                    lines.extend(more);
                    non_empty += 1;
                }
            }
            lines
        }
        scalar => vec![LineItem::kv(parent, value_to_text(scalar).trim_end())],
    }
}

/// Lay out rows as left-justified columns separated by two spaces
pub fn simple_table(rows: &[Vec<String>]) -> Vec<String> {
    let mut widths: Vec<usize> = Vec::new();
    for row in rows {
        for (i, col) in row.iter().enumerate() {
            let len = col.chars().count();
            match widths.get_mut(i) {
                Some(width) => {
                    *width = (*width).max(len);
                }
                None => widths.push(len),
            }
        }
    }

    rows.iter()
        .map(|row| {
            row.iter()
                .zip(&widths)
                .map(|(col, width)| format!("{:<width$}", col, width = *width))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keys_padded_to_longest_plus_four() {
        let lines = render_block(&[LineItem::kv("a", "1"), LineItem::kv("bb", "2")], None);
        assert_eq!(lines, vec!["a:    1", "bb:   2"]);
    }

    #[test]
    fn test_plain_text_is_verbatim() {
        let lines = render_block(
            &[LineItem::text("% comment"), LineItem::blank(), LineItem::kv("key", "v")],
            None
        );
        assert_eq!(lines, vec!["% comment", "", "key:    v"]);
    }

    #[test]
    fn test_min_key_width_applies_when_keys_are_short() {
        let lines = render_block(&[LineItem::kv("a", "1")], Some(20));
        assert_eq!(lines[0].find('1'), Some(24));

        let long = "k".repeat(30);
        let lines = render_block(&[LineItem::kv(long.clone(), "1")], Some(20));
        assert_eq!(lines[0], format!("{}:   1", long));
    }

    #[test]
    fn test_flatten_nested_value() {
        let data = json!({
            "prefixes": [{"prefix": "193.0.0.0/21"}, {}, {"prefix": "2001:67c::/32"}],
            "holder": "RIPE-NCC-AS ",
            "empty": []
        });
        let lines = flatten_value("", &data);
        assert_eq!(
            lines,
            vec![
                LineItem::kv("prefixes.0.prefix", "193.0.0.0/21"),
                LineItem::kv("prefixes.1.prefix", "2001:67c::/32"),
                LineItem::kv("holder", "RIPE-NCC-AS")
            ]
        );
    }

    #[test]
    fn test_simple_table_columns() {
        let rows = vec![
            vec!["geoloc".to_string(), "ip,asn".to_string()],
            vec!["as-overview".to_string(), "asn".to_string()]
        ];
        assert_eq!(simple_table(&rows), vec!["geoloc       ip,asn", "as-overview  asn"]);
    }
}
