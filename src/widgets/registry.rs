// ripestat-text - Widget Registry
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::config::DEFAULT_WIDGET_GROUP;
use crate::core::{ ResourceType, StatError, StatResult, simple_table };

use super::{
    Widget,
    WidgetFn,
    announced_prefixes,
    as_overview,
    geoloc,
    object_browser,
    prefix_overview,
    resource_overview,
    routing_history,
    routing_status,
};

#[derive(Debug)]
pub struct WidgetSpec {
    pub name: &'static str,
    pub resource_types: &'static [ResourceType],
}

#[derive(Debug)]
pub struct WidgetGroup {
    pub name: &'static str,
    pub widgets: &'static [WidgetSpec],
}

use ResourceType::{ Asn, Ip };

pub static GROUPS: &[WidgetGroup] = &[
    WidgetGroup {
        name: "at-a-glance",
        widgets: &[
            WidgetSpec { name: "as-overview", resource_types: &[Asn] },
            WidgetSpec { name: "prefix-overview", resource_types: &[Ip] },
            WidgetSpec { name: "geoloc", resource_types: &[Ip, Asn] },
            WidgetSpec { name: "object-browser", resource_types: &[Ip, Asn] },
            WidgetSpec { name: "routing-status", resource_types: &[Ip, Asn] },
        ],
    },
];

static BUILTINS: &[(&str, WidgetFn)] = &[
    ("announced-prefixes", announced_prefixes::widget),
    ("as-overview", as_overview::widget),
    ("geoloc", geoloc::widget),
    ("object-browser", object_browser::widget),
    ("prefix-overview", prefix_overview::widget),
    ("resource-overview", resource_overview::widget),
    ("routing-history", routing_history::widget),
    ("routing-status", routing_status::widget),
];

/// Expand a comma separated list of widgets and `@groups` into widget names.
///
/// Group members are filtered by `resource_type`; plain names are passed
/// through unchecked. An empty list means the default group.
pub fn resolve(spec: &str, resource_type: Option<ResourceType>) -> StatResult<Vec<String>> {
    let mut tokens: Vec<&str> = spec
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        tokens.push(DEFAULT_WIDGET_GROUP);
    }

    let mut names = Vec::new();
    for token in tokens {
        match token.strip_prefix('@') {
            Some(group_name) => {
                let group = find_group(group_name).ok_or_else(||
                    StatError::UnknownGroup(token.to_string())
                )?;
                names.extend(
                    group.widgets
                        .iter()
                        .filter(|w| resource_type.is_some_and(|t| w.resource_types.contains(&t)))
                        .map(|w| w.name.to_string())
                );
            }
            None => names.push(token.to_string()),
        }
    }
    Ok(names)
}

pub fn find_group(name: &str) -> Option<&'static WidgetGroup> {
    GROUPS.iter().find(|g| g.name.eq_ignore_ascii_case(name))
}

/// Widget for `name`, falling back to a direct rendering of the data call
pub fn lookup(name: &str) -> Widget {
    let normalized = name.to_lowercase().replace(['_', ' '], "-");
    BUILTINS.iter()
        .find(|(builtin, _)| *builtin == normalized)
        .map(|(_, widget)| Widget::Builtin(*widget))
        .unwrap_or_else(|| Widget::DataCall(name.to_string()))
}

/// Lines for `--list-widgets`
pub fn list_widgets() -> Vec<String> {
    let mut rows: Vec<Vec<String>> = GROUPS.iter()
        .flat_map(|g| g.widgets.iter())
        .map(|w| {
            let types = w.resource_types
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(",");
            vec![w.name.to_string(), types]
        })
        .collect();
    rows.sort();
    rows.dedup();

    let mut lines = vec!["% widgets".to_string()];
    lines.extend(simple_table(&rows));
    lines.push(String::new());
    lines.push("% widget groups".to_string());
    for group in GROUPS {
        let members = group.widgets
            .iter()
            .map(|w| w.name)
            .collect::<Vec<_>>()
            .join(",");
        lines.push(format!("@{}    {}", group.name, members));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_group_for_asn() {
        let names = resolve("", Some(ResourceType::Asn)).unwrap();
        assert_eq!(names, vec!["as-overview", "geoloc", "object-browser", "routing-status"]);
    }

    #[test]
    fn test_default_group_for_ip() {
        let names = resolve("", Some(ResourceType::Ip)).unwrap();
        assert_eq!(names, vec!["prefix-overview", "geoloc", "object-browser", "routing-status"]);
    }

    #[test]
    fn test_no_resource_filters_everything() {
        assert!(resolve("", None).unwrap().is_empty());
        assert!(resolve("@at-a-glance", Some(ResourceType::Unknown)).unwrap().is_empty());
    }

    #[test]
    fn test_mixed_spec_keeps_order_and_duplicates() {
        let names = resolve("geoloc,@AT-A-GLANCE,whois,geoloc", Some(ResourceType::Asn)).unwrap();
        assert_eq!(
            names,
            vec![
                "geoloc",
                "as-overview",
                "geoloc",
                "object-browser",
                "routing-status",
                "whois",
                "geoloc"
            ]
        );
    }

    #[test]
    fn test_unknown_group() {
        let err = resolve("geoloc,@nope", Some(ResourceType::Ip)).unwrap_err();
        assert!(matches!(err, StatError::UnknownGroup(ref g) if g == "@nope"));
        assert_eq!(err.to_string(), "No such widget group: @nope");
    }

    #[test]
    fn test_lookup_builtin_and_fallback() {
        assert!(matches!(lookup("geoloc"), Widget::Builtin(_)));
        assert!(matches!(lookup("Routing_Status"), Widget::Builtin(_)));
        assert!(matches!(lookup("whois"), Widget::DataCall(ref n) if n == "whois"));
    }

    #[test]
    fn test_list_widgets() {
        let lines = list_widgets();
        assert_eq!(lines[0], "% widgets");
        assert!(lines[1].starts_with("as-overview"));
        assert!(lines.contains(&"% widget groups".to_string()));
        assert_eq!(
            lines.last().unwrap(),
            "@at-a-glance    as-overview,prefix-overview,geoloc,object-browser,routing-status"
        );
    }
}
