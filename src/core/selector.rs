// ripestat-text - Data Selection and Templates
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Generic helpers for poking at data call responses
//!
//! - `select`: dotted paths with `*` globs over map keys
//! - `abbreviate_lists`: keep only the first element of every list
//! - `format_template`: `{a.b.c}` style templates, one line per record

use globset::{ Glob, GlobMatcher };
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{ Map, Value };

use super::error::{ StatError, StatResult };
use super::render::value_to_text;

/// Placeholder appended to abbreviated lists; printed as `...`
pub const ELLIPSIS_MARKER: &str = "...abbreviate_lists_ELLIPSIS...";

/// Upper bound for template widths and precisions
pub const MAX_FORMAT_WIDTH: usize = 1024;

static DOT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.(\w+)").expect("static regex"));

/// Result of a selection. `Glob` marks a sequence produced by wildcard
/// matching, which further globs flatten into instead of nesting.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Value(Value),
    Glob(Vec<Value>),
}

impl Selection {
    pub fn into_value(self) -> Value {
        match self {
            Selection::Value(value) => value,
            Selection::Glob(values) => Value::Array(values),
        }
    }
}

/// Split a user supplied `a.b.*.c` path into segments
pub fn parse_path(path: &str) -> Vec<&str> {
    if path.is_empty() { Vec::new() } else { path.split('.').collect() }
}

pub fn select(data: &Value, path: &[&str]) -> StatResult<Selection> {
    let mut current = data;

    for (i, segment) in path.iter().enumerate() {
        if segment.contains('*') {
            let matcher = compile_glob(segment)?;
            let candidates: Vec<&Value> = match current {
                Value::Object(map) => map
                    .iter()
                    .filter(|(key, _)| matcher.is_match(key.as_str()))
                    .map(|(_, value)| value)
                    .collect(),
                Value::Array(items) => items.iter().collect(),
                _ => {
                    return Err(StatError::NotFound(segment.to_string()));
                }
            };

            let rest = &path[i + 1..];
            let mut flattened = Vec::new();
            for candidate in candidates {
                match select(candidate, rest)? {
                    Selection::Glob(more) => flattened.extend(more),
                    Selection::Value(value) => flattened.push(value),
                }
            }
            return Ok(Selection::Glob(flattened));
        }

        current = index(current, segment).ok_or_else(||
            StatError::NotFound(segment.to_string())
        )?;
    }

    Ok(Selection::Value(current.clone()))
}

/// Index a map by key or a list by (possibly negative) position
fn index<'a>(data: &'a Value, key: &str) -> Option<&'a Value> {
    match data {
        Value::Object(map) => map.get(key),
        Value::Array(items) => {
            let position: i64 = key.parse().ok()?;
            let position = if position < 0 { (items.len() as i64) + position } else { position };
            usize::try_from(position)
                .ok()
                .and_then(|p| items.get(p))
        }
        _ => None,
    }
}

/// Compile one `*` path segment into a matcher over map keys
fn compile_glob(segment: &str) -> StatResult<GlobMatcher> {
    Glob::new(segment)
        .map(|glob| glob.compile_matcher())
        .map_err(|e| StatError::usage(format!("Invalid selector '{}': {}", segment, e.kind())))
}

/// Recursively keep only the first element of each non-empty list
pub fn abbreviate_lists(data: &Value, insert_ellipsis: bool) -> Value {
    match data {
        Value::Array(items) if !items.is_empty() => {
            let mut abbreviated = vec![abbreviate_lists(&items[0], insert_ellipsis)];
            if insert_ellipsis {
                abbreviated.push(Value::String(ELLIPSIS_MARKER.to_string()));
            }
            Value::Array(abbreviated)
        }
        Value::Object(map) => {
            Value::Object(
                map
                    .iter()
                    .map(|(k, v)| (k.clone(), abbreviate_lists(v, insert_ellipsis)))
                    .collect()
            )
        }
        other => other.clone(),
    }
}

/// Render `data` through a template.
///
/// A list applies the template once per element, joined by newlines. A map
/// exposes its top-level keys by name; the whole value is always `{0}`.
pub fn format_template(template: &str, data: &Value) -> StatResult<String> {
    match data {
        Value::Array(items) => {
            let lines = items
                .iter()
                .map(|item| format_template(template, item))
                .collect::<StatResult<Vec<_>>>()?;
            Ok(lines.join("\n"))
        }
        Value::Object(map) => TemplateFormatter::new(data, Some(map)).format(template),
        _ => TemplateFormatter::new(data, None).format(template),
    }
}

struct TemplateFormatter<'a> {
    positional: &'a Value,
    named: Option<&'a Map<String, Value>>,
    auto_index: usize,
}

impl<'a> TemplateFormatter<'a> {
    fn new(positional: &'a Value, named: Option<&'a Map<String, Value>>) -> Self {
        Self { positional, named, auto_index: 0 }
    }

    fn format(&mut self, template: &str) -> StatResult<String> {
        let mut output = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    output.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    output.push('}');
                }
                '{' => {
                    let mut field = String::new();
                    let mut closed = false;
                    for inner in chars.by_ref() {
                        match inner {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => {
                                return Err(
                                    StatError::Template("nested replacement fields".to_string())
                                );
                            }
                            other => field.push(other),
                        }
                    }
                    if !closed {
                        return Err(StatError::Template("expected '}' before end of string".into()));
                    }
                    output.push_str(&self.replace(&field)?);
                }
                '}' => {
                    return Err(
                        StatError::Template("single '}' encountered in format string".into())
                    );
                }
                other => output.push(other),
            }
        }

        Ok(output)
    }

    /// Resolve one `field[!conversion][:spec]` replacement
    fn replace(&mut self, field: &str) -> StatResult<String> {
        let (field, spec) = match field.split_once(':') {
            Some((f, s)) => (f, s),
            None => (field, ""),
        };
        let (field, conversion) = match field.split_once('!') {
            Some((f, c)) => (f, Some(c)),
            None => (field, None),
        };

        let value = self.lookup(field)?;
        let text = match conversion {
            Some("r") => value.to_string(),
            Some("s") | None => value_to_text(value),
            Some(other) => {
                return Err(StatError::Template(format!("unknown conversion '!{}'", other)));
            }
        };
        apply_format_spec(&text, value, spec)
    }

    fn lookup(&mut self, field: &str) -> StatResult<&'a Value> {
        // `a.b.c` becomes `a[b][c]` before resolving
        let field = DOT_RE.replace_all(field, "[$1]");
        let (head, mut rest) = match field.find('[') {
            Some(pos) => (&field[..pos], &field[pos..]),
            None => (&field[..], ""),
        };

        let mut value = if head.is_empty() {
            let position = self.auto_index;
            self.auto_index += 1;
            self.positional_arg(position, &field)?
        } else if let Ok(position) = head.parse::<usize>() {
            self.positional_arg(position, &field)?
        } else {
            self.named
                .and_then(|named| named.get(head))
                .ok_or_else(|| StatError::NotFound(head.to_string()))?
        };

        while !rest.is_empty() {
            let close = rest
                .find(']')
                .filter(|_| rest.starts_with('['))
                .ok_or_else(|| StatError::Template(format!("malformed field '{}'", field)))?;
            let key = &rest[1..close];
            value = index(value, key).ok_or_else(|| StatError::NotFound(key.to_string()))?;
            rest = &rest[close + 1..];
        }

        Ok(value)
    }

    fn positional_arg(&self, position: usize, field: &str) -> StatResult<&'a Value> {
        if position == 0 {
            Ok(self.positional)
        } else {
            Err(StatError::Template(format!("positional field '{}' out of range", field)))
        }
    }
}

/// Subset of the `[[fill]align][width][.precision][type]` mini-language
fn apply_format_spec(text: &str, value: &Value, spec: &str) -> StatResult<String> {
    if spec.is_empty() {
        return Ok(text.to_string());
    }

    let chars: Vec<char> = spec.chars().collect();
    let mut i = 0;
    let mut fill = ' ';
    let mut align = None;
    if chars.len() >= 2 && matches!(chars[1], '<' | '>' | '^') {
        fill = chars[0];
        align = Some(chars[1]);
        i = 2;
    } else if matches!(chars[0], '<' | '>' | '^') {
        align = Some(chars[0]);
        i = 1;
    }

    let width_start = i;
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    let width = parse_bounded(&chars[width_start..i], "width")?.unwrap_or(0);

    let mut precision = None;
    if i < chars.len() && chars[i] == '.' {
        let start = i + 1;
        i = start;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        precision = parse_bounded(&chars[start..i], "precision")?;
    }

    let kind = chars.get(i).copied();
    if i + 1 < chars.len() || !matches!(kind, None | Some('s' | 'd' | 'f' | '%')) {
        return Err(StatError::Template(format!("unsupported format spec '{}'", spec)));
    }

    let number = value.as_f64();
    let body = match (kind, number) {
        (Some('%'), Some(n)) => format!("{:.*}%", precision.unwrap_or(6), n * 100.0),
        (Some('f'), Some(n)) => format!("{:.*}", precision.unwrap_or(6), n),
        (_, Some(n)) if precision.is_some() => format!("{:.*}", precision.unwrap_or(0), n),
        (Some('s') | None, None) => {
            match precision {
                Some(p) => text.chars().take(p).collect(),
                None => text.to_string(),
            }
        }
        (Some(k), None) if k != 's' => {
            return Err(
                StatError::Template(format!("format code '{}' needs a number, got '{}'", k, text))
            );
        }
        _ => text.to_string(),
    };

    let len = body.chars().count();
    if len >= width {
        return Ok(body);
    }
    let padding = width - len;
    let align = align.unwrap_or(if number.is_some() { '>' } else { '<' });
    let pad = |n: usize| fill.to_string().repeat(n);
    Ok(match align {
        '>' => format!("{}{}", pad(padding), body),
        '^' => format!("{}{}{}", pad(padding / 2), body, pad(padding - padding / 2)),
        _ => format!("{}{}", body, pad(padding)),
    })
}

/// Digits of a width or precision, refused above `MAX_FORMAT_WIDTH`
fn parse_bounded(digits: &[char], what: &str) -> StatResult<Option<usize>> {
    if digits.is_empty() {
        return Ok(None);
    }
    let text: String = digits.iter().collect();
    match text.parse::<usize>() {
        Ok(n) if n <= MAX_FORMAT_WIDTH => Ok(Some(n)),
        _ => Err(StatError::Template(format!("format {} too large", what))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object_browser() -> Value {
        json!({
            "resource": "193.0.0.0/21",
            "backward_refs": [
                {"primary": {"key": "inetnum", "value": "193.0.0.0 - 193.0.7.255"}},
                {"primary": {"key": "route", "value": "193.0.0.0/21AS3333"}}
            ],
            "version": {"major": 1, "minor": 2}
        })
    }

    #[test]
    fn test_select_plain_path() {
        let data = object_browser();
        let selected = select(&data, &parse_path("backward_refs.1.primary.key")).unwrap();
        assert_eq!(selected, Selection::Value(json!("route")));

        let last = select(&data, &parse_path("backward_refs.-1.primary.key")).unwrap();
        assert_eq!(last.into_value(), json!("route"));
    }

    #[test]
    fn test_select_glob_over_sequence() {
        let data = object_browser();
        let selected = select(&data, &parse_path("backward_refs.*.primary.key")).unwrap();
        assert_eq!(selected, Selection::Glob(vec![json!("inetnum"), json!("route")]));
    }

    #[test]
    fn test_select_glob_filters_map_keys() {
        let data = json!({"announced_v4": 1, "announced_v6": 2, "first_seen": 3});
        let selected = select(&data, &["announced_*"]).unwrap();
        assert_eq!(selected.into_value(), json!([1, 2]));

        let selected = select(&data, &["announced_v[!4]*"]).unwrap();
        assert_eq!(selected.into_value(), json!([2]));

        let selected = select(&data, &["announced_v?"]).unwrap();
        assert_eq!(selected.into_value(), json!([1, 2]));

        let err = select(&data, &["first_seen", "*"]).unwrap_err();
        assert!(matches!(err, StatError::NotFound(_)));
    }

    #[test]
    fn test_invalid_glob_is_usage_error() {
        let data = json!({"announced_v4": 1});
        let err = select(&data, &["announced_[*"]).unwrap_err();
        assert!(matches!(err, StatError::Usage { show_help: false, .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_adjacent_globs_flatten() {
        let data = json!({
            "a": {"x": [1, 2]},
            "b": {"y": [3]}
        });
        let selected = select(&data, &["*", "*", "*"]).unwrap();
        assert_eq!(selected, Selection::Glob(vec![json!(1), json!(2), json!(3)]));
    }

    #[test]
    fn test_select_missing_segment() {
        let data = object_browser();
        let err = select(&data, &parse_path("backward_refs.7")).unwrap_err();
        assert!(matches!(err, StatError::NotFound(ref s) if s == "7"));
        assert!(select(&data, &["resource", "nope"]).is_err());
    }

    #[test]
    fn test_empty_path_selects_everything() {
        let data = object_browser();
        assert_eq!(select(&data, &parse_path("")).unwrap().into_value(), data);
    }

    #[test]
    fn test_abbreviate_lists() {
        let data = json!({"prefixes": [{"p": [1, 2, 3]}, {"p": []}], "n": 5, "e": []});
        let abbreviated = abbreviate_lists(&data, true);
        assert_eq!(
            abbreviated,
            json!({"prefixes": [{"p": [1, ELLIPSIS_MARKER]}, ELLIPSIS_MARKER], "n": 5, "e": []})
        );
        assert_eq!(abbreviate_lists(&abbreviated, true), abbreviated);

        let bare = abbreviate_lists(&data, false);
        assert_eq!(bare, json!({"prefixes": [{"p": [1]}], "n": 5, "e": []}));
        assert_eq!(abbreviate_lists(&bare, false), bare);
    }

    #[test]
    fn test_abbreviate_keeps_scalars() {
        for scalar in [json!(1), json!("x"), json!(null), json!(true)] {
            assert_eq!(abbreviate_lists(&scalar, true), scalar);
        }
    }

    #[test]
    fn test_template_dotted_placeholders() {
        let data = object_browser();
        let refs = select(&data, &parse_path("backward_refs")).unwrap().into_value();
        let output = format_template("{primary.key} = {primary.value}", &refs).unwrap();
        assert_eq!(output, "inetnum = 193.0.0.0 - 193.0.7.255\nroute = 193.0.0.0/21AS3333");
    }

    #[test]
    fn test_template_positional_and_escapes() {
        assert_eq!(format_template("{0}", &json!("AS3333")).unwrap(), "AS3333");
        assert_eq!(format_template("{{{}}}", &json!(7)).unwrap(), "{7}");
        let data = json!({"version": {"major": 1}});
        assert_eq!(format_template("v{0.version.major}", &data).unwrap(), "v1");
        assert_eq!(format_template("v{version[major]}", &data).unwrap(), "v1");
    }

    #[test]
    fn test_template_format_spec() {
        let data = json!({"name": "geoloc", "share": 0.256, "count": 7});
        assert_eq!(format_template("[{name:>8}]", &data).unwrap(), "[  geoloc]");
        assert_eq!(format_template("[{count:3}]", &data).unwrap(), "[  7]");
        assert_eq!(format_template("{share:.1%}", &data).unwrap(), "25.6%");
        assert_eq!(format_template("{share:.2f}", &data).unwrap(), "0.26");
        assert_eq!(format_template("{name!r}", &data).unwrap(), "\"geoloc\"");
    }

    #[test]
    fn test_template_errors() {
        let data = json!({"a": 1});
        assert!(matches!(format_template("{b}", &data), Err(StatError::NotFound(_))));
        assert!(matches!(format_template("{a", &data), Err(StatError::Template(_))));
        assert!(matches!(format_template("a}", &data), Err(StatError::Template(_))));
        assert!(matches!(format_template("{1}", &data), Err(StatError::Template(_))));
    }

    #[test]
    fn test_template_width_is_bounded() {
        let data = json!({"resource": "AS3333", "share": 0.5});
        assert!(
            matches!(
                format_template("{0:18446744073709551615}", &json!("x")),
                Err(StatError::Template(ref m)) if m == "format width too large"
            )
        );
        assert!(matches!(format_template("{resource:4000000000}", &data), Err(StatError::Template(_))));
        assert!(matches!(format_template("{share:.99999f}", &data), Err(StatError::Template(_))));
        assert!(matches!(format_template("{share:.2000%}", &data), Err(StatError::Template(_))));

        let widest = format!("{{resource:{}}}", MAX_FORMAT_WIDTH);
        assert_eq!(format_template(&widest, &data).unwrap().len(), MAX_FORMAT_WIDTH);
    }
}
