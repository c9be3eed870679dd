// ripestat-text - Query Parsing
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::fmt;

/// Key that a bare (no `=`) token is stored under
pub const RESOURCE_KEY: &str = "resource";

/// Lexical class of the queried resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Ip,
    Asn,
    Unknown,
}

impl ResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Ip => "ip",
            ResourceType::Asn => "asn",
            ResourceType::Unknown => "unknown",
        }
    }

    /// Classify a non-empty resource string
    pub fn classify(resource: &str) -> Self {
        if resource.contains(['.', '/', ':']) {
            return ResourceType::Ip;
        }

        let lower = resource.to_lowercase();
        let digits = lower.strip_prefix("as").unwrap_or(&lower);
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            ResourceType::Asn
        } else {
            ResourceType::Unknown
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for one widget or data call request
///
/// Built once from `key=value` tokens; read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: Vec<(String, String)>,
    resource_type: Option<ResourceType>,
}

impl Query {
    /// Parse raw argument tokens. Never fails: a token without `=` is the
    /// resource, later duplicates overwrite earlier ones.
    pub fn parse<I, S>(tokens: I) -> Self where I: IntoIterator<Item = S>, S: AsRef<str> {
        let mut query = Query::default();
        for token in tokens {
            let token = token.as_ref();
            match token.split_once('=') {
                Some((key, value)) => query.set(key, value),
                None => query.set(RESOURCE_KEY, token),
            }
        }

        query.resource_type = query
            .resource()
            .filter(|r| !r.is_empty())
            .map(ResourceType::classify);
        query
    }

    fn set(&mut self, key: &str, value: &str) {
        match self.params.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => {
                entry.1 = value.to_string();
            }
            None => self.params.push((key.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn resource(&self) -> Option<&str> {
        self.get(RESOURCE_KEY)
    }

    /// `None` when no resource was given, distinct from `Unknown`
    pub fn resource_type(&self) -> Option<ResourceType> {
        self.resource_type
    }

    /// Parameters in first-seen order, for building the request URL
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}
