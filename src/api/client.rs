// ripestat-text - Data API HTTP Client
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ COOKIE, USER_AGENT };

use super::DataService;
use super::types::{ DataResponse, check_version, error_messages };
use crate::config::{ CROWD_COOKIE, STAT_COOKIE, StatConfig, VERSION };
use crate::core::{ Query, StatError, StatResult };
use crate::log_debug;

/// reqwest-backed client for the RIPEstat Data API.
///
/// Cheap to clone; one instance serves every connection of a process.
#[derive(Clone)]
pub struct StatClient {
    client: Client,
    base_url: String,
    user_agent: String,
    cookie: Option<String>,
}

impl StatClient {
    /// `caller_id` identifies the front end in the User-Agent (`cli`, `whois`)
    pub fn new(config: &StatConfig, caller_id: &str) -> StatResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        let user_agent = format!(
            "{} ripestat-text/{} rust platform/{}",
            caller_id,
            VERSION,
            std::env::consts::OS
        );

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            user_agent,
            cookie: config.token.as_deref().and_then(session_cookie),
        })
    }

    /// Absolute URL for `path` with the query parameters encoded
    pub fn build_url(&self, path: &str, query: Option<&Query>) -> String {
        let mut url = if path.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{}", self.base_url.trim_end_matches('/'), path)
        };
        if !url.starts_with("http") {
            url = format!("https://{}", url);
        }

        if let Some(query) = query.filter(|q| !q.is_empty()) {
            let encoded = query
                .params()
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&");
            url.push('?');
            url.push_str(&encoded);
        }

        url
    }

    async fn get(&self, path: &str, query: Option<&Query>) -> StatResult<Vec<u8>> {
        let url = self.build_url(path, query);
        log_debug!("Data API URL: {}", url);

        let mut request = self.client.get(&url).header(USER_AGENT, &self.user_agent);
        if let Some(cookie) = &self.cookie {
            request = request.header(COOKIE, cookie);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            log_debug!("Data API returned {} for {}", status, url);
            return Err(StatError::Service {
                status: status.as_u16(),
                messages: error_messages(&body),
            });
        }

        Ok(body.to_vec())
    }
}

/// Cookie header for a stored `<crowd>_<session>` token
fn session_cookie(token: &str) -> Option<String> {
    let (crowd, session) = token.split_once('_')?;
    if crowd.is_empty() || session.is_empty() || session.contains('_') {
        return None;
    }
    Some(format!("{}={}; {}={}", CROWD_COOKIE, crowd, STAT_COOKIE, session))
}

#[async_trait]
impl DataService for StatClient {
    async fn fetch_data(
        &self,
        call: &str,
        query: &Query,
        expected_major: Option<u32>
    ) -> StatResult<DataResponse> {
        let body = self.get(&format!("{}/data.json", call), Some(query)).await?;
        let response = DataResponse::from_value(serde_json::from_slice(&body)?)?;
        check_version(call, &response, expected_major)?;
        Ok(response)
    }

    async fn fetch_raw(&self, path: &str, query: Option<&Query>) -> StatResult<Vec<u8>> {
        self.get(path, query).await
    }
}
