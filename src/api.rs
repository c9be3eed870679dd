// ripestat-text - Data Service Access
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The remote data service as seen by widgets and the dispatcher
//!
//! Everything above this module talks to [`DataService`]; the production
//! implementation is [`StatClient`], tests swap in `mock::MockService`.

pub mod client;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;

use async_trait::async_trait;

use crate::core::{ Query, StatResult };

pub use client::StatClient;
pub use types::{ DataResponse, check_version };

/// Narrow contract for the remote data service.
///
/// Implementations must be safe to share between concurrently running
/// widgets of the same request.
#[async_trait]
pub trait DataService: Send + Sync {
    /// Fetch `<call>/data.json`, optionally insisting on a major version
    async fn fetch_data(
        &self,
        call: &str,
        query: &Query,
        expected_major: Option<u32>
    ) -> StatResult<DataResponse>;

    /// Fetch an arbitrary path below the base URL (index, methodology)
    async fn fetch_raw(&self, path: &str, query: Option<&Query>) -> StatResult<Vec<u8>>;
}
