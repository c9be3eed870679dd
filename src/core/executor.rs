// ripestat-text - Widget Executor
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Concurrent execution of resolved widgets
//!
//! Every widget name gets its own task. Results come back over a channel
//! tagged with their request index and are either buffered and emitted in
//! request order, or rendered one block at a time as they complete.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::api::{ DataResponse, DataService };
use crate::config::{ ORDER_POLL_INTERVAL, UNORDERED_KEY_WIDTH };
use crate::core::error::GENERIC_WIDGET_ERROR;
use crate::core::output::Output;
use crate::core::query::Query;
use crate::core::render::{ LineItem, render_block, value_to_text };
use crate::widgets::{ self, WidgetOutput };
use crate::{ log_debug, log_error };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderMode {
    /// Wait for everything, then emit in request order
    PreserveOrder,
    /// Emit each widget as soon as it finishes
    #[default]
    StreamAsReady,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Completed,
    /// Interrupted while waiting; blocks still pending were dropped
    Cancelled,
}

pub struct WidgetExecutor {
    service: Arc<dyn DataService>,
    poll_interval: Duration,
    stream_key_width: usize,
}

impl WidgetExecutor {
    pub fn new(service: Arc<dyn DataService>) -> Self {
        Self {
            service,
            poll_interval: ORDER_POLL_INTERVAL,
            stream_key_width: UNORDERED_KEY_WIDTH,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Run `names` against `query` and queue their rendered blocks on `output`
    pub async fn execute(
        &self,
        names: &[String],
        query: Arc<Query>,
        include_metadata: bool,
        order: OrderMode,
        output: &Output,
        cancel: &CancellationToken
    ) -> ExecutionOutcome {
        let (tx, mut rx) = mpsc::unbounded_channel::<(usize, Vec<LineItem>)>();

        for (index, name) in names.iter().enumerate() {
            let tx = tx.clone();
            let name = name.clone();
            let service = Arc::clone(&self.service);
            let query = Arc::clone(&query);

            // Detached: a cancelled request leaves these to finish on their own
            tokio::spawn(async move {
                let lines = run_widget(name, service, query, include_metadata).await;
                let _ = tx.send((index, lines));
            });
        }
        drop(tx);

        match order {
            OrderMode::PreserveOrder => {
                self.collect_in_order(names.len(), &mut rx, output, cancel).await
            }
            OrderMode::StreamAsReady => {
                self.stream_as_ready(names.len(), &mut rx, output, cancel).await
            }
        }
    }

    async fn collect_in_order(
        &self,
        total: usize,
        rx: &mut mpsc::UnboundedReceiver<(usize, Vec<LineItem>)>,
        output: &Output,
        cancel: &CancellationToken
    ) -> ExecutionOutcome {
        let mut results: Vec<Option<Vec<LineItem>>> = vec![None; total];
        let mut received = 0;

        while received < total {
            tokio::select! {
                _ = cancel.cancelled() => return ExecutionOutcome::Cancelled,
                message = rx.recv() => match message {
                    Some((index, lines)) => {
                        results[index] = Some(lines);
                        received += 1;
                    }
                    None => break,
                },
            }
        }

        let mut items = Vec::new();
        for lines in results.into_iter().flatten() {
            items.push(LineItem::blank());
            items.extend(lines);
        }
        output.lines(render_block(&items, None));
        ExecutionOutcome::Completed
    }

    async fn stream_as_ready(
        &self,
        total: usize,
        rx: &mut mpsc::UnboundedReceiver<(usize, Vec<LineItem>)>,
        output: &Output,
        cancel: &CancellationToken
    ) -> ExecutionOutcome {
        let mut pending = total;

        while pending > 0 {
            tokio::select! {
                _ = cancel.cancelled() => return ExecutionOutcome::Cancelled,
                message = tokio::time::timeout(self.poll_interval, rx.recv()) => match message {
                    Ok(Some((index, lines))) => {
                        log_debug!("Widget #{} finished, {} still pending", index, pending - 1);
                        output.line("");
                        output.lines(render_block(&lines, Some(self.stream_key_width)));
                        pending -= 1;
                    }
                    Ok(None) => break,
                    Err(_) => {
                        if output.is_closed() {
                            log_debug!("Output closed with {} widgets pending", pending);
                            return ExecutionOutcome::Cancelled;
                        }
                    }
                },
            }
        }

        ExecutionOutcome::Completed
    }
}

/// One work unit: run the widget, turn any failure into a single error line
async fn run_widget(
    name: String,
    service: Arc<dyn DataService>,
    query: Arc<Query>,
    include_metadata: bool
) -> Vec<LineItem> {
    let widget = widgets::lookup(&name);
    let result = AssertUnwindSafe(widget.run(service, query)).catch_unwind().await;

    match result {
        Ok(Ok(WidgetOutput { response, mut lines })) => {
            if let Some(response) = response {
                lines.extend(derived_lines(&response, include_metadata));
            }
            lines
        }
        Ok(Err(err)) => {
            if !err.is_caller_facing() {
                log_error!("Widget '{}' failed: {}", name, err);
            }
            vec![error_line(&name, &err.user_message())]
        }
        Err(_) => {
            log_error!("Widget '{}' panicked", name);
            vec![error_line(&name, GENERIC_WIDGET_ERROR)]
        }
    }
}

fn error_line(name: &str, message: &str) -> LineItem {
    LineItem::text(format!("% {}: {}", name, message))
}

/// `query-time` and, with metadata, one `meta-<key>` line per metadata field
fn derived_lines(response: &DataResponse, include_metadata: bool) -> Vec<LineItem> {
    let mut lines = Vec::new();

    if let Some(time) = query_time(response) {
        lines.push(LineItem::kv("query-time", time));
    }
    if include_metadata {
        for (key, value) in &response.meta {
            lines.push(LineItem::kv(format!("meta-{}", key), value_to_text(value)));
        }
    }

    lines
}

fn query_time(response: &DataResponse) -> Option<String> {
    let text = |key: &str| response.data.get(key).map(value_to_text);

    if let Some(time) = text("query_time") {
        return Some(time);
    }
    let time = match (text("query_starttime"), text("query_endtime")) {
        (Some(start), Some(end)) => format!("{} to {}", start, end),
        (Some(start), None) => start,
        (None, Some(end)) => format!("since {}", end),
        (None, None) => {
            return None;
        }
    };
    Some(time)
}
