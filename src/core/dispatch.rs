// ripestat-text - Command Dispatcher
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Turns one parsed command into output lines
//!
//! Both front ends hand a parsed [`CommandArgs`] to [`Dispatcher::run`]. The
//! dispatcher decides between widget mode and data-call mode, runs the
//! pipeline and reports failures into the same output queue.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::{ PrettyFormatter, Serializer };
use tokio_util::sync::CancellationToken;

use crate::api::DataService;
use crate::config::{ VERSION, VISUALIZATION_URL };
use crate::core::args::CommandArgs;
use crate::core::error::{ StatError, StatResult };
use crate::core::executor::{ ExecutionOutcome, OrderMode, WidgetExecutor };
use crate::core::logger::{ LogLevel, log_with_level };
use crate::core::output::Output;
use crate::core::query::Query;
use crate::core::selector::{ ELLIPSIS_MARKER, abbreviate_lists, format_template, parse_path, select };
use crate::widgets;
use crate::{ log_error, log_info };

pub struct Dispatcher {
    service: Arc<dyn DataService>,
    executor: WidgetExecutor,
    help: String,
}

impl Dispatcher {
    /// `help` is the usage text of the grammar the front end parses with
    pub fn new(service: Arc<dyn DataService>, help: String) -> Self {
        Self {
            executor: WidgetExecutor::new(Arc::clone(&service)),
            service,
            help,
        }
    }

    pub fn with_executor(mut self, executor: WidgetExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// Run one command; returns its exit status
    pub async fn run(&self, args: &CommandArgs, output: &Output, cancel: &CancellationToken) -> i32 {
        match self.dispatch(args, output, cancel).await {
            Ok(()) => 0,
            Err(err) => {
                self.report(&err, output);
                err.exit_code()
            }
        }
    }

    /// Write `err` to the output, with the usage text when it asks for it
    pub fn report(&self, err: &StatError, output: &Output) {
        match err {
            StatError::Usage { message, show_help: true } => {
                if !message.is_empty() {
                    output.line(message.as_str());
                    output.line("");
                }
                self.help(output);
            }
            err => {
                if !err.is_caller_facing() {
                    log_error!("Command failed: {}", err);
                }
                output.line(err.user_message());
            }
        }
    }

    async fn dispatch(
        &self,
        args: &CommandArgs,
        output: &Output,
        cancel: &CancellationToken
    ) -> StatResult<()> {
        if args.version {
            output.line(VERSION);
            return Ok(());
        }
        if args.help {
            self.help(output);
            return Ok(());
        }
        if args.list_widgets {
            output.lines(widgets::list_widgets());
            return Ok(());
        }
        if args.list_data_calls {
            return self.list_data_calls(output).await;
        }
        if let Some(call) = &args.explain_data_call {
            return self.explain_data_call(call, output).await;
        }

        let query = Query::parse(&args.query);

        match (&args.data_call, &args.widgets) {
            (Some(_), Some(_)) => {
                Err(StatError::usage_with_help("--data-call and --widgets are conflicting options"))
            }
            (Some(call), None) => self.output_data(call, &query, args, output).await,
            (None, widgets) => {
                let order = if args.preserve_order {
                    OrderMode::PreserveOrder
                } else {
                    OrderMode::StreamAsReady
                };
                let spec = widgets.as_deref().unwrap_or_default();
                self.output_widgets(spec, query, args.include_metadata, order, output, cancel).await
                    .map(|_| ())
            }
        }
    }

    pub fn help(&self, output: &Output) {
        output.text(self.help.trim_end());
    }

    pub async fn list_data_calls(&self, output: &Output) -> StatResult<()> {
        let body = self.service.fetch_raw("list.json", None).await?;
        let calls: Value = serde_json::from_slice(&body)?;

        let mut slugs: Vec<String> = calls
            .as_array()
            .ok_or_else(|| StatError::Render("data call list is not a list".to_string()))?
            .iter()
            .filter_map(|c| c.get("slug").and_then(Value::as_str))
            .map(str::to_string)
            .collect();
        slugs.sort();

        output.lines(slugs);
        Ok(())
    }

    pub async fn explain_data_call(&self, call: &str, output: &Output) -> StatResult<()> {
        let body = self.service.fetch_raw(&format!("{}/meta/methodology", call), None).await?;
        let meta: Value = serde_json::from_slice(&body)?;
        let methodology = meta
            .get("methodology")
            .and_then(Value::as_str)
            .ok_or_else(|| StatError::NotFound(format!("{}/meta/methodology", call)))?;

        output.line(call);
        output.line("-".repeat(call.chars().count()));
        output.text(methodology);
        Ok(())
    }

    /// Data-call mode: the response itself, optionally reshaped
    pub async fn output_data(
        &self,
        call: &str,
        query: &Query,
        args: &CommandArgs,
        output: &Output
    ) -> StatResult<()> {
        let response = self.service.fetch_data(call, query, None).await?;
        let cached = response.is_cached();

        let mut data = if args.include_metadata {
            response.into_full_value()
        } else {
            for (level, text) in response.messages() {
                log_with_level(LogLevel::from_message_kind(&level), call, &text);
            }
            Value::Object(response.data)
        };

        if args.abbreviate {
            data = abbreviate_lists(&data, true);
        }

        let text = if args.select.is_some() || args.template.is_some() {
            let path = args.select.as_deref().unwrap_or_default();
            let selected = select(&data, &parse_path(path))?.into_value();
            let template = args.template.as_deref().unwrap_or("{0}");
            format_template(template, &selected)?.replace(ELLIPSIS_MARKER, "...")
        } else {
            pretty_json(&data)?
        };
        output.text(&text);

        if cached && !args.include_metadata {
            log_info!("This response was cached");
        }
        Ok(())
    }

    /// Widget mode: header lines, then every resolved widget
    pub async fn output_widgets(
        &self,
        spec: &str,
        query: Query,
        include_metadata: bool,
        order: OrderMode,
        output: &Output,
        cancel: &CancellationToken
    ) -> StatResult<ExecutionOutcome> {
        let names = widgets::resolve(spec, query.resource_type())?;
        if names.is_empty() {
            return Err(match query.resource() {
                Some(_) => StatError::usage("No widgets match the given resource type."),
                None => StatError::usage_with_help(""),
            });
        }

        if let Some(resource) = query.resource() {
            output.line(format!("% Results for '{}'", resource));
            output.line(
                format!("% You can see graphical visualizations at {}{}", VISUALIZATION_URL, resource)
            );
        }

        let outcome = self.executor.execute(
            &names,
            Arc::new(query),
            include_metadata,
            order,
            output,
            cancel
        ).await;
        Ok(outcome)
    }
}

/// Four-space indented JSON with list ellipses shown as `...`
fn pretty_json(data: &Value) -> StatResult<String> {
    let mut buffer = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    data.serialize(&mut serializer)?;

    let text = String::from_utf8_lossy(&buffer);
    Ok(text.replace(&format!("\"{}\"", ELLIPSIS_MARKER), "..."))
}
