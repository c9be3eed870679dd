// ripestat-text - Command Line Front End
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::process;
use std::sync::Arc;

use anyhow::{ Context, Result };
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use ripestat_text::api::StatClient;
use ripestat_text::config::StatConfig;
use ripestat_text::core::logger::init_for_cli;
use ripestat_text::core::{ CliArgs, Dispatcher, Output };
use ripestat_text::{ log_debug, log_info };

#[tokio::main]
async fn main() -> Result<()> {
    let parsed = CliArgs::parse_args(std::env::args_os());
    let verbosity = parsed.as_ref().map(|args| args.command.verbose).unwrap_or_default();
    init_for_cli(verbosity)?;

    let config = StatConfig::from_env();
    log_debug!("Using Data API at {}", config.base_url);
    let client = StatClient::new(&config, "cli").context("Failed to create Data API client")?;
    let dispatcher = Dispatcher::new(Arc::new(client), CliArgs::help_text());

    let (output, mut rx) = Output::channel();
    let printer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = rx.recv().await {
            let mut bytes = line.into_bytes();
            bytes.push(b'\n');
            if stdout.write_all(&bytes).await.is_err() {
                break;
            }
        }
        let _ = stdout.flush().await;
    });

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log_info!("Interrupted");
            interrupt.cancel();
        }
    });

    let status = match parsed {
        Ok(args) => dispatcher.run(&args.command, &output, &cancel).await,
        Err(err) => {
            dispatcher.report(&err, &output);
            err.exit_code()
        }
    };

    drop(output);
    printer.await.context("Output task failed")?;
    process::exit(status);
}
