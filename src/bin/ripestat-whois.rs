// ripestat-text - Whois Line Server
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::sync::Arc;
use std::time::Duration;

use anyhow::{ Context, Result };
use clap::Parser;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use ripestat_text::api::StatClient;
use ripestat_text::config::{ ServerCli, StatConfig, VERSION };
use ripestat_text::core::logger::init_from_args;
use ripestat_text::core::{ Dispatcher, LineArgs };
use ripestat_text::server::{ ServerOptions, bind_listener, run_async_server };
use ripestat_text::{ log_error, log_info };

#[tokio::main]
async fn main() -> Result<()> {
    let args = ServerCli::parse();

    // Initialize logging
    init_from_args(args.debug, args.trace, args.journald)?;

    let mut config = StatConfig::from_env();
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    let client = StatClient::new(&config, "whois").context("Failed to create Data API client")?;
    let dispatcher = Arc::new(Dispatcher::new(Arc::new(client), LineArgs::help_text()));

    let options = ServerOptions {
        idle_timeout: Duration::from_secs(args.timeout),
        max_connections: args.max_connections,
    };

    log_info!("Starting ripestat-whois {} against {}", VERSION, config.base_url);

    let shutdown = CancellationToken::new();
    let mut listeners = JoinSet::new();
    for host in &args.hosts {
        let listener = bind_listener(host, args.port).await?;
        listeners.spawn(run_async_server(listener, Arc::clone(&dispatcher), options, shutdown.clone()));
    }

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            log_info!("Received interrupt, shutting down");
        }
        Some(result) = listeners.join_next() => {
            if let Err(e) = result.context("Listener task panicked")? {
                log_error!("Listener stopped: {}", e);
            }
        }
    }

    shutdown.cancel();
    while let Some(result) = listeners.join_next().await {
        result.context("Listener task panicked")??;
    }
    Ok(())
}
