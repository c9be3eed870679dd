//! # ripestat-text
//!
//! Text front ends for the RIPEstat Data API:
//! - widgets: small whois-style summaries rendered from one data call each,
//!   run concurrently and merged into one response
//! - data calls: the raw JSON response, optionally reshaped with a dotted
//!   selector, list abbreviation and a format template
//! - a whois line server (port 43) speaking the same command grammar
//!
//! ## Quick Start
//!
//! ```no_run
//! use ripestat_text::run_command;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let (status, lines) = run_command("-w @at-a-glance AS3333").await?;
//!     for line in lines {
//!         println!("{}", line);
//!     }
//!     std::process::exit(status);
//! }
//! ```

pub mod api;
pub mod config;
pub mod core;
pub mod server;
pub mod widgets;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::api::StatClient;
use crate::config::StatConfig;
use crate::core::{ Dispatcher, LineArgs, Output };

/// Run one request line against the Data API configured in the environment
///
/// Returns the exit status and every output line, in the order they were
/// produced.
pub async fn run_command(line: &str) -> anyhow::Result<(i32, Vec<String>)> {
    let client = StatClient::new(&StatConfig::from_env(), "library")?;
    let dispatcher = Dispatcher::new(Arc::new(client), LineArgs::help_text());
    let (output, mut rx) = Output::channel();

    let status = match LineArgs::parse_line(line) {
        Ok(args) => dispatcher.run(&args.command, &output, &CancellationToken::new()).await,
        Err(err) => {
            dispatcher.report(&err, &output);
            err.exit_code()
        }
    };
    drop(output);

    let mut lines = Vec::new();
    while let Some(line) = rx.recv().await {
        lines.push(line);
    }
    Ok((status, lines))
}
