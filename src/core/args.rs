// ripestat-text - Command Line Grammar
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Flags shared by the command line front end and the whois line server

use clap::{ Args, CommandFactory, Parser };

use crate::core::error::{ StatError, StatResult };

/// Options common to every front end
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandArgs {
    /// Set output level info (-v) or debug (-vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print the ripestat-text version
    #[arg(long)]
    pub version: bool,

    /// Show this help text
    #[arg(short, long)]
    pub help: bool,

    /// A comma separated list of widgets and @widget-groups to include in the output
    #[arg(short, long, value_name = "LIST", help_heading = "Widget Options")]
    pub widgets: Option<String>,

    /// Output the available widgets and @widget-groups
    #[arg(short, long, help_heading = "Widget Options")]
    pub list_widgets: bool,

    /// Wait for all widgets and output them in the requested order
    #[arg(short = 'o', long, help_heading = "Widget Options")]
    pub preserve_order: bool,

    /// Get the raw response from a data call
    #[arg(short, long, value_name = "NAME", help_heading = "Data API Options")]
    pub data_call: Option<String>,

    /// Output the available data calls
    #[arg(long, help_heading = "Data API Options")]
    pub list_data_calls: bool,

    /// Print help and methodology for a data call
    #[arg(long, value_name = "NAME", help_heading = "Data API Options")]
    pub explain_data_call: Option<String>,

    /// Include the metadata in the response instead of logging messages
    #[arg(short = 'm', long, help_heading = "Data API Options")]
    pub include_metadata: bool,

    /// Abbreviate the response to get an idea of the structure
    #[arg(short, long = "abbreviate-data", help_heading = "Data API Options")]
    pub abbreviate: bool,

    /// Select data element(s) using dot notation and * globs, e.g. 'backward_refs.*.primary.key'
    #[arg(short, long, value_name = "PATH", help_heading = "Data API Options")]
    pub select: Option<String>,

    /// Render each selected item with a template, e.g. '{primary.key} = {primary.value}'
    #[arg(short, long, value_name = "TEMPLATE", help_heading = "Data API Options")]
    pub template: Option<String>,

    /// Resource and key=value query parameters
    #[arg(value_name = "QUERY")]
    pub query: Vec<String>,
}

/// Grammar of the `ripestat` command
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(
    name = "ripestat",
    about = "Command line access to RIPEstat widgets and data calls",
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct CliArgs {
    #[command(flatten)]
    pub command: CommandArgs,
}

/// Grammar of one whois request line
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(
    name = "ripestat",
    no_binary_name = true,
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct LineArgs {
    /// Toggle keeping the connection open after the response
    #[arg(short = 'k', long, action = clap::ArgAction::Count)]
    pub keep_alive: u8,

    #[command(flatten)]
    pub command: CommandArgs,
}

impl LineArgs {
    /// Parse the whitespace separated tokens of a request line
    pub fn parse_line(line: &str) -> StatResult<Self> {
        Self::try_parse_from(line.split_whitespace()).map_err(usage_error)
    }

    /// Whether this line flips the connection's keep-alive state
    pub fn toggles_keep_alive(&self) -> bool {
        self.keep_alive % 2 == 1
    }

    pub fn help_text() -> String {
        Self::command().render_help().to_string()
    }
}

impl CliArgs {
    /// Parse process arguments, binary name included
    pub fn parse_args<I, S>(args: I) -> StatResult<Self>
        where I: IntoIterator<Item = S>, S: Into<std::ffi::OsString> + Clone
    {
        Self::try_parse_from(args).map_err(usage_error)
    }

    pub fn help_text() -> String {
        Self::command().render_help().to_string()
    }
}

fn usage_error(err: clap::Error) -> StatError {
    let rendered = err.to_string();
    let message = rendered
        .lines()
        .next()
        .unwrap_or_default()
        .trim_start_matches("error: ")
        .to_string();
    StatError::usage_with_help(message)
}
