// ripestat-text - Whois Connection Handling
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

//! One whois connection: a reader loop, one command task at a time, and a
//! writer task that owns the socket's write half

use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::{ OwnedReadHalf, OwnedWriteHalf };
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_util::codec::{ FramedRead, LinesCodec, LinesCodecError };
use tokio_util::sync::CancellationToken;

use crate::config::MAX_LINE_LENGTH;
use crate::core::{ Dispatcher, LineArgs, Output };
use crate::{ log_debug, log_error, log_info, log_warn };

type RequestLines = FramedRead<OwnedReadHalf, LinesCodec>;

const LINGER_TIMEOUT: Duration = Duration::from_secs(2);

/// Per-connection state, only touched by the reader loop
#[derive(Debug, Default)]
struct Session {
    keep_alive: bool,
    commands: usize,
}

pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    dispatcher: Arc<Dispatcher>,
    idle_timeout: Duration
) -> Result<()> {
    // Set nodelay so each response line goes out as soon as it is queued
    if let Err(e) = stream.set_nodelay(true) {
        log_warn!("Failed to set TCP_NODELAY: {}", e);
    }

    let (read_half, write_half) = stream.into_split();
    let mut lines = FramedRead::new(read_half, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));

    let cancel = CancellationToken::new();
    let (output, rx) = Output::channel();
    let writer = tokio::spawn(write_lines(write_half, rx, cancel.clone()));

    let mut session = Session::default();
    loop {
        let line = match tokio::time::timeout(idle_timeout, lines.next()).await {
            Err(_) => {
                log_debug!("Connection from {} idle for {:?}, closing", addr, idle_timeout);
                break;
            }
            Ok(None) => break,
            Ok(Some(Err(LinesCodecError::MaxLineLengthExceeded))) => {
                log_warn!("Request from {} exceeds {} bytes", addr, MAX_LINE_LENGTH);
                output.line(format!("% Request line too long (maximum {} bytes)", MAX_LINE_LENGTH));
                break;
            }
            Ok(Some(Err(LinesCodecError::Io(e)))) if e.kind() == ErrorKind::InvalidData => {
                log_warn!("Request from {} is not valid UTF-8", addr);
                output.line("% Request line is not valid UTF-8");
                break;
            }
            Ok(Some(Err(LinesCodecError::Io(e)))) => {
                log_debug!("Read from {} failed: {}", addr, e);
                break;
            }
            Ok(Some(Ok(line))) => line,
        };

        session.commands += 1;
        log_info!("Query #{} from {}: {}", session.commands, addr, line);

        let task = start_command(&dispatcher, &line, &mut session, &output, &cancel);
        let peer_open = finish_command(task, &mut lines, addr).await;

        if !session.keep_alive || !peer_open || cancel.is_cancelled() {
            break;
        }
        output.line("");
    }

    // The writer exits once every queued line is written
    drop(output);
    writer.await?;
    linger(&mut lines).await;
    log_debug!("Closed connection from {} after {} commands", addr, session.commands);
    Ok(())
}

/// Parse one request line and start it on its own task. Parse errors are
/// reported directly and leave the keep-alive state untouched.
fn start_command(
    dispatcher: &Arc<Dispatcher>,
    line: &str,
    session: &mut Session,
    output: &Output,
    cancel: &CancellationToken
) -> Option<JoinHandle<i32>> {
    let args = match LineArgs::parse_line(line) {
        Ok(args) => args,
        Err(err) => {
            dispatcher.report(&err, output);
            return None;
        }
    };

    if args.toggles_keep_alive() {
        session.keep_alive = !session.keep_alive;
    }

    let dispatcher = Arc::clone(dispatcher);
    let output = output.clone();
    let cancel = cancel.clone();
    Some(tokio::spawn(async move { dispatcher.run(&args.command, &output, &cancel).await }))
}

/// Wait for the running command, discarding any line that arrives meanwhile.
/// Returns false once the peer has stopped sending.
async fn finish_command(
    task: Option<JoinHandle<i32>>,
    lines: &mut RequestLines,
    addr: SocketAddr
) -> bool {
    let Some(mut task) = task else {
        return true;
    };

    let mut reading = true;
    loop {
        tokio::select! {
            result = &mut task => {
                match result {
                    Ok(status) => log_debug!("Command from {} finished with status {}", addr, status),
                    Err(e) => log_error!("Command task for {} failed: {}", addr, e),
                }
                return reading;
            }
            next = lines.next(), if reading => match next {
                Some(Ok(line)) => log_debug!("Ignoring line from {} received while busy: {}", addr, line),
                Some(Err(e)) => {
                    log_debug!("Stopped reading from {}: {}", addr, e);
                    reading = false;
                }
                None => reading = false,
            },
        }
    }
}

/// Discard input until the peer closes its side or the linger timeout passes
async fn linger(lines: &mut RequestLines) {
    let drain = async { while lines.next().await.is_some() {} };
    let _ = tokio::time::timeout(LINGER_TIMEOUT, drain).await;
}

/// Sole writer of the socket. Lines go out in queue order, each completely
/// written before the next is taken.
async fn write_lines(
    mut writer: OwnedWriteHalf,
    mut rx: UnboundedReceiver<String>,
    cancel: CancellationToken
) {
    while let Some(line) = rx.recv().await {
        let mut bytes = line.into_bytes();
        bytes.extend_from_slice(b"\r\n");
        if let Err(e) = writer.write_all(&bytes).await {
            log_debug!("Write failed, dropping the rest of the response: {}", e);
            cancel.cancel();
            return;
        }
    }

    if let Err(e) = writer.shutdown().await {
        log_debug!("Shutdown failed: {}", e);
    }
}
