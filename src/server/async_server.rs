// ripestat-text - Whois Listener
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::sync::Arc;
use std::time::Duration;

use anyhow::{ Context, Result };
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use super::connection::handle_connection;
use crate::core::Dispatcher;
use crate::{ log_debug, log_error, log_info, log_warn };

#[derive(Debug, Clone, Copy)]
pub struct ServerOptions {
    /// How long a connection may sit without sending a request line
    pub idle_timeout: Duration,
    pub max_connections: usize,
}

pub async fn bind_listener(host: &str, port: u16) -> Result<TcpListener> {
    TcpListener::bind((host, port)).await.context(format!("Failed to bind to {}:{}", host, port))
}

/// Accept connections on `listener` until `shutdown` fires
pub async fn run_async_server(
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    options: ServerOptions,
    shutdown: CancellationToken
) -> Result<()> {
    let local_addr = listener.local_addr().context("Listener has no local address")?;
    log_info!("Listening for whois queries on {}", local_addr);

    let permits = Arc::new(Semaphore::new(options.max_connections));

    // Handle connections
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                log_info!("Stopped listening on {}", local_addr);
                return Ok(());
            }
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, addr)) => {
                        let Ok(permit) = Arc::clone(&permits).try_acquire_owned() else {
                            log_warn!("Connection limit of {} reached, refusing {}", options.max_connections, addr);
                            continue;
                        };
                        log_debug!("Accepted connection from {}", addr);
                        let dispatcher = Arc::clone(&dispatcher);

                        // Handle connection
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, addr, dispatcher, options.idle_timeout).await {
                                log_error!("Connection handling error: {}", e);
                            }
                            drop(permit);
                        });
                    }
                    Err(e) => {
                        log_error!("Failed to accept connection: {}", e);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockService;
    use crate::config::VERSION;
    use crate::core::LineArgs;
    use serde_json::json;
    use std::net::SocketAddr;
    use tokio::io::{ AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader };
    use tokio::net::TcpStream;

    const WAIT: Duration = Duration::from_secs(5);

    async fn start(service: MockService, idle_timeout: Duration) -> (SocketAddr, CancellationToken) {
        let listener = bind_listener("127.0.0.1", 0).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let dispatcher = Arc::new(Dispatcher::new(Arc::new(service), LineArgs::help_text()));
        let options = ServerOptions { idle_timeout, max_connections: 8 };
        let shutdown = CancellationToken::new();
        tokio::spawn(run_async_server(listener, dispatcher, options, shutdown.clone()));
        (addr, shutdown)
    }

    async fn read_all(stream: &mut TcpStream) -> String {
        let mut response = String::new();
        tokio::time::timeout(WAIT, stream.read_to_string(&mut response))
            .await
            .expect("connection was not closed")
            .unwrap();
        response
    }

    #[tokio::test]
    async fn test_single_command_then_close() {
        let (addr, shutdown) = start(MockService::new(), WAIT).await;
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"--version\r\n--list-widgets\r\n").await.unwrap();

        assert_eq!(read_all(&mut stream).await, format!("{}\r\n", VERSION));
        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_keep_alive_serves_several_commands() {
        let (addr, shutdown) = start(MockService::new(), WAIT).await;
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        write_half.write_all(b"-k --version\n").await.unwrap();
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        assert_eq!(line, format!("{}\r\n", VERSION));
        line.clear();
        reader.read_line(&mut line).await.unwrap();
        assert_eq!(line, "\r\n");

        // a second -k switches keep-alive off again
        write_half.write_all(b"-k --version\n").await.unwrap();
        let mut rest = String::new();
        tokio::time::timeout(WAIT, reader.read_to_string(&mut rest)).await.unwrap().unwrap();
        assert_eq!(rest, format!("{}\r\n", VERSION));
        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_lines_during_dispatch_are_ignored() {
        let service = MockService::new().with_delayed_data(
            "slow-call",
            Duration::from_millis(200),
            json!({"resource": "AS3333"})
        );
        let (addr, shutdown) = start(service, WAIT).await;
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        write_half.write_all(b"-k -d slow-call AS3333\r\n--version\r\n").await.unwrap();
        let mut response = Vec::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            if line == "\r\n" {
                break;
            }
            response.push(line);
        }
        assert_eq!(response, vec!["{\r\n", "    \"resource\": \"AS3333\"\r\n", "}\r\n"]);

        write_half.write_all(b"-k --list-data-calls\r\n").await.unwrap();
        let mut rest = String::new();
        tokio::time::timeout(WAIT, reader.read_to_string(&mut rest)).await.unwrap().unwrap();
        assert!(!rest.contains(VERSION));
        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_slow_connection_does_not_block_others() {
        let service = MockService::new().with_delayed_data(
            "slow-call",
            Duration::from_secs(2),
            json!({"resource": "AS3333"})
        );
        let (addr, shutdown) = start(service, WAIT).await;

        let mut slow = TcpStream::connect(addr).await.unwrap();
        slow.write_all(b"-d slow-call AS3333\r\n").await.unwrap();

        let mut fast = TcpStream::connect(addr).await.unwrap();
        fast.write_all(b"--version\r\n").await.unwrap();
        let mut response = String::new();
        tokio::time::timeout(Duration::from_secs(1), fast.read_to_string(&mut response))
            .await
            .expect("fast connection waited on the slow one")
            .unwrap();
        assert_eq!(response, format!("{}\r\n", VERSION));
        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_usage_error_is_sent_to_client() {
        let (addr, shutdown) = start(MockService::new(), WAIT).await;
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"ripe-ncc\r\n").await.unwrap();

        assert_eq!(read_all(&mut stream).await, "No widgets match the given resource type.\r\n");
        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_overlong_line_closes_connection() {
        let (addr, shutdown) = start(MockService::new(), WAIT).await;
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let mut request = vec![b'a'; 2000];
        request.extend_from_slice(b"\r\n");
        stream.write_all(&request).await.unwrap();

        assert!(read_all(&mut stream).await.starts_with("% Request line too long"));
        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_invalid_utf8_gets_notice() {
        let (addr, shutdown) = start(MockService::new(), WAIT).await;
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"AS33\xff\xfe33\r\n").await.unwrap();

        assert_eq!(read_all(&mut stream).await, "% Request line is not valid UTF-8\r\n");
        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_idle_connection_is_closed() {
        let (addr, shutdown) = start(MockService::new(), Duration::from_millis(100)).await;
        let mut stream = TcpStream::connect(addr).await.unwrap();
        assert_eq!(read_all(&mut stream).await, "");
        shutdown.cancel();
    }
}
