/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the hxfer authors.
 */

//! One HTTP exchange over a pooled or fresh connection.

use std::time::Duration;

use http::Method;
use log::debug;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use super::cache::ConnectionCache;
use super::request::serialize_request;
use super::response::{read_response, HttpResponse};
use super::url::{parse_url, Target};
use super::ClientError;

/// Whether `prepare` completes the exchange inline or spawns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeMode {
    Sync,
    Async,
}

enum HandleState {
    Ready(Result<HttpResponse, ClientError>),
    Pending(JoinHandle<Result<HttpResponse, ClientError>>),
}

/// An in-flight or completed exchange. Consumed exactly once by `receive`.
pub struct ExchangeHandle {
    state: HandleState,
}

impl ExchangeHandle {
    /// Wait for and take the response. A failed spawned exchange surfaces
    /// its error here.
    pub async fn receive(self) -> Result<HttpResponse, ClientError> {
        match self.state {
            HandleState::Ready(result) => result,
            HandleState::Pending(task) => match task.await {
                Ok(result) => result,
                Err(_) => Err(ClientError::TaskFailed),
            },
        }
    }
}

async fn attempt(
    mut stream: TcpStream,
    request: &[u8],
) -> Result<(HttpResponse, TcpStream), ClientError> {
    stream.write_all(request).await?;
    let mut reader = BufReader::new(stream);
    let rsp = read_response(&mut reader).await?;
    Ok((rsp, reader.into_inner()))
}

async fn run_exchange(target: Target, request: Vec<u8>) -> Result<HttpResponse, ClientError> {
    let cache = ConnectionCache::global();

    // a pooled connection may have gone stale; retry once on a fresh one
    if let Some(stream) = cache.checkout(&target.host, target.port) {
        match attempt(stream, &request).await {
            Ok((rsp, stream)) => {
                if rsp.keep_alive {
                    cache.checkin(&target.host, target.port, stream);
                }
                return Ok(rsp);
            }
            Err(e) => {
                debug!(
                    "pooled connection to {}:{} failed: {e}",
                    target.host, target.port
                );
            }
        }
    }

    let stream = TcpStream::connect((target.host.as_str(), target.port))
        .await
        .map_err(ClientError::ConnectFailed)?;
    let (rsp, stream) = attempt(stream, &request).await?;
    if rsp.keep_alive {
        cache.checkin(&target.host, target.port, stream);
    }
    Ok(rsp)
}

async fn bounded_exchange(
    target: Target,
    request: Vec<u8>,
    timeout: Duration,
) -> Result<HttpResponse, ClientError> {
    if timeout.is_zero() {
        run_exchange(target, request).await
    } else {
        match tokio::time::timeout(timeout, run_exchange(target, request)).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::TimedOut),
        }
    }
}

/// Validate the URL, acquire a connection and send the request. In sync
/// mode the whole exchange completes before this returns; in async mode it
/// continues on a spawned task. URL errors never touch the connection
/// cache. A zero timeout means unbounded.
pub async fn prepare(
    method: Method,
    url: &str,
    body: &[u8],
    headers: &[String],
    timeout: Duration,
    mode: ExchangeMode,
) -> Result<ExchangeHandle, ClientError> {
    let target = parse_url(url)?;
    let request = serialize_request(&method, &target, headers, body);
    let state = match mode {
        ExchangeMode::Sync => HandleState::Ready(bounded_exchange(target, request, timeout).await),
        ExchangeMode::Async => {
            HandleState::Pending(tokio::spawn(bounded_exchange(target, request, timeout)))
        }
    };
    Ok(ExchangeHandle { state })
}

/// Blocking-style GET: the exchange completes before return.
pub async fn get(
    url: &str,
    headers: &[String],
    timeout: Duration,
) -> Result<HttpResponse, ClientError> {
    prepare(Method::GET, url, b"", headers, timeout, ExchangeMode::Sync)
        .await?
        .receive()
        .await
}

/// Blocking-style POST.
pub async fn post(
    url: &str,
    body: &[u8],
    headers: &[String],
    timeout: Duration,
) -> Result<HttpResponse, ClientError> {
    prepare(Method::POST, url, body, headers, timeout, ExchangeMode::Sync)
        .await?
        .receive()
        .await
}

/// Fire a GET and return a handle to collect later.
pub async fn get_async(
    url: &str,
    headers: &[String],
    timeout: Duration,
) -> Result<ExchangeHandle, ClientError> {
    prepare(Method::GET, url, b"", headers, timeout, ExchangeMode::Async).await
}

/// Fire a POST and return a handle to collect later.
pub async fn post_async(
    url: &str,
    body: &[u8],
    headers: &[String],
    timeout: Duration,
) -> Result<ExchangeHandle, ClientError> {
    prepare(Method::POST, url, body, headers, timeout, ExchangeMode::Async).await
}

/// Bound the idle connections kept for one (host, port).
pub fn set_cache(host: &str, port: u16, max_idle: usize) {
    ConnectionCache::global().configure(host, port, max_idle);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    async fn read_request_head(stream: &mut TcpStream) -> std::io::Result<Vec<u8>> {
        let mut head = Vec::new();
        let mut buf = [0u8; 512];
        loop {
            let n = stream.read(&mut buf).await?;
            if n == 0 {
                return Err(std::io::ErrorKind::UnexpectedEof.into());
            }
            head.extend_from_slice(&buf[..n]);
            if memchr::memmem::find(&head, b"\r\n\r\n").is_some() {
                return Ok(head);
            }
        }
    }

    /// Canned server: each accepted connection serves up to `per_conn`
    /// responses of `payload`, then closes.
    async fn spawn_server(per_conn: usize, payload: &'static [u8]) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let conns = Arc::new(AtomicUsize::new(0));
        let counter = conns.clone();
        tokio::spawn(async move {
            loop {
                let (mut stream, _) = listener.accept().await.unwrap();
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    for _ in 0..per_conn {
                        if read_request_head(&mut stream).await.is_err() {
                            return;
                        }
                        if stream.write_all(payload).await.is_err() {
                            return;
                        }
                    }
                });
            }
        });
        (format!("127.0.0.1:{port}"), conns)
    }

    const KEEP_ALIVE_OK: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok";
    const CLOSING_OK: &[u8] =
        b"HTTP/1.1 200 OK\r\nConnection: close\r\nContent-Length: 5\r\n\r\nhello";

    #[tokio::test]
    async fn get_round_trip() {
        let (addr, conns) = spawn_server(1, CLOSING_OK).await;
        let rsp = get(&format!("http://{addr}/x"), &[], Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(rsp.code, 200);
        assert_eq!(rsp.body.as_ref(), b"hello");
        assert!(!rsp.keep_alive);
        assert_eq!(conns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn post_sends_body_and_headers() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = format!("127.0.0.1:{}", listener.local_addr().unwrap().port());
        let seen = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let head = read_request_head(&mut stream).await.unwrap();
            stream.write_all(CLOSING_OK).await.unwrap();
            head
        });

        let rsp = post(
            &format!("http://{addr}/submit"),
            b"k=v",
            &["X-Probe: 1".to_string()],
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert_eq!(rsp.code, 200);

        let head = seen.await.unwrap();
        let text = String::from_utf8_lossy(&head);
        assert!(text.starts_with("POST /submit HTTP/1.1\r\n"));
        assert!(text.contains("X-Probe: 1\r\n"));
        assert!(text.contains("Content-Length: 3\r\n"));
    }

    #[tokio::test]
    async fn keep_alive_connection_is_reused() {
        let (addr, conns) = spawn_server(2, KEEP_ALIVE_OK).await;
        let url = format!("http://{addr}/r");
        let first = get(&url, &[], Duration::from_secs(5)).await.unwrap();
        assert!(first.keep_alive);
        let second = get(&url, &[], Duration::from_secs(5)).await.unwrap();
        assert_eq!(second.body.as_ref(), b"ok");
        assert_eq!(conns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stale_pooled_connection_retries_fresh() {
        // each connection serves exactly one keep-alive response, then closes
        let (addr, conns) = spawn_server(1, KEEP_ALIVE_OK).await;
        let url = format!("http://{addr}/s");
        get(&url, &[], Duration::from_secs(5)).await.unwrap();
        let second = get(&url, &[], Duration::from_secs(5)).await.unwrap();
        assert_eq!(second.code, 200);
        assert_eq!(conns.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cache_capacity_bound_is_honored() {
        let (addr, _) = spawn_server(1, KEEP_ALIVE_OK).await;
        let (host, port) = addr.split_once(':').unwrap();
        let port: u16 = port.parse().unwrap();
        set_cache(host, port, 0);
        get(&format!("http://{addr}/c"), &[], Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(ConnectionCache::global().idle_count(host, port), 0);
    }

    #[tokio::test]
    async fn async_exchange_collects_later() {
        let (addr, _) = spawn_server(1, CLOSING_OK).await;
        let handle = get_async(&format!("http://{addr}/a"), &[], Duration::from_secs(5))
            .await
            .unwrap();
        let rsp = handle.receive().await.unwrap();
        assert_eq!(rsp.body.as_ref(), b"hello");
    }

    #[tokio::test]
    async fn async_exchange_error_surfaces_at_receive() {
        // nothing listens on this port
        let handle = get_async("http://127.0.0.1:1/void", &[], Duration::from_secs(2))
            .await
            .unwrap();
        assert!(matches!(
            handle.receive().await,
            Err(ClientError::ConnectFailed(_))
        ));
    }

    #[tokio::test]
    async fn timeout_bounds_the_exchange() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = format!("127.0.0.1:{}", listener.local_addr().unwrap().port());
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(60)).await;
            drop(stream);
        });
        let err = get(&format!("http://{addr}/slow"), &[], Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::TimedOut));
    }

    #[tokio::test]
    async fn url_errors_reported_before_any_connection() {
        assert!(matches!(
            get("ftp://host/x", &[], Duration::from_secs(1)).await,
            Err(ClientError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            get("http://", &[], Duration::from_secs(1)).await,
            Err(ClientError::InvalidUrl(_))
        ));
    }
}
