//! Raw-socket HTTP transport.
//!
//! One request per connection, framed by hand over `tokio::net::TcpStream`:
//! no general-purpose HTTP client, no redirects, no chunked decoding. The
//! response body is delimited solely by connection close, which is why
//! every request carries `Connection: close`.
//!
//! ## Plaintext only
//!
//! This transport does not speak TLS. `https` URLs connect to port 443 in
//! the clear and will fail against real TLS endpoints; deployments are
//! expected to front providers with a terminating proxy or use plain-HTTP
//! endpoints (e.g. a local model server).

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// How long to wait for the TCP connect to complete.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Inactivity window between reads; the response is considered complete
/// when the peer closes or no bytes arrive within this window.
const READ_TIMEOUT: Duration = Duration::from_secs(4);

/// Errors from a single HTTP exchange. All of these surface as values at
/// the dispatch boundary; none abort the caller.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("connect to {host} failed: {source}")]
    Connect {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("connect to {host} timed out after {timeout:?}")]
    ConnectTimeout { host: String, timeout: Duration },

    #[error("request write failed: {0}")]
    Write(#[source] io::Error),

    #[error("connection closed with no response data")]
    EmptyResponse,

    #[error("response has no header terminator")]
    MalformedResponse,

    #[error("unparsable status line: {0:?}")]
    BadStatusLine(String),
}

/// A parsed HTTP response: numeric status plus the raw body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One-shot HTTP exchange capability.
///
/// Backends depend on this trait rather than the concrete socket client so
/// tests can stub the wire and count calls.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// POST `body` to `url` with the given headers.
    async fn post(
        &self,
        url: &str,
        body: &str,
        headers: &[(String, String)],
    ) -> Result<HttpResponse, TransportError>;

    /// GET `url` with the given headers.
    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<HttpResponse, TransportError>;
}

/// The production transport: a fresh TCP connection per request.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self {
            connect_timeout: CONNECT_TIMEOUT,
            read_timeout: READ_TIMEOUT,
        }
    }
}

impl TcpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override both timeouts. Mostly useful in tests.
    pub fn with_timeouts(connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            read_timeout,
        }
    }

    async fn request(
        &self,
        method: &str,
        url: &str,
        body: Option<&str>,
        headers: &[(String, String)],
    ) -> Result<HttpResponse, TransportError> {
        let target = parse_url(url)?;

        let mut stream = timeout(
            self.connect_timeout,
            TcpStream::connect((target.host.as_str(), target.port)),
        )
        .await
        .map_err(|_| TransportError::ConnectTimeout {
            host: target.host.clone(),
            timeout: self.connect_timeout,
        })?
        .map_err(|source| TransportError::Connect {
            host: target.host.clone(),
            source,
        })?;

        // Assemble the full request so it goes out in one write.
        let mut request = format!(
            "{method} {path} HTTP/1.1\r\nHost: {host}\r\nConnection: close\r\n",
            path = target.path,
            host = target.host,
        );
        for (name, value) in headers {
            request.push_str(name);
            request.push_str(": ");
            request.push_str(value);
            request.push_str("\r\n");
        }
        if let Some(body) = body {
            request.push_str(&format!("Content-Length: {}\r\n", body.len()));
        }
        request.push_str("\r\n");
        if let Some(body) = body {
            request.push_str(body);
        }

        stream
            .write_all(request.as_bytes())
            .await
            .map_err(TransportError::Write)?;

        // Accumulate until the peer closes or the inactivity window expires.
        let mut raw = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            match timeout(self.read_timeout, stream.read(&mut chunk)).await {
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => raw.extend_from_slice(&chunk[..n]),
                Ok(Err(_)) | Err(_) => break,
            }
        }

        if raw.is_empty() {
            return Err(TransportError::EmptyResponse);
        }

        parse_response(&String::from_utf8_lossy(&raw))
    }
}

#[async_trait]
impl HttpTransport for TcpTransport {
    async fn post(
        &self,
        url: &str,
        body: &str,
        headers: &[(String, String)],
    ) -> Result<HttpResponse, TransportError> {
        self.request("POST", url, Some(body), headers).await
    }

    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<HttpResponse, TransportError> {
        self.request("GET", url, None, headers).await
    }
}

struct Target {
    host: String,
    port: u16,
    path: String,
}

fn parse_url(url: &str) -> Result<Target, TransportError> {
    let (scheme, rest) = url
        .split_once("://")
        .ok_or_else(|| TransportError::InvalidUrl(url.to_string()))?;

    let (authority, path) = match rest.find('/') {
        Some(slash) => (&rest[..slash], rest[slash..].to_string()),
        None => (rest, "/".to_string()),
    };

    if authority.is_empty() {
        return Err(TransportError::InvalidUrl(url.to_string()));
    }

    // An explicit port overrides the scheme default.
    let (host, port) = match authority.rsplit_once(':') {
        Some((host, port)) => (
            host,
            port.parse::<u16>()
                .map_err(|_| TransportError::InvalidUrl(url.to_string()))?,
        ),
        None => (authority, if scheme == "https" { 443 } else { 80 }),
    };

    if host.is_empty() {
        return Err(TransportError::InvalidUrl(url.to_string()));
    }

    Ok(Target {
        host: host.to_string(),
        port,
        path,
    })
}

fn parse_response(text: &str) -> Result<HttpResponse, TransportError> {
    let separator = text
        .find("\r\n\r\n")
        .ok_or(TransportError::MalformedResponse)?;
    let head = &text[..separator];
    let body = text[separator + 4..].to_string();

    let status_line = head.lines().next().unwrap_or_default();
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|token| token.parse::<u16>().ok())
        .ok_or_else(|| TransportError::BadStatusLine(status_line.to_string()))?;

    Ok(HttpResponse { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_parse_url_splits_host_and_path() {
        let target = parse_url("http://api.example.com/v1/chat").unwrap();
        assert_eq!(target.host, "api.example.com");
        assert_eq!(target.port, 80);
        assert_eq!(target.path, "/v1/chat");
    }

    #[test]
    fn test_parse_url_defaults() {
        let target = parse_url("https://api.example.com").unwrap();
        assert_eq!(target.port, 443);
        assert_eq!(target.path, "/");
    }

    #[test]
    fn test_parse_url_explicit_port() {
        let target = parse_url("http://localhost:11434/api/generate").unwrap();
        assert_eq!(target.host, "localhost");
        assert_eq!(target.port, 11434);
        assert_eq!(target.path, "/api/generate");

        assert!(matches!(
            parse_url("http://localhost:notaport/api"),
            Err(TransportError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_parse_url_rejects_missing_scheme_or_host() {
        assert!(matches!(
            parse_url("api.example.com/v1"),
            Err(TransportError::InvalidUrl(_))
        ));
        assert!(matches!(
            parse_url("http:///v1"),
            Err(TransportError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_parse_response_extracts_status_and_body() {
        let resp =
            parse_response("HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\nhello").unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, "hello");
        assert!(resp.is_success());
    }

    #[test]
    fn test_parse_response_missing_separator() {
        assert!(matches!(
            parse_response("HTTP/1.1 200 OK\r\nContent-Type: text/plain"),
            Err(TransportError::MalformedResponse)
        ));
    }

    #[test]
    fn test_parse_response_non_numeric_status() {
        assert!(matches!(
            parse_response("HTTP/1.1 abc OK\r\n\r\nbody"),
            Err(TransportError::BadStatusLine(_))
        ));
    }

    async fn one_shot_server(response: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            // Drain the request head before answering.
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_post_round_trip_over_loopback() {
        let base = one_shot_server(b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n{\"ok\":true}").await;

        let transport = TcpTransport::new();
        let resp = transport
            .post(
                &format!("{base}/v1/test"),
                "{}",
                &[("Content-Type".to_string(), "application/json".to_string())],
            )
            .await
            .unwrap();

        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, "{\"ok\":true}");
    }

    #[tokio::test]
    async fn test_get_over_loopback() {
        let base = one_shot_server(b"HTTP/1.1 404 Not Found\r\n\r\nmissing").await;

        let transport = TcpTransport::new();
        let resp = transport.get(&base, &[]).await.unwrap();
        assert_eq!(resp.status, 404);
        assert!(!resp.is_success());
        assert_eq!(resp.body, "missing");
    }

    #[tokio::test]
    async fn test_immediate_close_is_empty_response() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            drop(socket);
        });

        let transport = TcpTransport::new();
        let result = transport.post(&format!("http://{addr}/"), "{}", &[]).await;
        assert!(matches!(result, Err(TransportError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_connect_failure_is_reported() {
        // Bind then drop to get a port with nothing listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = TcpTransport::new();
        let result = transport.get(&format!("http://{addr}/"), &[]).await;
        assert!(matches!(result, Err(TransportError::Connect { .. })));
    }
}
