//! Minimal HTTP/1.1 client used by the URL check and the webhook sink.

use bytes::Bytes;
use http::{header, Method, Request, StatusCode, Uri};
use http_body_util::Full;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::{AppError, Result};

#[derive(Error, Debug)]
pub enum HttpClientError {
    #[error("connection failed: {0}")]
    Connect(#[from] std::io::Error),

    #[error("handshake failed: {0}")]
    Handshake(#[source] hyper::Error),

    #[error("request failed: {0}")]
    Request(#[source] hyper::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(#[from] http::Error),
}

/// A validated `http://` endpoint.
#[derive(Debug, Clone)]
pub struct HttpTarget {
    uri: Uri,
    address: String,
    host_header: String,
}

impl HttpTarget {
    pub fn parse(url: &str) -> Result<Self> {
        let uri: Uri = url
            .parse()
            .map_err(|e| AppError::Config(format!("invalid URL '{}': {}", url, e)))?;

        if uri.scheme_str() != Some("http") {
            return Err(AppError::Config(format!(
                "unsupported URL '{}': only http:// targets are supported",
                url
            )));
        }

        let authority = uri
            .authority()
            .ok_or_else(|| AppError::Config(format!("URL '{}' has no host", url)))?;

        Ok(Self {
            address: format!("{}:{}", authority.host(), authority.port_u16().unwrap_or(80)),
            host_header: authority.as_str().to_string(),
            uri,
        })
    }

    pub fn url(&self) -> String {
        self.uri.to_string()
    }

    fn path(&self) -> &str {
        self.uri
            .path_and_query()
            .map(|path| path.as_str())
            .unwrap_or("/")
    }
}

/// Sends one request and returns the response status. The body is discarded.
pub async fn send(
    target: &HttpTarget,
    method: Method,
    content_type: Option<&str>,
    body: Bytes,
) -> std::result::Result<StatusCode, HttpClientError> {
    let stream = TcpStream::connect(&target.address).await?;
    let io = TokioIo::new(stream);

    let (mut sender, conn) = hyper::client::conn::http1::handshake::<_, Full<Bytes>>(io)
        .await
        .map_err(HttpClientError::Handshake)?;

    // Drive the connection in the background.
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            debug!(error = %e, "http connection closed with error");
        }
    });

    let mut builder = Request::builder()
        .method(method)
        .uri(target.path())
        .header(header::HOST, target.host_header.as_str())
        .header(
            header::USER_AGENT,
            concat!("healthwatch/", env!("CARGO_PKG_VERSION")),
        );

    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }

    let request = builder.body(Full::new(body))?;
    let response = sender
        .send_request(request)
        .await
        .map_err(HttpClientError::Request)?;

    Ok(response.status())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target_defaults_port() {
        let target = HttpTarget::parse("http://example.com/status?verbose=1").unwrap();
        assert_eq!(target.address, "example.com:80");
        assert_eq!(target.host_header, "example.com");
        assert_eq!(target.path(), "/status?verbose=1");
    }

    #[test]
    fn test_parse_target_rejects_other_schemes() {
        assert!(HttpTarget::parse("https://example.com").is_err());
        assert!(HttpTarget::parse("/relative/path").is_err());
    }
}
