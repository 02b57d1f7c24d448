//! Destinations for published reports

use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use mime::Mime;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::SinkConfig;
use crate::error::{AppError, Result};
use crate::http_client::{self, HttpTarget};

/// An encoded report ready for a sink.
#[derive(Debug, Clone)]
pub struct EncodedMessage {
    pub report_id: Uuid,
    pub content_type: Mime,
    pub body: Bytes,
}

impl EncodedMessage {
    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// One-way channel to an external consumer. A single attempt per message;
/// implementations must not retry.
#[async_trait::async_trait]
pub trait Sink: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, message: &EncodedMessage) -> Result<()>;
}

/// Writes reports to the log.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait::async_trait]
impl Sink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, message: &EncodedMessage) -> Result<()> {
        info!(
            report_id = %message.report_id,
            content_type = %message.content_type,
            bytes = message.len(),
            "Health report published"
        );
        debug!("{}", String::from_utf8_lossy(&message.body));
        Ok(())
    }
}

/// Forwards reports into an in-process channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::Sender<EncodedMessage>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<EncodedMessage>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }
}

#[async_trait::async_trait]
impl Sink for ChannelSink {
    fn name(&self) -> &str {
        "channel"
    }

    async fn send(&self, message: &EncodedMessage) -> Result<()> {
        self.sender
            .send(message.clone())
            .await
            .map_err(|_| AppError::Sink("channel receiver dropped".to_string()))
    }
}

/// POSTs reports to a webhook.
#[derive(Debug, Clone)]
pub struct HttpSink {
    target: HttpTarget,
}

impl HttpSink {
    pub fn new(url: &str) -> Result<Self> {
        Ok(Self {
            target: HttpTarget::parse(url)?,
        })
    }
}

#[async_trait::async_trait]
impl Sink for HttpSink {
    fn name(&self) -> &str {
        "http"
    }

    async fn send(&self, message: &EncodedMessage) -> Result<()> {
        let status = http_client::send(
            &self.target,
            Method::POST,
            Some(message.content_type.as_ref()),
            message.body.clone(),
        )
        .await
        .map_err(|e| AppError::Sink(format!("{} ({})", e, self.target.url())))?;

        if status.is_success() {
            Ok(())
        } else {
            Err(AppError::Sink(format!(
                "webhook {} returned {}",
                self.target.url(),
                status
            )))
        }
    }
}

pub fn sink_from_config(config: &SinkConfig) -> Result<Arc<dyn Sink>> {
    let sink: Arc<dyn Sink> = match config {
        SinkConfig::Log => Arc::new(LogSink),
        SinkConfig::Http { url } => Arc::new(HttpSink::new(url)?),
    };
    Ok(sink)
}
