//! HTTP notification sink backed by a background outbox.
//!
//! # Responsibility
//! - Post notification payloads as JSON to the configured endpoint.
//! - Keep delivery off the caller's thread and retry transient failures.
//!
//! # Invariants
//! - `send` only enqueues; it never performs network I/O.
//! - Payloads are delivered in enqueue order by a single worker.
//! - Dropping the sink flushes queued payloads before returning.

use crate::config::NotifierConfig;
use crate::notify::payload::Notification;
use crate::notify::NotificationSink;
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Notification delivery errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    InvalidEndpoint(String),
    Encode(String),
    HttpStatus(u16),
    Transport(String),
    WorkerSpawn(String),
}

impl NotifyError {
    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::HttpStatus(code) => *code >= 500 || *code == 429,
            Self::InvalidEndpoint(_) | Self::Encode(_) | Self::WorkerSpawn(_) => false,
        }
    }
}

impl Display for NotifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEndpoint(value) => {
                write!(f, "notification endpoint must be an http(s) url, got `{value}`")
            }
            Self::Encode(message) => write!(f, "notification payload encode failed: {message}"),
            Self::HttpStatus(code) => write!(f, "notification rejected with http status {code}"),
            Self::Transport(message) => write!(f, "notification transport error: {message}"),
            Self::WorkerSpawn(message) => write!(f, "notification worker failed to start: {message}"),
        }
    }
}

impl Error for NotifyError {}

/// Sink that posts payloads from a dedicated outbox thread.
pub struct HttpNotificationSink {
    outbox: Mutex<Option<Sender<Notification>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl HttpNotificationSink {
    /// Validates config and starts the outbox worker.
    pub fn spawn(config: &NotifierConfig) -> Result<Self, NotifyError> {
        validate_endpoint(&config.endpoint)?;

        let (tx, rx) = mpsc::channel();
        let worker_config = config.clone();
        let worker = thread::Builder::new()
            .name("safetywalk-notify".to_string())
            .spawn(move || run_outbox(worker_config, rx))
            .map_err(|err| NotifyError::WorkerSpawn(err.to_string()))?;

        info!(
            "event=notify_start module=notify status=ok endpoint={} max_attempts={}",
            config.endpoint, config.max_attempts
        );
        Ok(Self {
            outbox: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Stops accepting payloads and waits until the outbox drains.
    pub fn shutdown(&self) {
        if let Ok(mut outbox) = self.outbox.lock() {
            outbox.take();
        }
        let worker = self.worker.lock().ok().and_then(|mut worker| worker.take());
        if let Some(worker) = worker {
            if worker.join().is_err() {
                error!("event=notify_stop module=notify status=error error_code=worker_panicked");
            }
        }
    }
}

impl NotificationSink for HttpNotificationSink {
    fn send(&self, notification: Notification) {
        let label = notification.label();
        let queued = match self.outbox.lock() {
            Ok(outbox) => match outbox.as_ref() {
                Some(tx) => tx.send(notification).is_ok(),
                None => false,
            },
            Err(_) => false,
        };
        if queued {
            debug!("event=notify_enqueue module=notify status=ok kind={label}");
        } else {
            warn!("event=notify_enqueue module=notify status=error kind={label} error_code=outbox_closed");
        }
    }
}

impl Drop for HttpNotificationSink {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Posts one payload synchronously.
pub fn deliver(
    agent: &ureq::Agent,
    endpoint: &str,
    notification: &Notification,
) -> Result<(), NotifyError> {
    let payload =
        serde_json::to_string(notification).map_err(|err| NotifyError::Encode(err.to_string()))?;
    match agent
        .post(endpoint)
        .set("content-type", "application/json")
        .send_string(&payload)
    {
        Ok(_) => Ok(()),
        Err(ureq::Error::Status(code, _)) => Err(NotifyError::HttpStatus(code)),
        Err(ureq::Error::Transport(transport)) => {
            Err(NotifyError::Transport(transport.to_string()))
        }
    }
}

fn run_outbox(config: NotifierConfig, rx: Receiver<Notification>) {
    let timeout = Duration::from_millis(config.timeout_ms.max(100));
    let agent = ureq::AgentBuilder::new()
        .timeout_connect(timeout)
        .timeout_read(timeout)
        .timeout_write(timeout)
        .build();
    let attempts = config.max_attempts.max(1);

    for notification in rx {
        let label = notification.label();
        for attempt in 1..=attempts {
            match deliver(&agent, &config.endpoint, &notification) {
                Ok(()) => {
                    info!("event=notify_deliver module=notify status=ok kind={label} attempt={attempt}");
                    break;
                }
                Err(err) if err.is_retryable() && attempt < attempts => {
                    warn!(
                        "event=notify_deliver module=notify status=retry kind={label} attempt={attempt} error={err}"
                    );
                    thread::sleep(Duration::from_millis(config.retry_delay_ms));
                }
                Err(err) => {
                    error!(
                        "event=notify_deliver module=notify status=error kind={label} attempt={attempt} error={err}"
                    );
                    break;
                }
            }
        }
    }
    debug!("event=notify_stop module=notify status=ok");
}

fn validate_endpoint(endpoint: &str) -> Result<(), NotifyError> {
    let trimmed = endpoint.trim();
    let has_scheme = trimmed.starts_with("http://") || trimmed.starts_with("https://");
    let has_host = trimmed
        .split_once("://")
        .map(|(_, rest)| !rest.is_empty())
        .unwrap_or(false);
    if has_scheme && has_host {
        Ok(())
    } else {
        Err(NotifyError::InvalidEndpoint(endpoint.to_string()))
    }
}
