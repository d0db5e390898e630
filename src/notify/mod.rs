//! Best-effort side effects: emails and calendar events.
//!
//! Nothing here can fail a request. Deliveries run on spawned tasks, are
//! retried a bounded number of times, and are dropped with a warning after
//! the last attempt.

pub mod calendar;
pub mod email;
pub mod templates;

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::Config;
use calendar::CalendarClient;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("invalid address: {0}")]
    Address(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("calendar API error: {0}")]
    Calendar(String),
}

#[derive(Debug, Clone)]
pub struct InlineImage {
    pub content_id: String,
    pub png: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub inline_image: Option<InlineImage>,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), NotifyError>;
}

/// Used when SMTP is not configured: logs instead of sending.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, email: &Email) -> Result<(), NotifyError> {
        tracing::info!(to = %email.to, subject = %email.subject, "email delivery disabled, dropping message");
        Ok(())
    }
}

/// Keeps every message in memory. Handy for tests and local runs.
#[derive(Default, Clone)]
pub struct MemoryNotifier {
    sent: Arc<Mutex<Vec<Email>>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn send(&self, email: &Email) -> Result<(), NotifyError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(email.clone());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

/// Run `op` until it succeeds or the attempts run out, doubling the delay
/// between attempts.
pub async fn with_retry<T, F, Fut>(label: &str, policy: RetryPolicy, mut op: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, NotifyError>>,
{
    let mut delay = policy.base_delay;
    for attempt in 1..=policy.max_attempts {
        match op().await {
            Ok(value) => return Some(value),
            Err(e) if attempt < policy.max_attempts => {
                tracing::warn!(label, attempt, "side effect failed, retrying: {e}");
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(e) => {
                tracing::warn!(label, attempt, "side effect failed, giving up: {e}");
            }
        }
    }
    None
}

#[derive(Clone)]
pub struct Notifications {
    notifier: Arc<dyn Notifier>,
    calendar: CalendarClient,
    retry: RetryPolicy,
}

impl Notifications {
    pub fn new(notifier: Arc<dyn Notifier>, calendar: CalendarClient) -> Self {
        Self {
            notifier,
            calendar,
            retry: RetryPolicy::default(),
        }
    }

    /// SMTP when configured, otherwise log-only.
    pub fn from_config(config: &Config) -> Result<Self, NotifyError> {
        let notifier: Arc<dyn Notifier> = match &config.smtp {
            Some(smtp) => Arc::new(email::SmtpNotifier::new(smtp)?),
            None => {
                tracing::warn!("SMTP_HOST not set, outgoing email is disabled");
                Arc::new(LogNotifier)
            }
        };
        Ok(Self::new(
            notifier,
            CalendarClient::new(config.utc_offset_minutes),
        ))
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn calendar(&self) -> &CalendarClient {
        &self.calendar
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Deliver on the current task, with retries.
    pub async fn deliver(&self, email: Email) -> bool {
        let notifier = self.notifier.clone();
        let delivered = with_retry("email", self.retry, || {
            let notifier = notifier.clone();
            let email = email.clone();
            async move { notifier.send(&email).await }
        })
        .await;
        if delivered.is_some() {
            tracing::info!(to = %email.to, subject = %email.subject, "email sent");
        }
        delivered.is_some()
    }

    /// Fire and forget.
    pub fn send_in_background(&self, email: Email) {
        let this = self.clone();
        tokio::spawn(async move {
            this.deliver(email).await;
        });
    }
}
