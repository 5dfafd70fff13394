//! Outgoing mail.
//!
//! `HttpMailer` posts to a JSON mail API (Resend-compatible payload),
//! `LogMailer` only traces the message and `RecordingMailer` keeps messages
//! in memory so tests can read them back.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

use crate::config::{MailConfig, MailProvider};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("mail API responded with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError>;
}

pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        tracing::info!(to = %mail.to, subject = %mail.subject, "mail (log only)");
        tracing::debug!("mail body:\n{}", redact_tokens(&mail.html));
        Ok(())
    }
}

const TOKEN_PARAM: &str = "token=";

/// Replaces every `token=<value>` query value so mail bodies can be logged.
pub fn redact_tokens(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(TOKEN_PARAM) {
        let (head, tail) = rest.split_at(pos + TOKEN_PARAM.len());
        out.push_str(head);
        let value_len = tail
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '%')))
            .unwrap_or(tail.len());
        if value_len > 0 {
            out.push_str("[redacted]");
        }
        rest = &tail[value_len..];
    }
    out.push_str(rest);
    out
}

#[derive(Serialize)]
struct SendEmailPayload<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
}

pub struct HttpMailer {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: String, from: String) -> Result<Self, MailError> {
        let client = Client::builder()
            .user_agent("shopfront-backend/0.1 (+reqwest)")
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            api_url,
            api_key,
            from,
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        let payload = SendEmailPayload {
            from: &self.from,
            to: vec![mail.to.as_str()],
            subject: &mail.subject,
            html: &mail.html,
        };

        let res = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = res.status();
        if status.is_success() {
            tracing::info!(to = %mail.to, subject = %mail.subject, "mail accepted");
            Ok(())
        } else {
            let body = res.text().await.unwrap_or_default();
            Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// Keeps every message; never fails.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingMail>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().clone()
    }

    pub fn last(&self) -> Option<OutgoingMail> {
        self.sent.lock().last().cloned()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        self.sent.lock().push(mail);
        Ok(())
    }
}

pub fn build_mailer(config: &MailConfig) -> Result<Box<dyn Mailer>, MailError> {
    match config.provider {
        MailProvider::Log => Ok(Box::new(LogMailer)),
        MailProvider::Http => Ok(Box::new(HttpMailer::new(
            config.api_url.clone(),
            config.api_key.clone(),
            config.from.clone(),
        )?)),
    }
}
