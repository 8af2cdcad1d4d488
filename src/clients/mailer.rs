//! Transactional email through the Resend HTTP API.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::emails::Email;

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("email API returned {status}: {body}")]
    Api { status: StatusCode, body: String },
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct SendResponse {
    pub id: String,
}

/// Injected email client; one instance per process.
#[derive(Debug, Clone)]
pub struct Mailer {
    client: Client,
    api_key: String,
    base_url: String,
    from: String,
}

impl Mailer {
    /// # Errors
    ///
    /// Returns [`MailerError::Http`] if the underlying `reqwest::Client` cannot be built.
    pub fn new(
        api_key: &str,
        base_url: &str,
        from: &str,
        timeout_secs: u64,
    ) -> Result<Self, MailerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            from: from.to_owned(),
        })
    }

    /// Sends one rendered email to a single recipient.
    ///
    /// # Errors
    ///
    /// - [`MailerError::Api`] when the email API rejects the message.
    /// - [`MailerError::Http`] on network failure.
    pub async fn send(&self, to: &str, email: &Email) -> Result<SendResponse, MailerError> {
        let body = SendRequest {
            from: &self.from,
            to: vec![to],
            subject: &email.subject,
            html: &email.html,
        };

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailerError::Api { status, body });
        }

        let sent = response.json::<SendResponse>().await?;
        tracing::debug!(email_id = %sent.id, subject = %email.subject, "email sent");
        Ok(sent)
    }
}
