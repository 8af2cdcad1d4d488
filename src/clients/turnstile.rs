//! Cloudflare Turnstile token verification.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptchaError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    success: bool,
    #[serde(rename = "error-codes", default)]
    error_codes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TurnstileVerifier {
    client: Client,
    secret: Option<String>,
    verify_url: String,
}

impl TurnstileVerifier {
    /// # Errors
    ///
    /// Returns [`CaptchaError::Http`] if the underlying `reqwest::Client` cannot be built.
    pub fn new(
        secret: Option<String>,
        verify_url: &str,
        timeout_secs: u64,
    ) -> Result<Self, CaptchaError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            secret,
            verify_url: verify_url.to_owned(),
        })
    }

    /// Returns whether the token proves a human. A missing token or missing secret
    /// counts as a failed check; only transport failures are errors.
    ///
    /// # Errors
    ///
    /// Returns [`CaptchaError::Http`] on network failure or an unparseable body.
    pub async fn verify(&self, token: &str, remote_ip: Option<&str>) -> Result<bool, CaptchaError> {
        if token.is_empty() {
            tracing::warn!("captcha token missing");
            return Ok(false);
        }
        let Some(secret) = self.secret.as_deref() else {
            tracing::error!("TURNSTILE_SECRET_KEY not configured");
            return Ok(false);
        };

        let mut form = vec![("secret", secret), ("response", token)];
        if let Some(ip) = remote_ip {
            form.push(("remoteip", ip));
        }

        let result = self
            .client
            .post(&self.verify_url)
            .form(&form)
            .send()
            .await?
            .json::<VerifyResponse>()
            .await?;

        if !result.success {
            tracing::warn!(error_codes = ?result.error_codes, "captcha verification failed");
        }
        Ok(result.success)
    }
}
