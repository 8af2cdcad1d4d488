use std::sync::Arc;

use crate::{
    clients::{AlmaClient, Mailer, TurnstileVerifier},
    config::AppConfig,
    db::OrmConn,
};

/// The connection sits behind an `Arc`: sea-orm's mock connection is not `Clone`.
#[derive(Clone)]
pub struct AppState {
    pub orm: Arc<OrmConn>,
    pub config: Arc<AppConfig>,
    pub alma: AlmaClient,
    pub mailer: Mailer,
    pub captcha: TurnstileVerifier,
}

impl AppState {
    /// Build the outbound clients from configuration around an existing connection.
    pub fn new(orm: OrmConn, config: AppConfig) -> anyhow::Result<Self> {
        let timeout = config.http_timeout_secs;
        let alma = AlmaClient::new(&config.alma_api_key, &config.alma_api_url, timeout)?;
        let mailer = Mailer::new(
            &config.resend_api_key,
            &config.resend_api_url,
            &config.email_from,
            timeout,
        )?;
        let captcha = TurnstileVerifier::new(
            config.turnstile_secret_key.clone(),
            &config.turnstile_verify_url,
            timeout,
        )?;

        Ok(Self {
            orm: Arc::new(orm),
            config: Arc::new(config),
            alma,
            mailer,
            captcha,
        })
    }
}
