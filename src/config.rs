use std::env;

const ALMA_LIVE_URL: &str = "https://api.getalma.eu/v1";
const ALMA_SANDBOX_URL: &str = "https://api.sandbox.getalma.eu/v1";
const RESEND_URL: &str = "https://api.resend.com";
const TURNSTILE_URL: &str = "https://challenges.cloudflare.com/turnstile/v0/siteverify";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub site_url: String,
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub alma_api_key: String,
    pub alma_api_url: String,
    pub resend_api_key: String,
    pub resend_api_url: String,
    pub email_from: String,
    pub shop_email: String,
    pub turnstile_secret_key: Option<String>,
    pub turnstile_verify_url: String,
    pub http_timeout_secs: u64,
    pub maintenance: MaintenanceConfig,
}

#[derive(Debug, Clone, Default)]
pub struct MaintenanceConfig {
    pub enabled: bool,
    pub bypass_secret: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);

        let alma_api_url = env::var("ALMA_API_URL").unwrap_or_else(|_| {
            if flag("ALMA_SANDBOX") {
                ALMA_SANDBOX_URL.to_string()
            } else {
                ALMA_LIVE_URL.to_string()
            }
        });

        Ok(Self {
            database_url,
            host,
            port,
            site_url: env::var("SITE_URL")
                .unwrap_or_else(|_| "https://visionnaireopticiens.vercel.app".to_string())
                .trim_end_matches('/')
                .to_string(),
            jwt_secret,
            jwt_audience: env::var("JWT_AUDIENCE").unwrap_or_else(|_| "authenticated".to_string()),
            alma_api_key: env::var("ALMA_API_KEY").unwrap_or_default(),
            alma_api_url,
            resend_api_key: env::var("RESEND_API_KEY").unwrap_or_default(),
            resend_api_url: env::var("RESEND_API_URL").unwrap_or_else(|_| RESEND_URL.to_string()),
            email_from: env::var("EMAIL_FROM").unwrap_or_else(|_| {
                "Visionnaire Opticiens <contact@visionnairesopticiens.fr>".to_string()
            }),
            shop_email: env::var("SHOP_EMAIL")
                .unwrap_or_else(|_| "contact@visionnairesopticiens.fr".to_string()),
            turnstile_secret_key: env::var("TURNSTILE_SECRET_KEY")
                .ok()
                .filter(|s| !s.is_empty()),
            turnstile_verify_url: env::var("TURNSTILE_VERIFY_URL")
                .unwrap_or_else(|_| TURNSTILE_URL.to_string()),
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(15),
            maintenance: MaintenanceConfig {
                enabled: flag("MAINTENANCE_MODE"),
                bypass_secret: env::var("MAINTENANCE_BYPASS_SECRET")
                    .ok()
                    .filter(|s| !s.is_empty()),
            },
        })
    }
}

fn flag(name: &str) -> bool {
    env::var(name).map(|v| v == "true").unwrap_or(false)
}
