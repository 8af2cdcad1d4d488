//! Maintenance gate: while enabled, storefront paths redirect to `/maintenance`
//! unless the request carries the bypass cookie.

use axum::{
    Json,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    config::MaintenanceConfig,
    response::{ApiResponse, Meta},
    state::AppState,
};

const BYPASS_COOKIE: &str = "maintenance_bypass";
const OPEN_PREFIXES: [&str; 5] = ["/maintenance", "/admin", "/auth", "/api", "/health"];

#[derive(Serialize, ToSchema)]
pub struct MaintenanceData {
    pub maintenance: bool,
}

/// Decide whether a request must be sent to the maintenance page.
pub fn must_redirect(config: &MaintenanceConfig, path: &str, cookie_header: Option<&str>) -> bool {
    if !config.enabled {
        return false;
    }
    if OPEN_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        return false;
    }
    let Some(secret) = config.bypass_secret.as_deref() else {
        return true;
    };
    let bypassed = cookie_header
        .into_iter()
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .any(|(name, value)| name == BYPASS_COOKIE && value == secret);
    !bypassed
}

pub async fn maintenance_gate(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let cookies = request
        .headers()
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok());

    if must_redirect(&state.config.maintenance, request.uri().path(), cookies) {
        tracing::debug!(path = %request.uri().path(), "maintenance redirect");
        return Redirect::temporary("/maintenance").into_response();
    }

    next.run(request).await
}

#[utoipa::path(
    get,
    path = "/maintenance",
    responses(
        (status = 503, description = "Site under maintenance", body = ApiResponse<MaintenanceData>),
    ),
    tag = "Health"
)]
pub async fn maintenance_page() -> (StatusCode, Json<ApiResponse<MaintenanceData>>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ApiResponse::success(
            "Site en maintenance. Nous revenons très bientôt.",
            MaintenanceData { maintenance: true },
            Some(Meta::empty()),
        )),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled(secret: Option<&str>) -> MaintenanceConfig {
        MaintenanceConfig {
            enabled: true,
            bypass_secret: secret.map(str::to_string),
        }
    }

    #[test]
    fn disabled_gate_lets_everything_through() {
        assert!(!must_redirect(&MaintenanceConfig::default(), "/catalogue", None));
    }

    #[test]
    fn open_prefixes_are_never_redirected() {
        let config = enabled(Some("s3cret"));
        for path in ["/api/products", "/health", "/maintenance", "/admin/orders", "/auth/callback"] {
            assert!(!must_redirect(&config, path, None), "{path}");
        }
        assert!(must_redirect(&config, "/docs", None));
    }

    #[test]
    fn bypass_cookie_must_match_the_secret() {
        let config = enabled(Some("s3cret"));
        assert!(!must_redirect(&config, "/", Some("theme=dark; maintenance_bypass=s3cret")));
        assert!(must_redirect(&config, "/", Some("maintenance_bypass=wrong")));
        assert!(must_redirect(&enabled(None), "/", Some("maintenance_bypass=")));
    }
}
