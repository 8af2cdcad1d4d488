use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    routing::post,
};

use crate::{
    dto::contact::{Accepted, AppointmentRequest, NewsletterRequest},
    error::{AppJson, AppResult},
    response::ApiResponse,
    services::contact_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rendez-vous", post(request_appointment))
        .route("/newsletter", post(subscribe_newsletter))
}

/// First hop of `x-forwarded-for`, else `x-real-ip`.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
}

#[utoipa::path(
    post,
    path = "/api/rendez-vous",
    request_body = AppointmentRequest,
    responses(
        (status = 200, description = "Request received", body = ApiResponse<Accepted>),
        (status = 400, description = "Missing fields or invalid email"),
    ),
    security(()),
    tag = "Contact"
)]
pub async fn request_appointment(
    State(state): State<AppState>,
    AppJson(payload): AppJson<AppointmentRequest>,
) -> AppResult<Json<ApiResponse<Accepted>>> {
    let resp = contact_service::request_appointment(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/newsletter",
    request_body = NewsletterRequest,
    responses(
        (status = 200, description = "Subscribed", body = ApiResponse<Accepted>),
        (status = 400, description = "Invalid email"),
        (status = 403, description = "Captcha verification failed"),
    ),
    security(()),
    tag = "Contact"
)]
pub async fn subscribe_newsletter(
    State(state): State<AppState>,
    headers: HeaderMap,
    AppJson(payload): AppJson<NewsletterRequest>,
) -> AppResult<Json<ApiResponse<Accepted>>> {
    let ip = client_ip(&headers);
    let resp = contact_service::subscribe_newsletter(&state, payload, ip.as_deref()).await?;
    Ok(Json(resp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwarded_for_takes_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "10.0.0.2".parse().unwrap());
        assert_eq!(client_ip(&headers).as_deref(), Some("10.0.0.2"));
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        assert_eq!(client_ip(&headers).as_deref(), Some("203.0.113.7"));
        assert_eq!(client_ip(&HeaderMap::new()), None);
    }
}
