use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get},
};
use uuid::Uuid;

use crate::{
    dto::account::{AddressInput, AddressList, UpdateProfileRequest},
    error::{AppJson, AppResult},
    middleware::auth::AuthUser,
    models::{Address, Profile},
    response::ApiResponse,
    routes::{appointments, orders},
    services::account_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_profile).patch(update_profile))
        .route("/addresses", get(list_addresses).post(add_address))
        .route("/addresses/{id}", delete(delete_address))
        .merge(orders::account_router())
        .merge(appointments::account_router())
}

#[utoipa::path(
    get,
    path = "/api/account",
    responses(
        (status = 200, description = "Profile of the caller", body = ApiResponse<Profile>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Profile>>> {
    let resp = account_service::get_profile(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/account",
    request_body = UpdateProfileRequest,
    responses((status = 200, description = "Profile updated", body = ApiResponse<Profile>)),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    let resp = account_service::update_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/account/addresses",
    responses((status = 200, description = "Saved addresses", body = ApiResponse<AddressList>)),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn list_addresses(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<AddressList>>> {
    let resp = account_service::list_addresses(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/account/addresses",
    request_body = AddressInput,
    responses(
        (status = 200, description = "Address saved", body = ApiResponse<Address>),
        (status = 400, description = "Missing fields"),
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn add_address(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<AddressInput>,
) -> AppResult<Json<ApiResponse<Address>>> {
    let resp = account_service::add_address(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/account/addresses/{id}",
    params(("id" = Uuid, Path, description = "Address ID")),
    responses(
        (status = 200, description = "Address deleted"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn delete_address(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = account_service::delete_address(&state, &user, id).await?;
    Ok(Json(resp))
}
