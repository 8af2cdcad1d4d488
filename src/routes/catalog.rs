use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};

use crate::{
    dto::products::{
        BrandDetail, BrandList, LensOptionList, ProductDetail, ProductList, Recommendations,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::ProductQuery,
    services::catalog_service,
    state::AppState,
};

pub fn products_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/featured", get(featured_products))
        .route("/{slug}", get(get_product))
}

pub fn brands_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_brands))
        .route("/{slug}", get(get_brand))
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(ProductQuery),
    responses(
        (status = 200, description = "Active products", body = ApiResponse<ProductList>),
    ),
    security(()),
    tag = "Catalogue"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = catalog_service::list_products(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/featured",
    responses(
        (status = 200, description = "Personalised, featured or latest products, with the selection type", body = ApiResponse<Recommendations>),
    ),
    security((), ("bearer_auth" = [])),
    tag = "Catalogue"
)]
pub async fn featured_products(
    State(state): State<AppState>,
    user: Option<AuthUser>,
) -> AppResult<Json<ApiResponse<Recommendations>>> {
    let resp = catalog_service::recommendations(&state, user.as_ref()).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/{slug}",
    params(("slug" = String, Path, description = "Product slug")),
    responses(
        (status = 200, description = "Product with its variants", body = ApiResponse<ProductDetail>),
        (status = 404, description = "Not Found"),
    ),
    security(()),
    tag = "Catalogue"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<ProductDetail>>> {
    let resp = catalog_service::get_product(&state, &slug).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/brands",
    responses((status = 200, description = "Active brands", body = ApiResponse<BrandList>)),
    security(()),
    tag = "Catalogue"
)]
pub async fn list_brands(State(state): State<AppState>) -> AppResult<Json<ApiResponse<BrandList>>> {
    let resp = catalog_service::list_brands(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/brands/{slug}",
    params(("slug" = String, Path, description = "Brand slug")),
    responses(
        (status = 200, description = "Brand with its products", body = ApiResponse<BrandDetail>),
        (status = 404, description = "Not Found"),
    ),
    security(()),
    tag = "Catalogue"
)]
pub async fn get_brand(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<BrandDetail>>> {
    let resp = catalog_service::get_brand(&state, &slug).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/lens-options",
    responses((status = 200, description = "Lens options for the configurator", body = ApiResponse<LensOptionList>)),
    security(()),
    tag = "Catalogue"
)]
pub async fn list_lens_options(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<LensOptionList>>> {
    let resp = catalog_service::list_lens_options(&state).await?;
    Ok(Json(resp))
}
