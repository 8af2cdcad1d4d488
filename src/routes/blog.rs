use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use uuid::Uuid;

use crate::{
    dto::blog::{BlogPostList, CreateBlogPostRequest, UpdateBlogPostRequest},
    error::{AppJson, AppResult},
    middleware::auth::AuthUser,
    models::BlogPost,
    response::ApiResponse,
    routes::params::PageQuery,
    services::blog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts))
        .route("/{slug}", get(get_post))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/blog", get(list_all_posts).post(create_post))
        .route("/blog/{id}", patch(update_post).delete(delete_post))
}

#[utoipa::path(
    get,
    path = "/api/blog",
    params(PageQuery),
    responses(
        (status = 200, description = "Published articles, newest first", body = ApiResponse<BlogPostList>),
    ),
    tag = "Blog"
)]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<BlogPostList>>> {
    let resp = blog_service::list_published(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/blog/{slug}",
    params(("slug" = String, Path, description = "Article slug")),
    responses(
        (status = 200, description = "Published article", body = ApiResponse<BlogPost>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Blog"
)]
pub async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<BlogPost>>> {
    let resp = blog_service::get_published(&state, &slug).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/blog",
    params(PageQuery),
    responses(
        (status = 200, description = "All articles including drafts", body = ApiResponse<BlogPostList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_all_posts(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<BlogPostList>>> {
    let resp = blog_service::list_all_posts(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/blog",
    request_body = CreateBlogPostRequest,
    responses(
        (status = 200, description = "Article created", body = ApiResponse<BlogPost>),
        (status = 400, description = "Slug already used"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_post(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateBlogPostRequest>,
) -> AppResult<Json<ApiResponse<BlogPost>>> {
    let resp = blog_service::create_post(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/blog/{id}",
    params(("id" = Uuid, Path, description = "Article ID")),
    request_body = UpdateBlogPostRequest,
    responses(
        (status = 200, description = "Article updated", body = ApiResponse<BlogPost>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateBlogPostRequest>,
) -> AppResult<Json<ApiResponse<BlogPost>>> {
    let resp = blog_service::update_post(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/blog/{id}",
    params(("id" = Uuid, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Article deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = blog_service::delete_post(&state, &user, id).await?;
    Ok(Json(resp))
}
