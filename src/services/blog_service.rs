use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::blog::{BlogPostList, CreateBlogPostRequest, UpdateBlogPostRequest},
    entity::blog_posts::{ActiveModel as PostActive, Column as PostCol, Entity as BlogPosts},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, require_admin},
    models::{BlogPost, BlogPostSummary},
    response::{ApiResponse, Meta},
    routes::params::PageQuery,
    services::catalog_service::slugify,
    state::AppState,
};

/// `published_at` after a save: stamped when a draft goes live, cleared when unpublished.
pub fn publication_date(
    was_published: bool,
    current: Option<DateTime<Utc>>,
    publish: bool,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match (was_published, publish) {
        (_, false) => None,
        (false, true) => Some(now),
        (true, true) => current.or(Some(now)),
    }
}

pub async fn list_published(
    state: &AppState,
    query: PageQuery,
) -> AppResult<ApiResponse<BlogPostList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let finder = BlogPosts::find()
        .filter(PostCol::IsPublished.eq(true))
        .order_by_desc(PostCol::PublishedAt);

    let total = finder.clone().count(&*state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&*state.orm)
        .await?
        .into_iter()
        .map(BlogPostSummary::from)
        .collect();

    Ok(ApiResponse::success(
        "Articles",
        BlogPostList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_published(state: &AppState, slug: &str) -> AppResult<ApiResponse<BlogPost>> {
    let post = BlogPosts::find()
        .filter(PostCol::Slug.eq(slug))
        .filter(PostCol::IsPublished.eq(true))
        .one(&*state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Article introuvable"))?;

    Ok(ApiResponse::success("Article", BlogPost::from(post), None))
}

/// Drafts included, newest first.
pub async fn list_all_posts(
    state: &AppState,
    user: &AuthUser,
    query: PageQuery,
) -> AppResult<ApiResponse<BlogPostList>> {
    require_admin(&*state.orm, user).await?;
    let (page, limit, offset) = query.pagination().normalize();

    let finder = BlogPosts::find().order_by_desc(PostCol::CreatedAt);
    let total = finder.clone().count(&*state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&*state.orm)
        .await?
        .into_iter()
        .map(BlogPostSummary::from)
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        BlogPostList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

async fn ensure_slug_free(state: &AppState, slug: &str, except: Option<Uuid>) -> AppResult<()> {
    let mut finder = BlogPosts::find().filter(PostCol::Slug.eq(slug));
    if let Some(id) = except {
        finder = finder.filter(PostCol::Id.ne(id));
    }
    if finder.count(&*state.orm).await? > 0 {
        return Err(AppError::bad_request(format!("Le slug {slug} est déjà utilisé")));
    }
    Ok(())
}

pub async fn create_post(
    state: &AppState,
    user: &AuthUser,
    payload: CreateBlogPostRequest,
) -> AppResult<ApiResponse<BlogPost>> {
    require_admin(&*state.orm, user).await?;
    if payload.title.trim().is_empty() || payload.content.trim().is_empty() {
        return Err(AppError::bad_request("Titre et contenu sont obligatoires"));
    }
    let slug = payload
        .slug
        .as_deref()
        .map(slugify)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| slugify(&payload.title));
    ensure_slug_free(state, &slug, None).await?;

    let published_at = publication_date(false, None, payload.is_published, Utc::now());
    let post = PostActive {
        id: Set(Uuid::new_v4()),
        title: Set(payload.title.trim().to_string()),
        slug: Set(slug),
        excerpt: Set(payload.excerpt.filter(|s| !s.is_empty())),
        content: Set(payload.content),
        cover_image_url: Set(payload.cover_image_url.filter(|s| !s.is_empty())),
        is_published: Set(payload.is_published),
        published_at: Set(published_at.map(Into::into)),
        author_id: Set(Some(user.user_id)),
        meta_title: Set(payload.meta_title.filter(|s| !s.is_empty())),
        meta_description: Set(payload.meta_description.filter(|s| !s.is_empty())),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&*state.orm)
    .await?;

    if let Err(err) = log_audit(
        &*state.orm,
        Some(user.user_id),
        "blog_post_create",
        Some("blog_posts"),
        Some(serde_json::json!({ "post_id": post.id, "published": post.is_published })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Article créé", BlogPost::from(post), Some(Meta::empty())))
}

pub async fn update_post(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateBlogPostRequest,
) -> AppResult<ApiResponse<BlogPost>> {
    require_admin(&*state.orm, user).await?;
    let existing = BlogPosts::find_by_id(id)
        .one(&*state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Article introuvable"))?;

    let was_published = existing.is_published;
    let current_date = existing.published_at.map(|dt| dt.with_timezone(&Utc));
    let mut active: PostActive = existing.into();

    if let Some(title) = payload.title {
        if title.trim().is_empty() {
            return Err(AppError::bad_request("Titre et contenu sont obligatoires"));
        }
        active.title = Set(title.trim().to_string());
    }
    if let Some(content) = payload.content {
        if content.trim().is_empty() {
            return Err(AppError::bad_request("Titre et contenu sont obligatoires"));
        }
        active.content = Set(content);
    }
    if let Some(slug) = payload.slug.as_deref().map(slugify).filter(|s| !s.is_empty()) {
        ensure_slug_free(state, &slug, Some(id)).await?;
        active.slug = Set(slug);
    }
    if let Some(excerpt) = payload.excerpt {
        active.excerpt = Set(Some(excerpt).filter(|s| !s.is_empty()));
    }
    if let Some(cover) = payload.cover_image_url {
        active.cover_image_url = Set(Some(cover).filter(|s| !s.is_empty()));
    }
    if let Some(meta_title) = payload.meta_title {
        active.meta_title = Set(Some(meta_title).filter(|s| !s.is_empty()));
    }
    if let Some(meta_description) = payload.meta_description {
        active.meta_description = Set(Some(meta_description).filter(|s| !s.is_empty()));
    }
    if let Some(publish) = payload.is_published {
        let date = publication_date(was_published, current_date, publish, Utc::now());
        active.is_published = Set(publish);
        active.published_at = Set(date.map(Into::into));
    }
    active.updated_at = Set(Utc::now().into());
    let post = active.update(&*state.orm).await?;

    if let Err(err) = log_audit(
        &*state.orm,
        Some(user.user_id),
        "blog_post_update",
        Some("blog_posts"),
        Some(serde_json::json!({ "post_id": post.id, "published": post.is_published })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Updated", BlogPost::from(post), Some(Meta::empty())))
}

pub async fn delete_post(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    require_admin(&*state.orm, user).await?;
    let result = BlogPosts::delete_by_id(id).exec(&*state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Article introuvable"));
    }
    Ok(ApiResponse::success(
        "Article supprimé",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}
