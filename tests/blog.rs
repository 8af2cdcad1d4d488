mod common;

use chrono::Utc;
use optical_storefront_api::{
    dto::blog::UpdateBlogPostRequest,
    entity::{blog_posts, profiles},
    error::AppError,
    services::blog_service::{get_published, update_post},
};
use sea_orm::{DatabaseBackend, MockDatabase};
use uuid::Uuid;

fn draft(id: Uuid) -> blog_posts::Model {
    let now = Utc::now().into();
    blog_posts::Model {
        id,
        title: "Choisir sa monture".to_string(),
        slug: "choisir-sa-monture".to_string(),
        excerpt: None,
        content: "Forme du visage, matière, couleur.".to_string(),
        cover_image_url: None,
        is_published: false,
        published_at: None,
        author_id: None,
        meta_title: None,
        meta_description: None,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn drafts_are_not_served_publicly() {
    let orm = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<blog_posts::Model>::new()])
        .into_connection();
    let state = common::test_state(orm, "http://127.0.0.1:9");

    let err = get_published(&state, "choisir-sa-monture").await.unwrap_err();

    assert!(matches!(err, AppError::NotFound(msg) if msg == "Article introuvable"));
    let sql = common::executed_sql(state);
    assert!(sql[0].contains("\"is_published\" = $"));
}

#[tokio::test]
async fn publishing_a_draft_stamps_its_date() {
    let admin_id = Uuid::new_v4();
    let post_id = Uuid::new_v4();
    let admin = profiles::Model {
        role: "admin".to_string(),
        ..common::profile_model(admin_id)
    };
    let mut published = draft(post_id);
    published.is_published = true;
    published.published_at = Some(Utc::now().into());

    let orm = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[admin]])
        .append_query_results([[draft(post_id)]])
        .append_query_results([[published]])
        .into_connection();
    let state = common::test_state(orm, "http://127.0.0.1:9");

    let resp = update_post(
        &state,
        &common::customer(admin_id),
        post_id,
        UpdateBlogPostRequest {
            is_published: Some(true),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let post = resp.data.expect("post");
    assert!(post.is_published);
    assert!(post.published_at.is_some());
    let sql = common::executed_sql(state);
    let update = sql
        .iter()
        .find(|stmt| stmt.starts_with("UPDATE \"blog_posts\""))
        .expect("update statement");
    assert!(update.contains("\"published_at\" = $"));
}
