mod common;

use chrono::Utc;
use optical_storefront_api::{
    dto::products::RecommendationKind,
    entity::{product_images, products},
    services::catalog_service::recommendations,
};
use sea_orm::{DatabaseBackend, MockDatabase};
use uuid::Uuid;

fn product(id: Uuid, featured: bool) -> products::Model {
    let now = Utc::now().into();
    products::Model {
        id,
        name: "Monture Lyon".to_string(),
        slug: format!("monture-{id}"),
        description: None,
        category: "optique".to_string(),
        gender: "mixte".to_string(),
        brand_id: None,
        base_price: 8_000,
        is_active: true,
        is_featured: featured,
        requires_prescription: true,
        frame_shape: None,
        frame_material: None,
        frame_color: None,
        created_at: now,
        updated_at: now,
    }
}

fn image(product_id: Uuid, sort_order: i32, is_primary: bool) -> product_images::Model {
    product_images::Model {
        id: Uuid::new_v4(),
        product_id,
        variant_id: None,
        url: format!("/images/{sort_order}.jpg"),
        alt_text: None,
        sort_order,
        is_primary,
        created_at: Utc::now().into(),
    }
}

#[tokio::test]
async fn anonymous_visitors_get_latest_products_when_none_are_featured() {
    let id = Uuid::new_v4();
    let orm = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<products::Model>::new()])
        .append_query_results([[product(id, false)]])
        .append_query_results([[image(id, 0, false), image(id, 1, true)]])
        .into_connection();
    let state = common::test_state(orm, "http://127.0.0.1:9");

    let resp = recommendations(&state, None).await.unwrap();

    let data = resp.data.expect("recommendations");
    assert_eq!(data.kind, RecommendationKind::Latest);
    assert_eq!(data.products.len(), 1);
    let lead = data.products[0].primary_image.as_ref().expect("image");
    assert_eq!(lead.url, "/images/1.jpg");
}

#[tokio::test]
async fn customers_without_orders_get_featured_products() {
    let id = Uuid::new_v4();
    let orm = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<products::Model>::new()])
        .append_query_results([[product(id, true)]])
        .append_query_results([Vec::<product_images::Model>::new()])
        .into_connection();
    let state = common::test_state(orm, "http://127.0.0.1:9");
    let user = common::customer(Uuid::new_v4());

    let resp = recommendations(&state, Some(&user)).await.unwrap();

    let data = resp.data.expect("recommendations");
    assert_eq!(data.kind, RecommendationKind::Featured);
    assert!(data.products[0].primary_image.is_none());
    let sql = common::executed_sql(state);
    assert!(sql[0].contains("FROM \"orders\""));
}
