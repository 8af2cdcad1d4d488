mod common;

use optical_storefront_api::{
    db::{create_pool, orm_from_pool, run_migrations},
    dto::orders::{CartLine, CreateOrderRequest, ShippingAddressInput},
    entity::{
        order_status_history::{Column as HistoryCol, Entity as History},
        orders::Entity as Orders,
        product_variants::ActiveModel as VariantActive,
        products::ActiveModel as ProductActive,
        profiles::ActiveModel as ProfileActive,
    },
    middleware::auth::AuthUser,
    models::{DeliveryMethod, OrderStatus},
    services::{order_service, payment_service::apply_payment_transition},
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

// Checkout pricing against a real database, then a duplicated payment confirmation.
#[tokio::test]
async fn checkout_totals_and_idempotent_payment() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;
    let user = create_profile(&state).await?;
    let frame = create_variant(&state, 10_000).await?;
    let case = create_variant(&state, 6_000).await?;
    let sunglasses = create_variant(&state, 8_000).await?;

    // 100.00 + 60.00 collected in store: no shipping.
    let in_store = order_service::create_order(
        &state,
        &user,
        CreateOrderRequest {
            items: vec![line(frame, 1), line(case, 1)],
            delivery_method: DeliveryMethod::Boutique,
            shipping_address: None,
            payment_method: None,
        },
    )
    .await?
    .data
    .expect("order data");
    assert_eq!(in_store.total, 16_000);
    let created = order_service::get_my_order(&state, &user, in_store.order_id)
        .await?
        .data
        .expect("detail");
    assert_eq!(created.order.subtotal, 16_000);
    assert_eq!(created.order.shipping_cost, 0);
    assert_eq!(created.items.len(), 2);
    assert_eq!(created.history.len(), 1);
    assert_eq!(created.history[0].status, OrderStatus::EnAttentePaiement.as_str());

    // 80.00 delivered: below the free-shipping threshold.
    let delivered = order_service::create_order(
        &state,
        &user,
        CreateOrderRequest {
            items: vec![line(sunglasses, 1)],
            delivery_method: DeliveryMethod::Domicile,
            shipping_address: Some(ShippingAddressInput {
                first_name: Some("Claire".into()),
                last_name: Some("Martin".into()),
                street: Some("12 rue de la Paix".into()),
                street_2: None,
                city: Some("Paris".into()),
                postal_code: Some("75002".into()),
                country: None,
            }),
            payment_method: None,
        },
    )
    .await?
    .data
    .expect("order data");
    assert_eq!(delivered.total, 8_690);
    assert!(delivered.order_number.starts_with("VO-"));
    assert_ne!(delivered.order_number, in_store.order_number);

    let order = Orders::find_by_id(delivered.order_id)
        .one(&*state.orm)
        .await?
        .expect("order row");
    assert_eq!(order.shipping_cost, 690);
    assert_eq!(order.status, OrderStatus::EnAttentePaiement.as_str());
    assert_eq!(order.shipping_country.as_deref(), Some("France"));

    // Webhook and return confirmation racing: only the first one applies.
    let first = apply_payment_transition(
        &*state.orm,
        delivered.order_id,
        OrderStatus::Payee,
        "Paiement Alma confirmé (in_progress) - ID: test",
    )
    .await?;
    let second = apply_payment_transition(
        &*state.orm,
        delivered.order_id,
        OrderStatus::Payee,
        "Paiement Alma confirmé (in_progress) - ID: test",
    )
    .await?;
    assert!(first);
    assert!(!second);

    let paid_rows = History::find()
        .filter(HistoryCol::OrderId.eq(delivered.order_id))
        .filter(HistoryCol::Status.eq(OrderStatus::Payee.as_str()))
        .count(&*state.orm)
        .await?;
    assert_eq!(paid_rows, 1);

    let detail = order_service::get_my_order(&state, &user, delivered.order_id)
        .await?
        .data
        .expect("detail");
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.history.len(), 2);

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    run_migrations(&pool).await?;
    let state = AppState::new(orm_from_pool(pool), common::test_config("http://127.0.0.1:9"))?;
    Ok(state)
}

async fn create_profile(state: &AppState) -> anyhow::Result<AuthUser> {
    let id = Uuid::new_v4();
    let email = format!("flow-{id}@example.fr");
    ProfileActive {
        id: Set(id),
        email: Set(email.clone()),
        first_name: Set(Some("Claire".into())),
        last_name: Set(Some("Martin".into())),
        phone: Set(None),
        role: Set("client".into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&*state.orm)
    .await?;

    Ok(AuthUser {
        user_id: id,
        email: Some(email),
    })
}

async fn create_variant(state: &AppState, price: i64) -> anyhow::Result<Uuid> {
    let product_id = Uuid::new_v4();
    ProductActive {
        id: Set(product_id),
        name: Set("Monture test".into()),
        slug: Set(format!("monture-test-{product_id}")),
        description: Set(None),
        category: Set("optique".into()),
        gender: Set("mixte".into()),
        brand_id: Set(None),
        base_price: Set(price),
        is_active: Set(true),
        is_featured: Set(false),
        requires_prescription: Set(false),
        frame_shape: Set(None),
        frame_material: Set(None),
        frame_color: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&*state.orm)
    .await?;

    let variant = VariantActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        sku: Set(None),
        color_name: Set("Noir".into()),
        color_hex: Set(Some("#000000".into())),
        size: Set(None),
        price_override: Set(None),
        stock_quantity: Set(5),
        is_active: Set(true),
        created_at: NotSet,
    }
    .insert(&*state.orm)
    .await?;

    Ok(variant.id)
}

fn line(variant_id: Uuid, quantity: i32) -> CartLine {
    CartLine {
        variant_id,
        quantity,
        lens_type: None,
        lens_option_ids: Vec::new(),
    }
}
