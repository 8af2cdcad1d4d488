use std::collections::HashMap;

use chrono::{Datelike, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbBackend,
    DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    Statement, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{
        CartLine, CreateOrderRequest, CreateOrderResponse, OrderDetail, OrderList,
        ShippingAddressInput,
    },
    emails::{OrderConfirmation, Templates},
    entity::{
        addresses::{ActiveModel as AddressActive, Column as AddressCol, Entity as Addresses},
        lens_options::{Column as LensCol, Entity as LensOptions, Model as LensOptionModel},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
        },
        order_status_history::{
            ActiveModel as HistoryActive, Column as HistoryCol, Entity as History,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        product_variants::{Column as VariantCol, Entity as Variants, Model as VariantModel},
        products::{Entity as Products, Model as ProductModel},
        profiles::Entity as Profiles,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{DeliveryMethod, Order, OrderItem, OrderStatus, PaymentMethod},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

/// Flat home-delivery fee in cents.
pub const SHIPPING_COST: i64 = 690;
/// Subtotal from which home delivery is free, in cents.
pub const FREE_SHIPPING_THRESHOLD: i64 = 15_000;
pub const MAX_QUANTITY: i32 = 10;
const ORDER_NUMBER_ATTEMPTS: u32 = 3;
const DEFAULT_COUNTRY: &str = "France";

/// A checkout line priced from the catalogue.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub variant_id: Uuid,
    pub product_name: String,
    pub variant_info: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub lens_type: Option<String>,
    pub lens_options_summary: Option<String>,
    pub lens_options_price: i64,
}

impl PricedLine {
    pub fn line_total(&self) -> i64 {
        (self.unit_price + self.lens_options_price) * i64::from(self.quantity)
    }
}

pub fn shipping_cost(method: DeliveryMethod, subtotal: i64) -> i64 {
    if method == DeliveryMethod::Domicile && subtotal < FREE_SHIPPING_THRESHOLD {
        SHIPPING_COST
    } else {
        0
    }
}

pub fn format_order_number(year: i32, seq: i64) -> String {
    format!("VO-{year}-{seq:04}")
}

pub fn validate_lines(lines: &[CartLine]) -> AppResult<()> {
    if lines.is_empty() {
        return Err(AppError::bad_request("Panier vide"));
    }
    if lines
        .iter()
        .any(|line| line.quantity < 1 || line.quantity > MAX_QUANTITY)
    {
        return Err(AppError::bad_request("Quantité invalide (1-10 par article)"));
    }
    Ok(())
}

/// Price every line from server-side data. Client prices are never read.
pub fn price_lines(
    lines: &[CartLine],
    variants: &HashMap<Uuid, (VariantModel, ProductModel)>,
    lens_options: &HashMap<Uuid, LensOptionModel>,
) -> AppResult<Vec<PricedLine>> {
    validate_lines(lines)?;

    lines
        .iter()
        .map(|line| {
            let (variant, product) = variants
                .get(&line.variant_id)
                .filter(|(v, p)| v.is_active && p.is_active)
                .ok_or_else(|| {
                    AppError::bad_request(format!("Variante {} introuvable", line.variant_id))
                })?;

            let mut names = Vec::with_capacity(line.lens_option_ids.len());
            let mut surcharge = 0;
            for id in &line.lens_option_ids {
                let option = lens_options
                    .get(id)
                    .filter(|o| o.is_active)
                    .ok_or_else(|| AppError::bad_request(format!("Option de verre {id} introuvable")))?;
                names.push(option.name.as_str());
                surcharge += option.price;
            }

            let variant_info = match variant.size.as_deref() {
                Some(size) if !size.is_empty() => format!("{} - {}", variant.color_name, size),
                _ => variant.color_name.clone(),
            };

            Ok(PricedLine {
                variant_id: variant.id,
                product_name: product.name.clone(),
                variant_info,
                quantity: line.quantity,
                unit_price: variant.price_override.unwrap_or(product.base_price),
                lens_type: line.lens_type.clone().filter(|t| !t.is_empty()),
                lens_options_summary: (!names.is_empty()).then(|| names.join(", ")),
                lens_options_price: surcharge,
            })
        })
        .collect()
}

struct OrderDraft {
    profile_id: Uuid,
    delivery_method: DeliveryMethod,
    payment_method: PaymentMethod,
    subtotal: i64,
    shipping_cost: i64,
    total: i64,
    address: Option<ShippingAddressInput>,
    lines: Vec<PricedLine>,
}

pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<CreateOrderResponse>> {
    validate_lines(&payload.items)?;

    let variant_ids: Vec<Uuid> = payload.items.iter().map(|l| l.variant_id).collect();
    let variants: HashMap<Uuid, (VariantModel, ProductModel)> = Variants::find()
        .filter(VariantCol::Id.is_in(variant_ids))
        .find_also_related(Products)
        .all(&*state.orm)
        .await?
        .into_iter()
        .filter_map(|(variant, product)| product.map(|p| (variant.id, (variant, p))))
        .collect();

    let lens_ids: Vec<Uuid> = payload
        .items
        .iter()
        .flat_map(|l| l.lens_option_ids.iter().copied())
        .collect();
    let lens_options: HashMap<Uuid, LensOptionModel> = if lens_ids.is_empty() {
        HashMap::new()
    } else {
        LensOptions::find()
            .filter(LensCol::Id.is_in(lens_ids))
            .all(&*state.orm)
            .await?
            .into_iter()
            .map(|o| (o.id, o))
            .collect()
    };

    let lines = price_lines(&payload.items, &variants, &lens_options)?;
    let subtotal: i64 = lines.iter().map(PricedLine::line_total).sum();
    let shipping = shipping_cost(payload.delivery_method, subtotal);

    let address = payload.shipping_address.map(|mut a| {
        if a.country.as_deref().is_none_or(str::is_empty) {
            a.country = Some(DEFAULT_COUNTRY.to_string());
        }
        a
    });

    let draft = OrderDraft {
        profile_id: user.user_id,
        delivery_method: payload.delivery_method,
        payment_method: payload.payment_method.unwrap_or(PaymentMethod::Alma),
        subtotal,
        shipping_cost: shipping,
        total: subtotal + shipping,
        address,
        lines,
    };

    let mut attempt = 0;
    let order = loop {
        attempt += 1;
        match insert_order(&*state.orm, &draft).await {
            Ok(order) => break order,
            Err(err) if attempt < ORDER_NUMBER_ATTEMPTS && is_unique_violation(&err) => {
                tracing::warn!(attempt, error = %err, "order number collision, retrying");
            }
            Err(err) => return Err(err.into()),
        }
    };

    tracing::info!(
        order_id = %order.id,
        order_number = %order.order_number,
        total = order.total,
        "order created"
    );

    if let Err(err) = log_audit(
        &*state.orm,
        Some(user.user_id),
        "order_create",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "total": order.total })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    if draft.delivery_method == DeliveryMethod::Domicile {
        if let Some(address) = draft.address.as_ref() {
            if let Err(err) = save_address(&*state.orm, user.user_id, address).await {
                tracing::warn!(error = %err, order_id = %order.id, "saving shipping address failed");
            }
        }
    }

    if let Err(err) = send_confirmation(state, &order, &draft).await {
        tracing::warn!(error = %err, order_id = %order.id, "order confirmation email failed");
    }

    Ok(ApiResponse::success(
        "Commande créée",
        CreateOrderResponse {
            order_id: order.id,
            order_number: order.order_number,
            total: order.total,
        },
        Some(Meta::empty()),
    ))
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

async fn next_order_number<C: ConnectionTrait>(conn: &C) -> Result<String, DbErr> {
    let row = conn
        .query_one(Statement::from_string(
            DbBackend::Postgres,
            "SELECT nextval('order_number_seq') AS seq",
        ))
        .await?
        .ok_or_else(|| DbErr::RecordNotFound("order_number_seq".into()))?;
    let seq: i64 = row.try_get("", "seq")?;
    Ok(format_order_number(Utc::now().year(), seq))
}

/// Order, lines and the first history row commit together or not at all.
async fn insert_order(db: &DatabaseConnection, draft: &OrderDraft) -> Result<OrderModel, DbErr> {
    let txn = db.begin().await?;
    let order_number = next_order_number(&txn).await?;
    let address = draft.address.clone().unwrap_or_default();

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        order_number: Set(order_number),
        profile_id: Set(draft.profile_id),
        status: Set(OrderStatus::EnAttentePaiement.as_str().to_string()),
        delivery_method: Set(draft.delivery_method.as_str().to_string()),
        payment_method: Set(draft.payment_method.as_str().to_string()),
        subtotal: Set(draft.subtotal),
        shipping_cost: Set(draft.shipping_cost),
        total: Set(draft.total),
        alma_payment_id: Set(None),
        shipping_first_name: Set(address.first_name),
        shipping_last_name: Set(address.last_name),
        shipping_street: Set(address.street),
        shipping_street_2: Set(address.street_2),
        shipping_city: Set(address.city),
        shipping_postal_code: Set(address.postal_code),
        shipping_country: Set(address.country),
        tracking_number: Set(None),
        notes: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    for line in &draft.lines {
        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            variant_id: Set(line.variant_id),
            product_name: Set(line.product_name.clone()),
            variant_info: Set(Some(line.variant_info.clone())),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            lens_type: Set(line.lens_type.clone()),
            lens_options_summary: Set(line.lens_options_summary.clone()),
            lens_options_price: Set(line.lens_options_price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
    }

    append_history(&txn, order.id, OrderStatus::EnAttentePaiement, Some("Commande créée")).await?;

    txn.commit().await?;
    Ok(order)
}

pub async fn append_history<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
    status: OrderStatus,
    comment: Option<&str>,
) -> Result<(), DbErr> {
    HistoryActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        status: Set(status.as_str().to_string()),
        comment: Set(comment.map(str::to_string)),
        created_at: NotSet,
    }
    .insert(conn)
    .await?;
    Ok(())
}

async fn save_address(
    db: &DatabaseConnection,
    profile_id: Uuid,
    address: &ShippingAddressInput,
) -> AppResult<()> {
    let Some(street) = address.street.as_deref().filter(|s| !s.is_empty()) else {
        return Ok(());
    };
    let postal_code = address.postal_code.clone().unwrap_or_default();
    let city = address.city.clone().unwrap_or_default();

    let existing = Addresses::find()
        .filter(
            Condition::all()
                .add(AddressCol::ProfileId.eq(profile_id))
                .add(AddressCol::Street.eq(street))
                .add(AddressCol::PostalCode.eq(postal_code.as_str()))
                .add(AddressCol::City.eq(city.as_str())),
        )
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let count = Addresses::find()
        .filter(AddressCol::ProfileId.eq(profile_id))
        .count(db)
        .await?;

    AddressActive {
        id: Set(Uuid::new_v4()),
        profile_id: Set(profile_id),
        label: Set(Some("Livraison".to_string())),
        first_name: Set(address.first_name.clone().unwrap_or_default()),
        last_name: Set(address.last_name.clone().unwrap_or_default()),
        street: Set(street.to_string()),
        street_2: Set(address.street_2.clone()),
        city: Set(city),
        postal_code: Set(postal_code),
        country: Set(address
            .country
            .clone()
            .unwrap_or_else(|| DEFAULT_COUNTRY.to_string())),
        is_default: Set(count == 0),
        created_at: NotSet,
    }
    .insert(db)
    .await?;
    Ok(())
}

async fn send_confirmation(state: &AppState, order: &OrderModel, draft: &OrderDraft) -> AppResult<()> {
    let Some(profile) = Profiles::find_by_id(order.profile_id).one(&*state.orm).await? else {
        return Ok(());
    };
    if profile.email.is_empty() {
        return Ok(());
    }

    let items: Vec<OrderItem> = draft
        .lines
        .iter()
        .map(|line| OrderItem {
            id: Uuid::nil(),
            order_id: order.id,
            variant_id: line.variant_id,
            product_name: line.product_name.clone(),
            variant_info: Some(line.variant_info.clone()),
            quantity: line.quantity,
            unit_price: line.unit_price,
            lens_type: line.lens_type.clone(),
            lens_options_summary: line.lens_options_summary.clone(),
            lens_options_price: line.lens_options_price,
        })
        .collect();

    let email = Templates::new(&state.config.site_url).order_confirmation(&OrderConfirmation {
        order_number: &order.order_number,
        first_name: profile.first_name.as_deref().unwrap_or("Client"),
        items: &items,
        subtotal: order.subtotal,
        shipping_cost: order.shipping_cost,
        total: order.total,
        delivery_method: draft.delivery_method,
        street: order.shipping_street.as_deref(),
        postal_code: order.shipping_postal_code.as_deref(),
        city: order.shipping_city.as_deref(),
    });

    state
        .mailer
        .send(&profile.email, &email)
        .await
        .map_err(|err| AppError::Upstream(err.to_string()))?;
    Ok(())
}

pub async fn list_my_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(OrderCol::ProfileId.eq(user.user_id));
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&*state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&*state.orm)
        .await?
        .into_iter()
        .map(Order::try_from)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "Ok",
        OrderList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_my_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDetail>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(id))
                .add(OrderCol::ProfileId.eq(user.user_id)),
        )
        .one(&*state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Commande introuvable"))?;

    let detail = load_detail(&*state.orm, order).await?;
    Ok(ApiResponse::success("OK", detail, Some(Meta::empty())))
}

/// Attach line items and status history to an order.
pub async fn load_detail<C: ConnectionTrait>(conn: &C, order: OrderModel) -> AppResult<OrderDetail> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

    let history = History::find()
        .filter(HistoryCol::OrderId.eq(order.id))
        .order_by_asc(HistoryCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(OrderDetail {
        order: Order::try_from(order)?,
        items,
        history,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn now() -> sea_orm::prelude::DateTimeWithTimeZone {
        Utc::now().with_timezone(&FixedOffset::east_opt(0).unwrap())
    }

    fn product(base_price: i64) -> ProductModel {
        ProductModel {
            id: Uuid::new_v4(),
            name: "Monture Croix-Rousse".into(),
            slug: "monture-croix-rousse".into(),
            description: None,
            category: "optique".into(),
            gender: "mixte".into(),
            brand_id: None,
            base_price,
            is_active: true,
            is_featured: false,
            requires_prescription: true,
            frame_shape: None,
            frame_material: None,
            frame_color: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    fn variant(product: &ProductModel, price_override: Option<i64>) -> VariantModel {
        VariantModel {
            id: Uuid::new_v4(),
            product_id: product.id,
            sku: None,
            color_name: "Écaille".into(),
            color_hex: None,
            size: Some("52".into()),
            price_override,
            stock_quantity: 5,
            is_active: true,
            created_at: now(),
        }
    }

    fn lens(name: &str, price: i64) -> LensOptionModel {
        LensOptionModel {
            id: Uuid::new_v4(),
            name: name.into(),
            slug: name.to_lowercase(),
            description: None,
            category: "traitement".into(),
            price,
            is_active: true,
            sort_order: 0,
            created_at: now(),
        }
    }

    fn line(variant_id: Uuid, quantity: i32, lens_option_ids: Vec<Uuid>) -> CartLine {
        CartLine {
            variant_id,
            quantity,
            lens_type: None,
            lens_option_ids,
        }
    }

    #[test]
    fn shipping_is_charged_only_for_small_home_deliveries() {
        assert_eq!(shipping_cost(DeliveryMethod::Domicile, 8_000), SHIPPING_COST);
        assert_eq!(shipping_cost(DeliveryMethod::Domicile, 14_999), SHIPPING_COST);
        assert_eq!(shipping_cost(DeliveryMethod::Domicile, 15_000), 0);
        assert_eq!(shipping_cost(DeliveryMethod::Boutique, 8_000), 0);
    }

    #[test]
    fn order_numbers_are_zero_padded() {
        assert_eq!(format_order_number(2026, 7), "VO-2026-0007");
        assert_eq!(format_order_number(2026, 12345), "VO-2026-12345");
    }

    #[test]
    fn price_override_wins_over_base_price() {
        let p = product(12_000);
        let plain = variant(&p, None);
        let special = variant(&p, Some(8_000));
        let variants = HashMap::from([
            (plain.id, (plain.clone(), p.clone())),
            (special.id, (special.clone(), p.clone())),
        ]);

        let priced = price_lines(
            &[line(plain.id, 1, vec![]), line(special.id, 2, vec![])],
            &variants,
            &HashMap::new(),
        )
        .unwrap();

        assert_eq!(priced[0].unit_price, 12_000);
        assert_eq!(priced[1].unit_price, 8_000);
        assert_eq!(priced[1].variant_info, "Écaille - 52");
        let subtotal: i64 = priced.iter().map(PricedLine::line_total).sum();
        assert_eq!(subtotal, 28_000);
    }

    #[test]
    fn lens_options_are_priced_server_side() {
        let p = product(10_000);
        let v = variant(&p, None);
        let thin = lens("Aminci", 3_000);
        let blue = lens("Lumière bleue", 2_000);
        let variants = HashMap::from([(v.id, (v.clone(), p))]);
        let options = HashMap::from([(thin.id, thin.clone()), (blue.id, blue.clone())]);

        let priced = price_lines(&[line(v.id, 2, vec![thin.id, blue.id])], &variants, &options).unwrap();

        assert_eq!(priced[0].lens_options_price, 5_000);
        assert_eq!(priced[0].lens_options_summary.as_deref(), Some("Aminci, Lumière bleue"));
        assert_eq!(priced[0].line_total(), 30_000);
    }

    #[test]
    fn unknown_or_inactive_references_are_rejected() {
        let p = product(10_000);
        let mut v = variant(&p, None);
        let variants = HashMap::from([(v.id, (v.clone(), p.clone()))]);

        let err = price_lines(&[line(Uuid::new_v4(), 1, vec![])], &variants, &HashMap::new());
        assert!(matches!(err, Err(AppError::BadRequest(_))));

        let err = price_lines(&[line(v.id, 1, vec![Uuid::new_v4()])], &variants, &HashMap::new());
        assert!(matches!(err, Err(AppError::BadRequest(_))));

        v.is_active = false;
        let variants = HashMap::from([(v.id, (v.clone(), p))]);
        let err = price_lines(&[line(v.id, 1, vec![])], &variants, &HashMap::new());
        assert!(matches!(err, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn empty_cart_and_bad_quantities_are_rejected() {
        match validate_lines(&[]) {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Panier vide"),
            other => panic!("unexpected {other:?}"),
        }
        let id = Uuid::new_v4();
        assert!(validate_lines(&[line(id, 0, vec![])]).is_err());
        assert!(validate_lines(&[line(id, 11, vec![])]).is_err());
        assert!(validate_lines(&[line(id, 10, vec![])]).is_ok());
    }
}
