use std::collections::{HashMap, HashSet};

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::products::{
        BrandDetail, BrandList, CreateBrandRequest, CreateImageRequest, CreateProductRequest,
        LensOptionList, ProductCard, ProductDetail, ProductList, RecommendationKind,
        Recommendations, StockAdjustRequest, UpdateBrandRequest, UpdateProductRequest,
    },
    entity::{
        brands::{ActiveModel as BrandActive, Column as BrandCol, Entity as Brands},
        lens_options::{Column as LensCol, Entity as LensOptions},
        order_items::{Column as ItemCol, Entity as OrderItems},
        orders::{Column as OrderCol, Entity as Orders},
        product_images::{
            ActiveModel as ImageActive, Column as ImageCol, Entity as ProductImages,
        },
        product_variants::{ActiveModel as VariantActive, Column as VariantCol, Entity as Variants},
        products::{
            ActiveModel as ProductActive, Column as ProdCol, Entity as Products,
            Model as ProductModel, Relation as ProductRelation,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, require_admin},
    models::{Brand, LensOption, Product, ProductImage, ProductVariant},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
};

/// URL slug from a display name: lower-case ASCII, words joined by dashes.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    for ch in input.chars().flat_map(char::to_lowercase) {
        let mapped = match ch {
            'à' | 'â' | 'ä' | 'á' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'î' | 'ï' | 'í' => 'i',
            'ô' | 'ö' | 'ó' => 'o',
            'ù' | 'û' | 'ü' | 'ú' => 'u',
            'ç' => 'c',
            c if c.is_ascii_alphanumeric() => c,
            _ => '-',
        };
        if mapped == '-' && (slug.is_empty() || slug.ends_with('-')) {
            continue;
        }
        slug.push(mapped);
    }
    slug.trim_end_matches('-').to_string()
}

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(ProdCol::IsActive.eq(true));

    if let Some(category) = query.category.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(ProdCol::Category.eq(category.as_str()));
    }
    if let Some(gender) = query.gender.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(ProdCol::Gender.eq(gender.as_str()));
    }
    if let Some(featured) = query.featured {
        condition = condition.add(ProdCol::IsFeatured.eq(featured));
    }
    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(Expr::col(ProdCol::Name).ilike(format!("%{search}%")));
    }

    let mut finder = Products::find();
    if let Some(brand) = query.brand.as_ref().filter(|s| !s.is_empty()) {
        finder = finder.inner_join(Brands);
        condition = condition.add(BrandCol::Slug.eq(brand.as_str()));
    }

    let sort_col = match query.sort_by.unwrap_or(ProductSortBy::CreatedAt) {
        ProductSortBy::CreatedAt => ProdCol::CreatedAt,
        ProductSortBy::Price => ProdCol::BasePrice,
        ProductSortBy::Name => ProdCol::Name,
    };
    let mut finder = finder.filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&*state.orm).await? as i64;

    let rows = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&*state.orm)
        .await?;
    let items = product_cards(&*state.orm, rows).await?;

    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_product(state: &AppState, slug: &str) -> AppResult<ApiResponse<ProductDetail>> {
    let (product, brand) = Products::find()
        .filter(ProdCol::Slug.eq(slug))
        .filter(ProdCol::IsActive.eq(true))
        .find_also_related(Brands)
        .one(&*state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Produit introuvable"))?;

    let variants = Variants::find()
        .filter(VariantCol::ProductId.eq(product.id))
        .filter(VariantCol::IsActive.eq(true))
        .order_by_asc(VariantCol::CreatedAt)
        .all(&*state.orm)
        .await?
        .into_iter()
        .map(ProductVariant::from)
        .collect();

    let images = product
        .find_related(ProductImages)
        .order_by_asc(ImageCol::SortOrder)
        .all(&*state.orm)
        .await?
        .into_iter()
        .map(ProductImage::from)
        .collect();

    Ok(ApiResponse::success(
        "Product",
        ProductDetail {
            product: product.into(),
            brand: brand.map(Brand::from),
            variants,
            images,
        },
        None,
    ))
}

pub async fn list_brands(state: &AppState) -> AppResult<ApiResponse<BrandList>> {
    let items = Brands::find()
        .filter(BrandCol::IsActive.eq(true))
        .order_by_asc(BrandCol::SortOrder)
        .order_by_asc(BrandCol::Name)
        .all(&*state.orm)
        .await?
        .into_iter()
        .map(Brand::from)
        .collect();

    Ok(ApiResponse::success("Brands", BrandList { items }, Some(Meta::empty())))
}

pub async fn get_brand(state: &AppState, slug: &str) -> AppResult<ApiResponse<BrandDetail>> {
    let brand = Brands::find()
        .filter(BrandCol::Slug.eq(slug))
        .filter(BrandCol::IsActive.eq(true))
        .one(&*state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Marque introuvable"))?;

    let rows = Products::find()
        .filter(ProdCol::BrandId.eq(brand.id))
        .filter(ProdCol::IsActive.eq(true))
        .order_by_desc(ProdCol::CreatedAt)
        .all(&*state.orm)
        .await?;
    let products = product_cards(&*state.orm, rows).await?;

    Ok(ApiResponse::success(
        "Brand",
        BrandDetail {
            brand: brand.into(),
            products,
        },
        None,
    ))
}

pub async fn list_lens_options(state: &AppState) -> AppResult<ApiResponse<LensOptionList>> {
    let items = LensOptions::find()
        .filter(LensCol::IsActive.eq(true))
        .order_by_asc(LensCol::Category)
        .order_by_asc(LensCol::SortOrder)
        .all(&*state.orm)
        .await?
        .into_iter()
        .map(LensOption::from)
        .collect();

    Ok(ApiResponse::success(
        "Lens options",
        LensOptionList { items },
        Some(Meta::empty()),
    ))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<ProductDetail>> {
    require_admin(&*state.orm, user).await?;

    if payload.name.trim().is_empty() {
        return Err(AppError::bad_request("Nom du produit requis"));
    }
    if payload.base_price < 0 {
        return Err(AppError::bad_request("Prix invalide"));
    }
    let slug = payload
        .slug
        .as_deref()
        .map(slugify)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| slugify(&payload.name));
    let taken = Products::find()
        .filter(ProdCol::Slug.eq(slug.as_str()))
        .count(&*state.orm)
        .await?;
    if taken > 0 {
        return Err(AppError::bad_request(format!("Le slug {slug} est déjà utilisé")));
    }

    let txn = state.orm.begin().await?;
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        slug: Set(slug),
        description: Set(payload.description),
        category: Set(payload.category),
        gender: Set(payload.gender.unwrap_or_else(|| "mixte".to_string())),
        brand_id: Set(payload.brand_id),
        base_price: Set(payload.base_price),
        is_active: Set(true),
        is_featured: Set(payload.is_featured),
        requires_prescription: Set(payload.requires_prescription),
        frame_shape: Set(None),
        frame_material: Set(None),
        frame_color: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut variants = Vec::with_capacity(payload.variants.len());
    for variant in payload.variants {
        if variant.stock_quantity < 0 {
            return Err(AppError::bad_request("Stock invalide"));
        }
        let model = VariantActive {
            id: Set(Uuid::new_v4()),
            product_id: Set(product.id),
            sku: Set(variant.sku),
            color_name: Set(variant.color_name),
            color_hex: Set(variant.color_hex),
            size: Set(variant.size),
            price_override: Set(variant.price_override),
            stock_quantity: Set(variant.stock_quantity),
            is_active: Set(true),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        variants.push(ProductVariant::from(model));
    }
    txn.commit().await?;

    if let Err(err) = log_audit(
        &*state.orm,
        Some(user.user_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Produit créé",
        ProductDetail {
            product: product.into(),
            brand: None,
            variants,
            images: Vec::new(),
        },
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    require_admin(&*state.orm, user).await?;
    let existing = Products::find_by_id(id)
        .one(&*state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Produit introuvable"))?;

    let mut active: ProductActive = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(category) = payload.category {
        active.category = Set(category);
    }
    if let Some(gender) = payload.gender {
        active.gender = Set(gender);
    }
    if let Some(brand_id) = payload.brand_id {
        active.brand_id = Set(Some(brand_id));
    }
    if let Some(price) = payload.base_price {
        if price < 0 {
            return Err(AppError::bad_request("Prix invalide"));
        }
        active.base_price = Set(price);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(is_featured) = payload.is_featured {
        active.is_featured = Set(is_featured);
    }
    active.updated_at = Set(Utc::now().into());

    let product = active.update(&*state.orm).await?;

    if let Err(err) = log_audit(
        &*state.orm,
        Some(user.user_id),
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Updated", Product::from(product), Some(Meta::empty())))
}

/// Products referenced by past orders are hidden rather than deleted.
pub async fn deactivate_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Product>> {
    require_admin(&*state.orm, user).await?;
    let existing = Products::find_by_id(id)
        .one(&*state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Produit introuvable"))?;

    let mut active: ProductActive = existing.into();
    active.is_active = Set(false);
    active.updated_at = Set(Utc::now().into());
    let product = active.update(&*state.orm).await?;

    if let Err(err) = log_audit(
        &*state.orm,
        Some(user.user_id),
        "product_deactivate",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Deactivated", Product::from(product), Some(Meta::empty())))
}

pub async fn adjust_stock(
    state: &AppState,
    user: &AuthUser,
    variant_id: Uuid,
    payload: StockAdjustRequest,
) -> AppResult<ApiResponse<ProductVariant>> {
    require_admin(&*state.orm, user).await?;
    if payload.delta == 0 {
        return Err(AppError::bad_request("Ajustement nul"));
    }

    // Conditional update keeps stock non-negative under concurrent adjustments.
    let result = Variants::update_many()
        .col_expr(
            VariantCol::StockQuantity,
            Expr::col(VariantCol::StockQuantity).add(payload.delta),
        )
        .filter(VariantCol::Id.eq(variant_id))
        .filter(VariantCol::StockQuantity.gte(-payload.delta))
        .exec(&*state.orm)
        .await?;

    let variant = Variants::find_by_id(variant_id)
        .one(&*state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Variante introuvable"))?;

    if result.rows_affected == 0 {
        return Err(AppError::bad_request("Stock insuffisant"));
    }

    if let Err(err) = log_audit(
        &*state.orm,
        Some(user.user_id),
        "stock_adjust",
        Some("product_variants"),
        Some(serde_json::json!({ "variant_id": variant_id, "delta": payload.delta })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Stock adjusted", ProductVariant::from(variant), Some(Meta::empty())))
}

pub async fn create_brand(
    state: &AppState,
    user: &AuthUser,
    payload: CreateBrandRequest,
) -> AppResult<ApiResponse<Brand>> {
    require_admin(&*state.orm, user).await?;
    if payload.name.trim().is_empty() {
        return Err(AppError::bad_request("Nom de la marque requis"));
    }
    let slug = payload
        .slug
        .as_deref()
        .map(slugify)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| slugify(&payload.name));
    let taken = Brands::find()
        .filter(BrandCol::Slug.eq(slug.as_str()))
        .count(&*state.orm)
        .await?;
    if taken > 0 {
        return Err(AppError::bad_request(format!("Le slug {slug} est déjà utilisé")));
    }

    let brand = BrandActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        slug: Set(slug),
        description: Set(payload.description),
        logo_url: Set(payload.logo_url),
        is_active: Set(true),
        sort_order: Set(payload.sort_order),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&*state.orm)
    .await?;

    if let Err(err) = log_audit(
        &*state.orm,
        Some(user.user_id),
        "brand_create",
        Some("brands"),
        Some(serde_json::json!({ "brand_id": brand.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Marque créée", Brand::from(brand), Some(Meta::empty())))
}

pub async fn update_brand(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateBrandRequest,
) -> AppResult<ApiResponse<Brand>> {
    require_admin(&*state.orm, user).await?;
    let existing = Brands::find_by_id(id)
        .one(&*state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Marque introuvable"))?;

    let mut active: BrandActive = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(logo_url) = payload.logo_url {
        active.logo_url = Set(Some(logo_url));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(sort_order) = payload.sort_order {
        active.sort_order = Set(sort_order);
    }
    active.updated_at = Set(Utc::now().into());
    let brand = active.update(&*state.orm).await?;

    if let Err(err) = log_audit(
        &*state.orm,
        Some(user.user_id),
        "brand_update",
        Some("brands"),
        Some(serde_json::json!({ "brand_id": brand.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Updated", Brand::from(brand), Some(Meta::empty())))
}

/// The image shown on product cards: the flagged primary one, else the first by sort order.
pub fn primary_image(images: &[ProductImage]) -> Option<&ProductImage> {
    images
        .iter()
        .find(|img| img.is_primary)
        .or_else(|| images.iter().min_by_key(|img| img.sort_order))
}

/// Attach brand and lead image to product rows with two batched queries.
async fn product_cards<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<ProductModel>,
) -> AppResult<Vec<ProductCard>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let product_ids: Vec<Uuid> = rows.iter().map(|p| p.id).collect();
    let brand_ids: Vec<Uuid> = rows
        .iter()
        .filter_map(|p| p.brand_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let brands: HashMap<Uuid, Brand> = if brand_ids.is_empty() {
        HashMap::new()
    } else {
        Brands::find()
            .filter(BrandCol::Id.is_in(brand_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|b| (b.id, Brand::from(b)))
            .collect()
    };

    let mut images: HashMap<Uuid, Vec<ProductImage>> = HashMap::new();
    for image in ProductImages::find()
        .filter(ImageCol::ProductId.is_in(product_ids))
        .order_by_asc(ImageCol::SortOrder)
        .all(conn)
        .await?
    {
        images
            .entry(image.product_id)
            .or_default()
            .push(ProductImage::from(image));
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let brand = row.brand_id.and_then(|id| brands.get(&id).cloned());
            let primary_image = images
                .get(&row.id)
                .and_then(|list| primary_image(list))
                .cloned();
            ProductCard {
                product: row.into(),
                brand,
                primary_image,
            }
        })
        .collect())
}

pub const RECOMMENDATION_LIMIT: u64 = 8;
/// Below this many matches the personalised selection falls back to featured products.
const PERSONALIZED_MINIMUM: usize = 4;

/// Home page selection: products close to what the caller already bought, else featured
/// products, else the latest additions.
pub async fn recommendations(
    state: &AppState,
    user: Option<&AuthUser>,
) -> AppResult<ApiResponse<Recommendations>> {
    let db = &*state.orm;

    if let Some(user) = user {
        let rows = personalised_products(db, user.user_id).await?;
        if rows.len() >= PERSONALIZED_MINIMUM {
            return recommendation_response(db, RecommendationKind::Personalized, rows).await;
        }
    }

    let featured = Products::find()
        .filter(ProdCol::IsActive.eq(true))
        .filter(ProdCol::IsFeatured.eq(true))
        .order_by_desc(ProdCol::CreatedAt)
        .limit(RECOMMENDATION_LIMIT)
        .all(db)
        .await?;
    if !featured.is_empty() {
        return recommendation_response(db, RecommendationKind::Featured, featured).await;
    }

    let latest = Products::find()
        .filter(ProdCol::IsActive.eq(true))
        .order_by_desc(ProdCol::CreatedAt)
        .limit(RECOMMENDATION_LIMIT)
        .all(db)
        .await?;
    recommendation_response(db, RecommendationKind::Latest, latest).await
}

async fn recommendation_response<C: ConnectionTrait>(
    conn: &C,
    kind: RecommendationKind,
    rows: Vec<ProductModel>,
) -> AppResult<ApiResponse<Recommendations>> {
    let products = product_cards(conn, rows).await?;
    Ok(ApiResponse::success(
        "Recommendations",
        Recommendations { kind, products },
        None,
    ))
}

/// Products sharing a brand or category with the caller's recent purchases, excluding
/// the products already bought.
async fn personalised_products<C: ConnectionTrait>(
    conn: &C,
    profile_id: Uuid,
) -> AppResult<Vec<ProductModel>> {
    let order_ids: Vec<Uuid> = Orders::find()
        .select_only()
        .column(OrderCol::Id)
        .filter(OrderCol::ProfileId.eq(profile_id))
        .order_by_desc(OrderCol::CreatedAt)
        .limit(20)
        .into_tuple()
        .all(conn)
        .await?;
    if order_ids.is_empty() {
        return Ok(Vec::new());
    }

    let variant_ids: Vec<Uuid> = OrderItems::find()
        .select_only()
        .column(ItemCol::VariantId)
        .filter(ItemCol::OrderId.is_in(order_ids))
        .limit(20)
        .into_tuple()
        .all(conn)
        .await?;
    if variant_ids.is_empty() {
        return Ok(Vec::new());
    }

    let bought: Vec<(Uuid, Option<Uuid>, String)> = Products::find()
        .select_only()
        .column(ProdCol::Id)
        .column(ProdCol::BrandId)
        .column(ProdCol::Category)
        .join(
            sea_orm::JoinType::InnerJoin,
            ProductRelation::ProductVariants.def(),
        )
        .filter(VariantCol::Id.is_in(variant_ids))
        .into_tuple()
        .all(conn)
        .await?;
    if bought.is_empty() {
        return Ok(Vec::new());
    }

    let bought_ids: HashSet<Uuid> = bought.iter().map(|(id, _, _)| *id).collect();
    let brand_ids: HashSet<Uuid> = bought.iter().filter_map(|(_, brand, _)| *brand).collect();
    let categories: HashSet<String> = bought.into_iter().map(|(_, _, c)| c).collect();

    let mut affinity = Condition::any().add(ProdCol::Category.is_in(categories));
    if !brand_ids.is_empty() {
        affinity = affinity.add(ProdCol::BrandId.is_in(brand_ids));
    }

    Ok(Products::find()
        .filter(ProdCol::IsActive.eq(true))
        .filter(ProdCol::Id.is_not_in(bought_ids))
        .filter(affinity)
        .order_by_desc(ProdCol::IsFeatured)
        .order_by_desc(ProdCol::CreatedAt)
        .limit(RECOMMENDATION_LIMIT)
        .all(conn)
        .await?)
}

pub async fn add_image(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: CreateImageRequest,
) -> AppResult<ApiResponse<ProductImage>> {
    require_admin(&*state.orm, user).await?;
    let url = payload.url.trim();
    if url.is_empty() {
        return Err(AppError::bad_request("URL de l'image requise"));
    }
    Products::find_by_id(product_id)
        .one(&*state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Produit introuvable"))?;
    if let Some(variant_id) = payload.variant_id {
        let variant = Variants::find_by_id(variant_id).one(&*state.orm).await?;
        if variant.is_none_or(|v| v.product_id != product_id) {
            return Err(AppError::bad_request("Variante inconnue pour ce produit"));
        }
    }

    let txn = state.orm.begin().await?;
    if payload.is_primary {
        ProductImages::update_many()
            .col_expr(ImageCol::IsPrimary, Expr::value(false))
            .filter(ImageCol::ProductId.eq(product_id))
            .exec(&txn)
            .await?;
    }
    let image = ImageActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        variant_id: Set(payload.variant_id),
        url: Set(url.to_string()),
        alt_text: Set(payload.alt_text),
        sort_order: Set(payload.sort_order),
        is_primary: Set(payload.is_primary),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    if let Err(err) = log_audit(
        &*state.orm,
        Some(user.user_id),
        "product_image_add",
        Some("product_images"),
        Some(serde_json::json!({ "product_id": product_id, "image_id": image.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Image ajoutée",
        ProductImage::from(image),
        Some(Meta::empty()),
    ))
}

pub async fn delete_image(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    require_admin(&*state.orm, user).await?;
    let result = ProductImages::delete_by_id(id).exec(&*state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Image introuvable"));
    }
    Ok(ApiResponse::success(
        "Image supprimée",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_are_ascii_and_dashed() {
        assert_eq!(slugify("Lunettes de Soleil Été"), "lunettes-de-soleil-ete");
        assert_eq!(slugify("  Ray-Ban  RB3025 "), "ray-ban-rb3025");
        assert_eq!(slugify("Façonnable & Co."), "faconnable-co");
    }

    fn image(sort_order: i32, is_primary: bool) -> ProductImage {
        ProductImage {
            id: Uuid::new_v4(),
            product_id: Uuid::nil(),
            variant_id: None,
            url: format!("https://cdn.test/{sort_order}.jpg"),
            alt_text: None,
            sort_order,
            is_primary,
        }
    }

    #[test]
    fn flagged_image_wins_over_sort_order() {
        let images = vec![image(0, false), image(3, true), image(1, false)];
        assert_eq!(primary_image(&images).map(|i| i.sort_order), Some(3));

        let images = vec![image(2, false), image(1, false)];
        assert_eq!(primary_image(&images).map(|i| i.sort_order), Some(1));
        assert!(primary_image(&[]).is_none());
    }
}
