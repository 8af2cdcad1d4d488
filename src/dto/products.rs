use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Brand, LensOption, Product, ProductImage, ProductVariant};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub category: String,
    pub gender: Option<String>,
    pub brand_id: Option<Uuid>,
    pub base_price: i64,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub requires_prescription: bool,
    #[serde(default)]
    pub variants: Vec<CreateVariantRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateVariantRequest {
    pub sku: Option<String>,
    pub color_name: String,
    pub color_hex: Option<String>,
    pub size: Option<String>,
    pub price_override: Option<i64>,
    #[serde(default)]
    pub stock_quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub gender: Option<String>,
    pub brand_id: Option<Uuid>,
    pub base_price: Option<i64>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StockAdjustRequest {
    pub delta: i32,
}

/// Product as shown in listings: the row plus its brand and lead image.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductCard {
    #[serde(flatten)]
    pub product: Product,
    pub brand: Option<Brand>,
    pub primary_image: Option<ProductImage>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<ProductCard>)]
    pub items: Vec<ProductCard>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDetail {
    pub product: Product,
    pub brand: Option<Brand>,
    pub variants: Vec<ProductVariant>,
    pub images: Vec<ProductImage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    Personalized,
    Featured,
    Latest,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Recommendations {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub products: Vec<ProductCard>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateImageRequest {
    pub url: String,
    pub alt_text: Option<String>,
    pub variant_id: Option<Uuid>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BrandList {
    pub items: Vec<Brand>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BrandDetail {
    pub brand: Brand,
    pub products: Vec<ProductCard>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBrandRequest {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBrandRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LensOptionList {
    pub items: Vec<LensOption>,
}
