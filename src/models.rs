use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::{
        addresses::Model as AddressModel, appointment_slots::Model as SlotModel,
        appointments::Model as AppointmentModel, blog_posts::Model as BlogPostModel,
        brands::Model as BrandModel, lens_options::Model as LensOptionModel,
        order_items::Model as OrderItemModel, order_status_history::Model as HistoryModel,
        orders::Model as OrderModel, product_images::Model as ProductImageModel,
        product_variants::Model as VariantModel, products::Model as ProductModel,
        profiles::Model as ProfileModel, promotions::Model as PromotionModel,
    },
    error::AppError,
};

/// Lifecycle of an order. Serialized with the French identifiers stored in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    EnAttentePaiement,
    Payee,
    OrdonnanceEnValidation,
    OrdonnanceValidee,
    OrdonnanceRefusee,
    EnFabrication,
    Expediee,
    PreteEnBoutique,
    Livree,
    Annulee,
    Remboursee,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 11] = [
        OrderStatus::EnAttentePaiement,
        OrderStatus::Payee,
        OrderStatus::OrdonnanceEnValidation,
        OrderStatus::OrdonnanceValidee,
        OrderStatus::OrdonnanceRefusee,
        OrderStatus::EnFabrication,
        OrderStatus::Expediee,
        OrderStatus::PreteEnBoutique,
        OrderStatus::Livree,
        OrderStatus::Annulee,
        OrderStatus::Remboursee,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::EnAttentePaiement => "en_attente_paiement",
            OrderStatus::Payee => "payee",
            OrderStatus::OrdonnanceEnValidation => "ordonnance_en_validation",
            OrderStatus::OrdonnanceValidee => "ordonnance_validee",
            OrderStatus::OrdonnanceRefusee => "ordonnance_refusee",
            OrderStatus::EnFabrication => "en_fabrication",
            OrderStatus::Expediee => "expediee",
            OrderStatus::PreteEnBoutique => "prete_en_boutique",
            OrderStatus::Livree => "livree",
            OrderStatus::Annulee => "annulee",
            OrderStatus::Remboursee => "remboursee",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::EnAttentePaiement => "En attente de paiement",
            OrderStatus::Payee => "Payée",
            OrderStatus::OrdonnanceEnValidation => "Ordonnance en validation",
            OrderStatus::OrdonnanceValidee => "Ordonnance validée",
            OrderStatus::OrdonnanceRefusee => "Ordonnance refusée",
            OrderStatus::EnFabrication => "En fabrication",
            OrderStatus::Expediee => "Expédiée",
            OrderStatus::PreteEnBoutique => "Prête en boutique",
            OrderStatus::Livree => "Livrée",
            OrderStatus::Annulee => "Annulée",
            OrderStatus::Remboursee => "Remboursée",
        }
    }

    /// True once the payment has been accepted and the order moved on from it.
    pub fn is_paid(&self) -> bool {
        !matches!(
            self,
            OrderStatus::EnAttentePaiement | OrderStatus::Annulee | OrderStatus::Remboursee
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AppError::bad_request(format!("Statut de commande invalide : {s}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    Domicile,
    #[serde(alias = "retrait")]
    Boutique,
}

impl DeliveryMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMethod::Domicile => "domicile",
            DeliveryMethod::Boutique => "boutique",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeliveryMethod::Domicile => "Livraison à domicile",
            DeliveryMethod::Boutique => "Retrait en boutique",
        }
    }
}

impl FromStr for DeliveryMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "domicile" => Ok(DeliveryMethod::Domicile),
            "boutique" | "retrait" => Ok(DeliveryMethod::Boutique),
            other => Err(AppError::bad_request(format!(
                "Mode de livraison invalide : {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Alma,
    Stripe,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Alma => "alma",
            PaymentMethod::Stripe => "stripe",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alma" => Ok(PaymentMethod::Alma),
            "stripe" => Ok(PaymentMethod::Stripe),
            other => Err(AppError::bad_request(format!(
                "Moyen de paiement invalide : {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Percentage => "percentage",
            DiscountType::Fixed => "fixed",
        }
    }
}

impl FromStr for DiscountType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(DiscountType::Percentage),
            "fixed" => Ok(DiscountType::Fixed),
            other => Err(AppError::bad_request(format!(
                "Type de remise invalide : {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

impl From<ProfileModel> for Profile {
    fn from(model: ProfileModel) -> Self {
        Self {
            id: model.id,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            phone: model.phone,
            role: model.role,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Address {
    pub id: Uuid,
    pub label: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub street_2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
}

impl From<AddressModel> for Address {
    fn from(model: AddressModel) -> Self {
        Self {
            id: model.id,
            label: model.label,
            first_name: model.first_name,
            last_name: model.last_name,
            street: model.street,
            street_2: model.street_2,
            city: model.city,
            postal_code: model.postal_code,
            country: model.country,
            is_default: model.is_default,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Brand {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub is_active: bool,
    pub sort_order: i32,
}

impl From<BrandModel> for Brand {
    fn from(model: BrandModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            logo_url: model.logo_url,
            is_active: model.is_active,
            sort_order: model.sort_order,
        }
    }
}

/// Prices are euro cents.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub category: String,
    pub gender: String,
    pub brand_id: Option<Uuid>,
    pub base_price: i64,
    pub is_active: bool,
    pub is_featured: bool,
    pub requires_prescription: bool,
    pub frame_shape: Option<String>,
    pub frame_material: Option<String>,
    pub frame_color: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ProductModel> for Product {
    fn from(model: ProductModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            category: model.category,
            gender: model.gender,
            brand_id: model.brand_id,
            base_price: model.base_price,
            is_active: model.is_active,
            is_featured: model.is_featured,
            requires_prescription: model.requires_prescription,
            frame_shape: model.frame_shape,
            frame_material: model.frame_material,
            frame_color: model.frame_color,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductVariant {
    pub id: Uuid,
    pub product_id: Uuid,
    pub sku: Option<String>,
    pub color_name: String,
    pub color_hex: Option<String>,
    pub size: Option<String>,
    pub price_override: Option<i64>,
    pub stock_quantity: i32,
    pub is_active: bool,
}

impl From<VariantModel> for ProductVariant {
    fn from(model: VariantModel) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            sku: model.sku,
            color_name: model.color_name,
            color_hex: model.color_hex,
            size: model.size,
            price_override: model.price_override,
            stock_quantity: model.stock_quantity,
            is_active: model.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LensOption {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub category: String,
    pub price: i64,
}

impl From<LensOptionModel> for LensOption {
    fn from(model: LensOptionModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            category: model.category,
            price: model.price,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShippingAddress {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub street: Option<String>,
    pub street_2: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub profile_id: Uuid,
    pub status: OrderStatus,
    pub delivery_method: DeliveryMethod,
    pub payment_method: PaymentMethod,
    pub subtotal: i64,
    pub shipping_cost: i64,
    pub total: i64,
    pub alma_payment_id: Option<String>,
    pub shipping_address: Option<ShippingAddress>,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<OrderModel> for Order {
    type Error = AppError;

    fn try_from(model: OrderModel) -> Result<Self, Self::Error> {
        let status = model.status.parse::<OrderStatus>().map_err(|_| {
            AppError::Internal(anyhow::anyhow!(
                "order {} has unknown status {}",
                model.id,
                model.status
            ))
        })?;
        let delivery_method = model.delivery_method.parse::<DeliveryMethod>().map_err(|_| {
            AppError::Internal(anyhow::anyhow!(
                "order {} has unknown delivery method {}",
                model.id,
                model.delivery_method
            ))
        })?;
        let payment_method = model.payment_method.parse::<PaymentMethod>().map_err(|_| {
            AppError::Internal(anyhow::anyhow!(
                "order {} has unknown payment method {}",
                model.id,
                model.payment_method
            ))
        })?;

        let shipping_address = model.shipping_street.is_some().then(|| ShippingAddress {
            first_name: model.shipping_first_name,
            last_name: model.shipping_last_name,
            street: model.shipping_street,
            street_2: model.shipping_street_2,
            city: model.shipping_city,
            postal_code: model.shipping_postal_code,
            country: model.shipping_country,
        });

        Ok(Self {
            id: model.id,
            order_number: model.order_number,
            profile_id: model.profile_id,
            status,
            delivery_method,
            payment_method,
            subtotal: model.subtotal,
            shipping_cost: model.shipping_cost,
            total: model.total,
            alma_payment_id: model.alma_payment_id,
            shipping_address,
            tracking_number: model.tracking_number,
            notes: model.notes,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub variant_id: Uuid,
    pub product_name: String,
    pub variant_info: Option<String>,
    pub quantity: i32,
    pub unit_price: i64,
    pub lens_type: Option<String>,
    pub lens_options_summary: Option<String>,
    pub lens_options_price: i64,
}

impl OrderItem {
    pub fn line_total(&self) -> i64 {
        (self.unit_price + self.lens_options_price) * i64::from(self.quantity)
    }
}

impl From<OrderItemModel> for OrderItem {
    fn from(model: OrderItemModel) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            variant_id: model.variant_id,
            product_name: model.product_name,
            variant_info: model.variant_info,
            quantity: model.quantity,
            unit_price: model.unit_price,
            lens_type: model.lens_type,
            lens_options_summary: model.lens_options_summary,
            lens_options_price: model.lens_options_price,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusHistoryEntry {
    pub id: Uuid,
    pub status: String,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<HistoryModel> for StatusHistoryEntry {
    fn from(model: HistoryModel) -> Self {
        Self {
            id: model.id,
            status: model.status,
            comment: model.comment,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Promotion {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub code: Option<String>,
    pub discount_type: String,
    pub discount_value: i64,
    pub is_active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub min_order_amount: Option<i64>,
}

impl From<PromotionModel> for Promotion {
    fn from(model: PromotionModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            code: model.code,
            discount_type: model.discount_type,
            discount_value: model.discount_value,
            is_active: model.is_active,
            starts_at: model.starts_at.map(|dt| dt.with_timezone(&Utc)),
            ends_at: model.ends_at.map(|dt| dt.with_timezone(&Utc)),
            min_order_amount: model.min_order_amount,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductImage {
    pub id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub url: String,
    pub alt_text: Option<String>,
    pub sort_order: i32,
    pub is_primary: bool,
}

impl From<ProductImageModel> for ProductImage {
    fn from(model: ProductImageModel) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            variant_id: model.variant_id,
            url: model.url,
            alt_text: model.alt_text,
            sort_order: model.sort_order,
            is_primary: model.is_primary,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BlogPost {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image_url: Option<String>,
    pub is_published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BlogPostModel> for BlogPost {
    fn from(model: BlogPostModel) -> Self {
        Self {
            id: model.id,
            title: model.title,
            slug: model.slug,
            excerpt: model.excerpt,
            content: model.content,
            cover_image_url: model.cover_image_url,
            is_published: model.is_published,
            published_at: model.published_at.map(|dt| dt.with_timezone(&Utc)),
            meta_title: model.meta_title,
            meta_description: model.meta_description,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

/// Blog post without its body, for listings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BlogPostSummary {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub cover_image_url: Option<String>,
    pub is_published: bool,
    pub published_at: Option<DateTime<Utc>>,
}

impl From<BlogPostModel> for BlogPostSummary {
    fn from(model: BlogPostModel) -> Self {
        Self {
            id: model.id,
            title: model.title,
            slug: model.slug,
            excerpt: model.excerpt,
            cover_image_url: model.cover_image_url,
            is_published: model.is_published,
            published_at: model.published_at.map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentType {
    ExamenVue,
    Essayage,
    Ajustement,
    Conseil,
}

impl AppointmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentType::ExamenVue => "examen_vue",
            AppointmentType::Essayage => "essayage",
            AppointmentType::Ajustement => "ajustement",
            AppointmentType::Conseil => "conseil",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AppointmentType::ExamenVue => "Examen de vue",
            AppointmentType::Essayage => "Essayage",
            AppointmentType::Ajustement => "Ajustement",
            AppointmentType::Conseil => "Conseil",
        }
    }
}

impl FromStr for AppointmentType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "examen_vue" => Ok(AppointmentType::ExamenVue),
            "essayage" => Ok(AppointmentType::Essayage),
            "ajustement" => Ok(AppointmentType::Ajustement),
            "conseil" => Ok(AppointmentType::Conseil),
            other => Err(AppError::bad_request(format!(
                "Type de rendez-vous invalide : {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Confirmee,
    Annulee,
    Terminee,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Confirmee => "confirmee",
            AppointmentStatus::Annulee => "annulee",
            AppointmentStatus::Terminee => "terminee",
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmee" => Ok(AppointmentStatus::Confirmee),
            "annulee" => Ok(AppointmentStatus::Annulee),
            "terminee" => Ok(AppointmentStatus::Terminee),
            other => Err(AppError::bad_request(format!(
                "Statut de rendez-vous invalide : {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AppointmentSlot {
    pub id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_available: bool,
}

impl From<SlotModel> for AppointmentSlot {
    fn from(model: SlotModel) -> Self {
        Self {
            id: model.id,
            date: model.date,
            start_time: model.start_time,
            end_time: model.end_time,
            is_available: model.is_available,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Appointment {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub profile_id: Uuid,
    pub appointment_type: AppointmentType,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<AppointmentModel> for Appointment {
    type Error = AppError;

    fn try_from(model: AppointmentModel) -> Result<Self, Self::Error> {
        let appointment_type = model.appointment_type.parse::<AppointmentType>().map_err(|_| {
            AppError::Internal(anyhow::anyhow!(
                "appointment {} has unknown type {}",
                model.id,
                model.appointment_type
            ))
        })?;
        let status = model.status.parse::<AppointmentStatus>().map_err(|_| {
            AppError::Internal(anyhow::anyhow!(
                "appointment {} has unknown status {}",
                model.id,
                model.status
            ))
        })?;
        Ok(Self {
            id: model.id,
            slot_id: model.slot_id,
            profile_id: model.profile_id,
            appointment_type,
            status,
            notes: model.notes,
            created_at: model.created_at.with_timezone(&Utc),
        })
    }
}
