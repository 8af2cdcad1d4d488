use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    cart::{Cart, CartItem, LensSelection, SelectedLensOption},
    dto::{
        account::{AddressInput, AddressList, CustomerList, UpdateProfileRequest},
        admin::{NotifyRequest, NotifyResponse, UpdateOrderStatusRequest},
        appointments::{
            AppointmentEntry, AppointmentList, BookAppointmentRequest, CreateSlotRequest,
            GenerateSlotsRequest, GeneratedSlots, SlotList, UpdateAppointmentStatusRequest,
            UpdateSlotRequest,
        },
        blog::{BlogPostList, CreateBlogPostRequest, UpdateBlogPostRequest},
        contact::{Accepted, AppointmentRequest, NewsletterRequest},
        orders::{
            CartLine, CreateOrderRequest, CreateOrderResponse, OrderDetail, OrderList,
            ShippingAddressInput,
        },
        payments::{CreatePaymentRequest, CreatePaymentResponse, VerifyPaymentResponse, WebhookAck, WebhookPayload},
        products::{
            BrandDetail, BrandList, CreateBrandRequest, CreateImageRequest, CreateProductRequest,
            CreateVariantRequest, LensOptionList, ProductCard, ProductDetail, ProductList,
            RecommendationKind, Recommendations, StockAdjustRequest, UpdateBrandRequest,
            UpdateProductRequest,
        },
        promotions::{
            CreatePromotionRequest, PromotionList, PromotionSummary, UpdatePromotionRequest,
            ValidatePromotionRequest,
        },
    },
    middleware::maintenance::{self, MaintenanceData},
    models::{
        Address, Appointment, AppointmentSlot, AppointmentStatus, AppointmentType, BlogPost,
        BlogPostSummary, Brand, DeliveryMethod, DiscountType, LensOption, Order, OrderItem,
        OrderStatus, PaymentMethod, Product, ProductImage, ProductVariant, Profile, Promotion,
        ShippingAddress, StatusHistoryEntry,
    },
    response::{ApiResponse, Meta},
    routes::{
        account, admin, appointments, blog, catalog, contact, health, orders, params, payments,
        promotions,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        maintenance::maintenance_page,
        catalog::list_products,
        catalog::featured_products,
        catalog::get_product,
        catalog::list_brands,
        catalog::get_brand,
        catalog::list_lens_options,
        promotions::validate_promotion,
        orders::create_order,
        orders::list_my_orders,
        orders::get_my_order,
        orders::order_invoice,
        payments::create_payment,
        payments::webhook,
        payments::webhook_ping,
        payments::verify_payment,
        account::get_profile,
        account::update_profile,
        account::list_addresses,
        account::add_address,
        account::delete_address,
        contact::request_appointment,
        contact::subscribe_newsletter,
        blog::list_posts,
        blog::get_post,
        appointments::list_available_slots,
        appointments::list_my_appointments,
        appointments::book_appointment,
        appointments::cancel_my_appointment,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::notify_customer,
        admin::create_product,
        admin::update_product,
        admin::deactivate_product,
        admin::add_product_image,
        admin::delete_product_image,
        admin::adjust_stock,
        admin::create_brand,
        admin::update_brand,
        admin::list_promotions,
        admin::create_promotion,
        admin::update_promotion,
        admin::list_customers,
        blog::list_all_posts,
        blog::create_post,
        blog::update_post,
        blog::delete_post,
        appointments::list_appointments,
        appointments::update_appointment_status,
        appointments::list_slots,
        appointments::create_slot,
        appointments::generate_day_slots,
        appointments::update_slot,
        appointments::delete_slot
    ),
    components(
        schemas(
            OrderStatus,
            DeliveryMethod,
            PaymentMethod,
            DiscountType,
            Profile,
            Address,
            Brand,
            Product,
            ProductVariant,
            ProductImage,
            LensOption,
            Order,
            OrderItem,
            ShippingAddress,
            StatusHistoryEntry,
            Promotion,
            Cart,
            CartItem,
            LensSelection,
            SelectedLensOption,
            CartLine,
            ShippingAddressInput,
            CreateOrderRequest,
            CreateOrderResponse,
            OrderList,
            OrderDetail,
            CreatePaymentRequest,
            CreatePaymentResponse,
            VerifyPaymentResponse,
            WebhookPayload,
            WebhookAck,
            ValidatePromotionRequest,
            PromotionSummary,
            CreatePromotionRequest,
            UpdatePromotionRequest,
            PromotionList,
            CreateProductRequest,
            CreateVariantRequest,
            UpdateProductRequest,
            StockAdjustRequest,
            ProductCard,
            ProductList,
            ProductDetail,
            RecommendationKind,
            Recommendations,
            CreateImageRequest,
            BrandList,
            BrandDetail,
            CreateBrandRequest,
            UpdateBrandRequest,
            LensOptionList,
            UpdateProfileRequest,
            AddressInput,
            AddressList,
            CustomerList,
            AppointmentRequest,
            NewsletterRequest,
            Accepted,
            UpdateOrderStatusRequest,
            NotifyRequest,
            NotifyResponse,
            BlogPost,
            BlogPostSummary,
            BlogPostList,
            CreateBlogPostRequest,
            UpdateBlogPostRequest,
            AppointmentType,
            AppointmentStatus,
            AppointmentSlot,
            Appointment,
            AppointmentEntry,
            AppointmentList,
            BookAppointmentRequest,
            UpdateAppointmentStatusRequest,
            CreateSlotRequest,
            GenerateSlotsRequest,
            GeneratedSlots,
            UpdateSlotRequest,
            SlotList,
            MaintenanceData,
            health::HealthData,
            payments::WebhookPing,
            params::Pagination,
            params::SortOrder,
            params::ProductSortBy,
            Meta,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<OrderDetail>,
            ApiResponse<ProductList>,
            ApiResponse<ProductDetail>,
            ApiResponse<Recommendations>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health and maintenance endpoints"),
        (name = "Catalogue", description = "Products, brands and lens options"),
        (name = "Promotions", description = "Promotion code validation"),
        (name = "Orders", description = "Checkout and invoices"),
        (name = "Payments", description = "Alma installment payments"),
        (name = "Account", description = "Customer profile, addresses and orders"),
        (name = "Contact", description = "Appointment requests and newsletter"),
        (name = "Appointments", description = "Slot booking"),
        (name = "Blog", description = "Published articles"),
        (name = "Admin", description = "Back-office endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_payment_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/alma/webhook"));
        assert!(doc.paths.paths.contains_key("/api/orders"));
        assert!(doc.paths.paths.contains_key("/api/admin/orders/notify"));
    }

    #[test]
    fn document_lists_content_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/products/featured",
            "/api/orders/{id}/invoice",
            "/api/blog/{slug}",
            "/api/account/appointments",
            "/api/admin/appointment-slots/generate",
            "/api/admin/products/{id}/images",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
    }
}
