use axum::Router;

use crate::state::AppState;

pub mod account;
pub mod admin;
pub mod appointments;
pub mod blog;
pub mod catalog;
pub mod contact;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod payments;
pub mod promotions;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/products", catalog::products_router())
        .nest("/brands", catalog::brands_router())
        .route("/lens-options", axum::routing::get(catalog::list_lens_options))
        .nest("/blog", blog::router())
        .nest("/appointment-slots", appointments::slots_router())
        .nest("/promotions", promotions::router())
        .nest("/orders", orders::router())
        .nest("/alma", payments::router())
        .nest("/account", account::router())
        .nest("/admin", admin::router())
        .merge(contact::router())
}
