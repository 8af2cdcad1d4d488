use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::{
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems, Model as OrderItemModel},
        orders::{Entity as Orders, Model as OrderModel},
        profiles::{Entity as Profiles, Model as ProfileModel},
    },
    error::{AppError, AppResult},
    invoice::{self, InvoiceData, InvoiceLine, Seller},
    middleware::auth::{AuthUser, require_admin},
    state::AppState,
};

/// A rendered invoice ready to be served.
#[derive(Debug)]
pub struct InvoicePdf {
    pub filename: String,
    pub bytes: Vec<u8>,
}

fn describe(item: &OrderItemModel) -> String {
    match item.variant_info.as_deref().filter(|info| !info.is_empty()) {
        Some(info) => format!("{} — {}", item.product_name, info),
        None => item.product_name.clone(),
    }
}

pub fn invoice_data(
    order: &OrderModel,
    items: &[OrderItemModel],
    profile: Option<&ProfileModel>,
) -> InvoiceData {
    let shipping_name = [
        order.shipping_first_name.as_deref(),
        order.shipping_last_name.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ");
    let profile_name = profile
        .map(|p| {
            [p.first_name.as_deref(), p.last_name.as_deref()]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();
    let customer_name = [shipping_name, profile_name]
        .into_iter()
        .find(|name| !name.trim().is_empty())
        .unwrap_or_else(|| "Client".to_string());

    InvoiceData {
        order_number: order.order_number.clone(),
        issued_on: order.created_at.date_naive(),
        customer_name,
        street: order.shipping_street.clone(),
        postal_code: order.shipping_postal_code.clone(),
        city: order.shipping_city.clone(),
        email: profile.map(|p| p.email.clone()),
        lines: items
            .iter()
            .map(|item| InvoiceLine {
                description: describe(item),
                quantity: item.quantity,
                unit_price: item.unit_price + item.lens_options_price,
            })
            .collect(),
        subtotal: order.subtotal,
        shipping_cost: order.shipping_cost,
        total: order.total,
    }
}

/// Invoice of an order, for its owner or an admin.
pub async fn order_invoice(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<InvoicePdf> {
    let order = Orders::find_by_id(id)
        .one(&*state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Commande introuvable"))?;

    if order.profile_id != user.user_id {
        require_admin(&*state.orm, user).await?;
    }

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(&*state.orm)
        .await?;
    let profile = Profiles::find_by_id(order.profile_id)
        .one(&*state.orm)
        .await?;

    let seller = Seller {
        name: invoice::SHOP_NAME,
        street: invoice::SHOP_STREET,
        city: invoice::SHOP_CITY,
        phone: invoice::SHOP_PHONE,
        email: &state.config.shop_email,
    };
    let bytes = invoice::render(&invoice_data(&order, &items, profile.as_ref()), &seller);
    tracing::info!(order_id = %order.id, user_id = %user.user_id, size = bytes.len(), "invoice rendered");

    Ok(InvoicePdf {
        filename: invoice::filename(&order.order_number),
        bytes,
    })
}
