use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::OrderStatus;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePaymentRequest {
    #[serde(alias = "orderId")]
    pub order_id: Uuid,
    pub installments: u8,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatePaymentResponse {
    pub payment_url: String,
    pub payment_id: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VerifyPaymentQuery {
    #[serde(alias = "orderId")]
    pub order_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyPaymentResponse {
    pub confirmed: bool,
    pub order_number: String,
    pub status: OrderStatus,
    pub message: Option<String>,
}

/// Body of an Alma IPN callback. Only the payment id is read; the state is re-fetched.
#[derive(Debug, Deserialize, ToSchema)]
pub struct WebhookPayload {
    pub id: Option<String>,
    pub payment_id: Option<String>,
}

impl WebhookPayload {
    pub fn payment_id(&self) -> Option<&str> {
        self.id
            .as_deref()
            .or(self.payment_id.as_deref())
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct WebhookAck {
    pub received: bool,
    pub applied_status: Option<OrderStatus>,
}
