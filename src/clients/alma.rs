//! HTTP client for the Alma installment-payment API.
//!
//! Only two endpoints are used: payment creation and payment lookup. Amounts are in
//! euro cents, which is also how orders store them.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Installment counts accepted by the merchant contract.
pub const ALLOWED_INSTALLMENTS: [u8; 5] = [1, 2, 3, 4, 12];

/// Errors returned by [`AlmaClient`].
#[derive(Debug, Error)]
pub enum AlmaError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Alma answered with a non-2xx status.
    #[error("Alma API returned {status}: {body}")]
    Api { status: StatusCode, body: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentRequest {
    pub payment: PaymentSpec,
    pub customer: Customer,
    pub order: MerchantOrder,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<AlmaAddress>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentSpec {
    pub purchase_amount: i64,
    pub installments_count: u8,
    pub return_url: String,
    pub customer_cancel_url: String,
    pub ipn_callback_url: String,
    pub locale: String,
    pub custom_data: CustomData,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CustomData {
    pub order_id: Option<String>,
    pub order_number: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MerchantOrder {
    pub merchant_reference: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlmaAddress {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub line1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country: String,
}

/// The subset of Alma's payment object this service reads.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Payment {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    pub state: String,
    #[serde(default)]
    pub custom_data: Option<CustomData>,
}

impl Payment {
    pub fn order_id(&self) -> Option<&str> {
        self.custom_data
            .as_ref()
            .and_then(|data| data.order_id.as_deref())
    }
}

/// Client for the Alma REST API.
///
/// Built once at start-up and shared through `AppState`; `reqwest::Client` is
/// reference-counted so clones are cheap.
#[derive(Debug, Clone)]
pub struct AlmaClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl AlmaClient {
    /// # Errors
    ///
    /// Returns [`AlmaError::Http`] if the underlying `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, base_url: &str, timeout_secs: u64) -> Result<Self, AlmaError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Creates a payment session and returns Alma's payment object, including the
    /// hosted payment page URL.
    ///
    /// # Errors
    ///
    /// - [`AlmaError::Api`] when Alma rejects the request.
    /// - [`AlmaError::Http`] on network failure or an unparseable body.
    pub async fn create_payment(&self, request: &PaymentRequest) -> Result<Payment, AlmaError> {
        let response = self
            .client
            .post(format!("{}/payments", self.base_url))
            .header("Authorization", self.auth_header())
            .header("Accept", "application/json")
            .json(request)
            .send()
            .await?;

        Self::parse(response).await
    }

    /// Fetches the live state of a payment.
    ///
    /// # Errors
    ///
    /// - [`AlmaError::Api`] when Alma answers with a non-2xx status.
    /// - [`AlmaError::Http`] on network failure or an unparseable body.
    pub async fn get_payment(&self, payment_id: &str) -> Result<Payment, AlmaError> {
        let response = self
            .client
            .get(format!("{}/payments/{}", self.base_url, payment_id))
            .header("Authorization", self.auth_header())
            .header("Accept", "application/json")
            .send()
            .await?;

        Self::parse(response).await
    }

    fn auth_header(&self) -> String {
        format!("Alma-Auth {}", self.api_key)
    }

    async fn parse(response: reqwest::Response) -> Result<Payment, AlmaError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AlmaError::Api { status, body });
        }
        Ok(response.json::<Payment>().await?)
    }
}
