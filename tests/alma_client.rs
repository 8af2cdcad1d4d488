use optical_storefront_api::clients::alma::{
    AlmaClient, AlmaError, CustomData, Customer, MerchantOrder, PaymentRequest, PaymentSpec,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request() -> PaymentRequest {
    PaymentRequest {
        payment: PaymentSpec {
            purchase_amount: 8_690,
            installments_count: 3,
            return_url: "https://shop.test/panier/checkout/alma-retour".to_string(),
            customer_cancel_url: "https://shop.test/panier/checkout?cancelled=true".to_string(),
            ipn_callback_url: "https://shop.test/api/alma/webhook".to_string(),
            locale: "fr".to_string(),
            custom_data: CustomData {
                order_id: Some("7f1e9a52-4c1b-4c55-9f0e-3b0f7f2d9c11".to_string()),
                order_number: Some("VO-2026-0042".to_string()),
            },
        },
        customer: Customer {
            first_name: "Claire".to_string(),
            last_name: "Martin".to_string(),
            email: "claire@example.fr".to_string(),
            phone: None,
        },
        order: MerchantOrder {
            merchant_reference: "VO-2026-0042".to_string(),
        },
        shipping_address: None,
    }
}

#[tokio::test]
async fn create_payment_sends_auth_and_amount() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/payments"))
        .and(header("Authorization", "Alma-Auth sk_test"))
        .and(body_partial_json(json!({
            "payment": { "purchase_amount": 8690, "installments_count": 3 },
            "order": { "merchant_reference": "VO-2026-0042" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "payment_abc",
            "url": "https://checkout.sandbox.getalma.eu/payment_abc",
            "state": "not_started"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = AlmaClient::new("sk_test", &server.uri(), 5).unwrap();
    let payment = client.create_payment(&request()).await.unwrap();

    assert_eq!(payment.id, "payment_abc");
    assert_eq!(
        payment.url.as_deref(),
        Some("https://checkout.sandbox.getalma.eu/payment_abc")
    );
}

#[tokio::test]
async fn get_payment_reads_order_id_from_custom_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/payments/payment_abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "payment_abc",
            "state": "paid",
            "custom_data": { "order_id": "7f1e9a52-4c1b-4c55-9f0e-3b0f7f2d9c11" }
        })))
        .mount(&server)
        .await;

    let client = AlmaClient::new("sk_test", &server.uri(), 5).unwrap();
    let payment = client.get_payment("payment_abc").await.unwrap();

    assert_eq!(payment.state, "paid");
    assert_eq!(
        payment.order_id(),
        Some("7f1e9a52-4c1b-4c55-9f0e-3b0f7f2d9c11")
    );
}

#[tokio::test]
async fn non_success_status_is_an_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/payments/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let client = AlmaClient::new("sk_test", &server.uri(), 5).unwrap();
    let err = client.get_payment("missing").await.unwrap_err();

    match err {
        AlmaError::Api { status, body } => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(body, "not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
