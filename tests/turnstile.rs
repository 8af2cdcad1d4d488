use optical_storefront_api::clients::TurnstileVerifier;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn valid_token_passes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/siteverify"))
        .and(body_string_contains("secret=s3cret"))
        .and(body_string_contains("response=tok"))
        .and(body_string_contains("remoteip=203.0.113.7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let verifier = TurnstileVerifier::new(
        Some("s3cret".to_string()),
        &format!("{}/siteverify", server.uri()),
        5,
    )
    .unwrap();
    assert!(verifier.verify("tok", Some("203.0.113.7")).await.unwrap());
}

#[tokio::test]
async fn rejected_token_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/siteverify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error-codes": ["invalid-input-response"]
        })))
        .mount(&server)
        .await;

    let verifier = TurnstileVerifier::new(
        Some("s3cret".to_string()),
        &format!("{}/siteverify", server.uri()),
        5,
    )
    .unwrap();
    assert!(!verifier.verify("bad", None).await.unwrap());
}

#[tokio::test]
async fn missing_token_or_secret_fails_without_calling_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(0)
        .mount(&server)
        .await;

    let url = format!("{}/siteverify", server.uri());
    let with_secret = TurnstileVerifier::new(Some("s3cret".to_string()), &url, 5).unwrap();
    assert!(!with_secret.verify("", None).await.unwrap());

    let without_secret = TurnstileVerifier::new(None, &url, 5).unwrap();
    assert!(!without_secret.verify("tok", None).await.unwrap());
}
