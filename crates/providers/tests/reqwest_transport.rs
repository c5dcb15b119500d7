//! End-to-end checks of the executor over the real `reqwest` transport.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal_macros::dec;
use serde_json::json;
use tradepress_providers::provider::{fmp, github};
use tradepress_providers::{
    params, Credential, EtoroClient, EtoroOrder, FailureKind, ProviderClient, ProviderConfig,
    ReqwestTransport, Secret,
};
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fmp_client(base_url: &str) -> ProviderClient {
    let config = ProviderConfig::new(base_url)
        .with_credential(Credential::ApiKey(Secret::new("fmp-secret-key")));
    ProviderClient::new(&fmp::DESCRIPTOR, config, Arc::new(ReqwestTransport::new()))
}

#[tokio::test]
async fn test_get_with_query_credential() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quote/AAPL"))
        .and(query_param("apikey", "fmp-secret-key"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"symbol": "AAPL", "price": 189.84}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let body = fmp_client(&server.uri())
        .execute("quote", params([("symbol", "AAPL")]))
        .await
        .unwrap();
    assert_eq!(body[0]["price"], 189.84);
}

#[tokio::test]
async fn test_post_sends_headers_and_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/trading/execution/market-open-orders/by-amount"))
        .and(header("x-api-key", "api-key"))
        .and(header("x-user-key", "user-key"))
        .and(header_exists("x-request-id"))
        .and(body_json(json!({"instrumentId": 100000, "isBuy": true, "amount": 250.0})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"orderForOpen": {"orderId": 77}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = ProviderConfig::new(server.uri()).with_credential(Credential::KeyPair {
        key: Secret::new("api-key"),
        secret: Secret::new("user-key"),
    });
    let client = EtoroClient::new(config, Arc::new(ReqwestTransport::new()));

    let body = client
        .place_order(&EtoroOrder::buy(100000, dec!(250)))
        .await
        .unwrap();
    assert_eq!(body["orderForOpen"]["orderId"], 77);
}

#[tokio::test]
async fn test_non_2xx_carries_status_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
        .mount(&server)
        .await;

    let client = ProviderClient::new(
        &github::DESCRIPTOR,
        ProviderConfig::new(server.uri()),
        Arc::new(ReqwestTransport::new()),
    );
    let err = client
        .execute("repository", params([("owner", "octo"), ("repo", "missing")]))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::HttpStatus);
    assert_eq!(err.http_status(), Some(404));
    assert!(err.message().contains("Not Found"));
}

#[tokio::test]
async fn test_timeout_is_transport_failure_without_credential() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quote/AAPL"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let config = ProviderConfig::new(server.uri())
        .with_credential(Credential::ApiKey(Secret::new("fmp-secret-key")))
        .with_timeout(Duration::from_millis(100));
    let client = ProviderClient::new(&fmp::DESCRIPTOR, config, Arc::new(ReqwestTransport::new()));

    let err = client
        .execute("quote", params([("symbol", "AAPL")]))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::Transport);
    assert!(!err.message().contains("fmp-secret-key"));
    assert!(!format!("{:?}", err).contains("fmp-secret-key"));
}

#[tokio::test]
async fn test_connection_refused_is_transport_failure() {
    let err = fmp_client("http://127.0.0.1:1")
        .execute("quote", params([("symbol", "AAPL")]))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Transport);
    assert!(!err.message().contains("fmp-secret-key"));
}
