//! `ApiClient` against a live server.

mod common;

use std::time::Duration;

use common::{test_config, TestServer};
use dfd_api::client::{ApiClient, ClientError, ContactForm};

fn form() -> ContactForm {
    ContactForm {
        name: "Ana Souza".to_string(),
        email: "ana@prefeitura.gov.br".to_string(),
        message: "Dúvida sobre o ETP.".to_string(),
    }
}

#[tokio::test]
async fn test_health_and_token_caching() {
    let server = TestServer::start(test_config()).await;
    let client = ApiClient::new(server.url(), Duration::from_secs(5)).unwrap();

    let health = client.health().await.unwrap();
    assert_eq!(health.status, "ok");

    let first = client.csrf_token().await.unwrap();
    let second = client.csrf_token().await.unwrap();
    assert_eq!(first, second);

    server.stop().await;
}

#[tokio::test]
async fn test_submit_and_improve() {
    let server = TestServer::start(test_config()).await;
    let client = ApiClient::new(server.url(), Duration::from_secs(5)).unwrap();

    let response = client.submit_contact(&form()).await.unwrap();
    assert!(response.success);

    let improved = client
        .improve_text("o tr   define o objeto.", Some("termo de referência"))
        .await
        .unwrap();
    assert_eq!(improved, "O TR define o objeto.");

    server.stop().await;
}

#[tokio::test]
async fn test_budget_tracking_and_rate_limit_message() {
    let mut config = test_config();
    config.rate_limit.max_requests = 2;
    let server = TestServer::start(config).await;
    let client = ApiClient::new(server.url(), Duration::from_secs(5)).unwrap();

    assert_eq!(client.remaining_requests(), None);
    assert!(!client.has_token());
    assert!(!client.can_submit());

    client.csrf_token().await.unwrap();
    assert!(client.has_token());
    assert!(client.can_submit());

    let status = client.rate_limit_status().await.unwrap();
    assert_eq!(status.remaining_requests, 1);
    assert_eq!(client.remaining_requests(), Some(1));

    client.submit_contact(&form()).await.unwrap();
    let err = client.submit_contact(&form()).await.unwrap_err();
    assert!(matches!(err, ClientError::RateLimited));
    assert_eq!(
        err.to_string(),
        "Too many attempts. Please wait a moment before trying again."
    );
    assert_eq!(client.remaining_requests(), Some(0));
    assert!(!client.can_submit());

    server.stop().await;
}

#[tokio::test]
async fn test_invalid_input_message() {
    let server = TestServer::start(test_config()).await;
    let client = ApiClient::new(server.url(), Duration::from_secs(5)).unwrap();

    let mut bad = form();
    bad.email = "not-an-email".to_string();
    let err = client.submit_contact(&bad).await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidInput));

    server.stop().await;
}

#[tokio::test]
async fn test_request_timeout() {
    let mut config = test_config();
    config.latency.target_ms = 1_000;
    let server = TestServer::start(config).await;
    let client = ApiClient::new(server.url(), Duration::from_millis(200)).unwrap();

    let err = client.submit_contact(&form()).await.unwrap_err();
    assert!(matches!(err, ClientError::Timeout), "got {:?}", err);
    assert!(client.can_submit());

    server.stop().await;
}

#[tokio::test]
async fn test_unreachable_server() {
    let server = TestServer::start(test_config()).await;
    let url = server.url();
    server.stop().await;

    let client = ApiClient::new(url, Duration::from_secs(2)).unwrap();
    let err = client.health().await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_)), "got {:?}", err);
}
