//! Connection validation against a mock agent

mod common;

use common::*;
use serde_json::json;
use unraid_exporter::config::UnraidConfig;
use unraid_exporter::validation::{validate_connection, ValidationError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_validation_derives_title_from_hostname() {
    // Given: A reachable agent
    let server = MockServer::start().await;
    mount_json(&server, "system", system_json()).await;
    let config = config_for(&server);

    // When
    let entry = validate_connection(&config).await.expect("validation succeeds");

    // Then
    assert_eq!(entry.title, "Unraid (tower)");
    assert_eq!(entry.hostname, "tower");
    assert_eq!(entry.unique_id, format!("{}:{}", config.host, config.port));
}

#[tokio::test]
async fn test_validation_without_hostname_uses_unknown() {
    let server = MockServer::start().await;
    mount_json(&server, "system", json!({"version": "6.12.6"})).await;

    let entry = validate_connection(&config_for(&server)).await.unwrap();
    assert_eq!(entry.title, "Unraid (unknown)");
}

#[tokio::test]
async fn test_validation_error_categories() {
    // Given: A server error
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/system"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    // Then: cannot_connect
    let err = validate_connection(&config_for(&server)).await.unwrap_err();
    assert_eq!(err, ValidationError::CannotConnect);

    // Given: A garbage body
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/system"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    // Then: unknown
    let err = validate_connection(&config_for(&server)).await.unwrap_err();
    assert_eq!(err, ValidationError::Unknown);
    assert_eq!(err.to_string(), "unknown");
}

#[tokio::test]
async fn test_validation_refused_connection() {
    // Given: Nothing listening
    let mut config = UnraidConfig::new("127.0.0.1", 1);
    config.timeout_seconds = 1;

    // Then
    let err = validate_connection(&config).await.unwrap_err();
    assert_eq!(err, ValidationError::CannotConnect);
}
