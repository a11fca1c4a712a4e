//! Integration tests for HttpBalanceFetcher.
//!
//! Uses wiremock for HTTP mocking. Tests cover the request shape, status
//! mapping, body validation and the controller driven over real HTTP.

use std::sync::Arc;
use std::time::Duration;

use ninja_client::controller::{BalanceController, ControllerConfig};
use ninja_client::fetcher::{get_account_balance, AccountBalanceRequest, HttpBalanceFetcher};
use ninja_core::{BalanceError, BalanceFetcher, BalanceRecord, CredentialKey, FetchState, SystemClock};
use ninja_storage::{BalanceStore, CacheEntry, MemoryBalanceStore};
use ninja_test_utils::RecordingLogSink;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_fetcher() -> HttpBalanceFetcher {
    HttpBalanceFetcher::new(Duration::from_secs(5)).expect("failed to create fetcher")
}

fn key_for(mock_server: &MockServer) -> CredentialKey {
    CredentialKey::new(mock_server.uri(), "sk-test").expect("valid key")
}

async fn mount_balance(mock_server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/account_balance"))
        .respond_with(response)
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_fetch_success_sends_bearer_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/account_balance"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "balance_nanos": 5_000_000_000i64,
            "keys_status": "active"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let record = create_test_fetcher()
        .fetch(&key_for(&mock_server))
        .await
        .expect("fetch failed");

    assert_eq!(record, BalanceRecord::new(5_000_000_000, "active"));
    assert_eq!(record.display_amount(), "$5.00");
}

#[tokio::test]
async fn test_fetch_trailing_slash_endpoint() {
    let mock_server = MockServer::start().await;
    mount_balance(
        &mock_server,
        ResponseTemplate::new(200).set_body_json(json!({"balance_nanos": 1, "keys_status": "active"})),
    )
    .await;

    let key = CredentialKey::new(format!("{}/", mock_server.uri()), "sk-test").expect("valid key");
    let record = create_test_fetcher().fetch(&key).await.expect("fetch failed");
    assert_eq!(record.balance_nanos, 1);
}

#[tokio::test]
async fn test_fetch_server_error_is_network_error() {
    let mock_server = MockServer::start().await;
    mount_balance(&mock_server, ResponseTemplate::new(500).set_body_string("upstream down")).await;

    let err = create_test_fetcher()
        .fetch(&key_for(&mock_server))
        .await
        .unwrap_err();

    assert!(matches!(err, BalanceError::Network { status: Some(500), .. }));
    assert!(err.to_string().contains("upstream down"), "got: {}", err);
    assert!(err.is_surfaced());
}

#[tokio::test]
async fn test_fetch_unauthorized_is_network_error() {
    let mock_server = MockServer::start().await;
    mount_balance(&mock_server, ResponseTemplate::new(401)).await;

    let err = create_test_fetcher()
        .fetch(&key_for(&mock_server))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn test_fetch_malformed_bodies_are_validation_errors() {
    let bodies = [
        json!({"keys_status": "active"}),
        json!({"balance_nanos": "5000", "keys_status": "active"}),
        json!({"balance_nanos": 5000}),
        json!({"balance_nanos": 1.5, "keys_status": "active"}),
        json!([1, 2, 3]),
    ];

    for body in bodies {
        let mock_server = MockServer::start().await;
        mount_balance(&mock_server, ResponseTemplate::new(200).set_body_json(&body)).await;

        let err = create_test_fetcher()
            .fetch(&key_for(&mock_server))
            .await
            .unwrap_err();
        assert!(matches!(err, BalanceError::Validation { .. }), "body {} gave {:?}", body, err);
    }
}

#[tokio::test]
async fn test_fetch_non_json_body_is_validation_error() {
    let mock_server = MockServer::start().await;
    mount_balance(&mock_server, ResponseTemplate::new(200).set_body_string("<html>ok</html>")).await;

    let err = create_test_fetcher()
        .fetch(&key_for(&mock_server))
        .await
        .unwrap_err();
    assert!(matches!(err, BalanceError::Validation { .. }));
}

#[tokio::test]
async fn test_fetch_unreachable_endpoint_is_network_error() {
    let key = CredentialKey::new("http://127.0.0.1:9", "sk-test").expect("valid key");
    let fetcher = HttpBalanceFetcher::new(Duration::from_millis(500)).expect("fetcher");

    let err = fetcher.fetch(&key).await.unwrap_err();
    assert!(matches!(err, BalanceError::Network { status: None, .. }));
}

#[tokio::test]
async fn test_fetch_malformed_endpoint_is_network_error() {
    let key = CredentialKey::new("not a url", "sk-test").expect("valid key");

    let err = create_test_fetcher().fetch(&key).await.unwrap_err();

    assert!(matches!(err, BalanceError::Network { status: None, .. }), "got {:?}", err);
    assert!(err.is_surfaced());
}

#[tokio::test]
async fn test_fetch_invalid_secret_header_is_network_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let key = CredentialKey::new(mock_server.uri(), "sk-line\nbreak").expect("valid key");
    let err = create_test_fetcher().fetch(&key).await.unwrap_err();

    assert!(matches!(err, BalanceError::Network { status: None, .. }), "got {:?}", err);
}

#[tokio::test]
async fn test_get_account_balance_requires_credentials() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let request = AccountBalanceRequest {
        api_base_url: Some(mock_server.uri()),
        api_key: None,
    };
    let err = get_account_balance(&create_test_fetcher(), &request)
        .await
        .unwrap_err();

    assert!(matches!(err, BalanceError::Configuration { .. }));
    assert!(!err.is_surfaced());
}

#[tokio::test]
async fn test_get_account_balance_fetches_once() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account_balance"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"balance_nanos": 42, "keys_status": "active"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = AccountBalanceRequest {
        api_base_url: Some(mock_server.uri()),
        api_key: Some("sk-test".to_string()),
    };
    let record = get_account_balance(&create_test_fetcher(), &request)
        .await
        .expect("fetch failed");
    assert_eq!(record.balance_nanos, 42);
}

// ============================================================================
// CONTROLLER OVER HTTP
// ============================================================================

#[tokio::test]
async fn test_controller_cold_start_over_http() {
    let mock_server = MockServer::start().await;
    mount_balance(
        &mock_server,
        ResponseTemplate::new(200).set_body_json(json!({
            "balance_nanos": 5_000_000_000i64,
            "keys_status": "active"
        })),
    )
    .await;

    let store = Arc::new(MemoryBalanceStore::new());
    let controller = BalanceController::new(create_test_fetcher(), Arc::clone(&store), ControllerConfig::default());
    controller.bind(Some(key_for(&mock_server)));

    let mut views = controller.subscribe();
    let view = views.wait_for(|v| !v.is_loading).await.expect("controller alive").clone();

    assert_eq!(view.record.map(|r| r.display_amount()).as_deref(), Some("$5.00"));
    assert!(view.error.is_none());
    assert!(!store.read().is_empty());
}

#[tokio::test]
async fn test_controller_cold_start_server_error() {
    let mock_server = MockServer::start().await;
    mount_balance(&mock_server, ResponseTemplate::new(500)).await;

    let store = Arc::new(MemoryBalanceStore::new());
    let controller = BalanceController::new(create_test_fetcher(), Arc::clone(&store), ControllerConfig::default());
    controller.bind(Some(key_for(&mock_server)));

    let mut views = controller.subscribe();
    let view = views.wait_for(|v| !v.is_loading).await.expect("controller alive").clone();

    assert!(view.record.is_none());
    assert_eq!(view.error.as_deref().and_then(BalanceError::status), Some(500));
    assert!(store.read().is_empty());
}

#[tokio::test]
async fn test_controller_revalidation_server_error_keeps_record() {
    let mock_server = MockServer::start().await;
    mount_balance(&mock_server, ResponseTemplate::new(500)).await;

    let key = key_for(&mock_server);
    let stale = BalanceRecord::new(1_000_000_000, "active");
    let store = Arc::new(MemoryBalanceStore::with_entry(CacheEntry::new(
        stale.clone(),
        key.fingerprint(),
        0,
    )));
    let controller = BalanceController::new(create_test_fetcher(), Arc::clone(&store), ControllerConfig::default());
    controller.bind(Some(key));

    let mut views = controller.subscribe();
    let view = views.wait_for(|v| v.has_error()).await.expect("controller alive").clone();

    assert_eq!(view.record, Some(stale.clone()));
    assert_eq!(store.read().record, Some(stale));
}

#[tokio::test]
async fn test_controller_malformed_endpoint_surfaces_error() {
    let log = Arc::new(RecordingLogSink::new());
    let store = Arc::new(MemoryBalanceStore::new());
    let controller = BalanceController::with_parts(
        create_test_fetcher(),
        Arc::clone(&store),
        SystemClock,
        log.clone(),
        ControllerConfig::default(),
    );
    controller.bind(CredentialKey::new("not a url", "sk-test"));

    let mut views = controller.subscribe();
    let view = views.wait_for(|v| !v.is_loading).await.expect("controller alive").clone();

    assert!(view.record.is_none());
    assert!(view.has_error());
    assert_eq!(controller.state(), FetchState::Error);
    assert!(store.read().is_empty());
    assert_eq!(log.errors().len(), 1);
}
