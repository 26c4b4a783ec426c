/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for siwe-client tests

use std::sync::Arc;

use siwe_client::{
    AuthOrchestrator, ClientConfig, MockWalletGateway, SiteConfig, SiweApiClient,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Build an orchestrator wired to the mock server and the given gateway
pub fn orchestrator(server: &MockServer, gateway: Arc<MockWalletGateway>) -> AuthOrchestrator {
    let client = Arc::new(
        SiweApiClient::with_config(ClientConfig::default(), &server.uri())
            .expect("client init"),
    );
    AuthOrchestrator::new(client, gateway, test_site())
}

/// Site identity used across tests
pub fn test_site() -> SiteConfig {
    SiteConfig::new("app.test", "https://app.test")
}

/// Mount the happy-path challenge endpoints: `/nonce` → `nonce`,
/// `/verify` → `true`, `/me` → `{address}`
pub async fn mount_successful_login(server: &MockServer, nonce: &str, address: &str) {
    Mock::given(method("GET"))
        .and(path("/nonce"))
        .respond_with(ResponseTemplate::new(200).set_body_string(nonce))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/verify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(true))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "address": address })),
        )
        .mount(server)
        .await;
}
