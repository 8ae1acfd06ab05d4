#![allow(dead_code)]

use axum::body::{Body, to_bytes};
use axum::http::Request;
use axum::response::Response;
use httpmock::prelude::*;
use httpmock::Mock;
use marketplace_proxy::api_client::{ApiClient, ApiConfig};
use marketplace_proxy::clock::ManualClock;
use marketplace_proxy::credentials::Credentials;
use marketplace_proxy::oauth_client::OAuthClient;
use marketplace_proxy::retrievers::refresh_token_retriever::RefreshTokenRetriever;
use marketplace_proxy::routes::{AppState, ConfiguredIdentity};
use marketplace_proxy::token_manager::TokenManager;
use oauth2::TokenUrl;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use url::Url;

pub const TOKEN_PATH: &str = "/auth/O2/token";
pub const USER_EMAIL: &str = "buyer@example.com";

pub fn start_time() -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(1_750_000_000)
}

pub fn credentials() -> Credentials {
    Credentials::new(
        Some("amzn1.application-oa2-client.test".to_owned()),
        Some("test-secret".to_owned()),
        Some("Atzr|test-refresh".to_owned()),
    )
}

pub fn token_mock<'a>(server: &'a MockServer, token: &str, expires_in: u64) -> Mock<'a> {
    let body = format!(
        r#"{{"access_token":"{token}","token_type":"bearer","expires_in":{expires_in}}}"#
    );

    server.mock(|when, then| {
        when.method(POST)
            .path(TOKEN_PATH)
            .body_includes("grant_type=refresh_token");
        then.status(200)
            .header("content-type", "application/json")
            .body(body);
    })
}

pub fn token_manager(
    server: &MockServer,
    credentials: Credentials,
    clock: &ManualClock,
) -> TokenManager {
    let oauth_client = OAuthClient::new(
        TokenUrl::new(server.url(TOKEN_PATH)).unwrap(),
        Duration::from_secs(5),
    )
    .unwrap();
    let retriever = RefreshTokenRetriever::new(oauth_client, credentials);

    TokenManager::with_clock(Arc::new(retriever), Arc::new(clock.clone()))
}

pub fn state(server: &MockServer, identity: ConfiguredIdentity) -> AppState {
    let clock = ManualClock::new(start_time());
    let api = ApiClient::new(
        ApiConfig {
            base_url: Url::parse(&server.base_url()).unwrap(),
            ..Default::default()
        },
        token_manager(server, credentials(), &clock),
    )
    .unwrap();

    AppState::new(api, identity)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_as_user(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-amz-access-token", "Atza|caller")
        .header("x-amz-user-email", USER_EMAIL)
        .body(Body::empty())
        .unwrap()
}

pub async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
