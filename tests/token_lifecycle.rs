use futures::future::join_all;
use httpmock::prelude::*;
use marketplace_proxy::clock::ManualClock;
use marketplace_proxy::credentials::Credentials;
use marketplace_proxy::error::ProxyError;
use marketplace_proxy::oauth_client::OAuthClient;
use marketplace_proxy::retrievers::refresh_token_retriever::RefreshTokenRetriever;
use marketplace_proxy::token_manager::TokenManager;
use oauth2::TokenUrl;
use std::sync::Arc;
use std::time::Duration;

use crate::common::{TOKEN_PATH, credentials, start_time, token_manager, token_mock};

mod common;

#[tokio::test]
async fn it_reuses_token_within_lifetime_and_refreshes_after() {
    let server = MockServer::start();
    let clock = ManualClock::new(start_time());
    let manager = token_manager(&server, credentials(), &clock);

    let mut first = token_mock(&server, "T1", 3600);

    assert_eq!(manager.get_valid_token().await.unwrap().secret(), "T1");

    clock.advance(Duration::from_secs(3000));
    assert_eq!(manager.get_valid_token().await.unwrap().secret(), "T1");
    first.assert_calls(1);
    first.delete();

    let second = token_mock(&server, "T2", 3600);
    clock.advance(Duration::from_secs(600));

    assert_eq!(manager.get_valid_token().await.unwrap().secret(), "T2");
    second.assert_calls(1);
}

#[tokio::test]
async fn it_reports_missing_client_secret_without_network_call() {
    let server = MockServer::start();
    let clock = ManualClock::new(start_time());
    let manager = token_manager(
        &server,
        Credentials::new(
            Some("client".to_owned()),
            None,
            Some("Atzr|refresh".to_owned()),
        ),
        &clock,
    );
    let mock = token_mock(&server, "T1", 3600);

    let error = manager.get_valid_token().await.unwrap_err();

    assert!(matches!(error, ProxyError::Configuration(ref missing) if missing.contains("client_secret")));
    mock.assert_calls(0);
}

#[tokio::test]
async fn it_keeps_cached_token_when_response_lacks_access_token() {
    let server = MockServer::start();
    let clock = ManualClock::new(start_time());
    let manager = token_manager(&server, credentials(), &clock);

    let mut first = token_mock(&server, "T1", 3600);
    manager.get_valid_token().await.unwrap();
    let before = manager.cached().await.unwrap();
    first.delete();

    let empty = server.mock(|when, then| {
        when.method(POST).path(TOKEN_PATH);
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"token_type":"bearer","expires_in":3600}"#);
    });
    clock.advance(Duration::from_secs(3600));

    let error = manager.get_valid_token().await.unwrap_err();

    assert!(matches!(error, ProxyError::UpstreamAuth { .. }));
    empty.assert_calls(1);

    let after = manager.cached().await.unwrap();
    assert_eq!(after.value.secret(), before.value.secret());
    assert_eq!(after.expires_at, before.expires_at);
}

#[tokio::test]
async fn it_refreshes_once_for_concurrent_callers() {
    let server = MockServer::start();
    let clock = ManualClock::new(start_time());
    let manager = token_manager(&server, credentials(), &clock);
    let mock = token_mock(&server, "T1", 3600);

    let tokens = join_all((0..10).map(|_| manager.get_valid_token())).await;

    mock.assert_calls(1);
    for token in tokens {
        assert_eq!(token.unwrap().secret(), "T1");
    }
}

#[tokio::test]
async fn it_relays_token_endpoint_rejection() {
    let server = MockServer::start();
    let clock = ManualClock::new(start_time());
    let manager = token_manager(&server, credentials(), &clock);
    server.mock(|when, then| {
        when.method(POST).path(TOKEN_PATH);
        then.status(400)
            .header("content-type", "application/json")
            .body(r#"{"error":"invalid_grant","error_description":"The request has an invalid grant parameter"}"#);
    });

    let error = manager.get_valid_token().await.unwrap_err();

    assert_eq!(
        error,
        ProxyError::UpstreamAuth {
            status: Some(400),
            message: "The request has an invalid grant parameter".to_owned(),
        }
    );
    assert!(manager.cached().await.is_none());
}

#[tokio::test]
async fn it_delivers_refreshed_token_after_first_caller_gives_up() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path(TOKEN_PATH);
        then.status(200)
            .header("content-type", "application/json")
            .delay(Duration::from_millis(300))
            .body(r#"{"access_token":"T1","token_type":"bearer","expires_in":3600}"#);
    });
    let oauth_client = OAuthClient::new(
        TokenUrl::new(server.url(TOKEN_PATH)).unwrap(),
        Duration::from_secs(1),
    )
    .unwrap();
    let clock = ManualClock::new(start_time());
    let manager = TokenManager::with_clock(
        Arc::new(RefreshTokenRetriever::new(oauth_client, credentials())),
        Arc::new(clock.clone()),
    );

    let abandoned =
        tokio::time::timeout(Duration::from_millis(100), manager.get_valid_token()).await;
    assert!(abandoned.is_err());

    tokio::time::sleep(Duration::from_millis(1500)).await;

    let token = manager.get_valid_token().await.unwrap();
    assert_eq!(token.secret(), "T1");
    mock.assert_calls(1);
}
