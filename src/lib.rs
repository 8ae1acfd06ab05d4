#![deny(warnings)]

use anyhow::{Context, Result};
use oauth2::TokenUrl;
use std::sync::Arc;
use url::Url;

use crate::api_client::{ApiClient, ApiConfig};
use crate::args::Arguments;
use crate::credentials::Credentials;
use crate::oauth_client::OAuthClient;
use crate::retrievers::refresh_token_retriever::RefreshTokenRetriever;
use crate::routes::{AppState, ConfiguredIdentity};
use crate::token_manager::TokenManager;

pub mod api_client;
pub mod args;
pub mod catalog;
pub mod clock;
mod config_file;
pub mod credentials;
pub mod error;
pub mod oauth_client;
pub mod products;
pub mod retrievers;
pub mod routes;
pub mod token_info;
pub mod token_manager;

/// Wires the token manager and API client from the parsed arguments.
pub fn build_state(args: &Arguments) -> Result<AppState> {
    let token_url = TokenUrl::new(args.token_url.clone())
        .with_context(|| format!("Invalid token url `{}`", args.token_url))?;
    let base_url = Url::parse(&args.api_base_url)
        .with_context(|| format!("Invalid API base url `{}`", args.api_base_url))?;

    let oauth_client = OAuthClient::new(token_url, args.token_timeout())?;
    let credentials = Credentials::new(
        args.client_id.clone(),
        args.client_secret.clone(),
        args.refresh_token.clone(),
    );

    if let Err(e) = credentials.validate() {
        log::warn!("{}. Upstream calls will fail until it is configured", e);
    }

    let retriever = RefreshTokenRetriever::new(oauth_client, credentials);
    let token_manager =
        TokenManager::new(Arc::new(retriever)).with_refresh_margin(args.token_refresh_margin());

    let api = ApiClient::new(
        ApiConfig {
            base_url,
            api_version: args.api_version.clone(),
            ordering_api_version: args.ordering_api_version.clone(),
            timeout: args.api_timeout(),
        },
        token_manager,
    )?;

    Ok(AppState::new(
        api,
        ConfiguredIdentity {
            access_token: args.access_token.clone(),
            user_email: args.user_email.clone(),
        },
    ))
}

pub async fn serve(args: Arguments) -> Result<()> {
    let state = build_state(&args)?;
    let app = routes::app(state, &args.cors_origins);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port))
        .await
        .with_context(|| format!("Failed to bind port {}", args.port))?;

    log::info!("Product Search API Server is running on port {}", args.port);
    log::info!("Health check available at: http://localhost:{}/health", args.port);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
