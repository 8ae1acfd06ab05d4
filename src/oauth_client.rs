use oauth2::TokenUrl;
use reqwest::redirect::Policy;
use serde::Deserialize;
use std::time::Duration;

use crate::credentials::Credentials;
use crate::error::ProxyError;
use crate::token_info::{TokenEndpointResponse, TokenInfo};

pub const DEFAULT_TOKEN_URL: &str = "https://api.amazon.com/auth/O2/token";
pub const DEFAULT_TOKEN_TIMEOUT: Duration = Duration::from_secs(10);

/// RFC 6749 section 5.2 error body.
#[derive(Deserialize, Debug, Default)]
struct TokenErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
}

pub struct OAuthClient {
    http: reqwest::Client,
    token_url: TokenUrl,
}

impl OAuthClient {
    pub fn new(token_url: TokenUrl, timeout: Duration) -> Result<OAuthClient, ProxyError> {
        log::debug!("Creating OAuthClient for {}", token_url.url());

        let http = reqwest::Client::builder()
            .timeout(timeout)
            // Credentials are in the body; never replay them to another host.
            .redirect(Policy::none())
            .build()
            .map_err(|e| {
                ProxyError::Configuration(format!("Failed to create token HTTP client: {e}"))
            })?;

        Ok(OAuthClient { http, token_url })
    }

    pub fn token_url(&self) -> &TokenUrl {
        &self.token_url
    }

    /// Exchanges the configured refresh token for a new access token.
    ///
    /// Credentials are checked before any request is sent.
    pub async fn refresh_token(&self, credentials: &Credentials) -> Result<TokenInfo, ProxyError> {
        let credentials = credentials.validate()?;

        log::debug!("Refreshing token...");

        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.secret().as_str()),
            ("refresh_token", credentials.refresh_token.secret().as_str()),
        ];

        let response = self
            .http
            .post(self.token_url.url().clone())
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                log::error!("Token endpoint unreachable: {}", e);
                ProxyError::Network(format!("Token refresh failed: {e}"))
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            log::error!("Failed to read token endpoint response: {}", e);
            ProxyError::Network(format!("Token refresh failed: {e}"))
        })?;

        if !status.is_success() {
            let error_response =
                serde_json::from_slice::<TokenErrorResponse>(&body).unwrap_or_default();
            let message = error_response
                .error_description
                .or(error_response.error)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("token endpoint error")
                        .to_owned()
                });

            log::error!("Token endpoint returned {}: {}", status, message);

            return Err(ProxyError::UpstreamAuth {
                status: Some(status.as_u16()),
                message,
            });
        }

        let token_response =
            serde_json::from_slice::<TokenEndpointResponse>(&body).map_err(|e| {
                ProxyError::UpstreamAuth {
                    status: Some(status.as_u16()),
                    message: format!("invalid token response: {e}"),
                }
            })?;

        if let Some(token_type) = &token_response.token_type
            && !token_type.eq_ignore_ascii_case("bearer")
        {
            log::warn!("Token endpoint returned unexpected token_type `{}`", token_type);
        }

        let token_info = TokenInfo::from_endpoint_response(token_response).ok_or_else(|| {
            ProxyError::UpstreamAuth {
                status: Some(status.as_u16()),
                message: "No access token received from refresh request".to_owned(),
            }
        })?;

        log::debug!("Refresh done");
        match token_info.expires_in {
            Some(expires_in) => log::info!("Token expires in {} seconds", expires_in.as_secs()),
            None => log::info!("Token endpoint did not report a lifetime"),
        }

        Ok(token_info)
    }
}
