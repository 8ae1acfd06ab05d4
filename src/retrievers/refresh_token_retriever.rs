use async_trait::async_trait;

use crate::credentials::Credentials;
use crate::error::ProxyError;
use crate::oauth_client::OAuthClient;
use crate::token_info::TokenInfo;

use super::token_retriever::TokenRetriever;

/// Obtains access tokens through the OAuth 2.0 refresh token grant.
/// More: <https://www.rfc-editor.org/rfc/rfc6749#section-6>
pub struct RefreshTokenRetriever {
    oauth_client: OAuthClient,
    credentials: Credentials,
}

impl RefreshTokenRetriever {
    pub fn new(oauth_client: OAuthClient, credentials: Credentials) -> RefreshTokenRetriever {
        RefreshTokenRetriever {
            oauth_client,
            credentials,
        }
    }
}

#[async_trait]
impl TokenRetriever for RefreshTokenRetriever {
    async fn retrieve(&self) -> Result<TokenInfo, ProxyError> {
        self.oauth_client.refresh_token(&self.credentials).await
    }
}
