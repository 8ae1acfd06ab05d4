use oauth2::AccessToken;
use serde::Deserialize;
use std::time::{Duration, SystemTime};

/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

/// Raw token endpoint payload. Every field is optional so a missing
/// `access_token` can be reported as an upstream auth failure rather than
/// a parse error.
#[derive(Deserialize, Debug, Default)]
pub struct TokenEndpointResponse {
    pub access_token: Option<String>,

    pub expires_in: Option<u64>,

    pub token_type: Option<String>,

    pub scope: Option<String>,
}

#[derive(Clone, Debug)]
pub struct TokenInfo {
    pub access_token: AccessToken,

    pub expires_in: Option<Duration>,

    pub scope: Option<String>,
}

impl TokenInfo {
    /// Returns `None` when the response carries no usable access token.
    pub fn from_endpoint_response(response: TokenEndpointResponse) -> Option<TokenInfo> {
        let access_token = response.access_token.filter(|token| !token.is_empty())?;

        Some(TokenInfo {
            access_token: AccessToken::new(access_token),
            expires_in: response.expires_in.map(Duration::from_secs),
            scope: response.scope,
        })
    }
}

/// The token owned by the token manager together with the instant it stops
/// being handed out.
#[derive(Clone, Debug)]
pub struct CachedToken {
    pub value: AccessToken,

    pub expires_at: SystemTime,
}

impl CachedToken {
    /// `expires_at = issued_at + lifetime - margin`.
    pub fn issue(token_info: TokenInfo, issued_at: SystemTime, margin: Duration) -> CachedToken {
        let lifetime = token_info.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME);
        let expires_at = issued_at
            .checked_add(lifetime)
            .unwrap_or(issued_at + DEFAULT_TOKEN_LIFETIME)
            .checked_sub(margin)
            .unwrap_or(issued_at);

        CachedToken {
            value: token_info.access_token,
            expires_at,
        }
    }

    pub fn is_fresh_at(&self, now: SystemTime) -> bool {
        now < self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use std::time::UNIX_EPOCH;

    use super::*;

    fn token_info(expires_in: Option<u64>) -> TokenInfo {
        TokenInfo {
            access_token: AccessToken::new("T1".to_owned()),
            expires_in: expires_in.map(Duration::from_secs),
            scope: None,
        }
    }

    #[test]
    fn it_subtracts_the_margin_from_the_lifetime() {
        let issued_at = UNIX_EPOCH + Duration::from_secs(10_000);

        let token = CachedToken::issue(token_info(Some(3600)), issued_at, Duration::from_secs(60));

        assert_eq!(token.expires_at, issued_at + Duration::from_secs(3540));
        assert_eq!(token.value.secret(), "T1");
    }

    #[test]
    fn it_uses_default_lifetime_when_expires_in_is_missing() {
        let issued_at = UNIX_EPOCH + Duration::from_secs(10_000);

        let token = CachedToken::issue(token_info(None), issued_at, Duration::from_secs(60));

        assert_eq!(
            token.expires_at,
            issued_at + DEFAULT_TOKEN_LIFETIME - Duration::from_secs(60)
        );
    }

    #[test]
    fn it_is_stale_immediately_when_lifetime_is_shorter_than_margin() {
        let issued_at = UNIX_EPOCH + Duration::from_secs(10_000);

        let token = CachedToken::issue(token_info(Some(30)), issued_at, Duration::from_secs(60));

        assert!(!token.is_fresh_at(issued_at));
    }

    #[test]
    fn it_is_stale_exactly_at_expiry() {
        let issued_at = UNIX_EPOCH + Duration::from_secs(10_000);
        let token = CachedToken::issue(token_info(Some(120)), issued_at, Duration::from_secs(60));

        assert!(token.is_fresh_at(issued_at + Duration::from_secs(59)));
        assert!(!token.is_fresh_at(issued_at + Duration::from_secs(60)));
    }

    #[test]
    fn it_rejects_response_without_access_token() {
        assert!(TokenInfo::from_endpoint_response(TokenEndpointResponse::default()).is_none());
        assert!(
            TokenInfo::from_endpoint_response(TokenEndpointResponse {
                access_token: Some(String::new()),
                ..Default::default()
            })
            .is_none()
        );
    }

    #[test]
    fn it_parses_endpoint_response() {
        let response: TokenEndpointResponse = serde_json::from_str(
            r#"{"access_token":"Atza|abc","expires_in":3600,"token_type":"bearer"}"#,
        )
        .unwrap();

        let token_info = TokenInfo::from_endpoint_response(response).unwrap();

        assert_eq!(token_info.access_token.secret(), "Atza|abc");
        assert_eq!(token_info.expires_in, Some(Duration::from_secs(3600)));
    }
}
