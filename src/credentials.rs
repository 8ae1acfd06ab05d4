use oauth2::{ClientId, ClientSecret, RefreshToken};

use crate::error::ProxyError;

/// OAuth credentials as configured at start-up. Any of them may be missing;
/// that only becomes an error once a refresh is attempted.
#[derive(Clone, Debug, Default)]
pub struct Credentials {
    client_id: Option<ClientId>,
    client_secret: Option<ClientSecret>,
    refresh_token: Option<RefreshToken>,
}

/// Borrowed view of a complete credential set.
pub struct ValidCredentials<'a> {
    pub client_id: &'a ClientId,
    pub client_secret: &'a ClientSecret,
    pub refresh_token: &'a RefreshToken,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Credentials {
    pub fn new(
        client_id: Option<String>,
        client_secret: Option<String>,
        refresh_token: Option<String>,
    ) -> Credentials {
        Credentials {
            client_id: non_empty(client_id).map(ClientId::new),
            client_secret: non_empty(client_secret).map(ClientSecret::new),
            refresh_token: non_empty(refresh_token).map(RefreshToken::new),
        }
    }

    pub fn validate(&self) -> Result<ValidCredentials<'_>, ProxyError> {
        let mut missing = vec![];

        if self.client_id.is_none() {
            missing.push("client_id");
        }
        if self.client_secret.is_none() {
            missing.push("client_secret");
        }
        if self.refresh_token.is_none() {
            missing.push("refresh_token");
        }

        match (&self.client_id, &self.client_secret, &self.refresh_token) {
            (Some(client_id), Some(client_secret), Some(refresh_token)) => Ok(ValidCredentials {
                client_id,
                client_secret,
                refresh_token,
            }),
            _ => Err(ProxyError::Configuration(format!(
                "Token refresh failed: missing required OAuth credentials: {}",
                missing.join(", ")
            ))),
        }
    }
}
