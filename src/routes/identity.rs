use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;

use crate::api_client::{ACCESS_TOKEN_HEADER, USER_EMAIL_HEADER};
use crate::error::ProxyError;

use super::AppState;

/// Identity values configured for the whole process. When set they win over
/// whatever the caller sends.
#[derive(Clone, Debug, Default)]
pub struct ConfiguredIdentity {
    pub access_token: Option<String>,
    pub user_email: Option<String>,
}

/// Caller identity required by every upstream-backed route.
#[derive(Clone, Debug, PartialEq)]
pub struct UserIdentity {
    pub access_token: String,
    pub user_email: String,
}

impl UserIdentity {
    pub fn resolve(
        configured: &ConfiguredIdentity,
        headers: &HeaderMap,
    ) -> Result<UserIdentity, ProxyError> {
        let access_token = non_blank(configured.access_token.as_deref())
            .or_else(|| header(headers, ACCESS_TOKEN_HEADER));
        let user_email = non_blank(configured.user_email.as_deref())
            .or_else(|| header(headers, USER_EMAIL_HEADER));

        log::debug!(
            "Validating credentials - access token present: {}, user email present: {}",
            access_token.is_some(),
            user_email.is_some()
        );

        match (access_token, user_email) {
            (Some(access_token), Some(user_email)) => Ok(UserIdentity {
                access_token,
                user_email,
            }),
            _ => Err(ProxyError::MissingCredentials),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    non_blank(headers.get(name).and_then(|v| v.to_str().ok()))
}

impl FromRequestParts<AppState> for UserIdentity {
    type Rejection = ProxyError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        UserIdentity::resolve(&state.identity, &parts.headers)
    }
}
