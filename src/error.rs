use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Errors raised anywhere between token refresh and the inbound response.
///
/// A single refresh result is cloned to every caller waiting on it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProxyError {
    /// Missing or unusable configuration, such as an absent OAuth credential
    /// or a malformed base url. Never retried.
    #[error("{0}")]
    Configuration(String),

    /// The token endpoint rejected the refresh or returned no usable token.
    #[error("Token refresh failed: {message}")]
    UpstreamAuth {
        status: Option<u16>,
        message: String,
    },

    /// The product API answered with a non-success status.
    #[error("{message}")]
    UpstreamApi {
        status: u16,
        message: String,
        request_id: Option<String>,
    },

    /// No response was received (timeout, DNS, connection reset).
    #[error("{0}")]
    Network(String),

    #[error(
        "Missing required credentials: X_AMZ_ACCESS_TOKEN and X_AMZ_USER_EMAIL must be set in environment variables or provided as headers"
    )]
    MissingCredentials,

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    NotFound(String),
}

impl ProxyError {
    /// HTTP status relayed to the inbound caller.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::UpstreamApi { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            ProxyError::MissingCredentials | ProxyError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ProxyError::NotFound(_) => StatusCode::NOT_FOUND,
            ProxyError::Configuration(_)
            | ProxyError::UpstreamAuth { .. }
            | ProxyError::Network(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn request_id(&self) -> Option<&str> {
        match self {
            ProxyError::UpstreamApi { request_id, .. } => request_id.as_deref(),
            _ => None,
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorBody {
                message: self.to_string(),
                status: self.status().as_u16(),
                request_id: self.request_id().map(str::to_owned),
            },
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub message: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            log::error!("Request failed with {}: {}", status, self);
        } else {
            log::warn!("Request rejected with {}: {}", status, self);
        }

        (status, Json(self.envelope())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn it_keeps_upstream_status_and_request_id() {
        let error = ProxyError::UpstreamApi {
            status: 429,
            message: "Rate exceeded".to_owned(),
            request_id: Some("req-123".to_owned()),
        };

        let body = serde_json::to_value(error.envelope()).unwrap();

        assert_eq!(
            body,
            json!({
                "error": {
                    "message": "Rate exceeded",
                    "status": 429,
                    "requestId": "req-123"
                }
            })
        );
    }

    #[test]
    fn it_omits_request_id_when_absent() {
        let body = serde_json::to_value(ProxyError::Network("timeout".to_owned()).envelope())
            .unwrap();

        assert_eq!(
            body,
            json!({
                "error": {
                    "message": "timeout",
                    "status": 500
                }
            })
        );
    }

    #[test]
    fn it_maps_token_failures_to_internal_server_error() {
        let error = ProxyError::UpstreamAuth {
            status: Some(401),
            message: "invalid_grant".to_owned(),
        };

        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            ProxyError::Configuration("client_secret".to_owned()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn it_maps_request_problems_to_client_errors() {
        assert_eq!(
            ProxyError::MissingCredentials.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ProxyError::InvalidRequest("bad".to_owned()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ProxyError::NotFound("Route not found".to_owned()).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn it_falls_back_to_500_for_out_of_range_upstream_status() {
        let error = ProxyError::UpstreamApi {
            status: 42,
            message: "odd".to_owned(),
            request_id: None,
        };

        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
