//! Inbound HTTP surface.

pub mod identity;
pub mod middleware;
pub mod orders;
pub mod products;

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::api_client::{ACCESS_TOKEN_HEADER, ApiClient, USER_EMAIL_HEADER};
use crate::error::ProxyError;

pub use identity::{ConfiguredIdentity, UserIdentity};

pub const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:4200", "http://127.0.0.1:4200"];

#[derive(Clone)]
pub struct AppState {
    pub api: Arc<ApiClient>,
    pub identity: ConfiguredIdentity,
}

impl AppState {
    pub fn new(api: ApiClient, identity: ConfiguredIdentity) -> AppState {
        AppState {
            api: Arc::new(api),
            identity,
        }
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    message: &'static str,
    timestamp: String,
}

async fn health() -> Json<Health> {
    log::debug!("Health check endpoint called");

    Json(Health {
        status: "OK",
        message: "Product Search API Server is running",
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    })
}

async fn not_found(method: Method, uri: Uri) -> Response {
    log::info!("404 - Route not found: {} {}", method, uri);
    ProxyError::NotFound("Route not found".to_owned()).into_response()
}

/// Allows the configured browser origins with credentials.
/// Origins that are not valid header values are skipped.
pub fn cors_layer<S: AsRef<str>>(origins: &[S]) -> CorsLayer {
    let origins = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.as_ref()) {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("Ignoring invalid CORS origin: {}", origin.as_ref());
                None
            }
        })
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static(ACCESS_TOKEN_HEADER),
            HeaderName::from_static(USER_EMAIL_HEADER),
        ])
}

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/health", get(health))
        .route("/api/products/search", get(products::search))
        .route("/api/products/supplier1", get(products::supplier1_page))
        .route("/api/products/{asin}", get(products::details))
        .route("/api/products/{asin}/offers", get(products::offers))
        .route("/api/supplier1", get(products::supplier1_listing))
        .route("/api/orders", post(orders::place))
        .fallback(not_found)
        .layer(axum::middleware::from_fn(middleware::access_log));

    middleware::with_security_headers(routes).with_state(state)
}

pub fn app<S: AsRef<str>>(state: AppState, cors_origins: &[S]) -> Router {
    router(state).layer(cors_layer(cors_origins))
}
