use rand::Rng;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::{RequestBuilder, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;
use url::Url;

use crate::error::ProxyError;
use crate::token_manager::TokenManager;

pub const DEFAULT_API_BASE_URL: &str = "https://na.business-api.amazon.com";
pub const DEFAULT_API_VERSION: &str = "2020-08-26";
pub const DEFAULT_ORDERING_API_VERSION: &str = "2022-10-30";
pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(30);

pub const ACCESS_TOKEN_HEADER: &str = "x-amz-access-token";
pub const USER_EMAIL_HEADER: &str = "x-amz-user-email";
pub const REQUEST_ID_HEADER: &str = "x-amzn-requestid";
pub const RATE_LIMIT_HEADER: &str = "x-amzn-ratelimit-limit";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Optional data blocks the product API attaches to each product.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Facet {
    Images,
    Offers,
}

impl Facet {
    pub fn as_str(&self) -> &'static str {
        match self {
            Facet::Images => "IMAGES",
            Facet::Offers => "OFFERS",
        }
    }

    pub fn join(facets: &[Facet]) -> String {
        facets
            .iter()
            .map(Facet::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[derive(Clone, Debug)]
pub struct SearchRequest {
    pub keywords: String,
    pub product_region: String,
    pub locale: String,
    pub page_number: u32,
    pub page_size: u32,
    pub facets: Vec<Facet>,
    pub search_refinements: Option<String>,
}

#[derive(Clone, Debug)]
pub struct DetailsRequest {
    pub asin: String,
    pub product_region: String,
    pub locale: String,
    pub facets: Vec<Facet>,
}

#[derive(Clone, Debug)]
pub struct OffersRequest {
    pub asin: String,
    pub product_region: String,
    pub locale: String,
    pub page_number: u32,
    pub page_size: u32,
}

#[derive(Clone, Debug)]
pub struct OrderRequest {
    pub asin: String,
    pub offer_id: String,
    pub quantity: u32,
    pub product_region: String,
    /// Generated when absent.
    pub external_id: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: Url,
    pub api_version: String,
    pub ordering_api_version: String,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: Url::parse(DEFAULT_API_BASE_URL).expect("default base url is valid"),
            api_version: DEFAULT_API_VERSION.to_owned(),
            ordering_api_version: DEFAULT_ORDERING_API_VERSION.to_owned(),
            timeout: DEFAULT_API_TIMEOUT,
        }
    }
}

/// Formats and dispatches calls to the marketplace API with a token from
/// the [`TokenManager`].
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiConfig,
    token_manager: TokenManager,
}

impl ApiClient {
    pub fn new(config: ApiConfig, token_manager: TokenManager) -> Result<ApiClient, ProxyError> {
        if config.base_url.cannot_be_a_base() {
            return Err(ProxyError::Configuration(format!(
                "API base url `{}` cannot be used as a base",
                config.base_url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                ProxyError::Configuration(format!("Failed to create API HTTP client: {e}"))
            })?;

        Ok(ApiClient {
            http,
            config,
            token_manager,
        })
    }

    pub fn token_manager(&self) -> &TokenManager {
        &self.token_manager
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ProxyError> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProxyError::Configuration("API base url cannot be a base".to_owned()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Product calls declare a JSON content type even without a body.
    fn get(&self, url: Url) -> RequestBuilder {
        self.http.get(url).header(CONTENT_TYPE, "application/json")
    }

    pub async fn search(
        &self,
        request: &SearchRequest,
        user_email: &str,
    ) -> Result<Value, ProxyError> {
        let url = self.endpoint(&["products", self.config.api_version.as_str(), "products"])?;

        let mut params = vec![
            ("keywords", request.keywords.clone()),
            ("productRegion", request.product_region.clone()),
            ("locale", request.locale.clone()),
            ("pageNumber", request.page_number.to_string()),
            ("pageSize", request.page_size.to_string()),
            ("facets", Facet::join(&request.facets)),
        ];
        if let Some(refinements) = &request.search_refinements {
            params.push(("searchRefinements", refinements.clone()));
        }

        log::debug!("Search URL: {} params: {:?}", url, params);

        let builder = self.get(url).query(&params);
        self.send(builder, user_email, "search").await
    }

    pub async fn get_details(
        &self,
        request: &DetailsRequest,
        user_email: &str,
    ) -> Result<Value, ProxyError> {
        log::debug!("Getting product details for ASIN: {}", request.asin);

        let url = self.endpoint(&[
            "products",
            self.config.api_version.as_str(),
            "products",
            request.asin.as_str(),
        ])?;
        let params = [
            ("productRegion", request.product_region.clone()),
            ("locale", request.locale.clone()),
            ("facets", Facet::join(&request.facets)),
        ];

        let builder = self.get(url).query(&params);
        self.send(builder, user_email, "product details").await
    }

    pub async fn get_offers(
        &self,
        request: &OffersRequest,
        user_email: &str,
    ) -> Result<Value, ProxyError> {
        log::debug!("Getting offers for ASIN: {}", request.asin);

        let url = self.endpoint(&[
            "products",
            self.config.api_version.as_str(),
            "products",
            request.asin.as_str(),
            "offers",
        ])?;
        let params = [
            ("productRegion", request.product_region.clone()),
            ("locale", request.locale.clone()),
            ("pageNumber", request.page_number.to_string()),
            ("pageSize", request.page_size.to_string()),
        ];

        let builder = self.get(url).query(&params);
        self.send(builder, user_email, "offers").await
    }

    pub async fn place_order(
        &self,
        request: &OrderRequest,
        user_email: &str,
    ) -> Result<Value, ProxyError> {
        let url = self.endpoint(&["ordering", self.config.ordering_api_version.as_str(), "orders"])?;
        let external_id = request
            .external_id
            .clone()
            .unwrap_or_else(|| format!("order-{:016x}", rand::rng().random::<u64>()));

        log::info!(
            "Placing order {} for ASIN {} with offer {}",
            external_id,
            request.asin,
            request.offer_id
        );

        let body = json!({
            "externalId": external_id,
            "lineItems": [{
                "externalId": format!("{external_id}-1"),
                "quantity": request.quantity,
                "attributes": [
                    {
                        "attributeType": "SelectedProductReference",
                        "productReference": {
                            "productReferenceType": "ProductIdentifier",
                            "id": request.asin,
                        },
                    },
                    {
                        "attributeType": "SelectedBuyingOptionReference",
                        "buyingOptionReference": {
                            "buyingOptionReferenceType": "BuyingOptionIdentifier",
                            "id": request.offer_id,
                        },
                    },
                ],
                "expectations": [],
            }],
            "attributes": [{
                "attributeType": "Region",
                "region": request.product_region,
            }],
        });

        let builder = self.http.post(url).json(&body);
        self.send(builder, user_email, "order").await
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        user_email: &str,
        operation: &str,
    ) -> Result<Value, ProxyError> {
        let access_token = self.token_manager.get_valid_token().await?;

        let response = builder
            .header(ACCESS_TOKEN_HEADER, access_token.secret().as_str())
            .header(USER_EMAIL_HEADER, user_email)
            .send()
            .await
            .map_err(|e| {
                log::error!("Network error in {} call, no response received: {}", operation, e);
                ProxyError::Network(e.to_string())
            })?;

        let status = response.status();
        let request_id = header_value(response.headers(), REQUEST_ID_HEADER);
        let rate_limit = header_value(response.headers(), RATE_LIMIT_HEADER);
        let body = response.bytes().await.map_err(|e| {
            log::error!("Failed to read {} response body: {}", operation, e);
            ProxyError::Network(e.to_string())
        })?;

        if !status.is_success() {
            let error = upstream_error(status, &body, request_id);
            log::error!(
                "API error in {} call - status: {}, message: {}, request id: {:?}",
                operation,
                status,
                error,
                error.request_id()
            );
            return Err(error);
        }

        log::info!("{} response status: {}", operation, status);
        log::debug!("Request ID: {:?}, rate limit: {:?}", request_id, rate_limit);

        if body.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&body).map_err(|e| ProxyError::UpstreamApi {
            status: StatusCode::BAD_GATEWAY.as_u16(),
            message: format!("Invalid JSON in {operation} response: {e}"),
            request_id,
        })
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

/// Builds the error for a non-success response, preferring the message of the
/// first entry in the upstream `errors` array.
fn upstream_error(status: StatusCode, body: &[u8], request_id: Option<String>) -> ProxyError {
    let message = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|body| {
            body.pointer("/errors/0/message")
                .and_then(Value::as_str)
                .map(str::to_owned)
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("API Error").to_owned());

    ProxyError::UpstreamApi {
        status: status.as_u16(),
        message,
        request_id,
    }
}
