use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::Value;

use crate::api_client::{DetailsRequest, Facet, OffersRequest, SearchRequest};
use crate::catalog;
use crate::error::ProxyError;
use crate::products::{Refinement, SearchResponse, summarize_search};

use super::AppState;
use super::identity::UserIdentity;

pub const DEFAULT_PRODUCT_REGION: &str = "US";
pub const DEFAULT_LOCALE: &str = "en_US";
pub const DEFAULT_PAGE_SIZE: u32 = 24;

const FACETS: [Facet; 2] = [Facet::Images, Facet::Offers];

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    keywords: Option<String>,
    product_region: Option<String>,
    locale: Option<String>,
    page_number: Option<u32>,
    page_size: Option<u32>,
    search_refinements: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegionParams {
    product_region: Option<String>,
    locale: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    product_region: Option<String>,
    locale: Option<String>,
    page_number: Option<u32>,
    page_size: Option<u32>,
}

fn query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ProxyError> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| ProxyError::InvalidRequest(rejection.body_text()))
}

fn region(value: Option<String>) -> String {
    value.unwrap_or_else(|| DEFAULT_PRODUCT_REGION.to_owned())
}

fn locale(value: Option<String>) -> String {
    value.unwrap_or_else(|| DEFAULT_LOCALE.to_owned())
}

pub async fn search(
    State(state): State<AppState>,
    identity: UserIdentity,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchResponse<Value>>, ProxyError> {
    let params = query(params)?;

    let request = SearchRequest {
        keywords: params.keywords.unwrap_or_default(),
        product_region: region(params.product_region),
        locale: locale(params.locale),
        page_number: params.page_number.unwrap_or(0),
        page_size: params.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        facets: FACETS.to_vec(),
        search_refinements: params
            .search_refinements
            .filter(|refinements| !refinements.trim().is_empty()),
    };

    log::info!(
        "Searching for products with keywords: \"{}\"",
        request.keywords
    );
    if let Some(refinements) = &request.search_refinements {
        log::debug!("Including searchRefinements in API call: {}", refinements);
    }

    let raw = state.api.search(&request, &identity.user_email).await?;
    let page = summarize_search(raw, request.page_number, request.page_size)?;

    log::info!(
        "Search completed. Found {:?} products, returning {}",
        page.total_results,
        page.products.len()
    );

    Ok(Json(page))
}

pub async fn details(
    State(state): State<AppState>,
    identity: UserIdentity,
    Path(asin): Path<String>,
    params: Result<Query<RegionParams>, QueryRejection>,
) -> Result<Json<Value>, ProxyError> {
    let params = query(params)?;
    log::info!("Product details request for ASIN: {}", asin);

    let request = DetailsRequest {
        asin,
        product_region: region(params.product_region),
        locale: locale(params.locale),
        facets: FACETS.to_vec(),
    };

    let details = state.api.get_details(&request, &identity.user_email).await?;
    Ok(Json(details))
}

pub async fn offers(
    State(state): State<AppState>,
    identity: UserIdentity,
    Path(asin): Path<String>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<Value>, ProxyError> {
    let params = query(params)?;
    log::info!("Offers request for ASIN: {}", asin);

    let request = OffersRequest {
        asin,
        product_region: region(params.product_region),
        locale: locale(params.locale),
        page_number: params.page_number.unwrap_or(0),
        page_size: params.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
    };

    let offers = state.api.get_offers(&request, &identity.user_email).await?;
    Ok(Json(offers))
}

/// Paginated view of the mock supplier catalog. Needs no credentials.
pub async fn supplier1_page(
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<SearchResponse<Refinement>>, ProxyError> {
    let params = query(params)?;
    let page_number = params.page_number.unwrap_or(0);
    let page_size = params.page_size.unwrap_or(DEFAULT_PAGE_SIZE);

    let page = catalog::page(page_number, page_size)?;

    log::info!(
        "Returning {} products for supplier1 (page {} of {:?})",
        page.products.len(),
        page_number.saturating_add(1),
        page.number_of_pages
    );

    Ok(Json(page))
}

pub async fn supplier1_listing() -> Json<SearchResponse<Refinement>> {
    log::info!("Supplier1 listing request received");
    Json(catalog::listing())
}
