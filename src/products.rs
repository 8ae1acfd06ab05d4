use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProxyError;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Price {
    pub amount: f64,
    pub currency: String,
    pub formatted: String,
}

impl Price {
    pub fn new(amount: f64, currency: &str) -> Price {
        Price {
            amount,
            currency: currency.to_owned(),
            formatted: format!("{} {}", currency, amount),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub asin: String,
    pub title: String,
    pub image: Option<String>,
    pub price: Option<Price>,
    pub url: Option<String>,
    pub has_add_to_cart: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RefinementValue {
    pub search_refinement_value: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Refinement {
    pub selection_type: String,
    pub display_value: String,
    pub refinement_values: Vec<RefinementValue>,
}

/// Normalized page of products. Upstream refinements are relayed as raw JSON,
/// the mock catalog uses [`Refinement`].
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse<R> {
    pub total_results: Option<u64>,
    pub number_of_pages: Option<u64>,
    pub current_page: u32,
    pub page_size: u32,
    pub search_refinements: Vec<R>,
    pub products: Vec<ProductSummary>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawSearchResult {
    matching_product_count: Option<u64>,
    number_of_pages: Option<u64>,
    search_refinements: Option<Vec<Value>>,
    products: Option<Vec<RawProduct>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawProduct {
    asin: Option<String>,
    title: Option<String>,
    url: Option<String>,
    included_data_types: Option<IncludedDataTypes>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
struct IncludedDataTypes {
    images: Option<Vec<RawImage>>,
    offers: Option<Vec<RawOffer>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct RawImage {
    large: Option<ImageLink>,
    medium: Option<ImageLink>,
    small: Option<ImageLink>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct ImageLink {
    url: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct RawOffer {
    price: Option<RawPrice>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct RawPrice {
    value: Option<Money>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
struct Money {
    amount: Option<f64>,
    currency_code: Option<String>,
}

impl RawProduct {
    fn first_image_url(&self) -> Option<String> {
        let image = self
            .included_data_types
            .as_ref()?
            .images
            .as_ref()?
            .first()?;

        [&image.large, &image.medium, &image.small]
            .into_iter()
            .flatten()
            .filter_map(|link| link.url.clone())
            .find(|url| !url.is_empty())
    }

    fn first_offer_price(&self) -> Option<Price> {
        let money = self
            .included_data_types
            .as_ref()?
            .offers
            .as_ref()?
            .first()?
            .price
            .as_ref()?
            .value
            .as_ref()?;

        Some(Price::new(money.amount?, money.currency_code.as_deref()?))
    }

    fn into_summary(self) -> ProductSummary {
        let image = self.first_image_url();
        let price = self.first_offer_price();

        ProductSummary {
            asin: self.asin.unwrap_or_default(),
            title: self.title.unwrap_or_default(),
            image,
            price,
            url: self.url,
            has_add_to_cart: true,
        }
    }
}

fn has_refinement_values(refinement: &Value) -> bool {
    refinement
        .get("refinementValues")
        .and_then(Value::as_array)
        .is_some_and(|values| !values.is_empty())
}

/// Reshapes a raw product search result into the normalized page.
///
/// Refinements without values are dropped. Products keep the first image and
/// the first offer's price.
pub fn summarize_search(
    raw: Value,
    current_page: u32,
    page_size: u32,
) -> Result<SearchResponse<Value>, ProxyError> {
    let raw: RawSearchResult = serde_json::from_value(raw).map_err(|e| ProxyError::UpstreamApi {
        status: 502,
        message: format!("Unexpected search response shape: {e}"),
        request_id: None,
    })?;

    let search_refinements = raw
        .search_refinements
        .unwrap_or_default()
        .into_iter()
        .filter(has_refinement_values)
        .collect::<Vec<_>>();

    let products = raw
        .products
        .unwrap_or_default()
        .into_iter()
        .map(RawProduct::into_summary)
        .collect::<Vec<_>>();

    Ok(SearchResponse {
        total_results: raw.matching_product_count,
        number_of_pages: raw.number_of_pages,
        current_page,
        page_size,
        search_refinements,
        products,
    })
}
