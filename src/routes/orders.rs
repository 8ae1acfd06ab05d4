use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::Deserialize;
use serde_json::Value;

use crate::api_client::OrderRequest;
use crate::error::ProxyError;

use super::AppState;
use super::identity::UserIdentity;
use super::products::DEFAULT_PRODUCT_REGION;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    asin: String,
    offer_id: String,
    quantity: Option<u32>,
    product_region: Option<String>,
    external_id: Option<String>,
}

impl PlaceOrder {
    fn into_request(self) -> Result<OrderRequest, ProxyError> {
        if self.asin.trim().is_empty() {
            return Err(ProxyError::InvalidRequest("asin must not be empty".to_owned()));
        }
        if self.offer_id.trim().is_empty() {
            return Err(ProxyError::InvalidRequest(
                "offerId must not be empty".to_owned(),
            ));
        }

        let quantity = self.quantity.unwrap_or(1);
        if quantity == 0 {
            return Err(ProxyError::InvalidRequest(
                "quantity must be at least 1".to_owned(),
            ));
        }

        Ok(OrderRequest {
            asin: self.asin,
            offer_id: self.offer_id,
            quantity,
            product_region: self
                .product_region
                .unwrap_or_else(|| DEFAULT_PRODUCT_REGION.to_owned()),
            external_id: self.external_id,
        })
    }
}

pub async fn place(
    State(state): State<AppState>,
    identity: UserIdentity,
    body: Result<Json<PlaceOrder>, JsonRejection>,
) -> Result<Json<Value>, ProxyError> {
    let Json(body) = body.map_err(|rejection| ProxyError::InvalidRequest(rejection.body_text()))?;
    let request = body.into_request()?;

    let order = state.api.place_order(&request, &identity.user_email).await?;
    log::info!("Order for ASIN {} accepted", request.asin);

    Ok(Json(order))
}
