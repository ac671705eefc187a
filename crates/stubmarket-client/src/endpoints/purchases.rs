//! Purchase endpoints. These answer with bare payloads, not envelopes.

use serde_json::json;
use stubmarket_core::{ListingId, PurchaseId};

use super::decode;
use crate::error::Result;
use crate::gateway::ApiClient;
use crate::request::Request;
use crate::types::{Purchase, PurchaseCreated, PurchaseStatus};

const PURCHASES: &str = "/api/purchases";

/// Buy a listing.
///
/// Repeating a call with the same `idempotency_key` returns the existing
/// purchase instead of creating a second one.
///
/// # Errors
///
/// Returns `Http { status: 400 }` if the listing is no longer available or
/// belongs to the caller.
pub async fn create(
    api: &ApiClient,
    listing_id: ListingId,
    idempotency_key: Option<&str>,
) -> Result<PurchaseCreated> {
    let mut body = json!({ "listing_id": listing_id });
    if let Some(key) = idempotency_key {
        body["idempotency_key"] = json!(key);
    }

    let value = api.post(Request::new(PURCHASES).json(body)).await?;

    // A replayed idempotency key answers with the bare purchase
    if value.get("purchase").is_some() {
        decode(api, value)
    } else {
        Ok(PurchaseCreated {
            purchase: decode(api, value)?,
            client_secret: None,
        })
    }
}

/// The caller's purchases.
///
/// # Errors
///
/// Returns an [`ApiError`](crate::ApiError) if the request fails.
pub async fn list(api: &ApiClient) -> Result<Vec<Purchase>> {
    decode(api, api.get(Request::new(PURCHASES)).await?)
}

/// A purchase the caller bought or sold.
///
/// # Errors
///
/// Returns `Http { status: 403 }` if the caller is neither buyer nor seller.
pub async fn get(api: &ApiClient, id: PurchaseId) -> Result<Purchase> {
    decode(api, api.get(Request::new(PURCHASES).slug(id.to_string())).await?)
}

/// Set the status of a sold purchase. Only the seller may do this.
///
/// # Errors
///
/// Returns `Http { status: 403 }` if the caller is not the seller.
pub async fn update_status(api: &ApiClient, id: PurchaseId, status: PurchaseStatus) -> Result<Purchase> {
    let request = Request::new(PURCHASES)
        .slug(format!("{id}/status"))
        .json(json!({ "status": status }));
    decode(api, api.patch(request).await?)
}
