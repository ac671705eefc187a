//! Marketplace listing and seller endpoints.

use stubmarket_core::{ListingId, SellerId};

use super::{data, to_json};
use crate::error::Result;
use crate::gateway::ApiClient;
use crate::request::Request;
use crate::types::{Listing, ListingUpdate, NewListing, SellerListings, SellerProfile};

const LIST: &str = "/api/marketplace/list";
const LISTINGS: &str = "/api/marketplace/listings";
const MY_LISTINGS: &str = "/api/marketplace/my-listings";
const SELLERS: &str = "/api/marketplace/sellers";

/// Put a stub up for sale.
///
/// # Errors
///
/// Returns `Http { status: 400 }` if the stub is already listed or the
/// currency is unsupported, and `Http { status: 404 }` if the stub is not
/// the caller's.
pub async fn create_listing(api: &ApiClient, listing: &NewListing) -> Result<Listing> {
    data(api, api.post(Request::new(LIST).json(to_json(api, listing)?)).await?)
}

/// Listings in the given status (the server defaults to `active`).
///
/// # Errors
///
/// Returns an [`ApiError`](crate::ApiError) if the request fails.
pub async fn listings(api: &ApiClient, status: Option<&str>) -> Result<Vec<Listing>> {
    let mut request = Request::new(LISTINGS);
    if let Some(status) = status {
        request = request.query("status", status);
    }
    data(api, api.get(request).await?)
}

/// A single listing.
///
/// # Errors
///
/// Returns `Http { status: 404 }` if the listing does not exist.
pub async fn listing(api: &ApiClient, id: ListingId) -> Result<Listing> {
    data(api, api.get(Request::new(LISTINGS).slug(id.to_string())).await?)
}

/// The caller's own listings in every status.
///
/// # Errors
///
/// Returns an [`ApiError`](crate::ApiError) if the request fails.
pub async fn my_listings(api: &ApiClient) -> Result<Vec<Listing>> {
    data(api, api.get(Request::new(MY_LISTINGS)).await?)
}

/// Change an active listing.
///
/// # Errors
///
/// Returns `Http { status: 400 }` if the listing is no longer active.
pub async fn update_listing(api: &ApiClient, id: ListingId, changes: &ListingUpdate) -> Result<Listing> {
    let request = Request::new(LISTINGS)
        .slug(id.to_string())
        .json(to_json(api, changes)?);
    data(api, api.put(request).await?)
}

/// Cancel a listing. Returns the listing in its cancelled state.
///
/// # Errors
///
/// Returns `Http { status: 400 }` if the listing is no longer active.
pub async fn delete_listing(api: &ApiClient, id: ListingId) -> Result<Listing> {
    data(api, api.delete(Request::new(LISTINGS).slug(id.to_string())).await?)
}

/// A seller's public profile.
///
/// # Errors
///
/// Returns `Http { status: 404 }` if the seller does not exist.
pub async fn seller(api: &ApiClient, id: SellerId) -> Result<SellerProfile> {
    data(api, api.get(Request::new(SELLERS).slug(id.to_string())).await?)
}

/// One page of a seller's active listings.
///
/// The server caps `per_page` at 50.
///
/// # Errors
///
/// Returns `Http { status: 404 }` if the seller does not exist.
pub async fn seller_listings(
    api: &ApiClient,
    id: SellerId,
    page: u32,
    per_page: u32,
) -> Result<SellerListings> {
    let request = Request::new(SELLERS)
        .slug(format!("{id}/listings"))
        .query("page", page)
        .query("per_page", per_page);
    data(api, api.get(request).await?)
}
