//! Payload models of the stubmarket REST API.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use stubmarket_core::{ListingId, PurchaseId, SellerId, StubId};

/// The `{status, message, data}` envelope most endpoints answer with.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    /// `"success"` or `"error"`.
    #[serde(default)]
    pub status: Option<String>,
    /// Human-readable outcome.
    #[serde(default)]
    pub message: Option<String>,
    /// The payload.
    pub data: T,
}

/// Whether a stub is on the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingState {
    /// Not listed.
    Unlisted,
    /// Has an active listing.
    Listed,
    /// Sold through a listing.
    Sold,
    /// A state this client does not know.
    #[serde(other)]
    Unknown,
}

/// A scanned ticket stub.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stub {
    /// Stub ID.
    pub id: StubId,
    /// Title given by the owner.
    pub title: Option<String>,
    /// Server-side path of the uploaded image.
    #[serde(default)]
    pub image_path: Option<String>,
    /// Public URL of the image.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Name of the event.
    #[serde(default)]
    pub event_name: Option<String>,
    /// Date of the event (ISO 8601).
    #[serde(default)]
    pub event_date: Option<String>,
    /// Venue of the event.
    #[serde(default)]
    pub venue_name: Option<String>,
    /// Face value of the ticket.
    #[serde(default)]
    pub ticket_price: Option<f64>,
    /// Currency of the face value.
    #[serde(default)]
    pub currency: Option<String>,
    /// Section, row, and seat.
    #[serde(default)]
    pub seat_info: Option<String>,
    /// Processing status (`processed`, `manual`).
    #[serde(default)]
    pub status: Option<String>,
    /// Marketplace state.
    #[serde(default = "Stub::default_listing_status")]
    pub listing_status: ListingState,
    /// Active listing, if any.
    #[serde(default)]
    pub listing_id: Option<ListingId>,
    /// Creation time (UTC).
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    /// Last update time (UTC).
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

impl Stub {
    const fn default_listing_status() -> ListingState {
        ListingState::Unlisted
    }
}

/// Manual corrections to a stub. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StubUpdate {
    /// New title. Must not be empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New event name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    /// New event date (`YYYY-MM-DD`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_date: Option<String>,
    /// New venue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue_name: Option<String>,
    /// New face value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_price: Option<f64>,
    /// New currency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// New seat information.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat_info: Option<String>,
}

/// A marketplace listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    /// Listing ID.
    pub id: ListingId,
    /// Listed stub.
    pub stub_id: StubId,
    /// Seller.
    pub seller_id: SellerId,
    /// Asking price.
    pub asking_price: f64,
    /// Currency of the asking price.
    pub currency: String,
    /// Seller's description.
    #[serde(default)]
    pub description: Option<String>,
    /// `active`, `sold`, or `cancelled`.
    pub status: String,
    /// When the listing was created.
    #[serde(default)]
    pub listed_at: Option<NaiveDateTime>,
    /// Last update time.
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
    /// When the listing sold.
    #[serde(default)]
    pub sold_at: Option<NaiveDateTime>,
    /// The listed stub.
    #[serde(default)]
    pub stub: Option<Stub>,
}

/// Payload for putting a stub on the marketplace.
#[derive(Debug, Clone, Serialize)]
pub struct NewListing {
    /// Stub to list.
    pub stub_id: StubId,
    /// Asking price.
    pub asking_price: f64,
    /// Currency code (e.g., "USD").
    pub currency: String,
    /// Seller's description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Changes to a listing. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListingUpdate {
    /// New asking price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asking_price: Option<f64>,
    /// New currency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Public seller statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerStats {
    /// All listings ever created.
    pub total_listings: u64,
    /// Listings currently active.
    pub active_listings: u64,
    /// Listings sold.
    pub completed_sales: u64,
}

/// A seller's public profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerProfile {
    /// Seller ID.
    pub id: SellerId,
    /// Public username.
    pub username: String,
    /// Registration time.
    #[serde(default)]
    pub member_since: Option<NaiveDateTime>,
    /// Listing statistics.
    pub stats: SellerStats,
}

/// Page information for paginated listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    /// Current page (1-based).
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total matching items.
    pub total: u64,
    /// Total pages.
    pub pages: u32,
    /// Whether a next page exists.
    pub has_next: bool,
    /// Whether a previous page exists.
    pub has_prev: bool,
}

/// One page of a seller's listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerListings {
    /// The seller.
    pub seller: SellerProfile,
    /// Listings on this page.
    pub listings: Vec<Listing>,
    /// Page information.
    pub pagination: Pagination,
}

/// Purchase lifecycle states a seller may set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    /// The stub was handed over.
    Completed,
    /// The buyer was refunded.
    Refunded,
    /// The buyer disputed the purchase.
    Disputed,
}

/// A purchase of a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    /// Purchase ID.
    pub id: PurchaseId,
    /// Purchased listing.
    pub listing_id: ListingId,
    /// Buyer's user ID.
    pub buyer_id: i64,
    /// Idempotency key the purchase was created with.
    #[serde(default)]
    pub idempotency_key: Option<String>,
    /// Payment processor status.
    #[serde(default)]
    pub payment_status: Option<String>,
    /// Payment processor charge.
    #[serde(default)]
    pub charge_id: Option<String>,
    /// Checkout session status.
    #[serde(default)]
    pub checkout_status: Option<String>,
    /// Checkout session URL.
    #[serde(default)]
    pub checkout_url: Option<String>,
    /// Price paid.
    pub purchase_price: f64,
    /// Currency of the price.
    pub currency: String,
    /// Lifecycle status (`pending`, `completed`, ...).
    pub status: String,
    /// When the purchase was created.
    #[serde(default)]
    pub purchased_at: Option<NaiveDateTime>,
    /// Last update time.
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
    /// When payment completed.
    #[serde(default)]
    pub payment_completed_at: Option<NaiveDateTime>,
    /// The purchased listing.
    #[serde(default)]
    pub listing: Option<Listing>,
}

/// A newly created purchase and its payment secret.
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseCreated {
    /// The purchase.
    pub purchase: Purchase,
    /// Client secret of the payment intent.
    #[serde(default)]
    pub client_secret: Option<String>,
}

/// Answer of the session status check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStatus {
    /// Whether the server recognizes the session.
    pub is_authenticated: bool,
    /// Username, when authenticated.
    #[serde(default)]
    pub username: Option<String>,
    /// User ID, when authenticated.
    #[serde(default)]
    pub user_id: Option<i64>,
}
