//! Address lookup endpoints.

use serde_json::Value;

use crate::cancel::Cancelable;
use crate::error::Result;
use crate::gateway::ApiClient;
use crate::request::Request;

/// Operation key of the address autocomplete lookup.
pub const AUTOCOMPLETE_KEY: &str = "pii.auto-complete";

/// Suggest addresses for partial input.
///
/// Each call supersedes the previous lookup, so only the answer for the
/// latest keystroke arrives; older ones resolve to
/// [`ApiError::Canceled`](crate::ApiError::Canceled).
#[must_use]
pub fn address_autocomplete(api: &ApiClient, input: &str) -> Cancelable {
    api.get_cancelable(
        AUTOCOMPLETE_KEY,
        Request::new("/pii/auto-complete").query("address", input),
    )
}

/// Validate a postal address.
///
/// # Errors
///
/// Returns `Http { status: 422 }` with the server message if the address is
/// not deliverable.
pub async fn validate_address(api: &ApiClient, address: Value) -> Result<Value> {
    api.post(Request::new("/pii/validate-address").json(address))
        .await
}
