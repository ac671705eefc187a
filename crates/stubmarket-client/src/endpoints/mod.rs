//! One function per REST endpoint of the stubmarket API.
//!
//! These are thin wrappers over [`ApiClient`](crate::ApiClient): they build
//! the [`Request`](crate::Request), send it, and decode the payload.

pub mod auth;
pub mod marketplace;
pub mod pii;
pub mod purchases;
pub mod stubs;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::gateway::ApiClient;
use crate::types::Envelope;

/// Decode a bare JSON payload. A malformed payload is reported like any
/// other failed request.
fn decode<T: DeserializeOwned>(api: &ApiClient, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| api.fail(e.into()))
}

/// Decode the `data` field of a `{status, message, data}` envelope.
fn data<T: DeserializeOwned>(api: &ApiClient, value: Value) -> Result<T> {
    decode::<Envelope<T>>(api, value).map(|envelope| envelope.data)
}

fn to_json<T: Serialize>(api: &ApiClient, payload: &T) -> Result<Value> {
    serde_json::to_value(payload).map_err(|e| api.fail(e.into()))
}
