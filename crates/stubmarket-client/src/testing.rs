//! Shared fixtures for unit tests.

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;
use stubmarket_auth::{MockRefreshExchange, RefreshExchange};
use stubmarket_store::{Credentials, LocalStore, MemoryStorage};
use wiremock::MockServer;

use crate::notify::RecordingSink;
use crate::{ApiClient, ClientConfig};

#[derive(Serialize)]
struct Claims<'a> {
    exp: i64,
    username: &'a str,
}

/// Mint an access token expiring `secs` from now.
pub(crate) fn token_expiring_in(secs: i64) -> String {
    encode(
        &Header::default(),
        &Claims {
            exp: Utc::now().timestamp() + secs,
            username: "collector",
        },
        &EncodingKey::from_secret(b"server-secret"),
    )
    .unwrap()
}

/// A client against `server`, logged in with a fresh token.
pub(crate) fn logged_in_client(server: &MockServer) -> (ApiClient, Arc<RecordingSink>, String) {
    let token = token_expiring_in(3600);
    let store = LocalStore::new(Arc::new(MemoryStorage::new()));
    store
        .save_credentials(&Credentials::new(&token, "refresh-1"))
        .unwrap();

    let exchange: Arc<dyn RefreshExchange> = Arc::new(MockRefreshExchange::failing("unused"));
    let sink = Arc::new(RecordingSink::new());
    let client = ApiClient::builder(ClientConfig::new(server.uri()))
        .store(store)
        .refresh_exchange(exchange)
        .notifier(sink.clone())
        .build()
        .unwrap();

    (client, sink, token)
}
