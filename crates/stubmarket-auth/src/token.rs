//! Local access-token decoding and expiry checks.
//!
//! The client never holds the signing key, so tokens are decoded without
//! signature verification. The result is only used to decide whether a token
//! is worth sending; the server remains the authority.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::error::{AuthError, Result};

/// Claims the client reads from an access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    /// Expiration timestamp (seconds since the Unix epoch).
    pub exp: i64,
    /// Issued-at timestamp.
    pub iat: Option<i64>,
    /// Numeric user ID.
    pub id: Option<i64>,
    /// Username of the token holder.
    pub username: Option<String>,
    /// Role of the token holder.
    pub role: Option<String>,
}

impl TokenClaims {
    /// When the token expires, if the timestamp is representable.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Whether the token is still usable at `now`, given the early-expiry buffer.
    ///
    /// A token is fresh only if it expires strictly after `now + buffer`.
    #[must_use]
    pub fn is_fresh_at(&self, now: DateTime<Utc>, buffer: Duration) -> bool {
        let buffer_secs = i64::try_from(buffer.as_secs()).unwrap_or(i64::MAX);
        self.exp > now.timestamp().saturating_add(buffer_secs)
    }
}

/// Raw payload before the `exp` claim is checked for presence.
#[derive(Debug, Deserialize)]
struct RawClaims {
    #[serde(default)]
    exp: Option<i64>,
    #[serde(default)]
    iat: Option<i64>,
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

/// Decode the claims of a token without verifying its signature.
///
/// # Errors
///
/// Returns `MissingClaim` if the token has no `exp` claim, and `InvalidToken`
/// if it is not a well-formed JWT.
pub fn decode_claims(token: &str) -> Result<TokenClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    // Expiry is judged by the caller with a buffer
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let raw = decode::<RawClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?
        .claims;

    let exp = raw
        .exp
        .ok_or_else(|| AuthError::MissingClaim("exp".to_string()))?;

    Ok(TokenClaims {
        exp,
        iat: raw.iat,
        id: raw.id,
        username: raw.username,
        role: raw.role,
    })
}

/// When `token` expires, if it carries a readable `exp` claim.
#[must_use]
pub fn expires_at(token: &str) -> Option<DateTime<Utc>> {
    decode_claims(token).ok()?.expires_at()
}

/// Check whether a token can be sent as-is.
///
/// Malformed tokens, tokens without `exp`, and tokens expiring within
/// `buffer` of `now` are all reported as not fresh.
#[must_use]
pub fn is_fresh(token: &str, now: DateTime<Utc>, buffer: Duration) -> bool {
    match decode_claims(token) {
        Ok(claims) => claims.is_fresh_at(now, buffer),
        Err(e) => {
            tracing::debug!(error = %e, "Stored access token is unreadable");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct Claims {
        exp: i64,
        username: &'static str,
    }

    #[derive(Serialize)]
    struct NoExp {
        username: &'static str,
    }

    const BUFFER: Duration = Duration::from_secs(300);

    fn token_expiring_at(exp: i64) -> String {
        encode(
            &Header::default(),
            &Claims {
                exp,
                username: "collector",
            },
            &EncodingKey::from_secret(b"server-secret"),
        )
        .unwrap()
    }

    #[test]
    fn decodes_without_the_signing_key() {
        let now = Utc::now();
        let token = token_expiring_at(now.timestamp() + 3600);

        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.exp, now.timestamp() + 3600);
        assert_eq!(claims.username.as_deref(), Some("collector"));
        assert!(claims.role.is_none());
    }

    #[test]
    fn token_within_buffer_is_not_fresh() {
        let now = Utc::now();
        let token = token_expiring_at(now.timestamp() + 60);
        assert!(!is_fresh(&token, now, BUFFER));
    }

    #[test]
    fn token_exactly_at_buffer_is_not_fresh() {
        let now = Utc::now();
        let token = token_expiring_at(now.timestamp() + 300);
        assert!(!is_fresh(&token, now, BUFFER));
    }

    #[test]
    fn token_beyond_buffer_is_fresh() {
        let now = Utc::now();
        let token = token_expiring_at(now.timestamp() + 301);
        assert!(is_fresh(&token, now, BUFFER));
    }

    #[test]
    fn expired_token_is_not_fresh() {
        let now = Utc::now();
        let token = token_expiring_at(now.timestamp() - 10);
        assert!(!is_fresh(&token, now, BUFFER));
    }

    #[test]
    fn missing_exp_is_reported() {
        let token = encode(
            &Header::default(),
            &NoExp {
                username: "collector",
            },
            &EncodingKey::from_secret(b"k"),
        )
        .unwrap();

        assert!(matches!(
            decode_claims(&token),
            Err(AuthError::MissingClaim(claim)) if claim == "exp"
        ));
        assert!(!is_fresh(&token, Utc::now(), BUFFER));
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(
            decode_claims("not-a-jwt"),
            Err(AuthError::InvalidToken(_))
        ));
        assert!(!is_fresh("not-a-jwt", Utc::now(), BUFFER));
    }

    #[test]
    fn expires_at_converts_timestamp() {
        let claims = TokenClaims {
            exp: 1_700_000_000,
            iat: None,
            id: None,
            username: None,
            role: None,
        };
        assert_eq!(claims.expires_at().unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn expires_at_reads_token() {
        let token = token_expiring_at(1_900_000_000);
        assert_eq!(expires_at(&token).unwrap().timestamp(), 1_900_000_000);
        assert!(expires_at("not-a-jwt").is_none());
    }
}
