//! API key authentication for the order endpoint.
//!
//! The presented `api_key` header value is hashed with SHA-256 and looked up
//! against the active rows of the api_keys table; the stored hash is then
//! compared in constant time. Every failure path collapses into the same
//! opaque `Unauthorized` so callers cannot distinguish a missing key from a
//! mismatch.

use axum::http::HeaderMap;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::api::errors::ApiError;
use crate::store::ApiKeyStore;

pub const API_KEY_HEADER: &str = "api_key";

/// Hex SHA-256 of a plaintext key; the storage form used by the seed tool
/// and the lookup.
pub fn hash_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

pub async fn authenticate(
    store: &(dyn ApiKeyStore + Send + Sync),
    headers: &HeaderMap,
) -> Result<(), ApiError> {
    let presented = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or(ApiError::Unauthorized)?;

    let digest = Sha256::digest(presented.as_bytes());

    let record = store
        .find_by_hash(&hex::encode(digest))
        .await
        .map_err(|err| {
            debug!(error = %err, "api key lookup failed");
            ApiError::Unauthorized
        })?
        .ok_or(ApiError::Unauthorized)?;

    // The lookup already matched on the hash, but the stored row could be
    // stale or corrupt; compare what we computed against it without leaking
    // timing.
    let stored = hex::decode(&record.key_hash).map_err(|_| ApiError::Unauthorized)?;
    if bool::from(digest.as_slice().ct_eq(stored.as_slice())) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MemoryApiKeyStore;
    use axum::http::HeaderValue;

    #[test]
    fn hash_key_is_hex_sha256() {
        let hash = hash_key("apitest");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        // Stable across calls.
        assert_eq!(hash, hash_key("apitest"));
    }

    fn headers_with_key(key: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_str(key).unwrap());
        headers
    }

    #[tokio::test]
    async fn accepts_a_seeded_key() {
        let store = MemoryApiKeyStore::with_keys(&["apitest"]);
        assert!(authenticate(&store, &headers_with_key("apitest"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn rejects_an_unknown_key() {
        let store = MemoryApiKeyStore::with_keys(&["apitest"]);
        let result = authenticate(&store, &headers_with_key("wrong")).await;
        assert!(matches!(result, Err(ApiError::Unauthorized)));
    }

    #[tokio::test]
    async fn rejects_a_missing_header() {
        let store = MemoryApiKeyStore::with_keys(&["apitest"]);
        let result = authenticate(&store, &HeaderMap::new()).await;
        assert!(matches!(result, Err(ApiError::Unauthorized)));
    }

    #[tokio::test]
    async fn rejects_an_empty_header() {
        let store = MemoryApiKeyStore::with_keys(&["apitest"]);
        let result = authenticate(&store, &headers_with_key("")).await;
        assert!(matches!(result, Err(ApiError::Unauthorized)));
    }
}
