//! Guest device tokens and source-address hashing.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;
use sha2::{Digest, Sha256};

/// Cookie carrying the guest device token.
pub const GUEST_COOKIE_NAME: &str = "cd_anon_id";

/// Guest cookie lifetime (one year).
pub const GUEST_COOKIE_MAX_AGE_SECS: i64 = 365 * 24 * 60 * 60;

const DEVICE_TOKEN_BYTES: usize = 18;
const MAX_DEVICE_TOKEN_LEN: usize = 128;

/// Generates a random URL-safe device token.
pub fn mint_device_token() -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..DEVICE_TOKEN_BYTES).map(|_| rng.random::<u8>()).collect();
    URL_SAFE_NO_PAD.encode(&bytes)
}

/// Accepts tokens we could have minted: non-empty, bounded, URL-safe.
pub fn is_valid_device_token(token: &str) -> bool {
    !token.is_empty()
        && token.len() <= MAX_DEVICE_TOKEN_LEN
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Best-effort client address: first `x-forwarded-for` entry, else
/// `x-real-ip`.
pub fn client_address(forwarded_for: Option<&str>, real_ip: Option<&str>) -> Option<String> {
    forwarded_for
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .or_else(|| real_ip.map(str::trim).filter(|value| !value.is_empty()))
        .map(str::to_string)
}

/// Salted one-way hash of client addresses.
#[derive(Clone)]
pub struct AddressHasher {
    salt: String,
}

impl std::fmt::Debug for AddressHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressHasher").finish_non_exhaustive()
    }
}

impl AddressHasher {
    pub fn new(salt: impl Into<String>) -> Self {
        Self { salt: salt.into() }
    }

    /// SHA-256 of `salt:address`, URL-safe base64 encoded.
    pub fn hash(&self, address: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.salt.as_bytes());
        hasher.update(b":");
        hasher.update(address.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minted_tokens_are_valid_and_distinct() {
        let a = mint_device_token();
        let b = mint_device_token();
        assert_eq!(a.len(), 24);
        assert!(is_valid_device_token(&a));
        assert_ne!(a, b);
    }

    #[test]
    fn test_rejects_malformed_tokens() {
        assert!(!is_valid_device_token(""));
        assert!(!is_valid_device_token("has space"));
        assert!(!is_valid_device_token("semi;colon"));
        assert!(!is_valid_device_token(&"a".repeat(129)));
        assert!(is_valid_device_token("0f9c2a1e-legacy_token"));
    }

    #[test]
    fn test_client_address_prefers_forwarded_for() {
        assert_eq!(
            client_address(Some("203.0.113.7, 10.0.0.1"), Some("10.0.0.2")).as_deref(),
            Some("203.0.113.7")
        );
        assert_eq!(
            client_address(None, Some(" 10.0.0.2 ")).as_deref(),
            Some("10.0.0.2")
        );
        assert_eq!(
            client_address(Some(""), Some("10.0.0.2")).as_deref(),
            Some("10.0.0.2")
        );
        assert_eq!(client_address(None, None), None);
    }

    #[test]
    fn test_address_hash_is_salted_and_stable() {
        let hasher = AddressHasher::new("pepper");
        let hash = hasher.hash("203.0.113.7");
        assert_eq!(hash, hasher.hash("203.0.113.7"));
        assert_ne!(hash, AddressHasher::new("salt").hash("203.0.113.7"));
        assert!(!hash.contains("203.0.113.7"));
        assert_eq!(hash.len(), 43);
    }
}
