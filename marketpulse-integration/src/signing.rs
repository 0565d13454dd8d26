use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 `data` with `key`, base64-encoding the raw digest.
///
/// Used by both KuCoin (`KC-API-SIGN`, `KC-API-PASSPHRASE`) and OKX (`sign` in the login/subscribe
/// payload) request signers - mirrors `common/src/crypto_utils.cpp`'s `hmac256Encode` followed by
/// `base64Encode`.
pub fn hmac_sha256_base64(key: &str, data: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC accepts any key length");
    mac.update(data.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Current epoch milliseconds, as required by KuCoin's `KC-API-TIMESTAMP` header and OKX's login
/// `timestamp` field.
pub fn epoch_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Whole epoch seconds, as a string, matching `std::time(nullptr)` - used by OKX's login
/// `timestamp` field (`YYYY-MM-DDTHH:mm:ss.sssZ` is NOT used).
pub fn epoch_seconds() -> String {
    chrono::Utc::now().timestamp().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hmac_sha256_base64_is_deterministic() {
        let a = hmac_sha256_base64("secret", "payload");
        let b = hmac_sha256_base64("secret", "payload");
        assert_eq!(a, b);
    }

    #[test]
    fn test_hmac_sha256_base64_differs_by_key() {
        let a = hmac_sha256_base64("secret-a", "payload");
        let b = hmac_sha256_base64("secret-b", "payload");
        assert_ne!(a, b);
    }

    #[test]
    fn test_known_vector() {
        // RFC 4231 test case 1, base64 re-encoded.
        let key = "\x0b".repeat(20);
        let sig = hmac_sha256_base64(&key, "Hi There");
        assert_eq!(sig, "h9ruiJu+xOM4tJjzaztBmrNl9Mj5e7yMh5tMvRnVkTQ=");
    }
}
