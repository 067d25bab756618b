//! HMAC-SHA256 webhook signatures.
//!
//! ## Security
//!
//! - The MAC is computed over the exact bytes received, never over a
//!   re-serialized parse of them.
//! - Digest comparison is constant-time in the digest contents.
//! - Malformed input is rejected, never panicked on: a garbage header is
//!   indistinguishable from someone probing the endpoint.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use nime_core::constants::SIGNATURE_PREFIX;

use crate::secret::WebhookSecret;

type HmacSha256 = Hmac<Sha256>;

/// Size of an HMAC-SHA256 digest in bytes.
pub const MAC_SIZE: usize = 32;

/// Why a signature was rejected. For logs only; callers see one outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignatureError {
    /// The secret is empty.
    EmptySecret,
    /// The header is not valid hex of the right length.
    Malformed,
    /// The digest does not match the body.
    Mismatch,
}

impl std::fmt::Display for SignatureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignatureError::EmptySecret => write!(f, "webhook secret is empty"),
            SignatureError::Malformed => write!(f, "signature header is malformed"),
            SignatureError::Mismatch => write!(f, "signature does not match body"),
        }
    }
}

impl std::error::Error for SignatureError {}

/// Computes HMAC-SHA256(secret, body).
pub fn compute_mac(secret: &WebhookSecret, body: &[u8]) -> [u8; MAC_SIZE] {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
    mac.update(body);
    mac.finalize().into_bytes().into()
}

/// Produces the `sha256=<hex>` header value for `body`.
pub fn sign(secret: &WebhookSecret, body: &[u8]) -> String {
    format!("{}{}", SIGNATURE_PREFIX, hex::encode(compute_mac(secret, body)))
}

/// Checks `header` against `body`, reporting why it was rejected.
pub fn check_signature(
    secret: &WebhookSecret,
    header: &str,
    body: &[u8],
) -> Result<(), SignatureError> {
    if secret.is_empty() {
        return Err(SignatureError::EmptySecret);
    }

    let header = header.trim();
    let signature_hex = header.strip_prefix(SIGNATURE_PREFIX).unwrap_or(header);

    let mut provided = [0u8; MAC_SIZE];
    hex::decode_to_slice(signature_hex, &mut provided).map_err(|_| SignatureError::Malformed)?;

    let expected = compute_mac(secret, body);
    if bool::from(expected.ct_eq(&provided)) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Returns true iff `header` is the HMAC-SHA256 of `body` under `secret`.
///
/// Never fails: any decoding problem is just `false`.
pub fn verify_signature(secret: &WebhookSecret, header: &str, body: &[u8]) -> bool {
    check_signature(secret, header, body).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    const DOCS_SECRET: &str = "It's a Secret to Everybody";
    const DOCS_BODY: &[u8] = b"Hello, World!";
    const DOCS_SIGNATURE: &str =
        "757107ea0eb2509fc211221cce984b8a37570b6d7586c22c46f4379c8b043e17";

    fn secret() -> WebhookSecret {
        WebhookSecret::new(DOCS_SECRET)
    }

    #[test]
    fn test_known_answer() {
        assert_eq!(hex::encode(compute_mac(&secret(), DOCS_BODY)), DOCS_SIGNATURE);
        assert_eq!(sign(&secret(), DOCS_BODY), format!("sha256={}", DOCS_SIGNATURE));
    }

    #[test_case(&format!("sha256={}", DOCS_SIGNATURE) ; "prefixed")]
    #[test_case(DOCS_SIGNATURE ; "bare hex")]
    #[test_case(&DOCS_SIGNATURE.to_uppercase() ; "uppercase hex")]
    #[test_case(&format!("  sha256={}\n", DOCS_SIGNATURE) ; "surrounding whitespace")]
    fn test_accepts(header: &str) {
        assert!(verify_signature(&secret(), header, DOCS_BODY));
    }

    #[test_case("", SignatureError::Malformed ; "empty")]
    #[test_case("sha256=", SignatureError::Malformed ; "prefix only")]
    #[test_case("sha256=zz", SignatureError::Malformed ; "not hex")]
    #[test_case("sha256=abc", SignatureError::Malformed ; "odd length")]
    #[test_case("sha256=00ff", SignatureError::Malformed ; "too short")]
    #[test_case(&"0".repeat(64), SignatureError::Mismatch ; "wrong digest")]
    #[test_case(&format!("sha1={}", DOCS_SIGNATURE), SignatureError::Malformed ; "other algorithm")]
    fn test_rejects(header: &str, reason: SignatureError) {
        assert_eq!(check_signature(&secret(), header, DOCS_BODY), Err(reason));
        assert!(!verify_signature(&secret(), header, DOCS_BODY));
    }

    #[test]
    fn test_empty_secret_rejected() {
        let empty = WebhookSecret::new("");
        let header = sign(&empty, DOCS_BODY);
        assert_eq!(
            check_signature(&empty, &header, DOCS_BODY),
            Err(SignatureError::EmptySecret)
        );
    }

    #[test]
    fn test_reserialized_body_rejected() {
        let raw = br#"{"action":"published",  "release":{"tag_name":"v1"}}"#;
        let header = sign(&secret(), raw);
        let reparsed = serde_json::to_vec(&serde_json::from_slice::<serde_json::Value>(raw).unwrap()).unwrap();
        assert!(verify_signature(&secret(), &header, raw));
        assert!(!verify_signature(&secret(), &header, &reparsed));
    }

    proptest! {
        #[test]
        fn prop_sign_then_verify(key in proptest::collection::vec(any::<u8>(), 1..64),
                                 body in proptest::collection::vec(any::<u8>(), 0..256)) {
            let secret = WebhookSecret::new(key);
            let header = sign(&secret, &body);
            prop_assert!(verify_signature(&secret, &header, &body));
        }

        #[test]
        fn prop_body_bit_flip_rejected(body in proptest::collection::vec(any::<u8>(), 1..256),
                                       idx in any::<proptest::sample::Index>(),
                                       bit in 0u8..8) {
            let header = sign(&secret(), &body);
            let mut tampered = body.clone();
            let i = idx.index(tampered.len());
            tampered[i] ^= 1 << bit;
            prop_assert!(!verify_signature(&secret(), &header, &tampered));
        }

        #[test]
        fn prop_signature_bit_flip_rejected(body in proptest::collection::vec(any::<u8>(), 0..256),
                                            idx in 0usize..MAC_SIZE,
                                            bit in 0u8..8) {
            let mut mac = compute_mac(&secret(), &body);
            mac[idx] ^= 1 << bit;
            let header = format!("sha256={}", hex::encode(mac));
            prop_assert!(!verify_signature(&secret(), &header, &body));
        }

        #[test]
        fn prop_secret_bit_flip_rejected(key in proptest::collection::vec(any::<u8>(), 1..64),
                                         idx in any::<proptest::sample::Index>(),
                                         bit in 0u8..8,
                                         body in proptest::collection::vec(any::<u8>(), 0..128)) {
            let header = sign(&WebhookSecret::new(key.clone()), &body);
            let mut flipped = key;
            let i = idx.index(flipped.len());
            flipped[i] ^= 1 << bit;
            prop_assert!(!verify_signature(&WebhookSecret::new(flipped), &header, &body));
        }
    }
}
