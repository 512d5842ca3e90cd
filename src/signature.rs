// Payload signing
//
// Deliveries carry an HMAC-SHA256 signature over the exact JSON bytes of
// the request body, hex-encoded with a "sha256=" prefix. Subscriptions
// without a secret deliver unsigned payloads; that is accepted, not an
// error.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the payload signature
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// Sign a request body with the subscription secret.
/// Returns a header value of the form "sha256=<hex hmac>".
pub fn sign(body: &[u8], secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

/// Verify a signature header against a request body and secret.
pub fn verify(body: &[u8], secret: &str, signature_header: &str) -> bool {
    let expected_hex = match signature_header.strip_prefix("sha256=") {
        Some(h) => h,
        None => return false,
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(body);
    let computed_hex = hex::encode(mac.finalize().into_bytes());

    computed_hex == expected_hex
}
