//! Webhook signature verification.
//!
//! Paystack signs every webhook delivery with HMAC-SHA512 over the exact raw
//! request body, keyed by the account's secret key, and sends the hex digest
//! in the `x-paystack-signature` header. This is the sole authentication for
//! the webhook endpoint, so verification runs before any body parsing.

use hmac::{Hmac, Mac};
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// Verifies `signature` (lowercase hex) against the HMAC-SHA512 of `payload`
/// keyed by `secret`. Pure function: no parsing, no side effects.
pub fn verify(payload: &[u8], signature: &str, secret: &str) -> bool {
    let Ok(mut mac) = HmacSha512::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);
    let expected = hex::encode(mac.finalize().into_bytes());
    constant_time_eq(&expected, signature)
}

/// Computes the signature a gateway would attach to `payload` (test support
/// and outbound webhook signing).
pub fn sign(payload: &[u8], secret: &str) -> String {
    let mut mac = HmacSha512::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        res |= x ^ y;
    }
    res == 0
}
