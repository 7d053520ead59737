use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verifies the marketplace webhook signature header against the raw
/// request body. The header carries `v1=<hex hmac-sha256>`.
pub fn verify_signature(secret: &str, body: &[u8], header: &str) -> bool {
    let provided = header.strip_prefix("v1=").unwrap_or(header);

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    let expected = hex::encode(mac.finalize().into_bytes());

    expected == provided
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_correctly_signed_body() {
        let secret = "webhook-secret";
        let body = br#"{"eventType":"TripRequestSellerResponse"}"#;

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        let header = format!("v1={}", hex::encode(mac.finalize().into_bytes()));

        assert!(verify_signature(secret, body, &header));
    }

    #[test]
    fn rejects_a_tampered_body() {
        let secret = "webhook-secret";
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(b"original");
        let header = format!("v1={}", hex::encode(mac.finalize().into_bytes()));

        assert!(!verify_signature(secret, b"tampered", &header));
        assert!(!verify_signature(secret, b"original", "v1=deadbeef"));
    }
}
