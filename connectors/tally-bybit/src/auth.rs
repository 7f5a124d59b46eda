use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// API key pair used for private endpoints.
#[derive(Clone)]
pub struct BybitCredentials {
    pub api_key: String,
    pub api_secret: String,
}

impl fmt::Debug for BybitCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BybitCredentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Produces `X-BAPI-SIGN` values.
///
/// The signed payload is `timestamp + api_key + recv_window + query_string`.
#[derive(Clone, Debug)]
pub struct Signer {
    credentials: BybitCredentials,
}

impl Signer {
    pub fn new(credentials: BybitCredentials) -> Self {
        Self { credentials }
    }

    pub fn api_key(&self) -> &str {
        &self.credentials.api_key
    }

    /// Hex-encoded HMAC-SHA256 over the request's signing payload.
    pub fn sign(&self, timestamp_ms: i64, recv_window_ms: u64, query: &str) -> String {
        let payload = format!(
            "{timestamp_ms}{}{recv_window_ms}{query}",
            self.credentials.api_key
        );
        // HMAC accepts keys of any length.
        let mut mac = HmacSha256::new_from_slice(self.credentials.api_secret.as_bytes())
            .unwrap_or_else(|_| unreachable!("hmac key length is unrestricted"));
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}
