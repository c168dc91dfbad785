//! Webhook request authenticity.
//!
//! Messenger signs every delivery with `X-Hub-Signature: sha1=<hex>`, an
//! HMAC-SHA1 of the raw request body keyed with the app secret. The check
//! runs once per delivery, before the body is parsed.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha1::Sha1;
use tracing::warn;

use crate::error::SignatureError;

type HmacSha1 = Hmac<Sha1>;

/// Header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature";

/// Outcome of a successful check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// Signature present and matching.
    Verified,
    /// No signature header. Accepted, but logged.
    Unsigned,
}

/// Verifies delivery signatures against the shared app secret.
pub struct SignatureVerifier {
    app_secret: SecretString,
}

impl SignatureVerifier {
    pub fn new(app_secret: SecretString) -> Self {
        Self { app_secret }
    }

    /// Check `header` (the raw `X-Hub-Signature` value) against `body`.
    pub fn verify(&self, header: Option<&str>, body: &[u8]) -> Result<Verification, SignatureError> {
        let Some(header) = header else {
            warn!("Couldn't validate the signature: no X-Hub-Signature header");
            return Ok(Verification::Unsigned);
        };

        let (algorithm, digest) = header.trim().split_once('=').ok_or(SignatureError::Mismatch)?;
        if !algorithm.eq_ignore_ascii_case("sha1") {
            return Err(SignatureError::UnsupportedAlgorithm(algorithm.to_string()));
        }

        let expected = hex::decode(digest).map_err(|_| SignatureError::Mismatch)?;
        let mut mac = self.mac()?;
        mac.update(body);
        mac.verify_slice(&expected)
            .map_err(|_| SignatureError::Mismatch)?;

        Ok(Verification::Verified)
    }

    /// Produce the header value the platform would send for `body`.
    pub fn sign(&self, body: &[u8]) -> Result<String, SignatureError> {
        let mut mac = self.mac()?;
        mac.update(body);
        Ok(format!("sha1={}", hex::encode(mac.finalize().into_bytes())))
    }

    fn mac(&self) -> Result<HmacSha1, SignatureError> {
        HmacSha1::new_from_slice(self.app_secret.expose_secret().as_bytes())
            .map_err(|e| SignatureError::InvalidKey(e.to_string()))
    }
}
