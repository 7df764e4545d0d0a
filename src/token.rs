//! Signed access tokens over a compact three-segment wire format.
//!
//! A token is `base64url(header) "." base64url(payload) "." base64url(sig)`
//! (RFC 4648 URL-safe alphabet, no padding). The signature is HMAC-SHA256
//! over the ASCII `header.payload` signing input, keyed with a per-process
//! secret, so any mutation of header or payload invalidates the token.
//!
//! Verification collapses every failure, structural or cryptographic, into
//! the single `TokenError::Invalid` outcome. Callers must not be able to
//! tell a truncated token from a forged one.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha256 = Hmac<Sha256>;

/// Fixed JOSE header. Presented tokens must carry exactly this header.
const HEADER: &[u8] = br#"{"alg":"HS256","typ":"JWT"}"#;

/// Largest encodable payload. The length field is 16-bit and `0xFFFF` is
/// the decode-failure sentinel, so the last usable value is 65534.
pub const MAX_PAYLOAD: usize = 0xFFFF - 1;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    /// Payload exceeds the 16-bit length bound; resubmit something smaller.
    #[error("payload exceeds the token length bound ({0} bytes)")]
    PayloadTooLarge(usize),
    /// Uniform outcome for any presented token that fails verification.
    #[error("invalid token")]
    Invalid,
}

/// 256-bit token signing key.
///
/// Generated once per process from the system entropy source, or injected
/// fixed via `from_bytes` for deterministic tests. Never persisted; tokens
/// signed before a restart do not verify after it. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    pub fn generate() -> anyhow::Result<Self> {
        let mut buf = [0u8; 32];
        getrandom::getrandom(&mut buf).map_err(|e| anyhow::anyhow!(e.to_string()))?;
        Ok(Self(buf))
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

/// Encodes and verifies signed tokens with an injected secret key.
pub struct TokenCodec {
    key: SecretKey,
}

impl TokenCodec {
    pub fn new(key: SecretKey) -> Self {
        Self { key }
    }

    /// Issue a signed token carrying `payload`.
    ///
    /// The only failure is a payload past the 16-bit bound; callers that
    /// pre-validate length never see an error here.
    pub fn encode(&self, payload: &[u8]) -> Result<String, TokenError> {
        if payload.len() > MAX_PAYLOAD {
            return Err(TokenError::PayloadTooLarge(payload.len()));
        }
        let head = URL_SAFE_NO_PAD.encode(HEADER);
        let body = URL_SAFE_NO_PAD.encode(payload);
        let mut token = String::with_capacity(head.len() + body.len() + 45);
        token.push_str(&head);
        token.push('.');
        token.push_str(&body);
        let sig = self.sign(token.as_bytes());
        token.push('.');
        token.push_str(&URL_SAFE_NO_PAD.encode(sig));
        Ok(token)
    }

    /// Verify a presented token and return its payload bytes.
    ///
    /// Requires exactly three segments, the fixed header, a non-empty
    /// signature, and an HMAC match under constant-time comparison. Every
    /// failure is `TokenError::Invalid`.
    pub fn decode(&self, token: &str) -> Result<Vec<u8>, TokenError> {
        let mut parts = token.split('.');
        let (Some(head), Some(body), Some(sig), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Invalid);
        };
        if sig.is_empty() {
            return Err(TokenError::Invalid);
        }
        let header = URL_SAFE_NO_PAD.decode(head).map_err(|_| TokenError::Invalid)?;
        if header != HEADER {
            return Err(TokenError::Invalid);
        }
        let payload = URL_SAFE_NO_PAD.decode(body).map_err(|_| TokenError::Invalid)?;
        if payload.len() > MAX_PAYLOAD {
            return Err(TokenError::Invalid);
        }
        let supplied = URL_SAFE_NO_PAD.decode(sig).map_err(|_| TokenError::Invalid)?;
        let signing_input = &token.as_bytes()[..head.len() + 1 + body.len()];
        let expected = self.sign(signing_input);
        if supplied.len() != expected.len() {
            return Err(TokenError::Invalid);
        }
        if !bool::from(expected.as_slice().ct_eq(supplied.as_slice())) {
            return Err(TokenError::Invalid);
        }
        Ok(payload)
    }

    fn sign(&self, input: &[u8]) -> [u8; 32] {
        // Per RFC 2104, HMAC accepts keys of any size; a 32-byte key can
        // not hit the InvalidLength arm.
        let mut mac = HmacSha256::new_from_slice(self.key.as_bytes())
            .unwrap_or_else(|_| HmacSha256::new_from_slice(&[0u8; 32]).unwrap());
        mac.update(input);
        let out = mac.finalize().into_bytes();
        let mut sig = [0u8; 32];
        sig.copy_from_slice(&out);
        sig
    }
}
