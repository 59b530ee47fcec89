//! Signed, time-boxed CSRF tokens.
//!
//! A token is `issued_at.nonce.signature` where `issued_at` is unix millis,
//! `nonce` is 16 random bytes (hex) and `signature` is the hex HMAC-SHA256 of
//! `issued_at.nonce` under the service secret. Nothing is stored server-side;
//! dropping the secret invalidates every outstanding token.

use std::sync::Arc;

use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

use crate::config::CsrfConfig;
use crate::security::clock::Clock;
use crate::security::timing::constant_time_eq;

type HmacSha256 = Hmac<Sha256>;

const SEPARATOR: char = '.';
const NONCE_LEN: usize = 16;
const SIGNATURE_LEN: usize = 32;
const GENERATED_SECRET_LEN: usize = 32;

/// A freshly issued token and its expiry (unix millis).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: u64,
}

/// Issues and verifies CSRF tokens.
pub struct CsrfService {
    secret: Vec<u8>,
    ttl_ms: u64,
    clock: Arc<dyn Clock>,
}

impl CsrfService {
    pub fn new(secret: Vec<u8>, ttl_ms: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            secret,
            ttl_ms,
            clock,
        }
    }

    /// Build from config, generating a random secret when none is configured.
    pub fn from_config(config: &CsrfConfig, clock: Arc<dyn Clock>) -> Self {
        let secret = match config.secret.as_deref() {
            Some(secret) if !secret.is_empty() => secret.as_bytes().to_vec(),
            _ => {
                tracing::info!("No CSRF secret configured, generating an ephemeral one");
                let mut secret = vec![0u8; GENERATED_SECRET_LEN];
                OsRng.fill_bytes(&mut secret);
                secret
            }
        };
        Self::new(secret, config.ttl_secs.saturating_mul(1000), clock)
    }

    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }

    pub fn generate_token(&self) -> IssuedToken {
        let issued_at = self.clock.now_millis();
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let payload = format!("{}{}{}", issued_at, SEPARATOR, hex::encode(nonce));
        let signature = hex::encode(self.sign(&payload));

        IssuedToken {
            token: format!("{}{}{}", payload, SEPARATOR, signature),
            expires_at: issued_at.saturating_add(self.ttl_ms),
        }
    }

    /// True only for a well-formed, unexpired token carrying a valid signature.
    pub fn validate_token(&self, token: &str) -> bool {
        let mut parts = token.split(SEPARATOR);
        let (Some(issued_at), Some(nonce), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return false;
        };
        if issued_at.is_empty() || nonce.is_empty() || signature.is_empty() {
            return false;
        }

        let Ok(issued_ms) = issued_at.parse::<u64>() else {
            return false;
        };
        let now = self.clock.now_millis();
        if issued_ms > now || now - issued_ms > self.ttl_ms {
            return false;
        }

        // Compared as text: hex decoding would accept an uppercased signature.
        if signature.len() != SIGNATURE_LEN * 2 {
            return false;
        }

        let payload = &token[..issued_at.len() + 1 + nonce.len()];
        let expected = hex::encode(self.sign(payload));
        constant_time_eq(expected.as_bytes(), signature.as_bytes())
    }

    fn sign(&self, payload: &str) -> [u8; SIGNATURE_LEN] {
        // HMAC accepts keys of any length.
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .unwrap_or_else(|_| unreachable!("HMAC key of any size is valid"));
        mac.update(payload.as_bytes());
        mac.finalize().into_bytes().into()
    }
}
