//! Onion transport capability.
//!
//! The subscription manager never opens sockets itself — it hands an
//! HTTP-style request plus the destination's host and X25519 key to an
//! injected transport, which relays it through the onion path. Backoff
//! between attempts is the transport's business; the caller only bounds the
//! number of attempts.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

/// Onion protocol version to encrypt the request for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Version {
    #[default]
    V2,
    V4,
}

/// An HTTP-style request to relay. All push endpoints are JSON POSTs.
#[derive(Debug, Clone, PartialEq)]
pub struct OnionRequest {
    pub url: String,
    pub body: serde_json::Value,
}

/// Where the final hop delivers the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub host: String,
    /// Destination's X25519 public key, condensed hex.
    pub public_key: String,
    pub version: Version,
}

/// Generic key-value response body. Push endpoints answer with at least
/// `code` (integer, 0 = success) and `message` (string).
#[derive(Debug, Clone, Default)]
pub struct OnionResponse {
    pub info: HashMap<String, serde_json::Value>,
}

impl OnionResponse {
    pub fn code(&self) -> Option<i64> {
        self.info.get("code")?.as_i64()
    }

    pub fn message(&self) -> Option<&str> {
        self.info.get("message")?.as_str()
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Onion request failed: {0}")]
    Request(String),
}

#[async_trait]
pub trait OnionTransport: Send + Sync {
    async fn send(
        &self,
        request: OnionRequest,
        destination: &Destination,
    ) -> Result<OnionResponse, TransportError>;
}
