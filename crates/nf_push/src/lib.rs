//! nf_push — Push notification subscription management.
//!
//! Keeps the push service's record of "which closed groups is this device
//! subscribed to" in line with local membership, over an onion-routed
//! transport. Everything here is best-effort and self-healing: operations
//! are idempotent on the server side, failures are logged and dropped, and
//! the next app-state change re-issues whatever is needed. The authoritative
//! subscription state lives server-side; this component only emits
//! transition requests.
//!
//! # Modules
//! - `api`       — `PushNotificationApi`: register / unregister / per-group operations
//! - `transport` — `OnionTransport` capability trait and request/response types
//! - `storage`   — `PushStorage` capability trait (group roster, push flag)

pub mod api;
pub mod storage;
pub mod transport;

pub use api::{ClosedGroupOperation, PushConfig, PushNotificationApi};
pub use storage::PushStorage;
pub use transport::{Destination, OnionRequest, OnionResponse, OnionTransport, TransportError, Version};
