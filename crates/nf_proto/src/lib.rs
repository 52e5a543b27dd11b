//! nf_proto — Closed group control messages for Nightfall Messenger.
//!
//! Closed groups are fixed-membership encrypted chats whose shared key pair
//! is distributed explicitly: creating a group, changing its membership or
//! name, rotating its keys and leaving it are all driven by a single
//! versioned control message carried inside the standard message envelope.
//!
//! # Modules
//! - `wire`        — Protobuf wire structs (what actually crosses the network)
//! - `control`     — `ClosedGroupControlMessage` domain type and its codec
//! - `wrapper`     — Per-recipient encrypted key-pair wrappers
//! - `validation`  — Semantic validity rules, checked before send and after decode
//! - `update_text` — Human-readable projection of decoded group updates
//!
//! Decoding and encoding are pure and fallible: malformed or adversarial
//! input surfaces as an error value, never a panic. Semantic rules (empty
//! member lists and the like) are deliberately NOT the codec's job — callers
//! run [`control::ClosedGroupControlMessage::validate`] separately.

pub mod control;
pub mod error;
pub mod update_text;
pub mod validation;
pub mod wire;
pub mod wrapper;

pub use control::{ClosedGroupControlMessage, ExpiryMode, Kind, DEFAULT_TTL};
pub use error::ProtoError;
pub use validation::ValidationError;
pub use wrapper::KeyPairWrapper;
