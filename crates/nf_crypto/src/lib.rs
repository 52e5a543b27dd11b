//! nf_crypto — Key material for Nightfall closed groups.
//!
//! A closed group's content is protected by a shared X25519 key pair whose
//! private half is distributed to every member (and re-distributed on each
//! membership change). This crate owns that key pair type plus the identity
//! key encodings used on the wire.
//!
//! # Modules
//! - `group_keys` — `GroupEncryptionKeyPair` and identity-prefix handling
//! - `error`      — `CryptoError`

pub mod error;
pub mod group_keys;

pub use error::CryptoError;
pub use group_keys::{
    from_hex_condensed, strip_id_prefix_if_needed, GroupEncryptionKeyPair, ID_PREFIX,
};
