//! Per-recipient encrypted key-pair wrappers.
//!
//! An ENCRYPTION_KEY_PAIR message carries one wrapper per member: the
//! group's key pair encrypted to that member, addressed by their identity
//! key. A wrapper that fails to decode or encode is dropped individually —
//! one corrupt recipient entry must never abort key distribution to the
//! rest of the group.

use crate::error::ProtoError;
use crate::wire;

/// The group encryption key pair, encrypted for a single recipient.
///
/// `public_key` is the recipient's identity key as condensed hex;
/// `encrypted_key_pair` is opaque ciphertext only that recipient can open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPairWrapper {
    pub public_key: Option<String>,
    pub encrypted_key_pair: Option<Vec<u8>>,
}

impl KeyPairWrapper {
    pub fn new(public_key: impl Into<String>, encrypted_key_pair: Vec<u8>) -> Self {
        Self {
            public_key: Some(public_key.into()),
            encrypted_key_pair: Some(encrypted_key_pair),
        }
    }

    /// A wrapper is valid iff both fields are present.
    pub fn is_valid(&self) -> bool {
        self.public_key.is_some() && self.encrypted_key_pair.is_some()
    }

    /// Decode a wire wrapper. The recipient key is re-encoded as condensed
    /// hex; the ciphertext passes through unchanged. Fails only on field
    /// absence (an empty protobuf field is an absent one).
    pub fn from_wire(wrapper: &wire::KeyPairWrapper) -> Result<Self, ProtoError> {
        if wrapper.public_key.is_empty() {
            return Err(ProtoError::MissingField("publicKey"));
        }
        if wrapper.encrypted_key_pair.is_empty() {
            return Err(ProtoError::MissingField("encryptedKeyPair"));
        }
        Ok(Self {
            public_key: Some(hex::encode(&wrapper.public_key)),
            encrypted_key_pair: Some(wrapper.encrypted_key_pair.clone()),
        })
    }

    /// Encode to wire form. Fails if either field is absent or the recipient
    /// key is not valid condensed hex. The containing message drops failed
    /// wrappers rather than propagating the error.
    pub fn to_wire(&self) -> Result<wire::KeyPairWrapper, ProtoError> {
        let public_key = self
            .public_key
            .as_deref()
            .ok_or(ProtoError::MissingField("publicKey"))?;
        let public_key = nf_crypto::from_hex_condensed(public_key)?;
        let encrypted_key_pair = self
            .encrypted_key_pair
            .clone()
            .ok_or(ProtoError::MissingField("encryptedKeyPair"))?;
        Ok(wire::KeyPairWrapper {
            public_key,
            encrypted_key_pair,
        })
    }
}
