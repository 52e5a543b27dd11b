//! Group encryption key pairs and identity key encodings.
//!
//! Account identifiers are X25519 public keys carried as 33 bytes on most
//! surfaces: a fixed 0x05 prefix byte followed by the 32-byte key. The group
//! key-pair wire field is the exception — it carries the prefix-free 32-byte
//! form. Reconstruction from wire bytes accepts either shape and normalises
//! to the prefix-free key.

use rand::rngs::OsRng;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// Prefix byte carried in front of X25519 identity keys.
pub const ID_PREFIX: u8 = 0x05;

/// Strip the 0x05 identity prefix from a serialised public key, if present.
///
/// Accepts the 32-byte prefix-free form or the 33-byte prefixed form.
/// Anything else is malformed key material.
pub fn strip_id_prefix_if_needed(bytes: &[u8]) -> Result<&[u8], CryptoError> {
    match bytes.len() {
        32 => Ok(bytes),
        33 if bytes[0] == ID_PREFIX => Ok(&bytes[1..]),
        33 => Err(CryptoError::InvalidKey(format!(
            "Unknown identity prefix byte: 0x{:02x}",
            bytes[0]
        ))),
        n => Err(CryptoError::InvalidKey(format!(
            "Public key must be 32 or 33 bytes, got {n}"
        ))),
    }
}

/// Strict ("condensed") hex decoding: no separators, even length, lowercase
/// or uppercase digits only.
pub fn from_hex_condensed(s: &str) -> Result<Vec<u8>, CryptoError> {
    Ok(hex::decode(s)?)
}

/// The shared X25519 key pair of a closed group.
///
/// The private half is what key-pair distribution messages deliver to each
/// member; possession of it is what "being able to read the group" means.
#[derive(Clone)]
pub struct GroupEncryptionKeyPair {
    secret: StaticSecret,
    public: PublicKey,
}

impl GroupEncryptionKeyPair {
    /// Generate a fresh key pair (used when creating a group or rotating
    /// keys after a membership change).
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Reconstruct a key pair from raw wire bytes.
    ///
    /// The public key may carry the 0x05 identity prefix; the private key is
    /// always the raw 32-byte scalar. The public half is trusted as given —
    /// it is not re-derived from the private half, matching the behaviour of
    /// key pairs received from remote group admins.
    pub fn from_bytes(public: &[u8], private: &[u8]) -> Result<Self, CryptoError> {
        let public = strip_id_prefix_if_needed(public)?;
        let public: [u8; 32] = public
            .try_into()
            .map_err(|_| CryptoError::InvalidKey("Public key must be 32 bytes".into()))?;
        let private: [u8; 32] = private.try_into().map_err(|_| {
            CryptoError::InvalidKey(format!("Private key must be 32 bytes, got {}", private.len()))
        })?;
        Ok(Self {
            secret: StaticSecret::from(private),
            public: PublicKey::from(public),
        })
    }

    /// Prefix-free 32-byte public key, as carried on the group key-pair wire
    /// field.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.public.to_bytes()
    }

    /// 33-byte prefixed public key (0x05 || key), as used for account ids.
    pub fn prefixed_public_key(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(33);
        out.push(ID_PREFIX);
        out.extend_from_slice(self.public.as_bytes());
        out
    }

    /// Hex-encoded prefixed public key ("05…", 66 chars).
    pub fn hex_public_key(&self) -> String {
        hex::encode(self.prefixed_public_key())
    }

    /// Raw private scalar. Zeroized when the returned guard drops.
    pub fn private_key_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.secret.to_bytes())
    }
}

impl PartialEq for GroupEncryptionKeyPair {
    fn eq(&self, other: &Self) -> bool {
        self.public == other.public && self.secret.to_bytes() == other.secret.to_bytes()
    }
}

impl Eq for GroupEncryptionKeyPair {}

impl std::fmt::Debug for GroupEncryptionKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupEncryptionKeyPair")
            .field("public", &hex::encode(self.public.as_bytes()))
            .field("secret", &"<redacted>")
            .finish()
    }
}
