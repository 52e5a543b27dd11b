//! Semantic validity rules for closed group control messages.
//!
//! The codec accepts anything structurally well-formed; this gate rejects
//! messages that decoded fine but violate group-lifecycle rules (a creation
//! with no members, a rename to the empty string). Run before encoding
//! outbound messages and after decoding inbound ones — acting on or
//! persisting an invalid message is a caller bug.

use thiserror::Error;

use crate::control::{ClosedGroupControlMessage, Kind};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing or zero sent timestamp")]
    InvalidTimestamp,

    #[error("Group public key is empty")]
    EmptyPublicKey,

    #[error("Group name is empty")]
    EmptyName,

    #[error("Member list is empty")]
    NoMembers,

    #[error("Admin list is empty")]
    NoAdmins,
}

/// Check every rule for the message's kind, reporting the first violation.
///
/// Pure: no state is read or written beyond the argument.
pub fn validate(message: &ClosedGroupControlMessage) -> Result<(), ValidationError> {
    // Envelope-level sanity short-circuits before any variant rule runs.
    if !matches!(message.sent_timestamp_ms, Some(ts) if ts > 0) {
        return Err(ValidationError::InvalidTimestamp);
    }

    match &message.kind {
        Kind::New {
            public_key,
            name,
            members,
            admins,
            // Present by construction; the timer is unsigned so "negative
            // timer" is unrepresentable.
            encryption_key_pair: _,
            expiration_timer: _,
        } => {
            if public_key.is_empty() {
                return Err(ValidationError::EmptyPublicKey);
            }
            if name.is_empty() {
                return Err(ValidationError::EmptyName);
            }
            if members.is_empty() {
                return Err(ValidationError::NoMembers);
            }
            if admins.is_empty() {
                return Err(ValidationError::NoAdmins);
            }
            Ok(())
        }
        Kind::EncryptionKeyPair { .. } => Ok(()),
        Kind::NameChange { name } => {
            if name.is_empty() {
                Err(ValidationError::EmptyName)
            } else {
                Ok(())
            }
        }
        Kind::MembersAdded { members } | Kind::MembersRemoved { members } => {
            if members.is_empty() {
                Err(ValidationError::NoMembers)
            } else {
                Ok(())
            }
        }
        Kind::MemberLeft => Ok(()),
    }
}

impl ClosedGroupControlMessage {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate(self)
    }

    /// Pure predicate form of [`validate`].
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}
