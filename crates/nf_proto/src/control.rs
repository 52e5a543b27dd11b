//! `ClosedGroupControlMessage` — the domain type and its wire codec.
//!
//! Decode and encode are lossless for every semantically significant field
//! and fail as error values, never panics. Malformed input (missing required
//! fields, unparsable key material, unknown discriminators) is rejected
//! here; semantically incomplete-but-well-formed messages are the
//! [`validation`](crate::validation) module's job.

use std::time::Duration;

use prost::Message as _;
use tracing::warn;

use nf_crypto::GroupEncryptionKeyPair;

use crate::error::ProtoError;
use crate::wire;
use crate::wire::closed_group_control_message::Type;
use crate::wrapper::KeyPairWrapper;

/// Every closed group control message is relayed for 14 days, regardless of
/// kind. Distinct from the per-group disappearing-message timer.
pub const DEFAULT_TTL: Duration = Duration::from_millis(14 * 24 * 60 * 60 * 1000);

/// Disappearing-message configuration carried on the envelope, copied
/// through the codec unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpiryMode {
    #[default]
    None,
    /// Countdown starts when the recipient reads the message.
    AfterRead { seconds: u32 },
    /// Countdown starts when the message is sent.
    AfterSend { seconds: u32 },
}

impl ExpiryMode {
    fn from_wire(expiry: Option<&wire::ExpiryMode>) -> Self {
        use wire::expiry_mode::Type as ExpiryType;
        let Some(expiry) = expiry else {
            return ExpiryMode::None;
        };
        match ExpiryType::try_from(expiry.r#type) {
            Ok(ExpiryType::DeleteAfterRead) => ExpiryMode::AfterRead {
                seconds: expiry.duration_seconds,
            },
            Ok(ExpiryType::DeleteAfterSend) => ExpiryMode::AfterSend {
                seconds: expiry.duration_seconds,
            },
            // Unknown modes degrade to "no expiry" rather than rejecting the
            // whole message; expiry metadata is advisory.
            Ok(ExpiryType::None) | Err(_) => ExpiryMode::None,
        }
    }

    fn to_wire(self) -> Option<wire::ExpiryMode> {
        use wire::expiry_mode::Type as ExpiryType;
        match self {
            ExpiryMode::None => None,
            ExpiryMode::AfterRead { seconds } => Some(wire::ExpiryMode {
                r#type: ExpiryType::DeleteAfterRead as i32,
                duration_seconds: seconds,
            }),
            ExpiryMode::AfterSend { seconds } => Some(wire::ExpiryMode {
                r#type: ExpiryType::DeleteAfterSend as i32,
                duration_seconds: seconds,
            }),
        }
    }
}

/// The payload of a closed group control message. Exactly one kind per
/// message; the discriminator travels on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    /// Group creation: full roster, the group's key pair and the initial
    /// disappearing-message timer, pushed to every initial member.
    New {
        public_key: Vec<u8>,
        name: String,
        encryption_key_pair: GroupEncryptionKeyPair,
        members: Vec<Vec<u8>>,
        admins: Vec<Vec<u8>>,
        expiration_timer: u32,
    },
    /// The group's (rotated) key pair, encrypted per member.
    ///
    /// `public_key` identifies the target group only when the message is
    /// delivered in a one-to-one conversation; inside the group itself it is
    /// absent.
    EncryptionKeyPair {
        public_key: Option<Vec<u8>>,
        wrappers: Vec<KeyPairWrapper>,
    },
    NameChange {
        name: String,
    },
    MembersAdded {
        members: Vec<Vec<u8>>,
    },
    MembersRemoved {
        members: Vec<Vec<u8>>,
    },
    MemberLeft,
}

impl Kind {
    pub fn description(&self) -> &'static str {
        match self {
            Kind::New { .. } => "new",
            Kind::EncryptionKeyPair { .. } => "encryptionKeyPair",
            Kind::NameChange { .. } => "nameChange",
            Kind::MembersAdded { .. } => "membersAdded",
            Kind::MembersRemoved { .. } => "membersRemoved",
            Kind::MemberLeft => "memberLeft",
        }
    }
}

/// A closed group lifecycle event: creation, membership change, key
/// rotation, rename or departure.
///
/// Constructed transiently per send/receive; the kind is mandatory at
/// construction, so a kind-less message cannot exist. `group_id` is local
/// routing state and never crosses the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedGroupControlMessage {
    pub kind: Kind,
    pub group_id: Option<String>,
    pub sent_timestamp_ms: Option<u64>,
    pub expiry_mode: ExpiryMode,
}

impl ClosedGroupControlMessage {
    pub fn new(kind: Kind, sent_timestamp_ms: u64) -> Self {
        Self {
            kind,
            group_id: None,
            sent_timestamp_ms: Some(sent_timestamp_ms),
            expiry_mode: ExpiryMode::None,
        }
    }

    /// Relay TTL for this message. Fixed for every kind.
    pub fn default_ttl(&self) -> Duration {
        DEFAULT_TTL
    }

    /// Decode from envelope bytes. The single entry point for inbound
    /// network data; every failure mode is an error value.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtoError> {
        let envelope = wire::Envelope::decode(bytes)?;
        Self::from_envelope(&envelope)
    }

    /// Build the domain message from a decoded envelope.
    pub fn from_envelope(envelope: &wire::Envelope) -> Result<Self, ProtoError> {
        let content = envelope
            .closed_group_control_message
            .as_ref()
            .ok_or(ProtoError::MissingControlMessage)?;

        let r#type = Type::try_from(content.r#type)
            .map_err(|_| ProtoError::UnknownType(content.r#type))?;

        let kind = match r#type {
            Type::Unspecified => return Err(ProtoError::UnknownType(content.r#type)),
            Type::New => {
                let public_key = content
                    .public_key
                    .clone()
                    .ok_or(ProtoError::MissingField("publicKey"))?;
                let name = content
                    .name
                    .clone()
                    .ok_or(ProtoError::MissingField("name"))?;
                let key_pair = content
                    .encryption_key_pair
                    .as_ref()
                    .ok_or(ProtoError::MissingField("encryptionKeyPair"))?;
                let encryption_key_pair =
                    GroupEncryptionKeyPair::from_bytes(&key_pair.public_key, &key_pair.private_key)
                        .map_err(|e| {
                            warn!(error = %e, "Couldn't reconstruct group key pair from wire bytes");
                            e
                        })?;
                Kind::New {
                    public_key,
                    name,
                    encryption_key_pair,
                    members: content.members.clone(),
                    admins: content.admins.clone(),
                    expiration_timer: content.expiration_timer.unwrap_or(0),
                }
            }
            Type::EncryptionKeyPair => {
                // Empty bytes are the on-wire sentinel for "no public key".
                let public_key = content.public_key.clone().filter(|pk| !pk.is_empty());
                let wrappers = content
                    .wrappers
                    .iter()
                    .filter_map(|wrapper| match KeyPairWrapper::from_wire(wrapper) {
                        Ok(wrapper) => Some(wrapper),
                        Err(e) => {
                            // One corrupt wrapper must not fail key
                            // distribution to everyone else.
                            warn!(error = %e, "Dropping undecodable key pair wrapper");
                            None
                        }
                    })
                    .collect();
                Kind::EncryptionKeyPair {
                    public_key,
                    wrappers,
                }
            }
            Type::NameChange => Kind::NameChange {
                name: content
                    .name
                    .clone()
                    .ok_or(ProtoError::MissingField("name"))?,
            },
            // Member lists are accepted as-is here, empty included; the
            // validation pass rejects them.
            Type::MembersAdded => Kind::MembersAdded {
                members: content.members.clone(),
            },
            Type::MembersRemoved => Kind::MembersRemoved {
                members: content.members.clone(),
            },
            Type::MemberLeft => Kind::MemberLeft,
        };

        Ok(Self {
            kind,
            group_id: None,
            sent_timestamp_ms: envelope.sent_timestamp_ms,
            expiry_mode: ExpiryMode::from_wire(envelope.expiry.as_ref()),
        })
    }

    /// Encode to envelope bytes ready for the transport.
    pub fn encode(&self) -> Result<Vec<u8>, ProtoError> {
        Ok(self.to_envelope()?.encode_to_vec())
    }

    /// Build the wire envelope: payload, group-context marker, expiry
    /// metadata and the fixed relay TTL.
    pub fn to_envelope(&self) -> Result<wire::Envelope, ProtoError> {
        let mut content = wire::ClosedGroupControlMessage::default();
        match &self.kind {
            Kind::New {
                public_key,
                name,
                encryption_key_pair,
                members,
                admins,
                expiration_timer,
            } => {
                content.r#type = Type::New as i32;
                content.public_key = Some(public_key.clone());
                content.name = Some(name.clone());
                content.encryption_key_pair = Some(wire::KeyPair {
                    // Prefix-free form on this field.
                    public_key: encryption_key_pair.public_key_bytes().to_vec(),
                    private_key: encryption_key_pair.private_key_bytes().to_vec(),
                });
                content.members = members.clone();
                content.admins = admins.clone();
                content.expiration_timer = Some(*expiration_timer);
            }
            Kind::EncryptionKeyPair {
                public_key,
                wrappers,
            } => {
                content.r#type = Type::EncryptionKeyPair as i32;
                content.public_key = Some(public_key.clone().unwrap_or_default());
                content.wrappers = wrappers
                    .iter()
                    .filter_map(|wrapper| match wrapper.to_wire() {
                        Ok(wrapper) => Some(wrapper),
                        Err(e) => {
                            warn!(
                                error = %e,
                                kind = self.kind.description(),
                                "Excluding unencodable key pair wrapper"
                            );
                            None
                        }
                    })
                    .collect();
            }
            Kind::NameChange { name } => {
                content.r#type = Type::NameChange as i32;
                content.name = Some(name.clone());
            }
            Kind::MembersAdded { members } => {
                content.r#type = Type::MembersAdded as i32;
                content.members = members.clone();
            }
            Kind::MembersRemoved { members } => {
                content.r#type = Type::MembersRemoved as i32;
                content.members = members.clone();
            }
            Kind::MemberLeft => {
                content.r#type = Type::MemberLeft as i32;
            }
        }

        Ok(wire::Envelope {
            group_context: true,
            expiry: self.expiry_mode.to_wire(),
            ttl_ms: self.default_ttl().as_millis() as u64,
            sent_timestamp_ms: self.sent_timestamp_ms,
            closed_group_control_message: Some(content),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message as _;

    fn member(id: u8) -> Vec<u8> {
        let mut key = vec![0x05];
        key.extend_from_slice(&[id; 32]);
        key
    }

    fn new_kind() -> Kind {
        Kind::New {
            public_key: member(9),
            name: "Ship log".into(),
            encryption_key_pair: GroupEncryptionKeyPair::generate(),
            members: vec![member(1), member(2)],
            admins: vec![member(1)],
            expiration_timer: 3600,
        }
    }

    fn roundtrip(kind: Kind) -> ClosedGroupControlMessage {
        let message = ClosedGroupControlMessage::new(kind, 1_700_000_000_000);
        let bytes = message.encode().unwrap();
        let decoded = ClosedGroupControlMessage::decode(&bytes).unwrap();
        assert_eq!(decoded, message);
        decoded
    }

    #[test]
    fn roundtrip_new() {
        let decoded = roundtrip(new_kind());
        let Kind::New {
            members,
            admins,
            expiration_timer,
            ..
        } = decoded.kind
        else {
            panic!("wrong kind");
        };
        // Order preserved.
        assert_eq!(members, vec![member(1), member(2)]);
        assert_eq!(admins, vec![member(1)]);
        assert_eq!(expiration_timer, 3600);
    }

    #[test]
    fn roundtrip_encryption_key_pair() {
        roundtrip(Kind::EncryptionKeyPair {
            public_key: Some(member(7)),
            wrappers: vec![
                KeyPairWrapper::new(hex::encode(member(1)), vec![1, 1, 1]),
                KeyPairWrapper::new(hex::encode(member(2)), vec![2, 2, 2]),
            ],
        });
    }

    #[test]
    fn roundtrip_remaining_kinds() {
        roundtrip(Kind::NameChange {
            name: "Renamed".into(),
        });
        roundtrip(Kind::MembersAdded {
            members: vec![member(3)],
        });
        roundtrip(Kind::MembersRemoved {
            members: vec![member(3), member(4)],
        });
        roundtrip(Kind::MemberLeft);
    }

    #[test]
    fn roundtrip_preserves_expiry_mode() {
        let mut message = ClosedGroupControlMessage::new(Kind::MemberLeft, 42);
        message.expiry_mode = ExpiryMode::AfterSend { seconds: 86400 };
        let decoded = ClosedGroupControlMessage::decode(&message.encode().unwrap()).unwrap();
        assert_eq!(decoded.expiry_mode, ExpiryMode::AfterSend { seconds: 86400 });
    }

    #[test]
    fn every_kind_carries_the_fixed_ttl() {
        let kinds = [
            new_kind(),
            Kind::EncryptionKeyPair {
                public_key: None,
                wrappers: vec![],
            },
            Kind::NameChange { name: "x".into() },
            Kind::MembersAdded {
                members: vec![member(1)],
            },
            Kind::MembersRemoved {
                members: vec![member(1)],
            },
            Kind::MemberLeft,
        ];
        for kind in kinds {
            let bytes = ClosedGroupControlMessage::new(kind, 1).encode().unwrap();
            let envelope = wire::Envelope::decode(bytes.as_slice()).unwrap();
            assert_eq!(envelope.ttl_ms, 1_209_600_000);
            assert!(envelope.group_context);
        }
    }

    #[test]
    fn kind_descriptions_name_each_variant() {
        let cases = [
            (new_kind(), "new"),
            (
                Kind::EncryptionKeyPair {
                    public_key: None,
                    wrappers: vec![],
                },
                "encryptionKeyPair",
            ),
            (Kind::NameChange { name: "n".into() }, "nameChange"),
            (Kind::MembersAdded { members: vec![] }, "membersAdded"),
            (Kind::MembersRemoved { members: vec![] }, "membersRemoved"),
            (Kind::MemberLeft, "memberLeft"),
        ];
        for (kind, expected) in cases {
            assert_eq!(kind.description(), expected);
        }
    }

    #[test]
    fn decode_fails_without_control_message() {
        let envelope = wire::Envelope {
            group_context: true,
            ..Default::default()
        };
        assert!(matches!(
            ClosedGroupControlMessage::from_envelope(&envelope),
            Err(ProtoError::MissingControlMessage)
        ));
    }

    #[test]
    fn decode_fails_on_unknown_discriminator() {
        let envelope = wire::Envelope {
            closed_group_control_message: Some(wire::ClosedGroupControlMessage {
                r#type: 99,
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(matches!(
            ClosedGroupControlMessage::from_envelope(&envelope),
            Err(ProtoError::UnknownType(99))
        ));
    }

    #[test]
    fn new_decode_fails_on_malformed_key_pair() {
        let message = ClosedGroupControlMessage::new(new_kind(), 1);
        let mut envelope = message.to_envelope().unwrap();
        let content = envelope.closed_group_control_message.as_mut().unwrap();
        // 31 bytes cannot be an X25519 public key.
        content.encryption_key_pair.as_mut().unwrap().public_key = vec![0u8; 31];

        let result = ClosedGroupControlMessage::decode(&envelope.encode_to_vec());
        assert!(matches!(result, Err(ProtoError::Key(_))));
    }

    #[test]
    fn new_decode_fails_on_missing_fields() {
        let message = ClosedGroupControlMessage::new(new_kind(), 1);
        for field in ["publicKey", "name", "encryptionKeyPair"] {
            let mut envelope = message.to_envelope().unwrap();
            let content = envelope.closed_group_control_message.as_mut().unwrap();
            match field {
                "publicKey" => content.public_key = None,
                "name" => content.name = None,
                _ => content.encryption_key_pair = None,
            }
            assert!(
                matches!(
                    ClosedGroupControlMessage::decode(&envelope.encode_to_vec()),
                    Err(ProtoError::MissingField(f)) if f == field
                ),
                "expected missing {field}"
            );
        }
    }

    #[test]
    fn corrupt_wrappers_are_dropped_not_fatal() {
        let envelope = wire::Envelope {
            closed_group_control_message: Some(wire::ClosedGroupControlMessage {
                r#type: Type::EncryptionKeyPair as i32,
                public_key: Some(vec![]),
                wrappers: vec![
                    wire::KeyPairWrapper {
                        public_key: member(1),
                        encrypted_key_pair: vec![1],
                    },
                    // Missing ciphertext: dropped.
                    wire::KeyPairWrapper {
                        public_key: member(2),
                        encrypted_key_pair: vec![],
                    },
                    wire::KeyPairWrapper {
                        public_key: member(3),
                        encrypted_key_pair: vec![3],
                    },
                ],
                ..Default::default()
            }),
            ..Default::default()
        };

        let decoded = ClosedGroupControlMessage::from_envelope(&envelope).unwrap();
        let Kind::EncryptionKeyPair {
            public_key,
            wrappers,
        } = decoded.kind
        else {
            panic!("wrong kind");
        };
        // Empty public key bytes mean "not set".
        assert_eq!(public_key, None);
        assert_eq!(wrappers.len(), 2);
        assert_eq!(wrappers[0].public_key.as_deref(), Some(hex::encode(member(1)).as_str()));
        assert_eq!(wrappers[1].public_key.as_deref(), Some(hex::encode(member(3)).as_str()));
    }

    #[test]
    fn unencodable_wrapper_is_excluded_without_failing_encode() {
        let message = ClosedGroupControlMessage::new(
            Kind::EncryptionKeyPair {
                public_key: None,
                wrappers: vec![
                    KeyPairWrapper::new(hex::encode(member(1)), vec![1]),
                    // Not condensed hex: excluded at encode time.
                    KeyPairWrapper::new("not-hex", vec![2]),
                ],
            },
            1,
        );

        let envelope = message.to_envelope().unwrap();
        let content = envelope.closed_group_control_message.unwrap();
        assert_eq!(content.wrappers.len(), 1);
        assert_eq!(content.wrappers[0].public_key, member(1));
        // Absent public key goes out as the empty-bytes sentinel.
        assert_eq!(content.public_key, Some(vec![]));
    }

    #[test]
    fn new_encodes_prefix_free_group_public_key() {
        let pair = GroupEncryptionKeyPair::generate();
        let message = ClosedGroupControlMessage::new(
            Kind::New {
                public_key: member(9),
                name: "g".into(),
                encryption_key_pair: pair.clone(),
                members: vec![member(1)],
                admins: vec![member(1)],
                expiration_timer: 0,
            },
            1,
        );
        let envelope = message.to_envelope().unwrap();
        let key_pair = envelope
            .closed_group_control_message
            .unwrap()
            .encryption_key_pair
            .unwrap();
        assert_eq!(key_pair.public_key.len(), 32);
        assert_eq!(key_pair.public_key, pair.public_key_bytes().to_vec());
    }
}
