//! Protobuf wire structs.
//!
//! Hand-written `prost` derives rather than generated code — the message set
//! is small and stable, and the tags below ARE the wire contract: changing
//! one breaks compatibility with every deployed client. New fields get new
//! tags; retired fields keep their tag reserved.

/// Outer message envelope. Everything a closed group control message needs
/// beyond its own payload lives here: the group-context marker, expiry
/// metadata copied through from the outer message, and the relay TTL.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Envelope {
    /// Marks the payload as carrying group context.
    #[prost(bool, tag = "1")]
    pub group_context: bool,
    /// Disappearing-message configuration, copied through unchanged.
    #[prost(message, optional, tag = "2")]
    pub expiry: ::core::option::Option<ExpiryMode>,
    /// How long the delivery network retains the message, in milliseconds.
    #[prost(uint64, tag = "3")]
    pub ttl_ms: u64,
    #[prost(uint64, optional, tag = "4")]
    pub sent_timestamp_ms: ::core::option::Option<u64>,
    #[prost(message, optional, tag = "5")]
    pub closed_group_control_message: ::core::option::Option<ClosedGroupControlMessage>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ExpiryMode {
    #[prost(enumeration = "expiry_mode::Type", tag = "1")]
    pub r#type: i32,
    #[prost(uint32, tag = "2")]
    pub duration_seconds: u32,
}

pub mod expiry_mode {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Type {
        None = 0,
        DeleteAfterRead = 1,
        DeleteAfterSend = 2,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ClosedGroupControlMessage {
    #[prost(enumeration = "closed_group_control_message::Type", tag = "1")]
    pub r#type: i32,
    /// NEW, ENCRYPTION_KEY_PAIR.
    #[prost(bytes = "vec", optional, tag = "2")]
    pub public_key: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
    /// NEW, NAME_CHANGE.
    #[prost(string, optional, tag = "3")]
    pub name: ::core::option::Option<::prost::alloc::string::String>,
    /// NEW.
    #[prost(message, optional, tag = "4")]
    pub encryption_key_pair: ::core::option::Option<KeyPair>,
    /// NEW, MEMBERS_ADDED, MEMBERS_REMOVED. Raw 33-byte identity keys.
    #[prost(bytes = "vec", repeated, tag = "5")]
    pub members: ::prost::alloc::vec::Vec<::prost::alloc::vec::Vec<u8>>,
    /// NEW.
    #[prost(bytes = "vec", repeated, tag = "6")]
    pub admins: ::prost::alloc::vec::Vec<::prost::alloc::vec::Vec<u8>>,
    /// NEW. Seeds the group's disappearing-message timer, in seconds.
    #[prost(uint32, optional, tag = "7")]
    pub expiration_timer: ::core::option::Option<u32>,
    /// ENCRYPTION_KEY_PAIR.
    #[prost(message, repeated, tag = "8")]
    pub wrappers: ::prost::alloc::vec::Vec<KeyPairWrapper>,
}

pub mod closed_group_control_message {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Type {
        Unspecified = 0,
        New = 1,
        // 2 carried the retired all-in-one group update; the tag stays reserved.
        EncryptionKeyPair = 3,
        NameChange = 4,
        MembersAdded = 5,
        MembersRemoved = 6,
        MemberLeft = 7,
    }
}

/// A group's shared X25519 key pair. The public key is carried prefix-free
/// (32 bytes, no 0x05 identity prefix) on this field.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct KeyPair {
    #[prost(bytes = "vec", tag = "1")]
    pub public_key: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub private_key: ::prost::alloc::vec::Vec<u8>,
}

/// The group key pair encrypted for one recipient, addressed by their
/// identity key.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct KeyPairWrapper {
    #[prost(bytes = "vec", tag = "1")]
    pub public_key: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub encrypted_key_pair: ::prost::alloc::vec::Vec<u8>,
}
