use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("Envelope carries no closed group control message")]
    MissingControlMessage,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Unknown control message type: {0}")]
    UnknownType(i32),

    #[error("Invalid key material: {0}")]
    Key(#[from] nf_crypto::CryptoError),

    #[error("Protobuf decode error: {0}")]
    Decode(#[from] prost::DecodeError),
}
