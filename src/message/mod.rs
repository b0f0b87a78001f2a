//! Closed set of messages exchanged by tracker, seeders and clients.
//!
//! Each payload struct maps to exactly one [`MessageKind`] through the
//! [`Payload`] trait. [`Message`] is the sum type used wherever a frame's
//! kind is only known at runtime.

pub mod types;

pub use types::{ChunkRequest, ChunkResponse, SeederList, Torrent, TorrentList};

use crate::error::{SwarmError, SwarmResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// One-byte discriminant carried in every frame header.
///
/// The string form is for logs only.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::FromRepr,
    strum::EnumIter,
)]
#[repr(u8)]
pub enum MessageKind {
    ChunkRequest = 1,
    ChunkResponse = 2,
    Torrent = 3,
    TorrentList = 4,
    SeederList = 5,
}

impl MessageKind {
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for MessageKind {
    type Error = SwarmError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        MessageKind::from_repr(value).ok_or(SwarmError::UnknownType(value))
    }
}

/// A struct that travels as the body of a frame.
pub trait Payload: Serialize + DeserializeOwned + Into<Message> {
    const KIND: MessageKind;

    fn to_bytes(&self) -> SwarmResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    fn from_bytes(bytes: &[u8]) -> SwarmResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Any message, tagged by variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    ChunkRequest(ChunkRequest),
    ChunkResponse(ChunkResponse),
    Torrent(Torrent),
    TorrentList(TorrentList),
    SeederList(SeederList),
}

macro_rules! impl_payload {
    ($($variant:ident),+ $(,)?) => {
        $(
            impl Payload for $variant {
                const KIND: MessageKind = MessageKind::$variant;
            }

            impl From<$variant> for Message {
                fn from(payload: $variant) -> Self {
                    Message::$variant(payload)
                }
            }
        )+

        impl Message {
            pub fn kind(&self) -> MessageKind {
                match self {
                    $(Message::$variant(_) => MessageKind::$variant,)+
                }
            }

            /// Serialize the body, without any frame header.
            pub fn to_bytes(&self) -> SwarmResult<Vec<u8>> {
                match self {
                    $(Message::$variant(payload) => payload.to_bytes(),)+
                }
            }

            /// Deserialize a body whose kind was read from a frame header.
            pub fn from_bytes(kind: MessageKind, bytes: &[u8]) -> SwarmResult<Self> {
                match kind {
                    $(MessageKind::$variant => $variant::from_bytes(bytes).map(Message::$variant),)+
                }
            }
        }
    };
}

impl_payload!(ChunkRequest, ChunkResponse, Torrent, TorrentList, SeederList);
