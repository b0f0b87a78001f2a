//! Frame codec shared by every role.
//!
//! ```text
//! [ type: u8 ][ payload length: u64 BE ][ crc32: u32 BE ][ payload ... ]
//! ```
//!
//! The checksum is CRC-32/ISO-HDLC over the payload bytes. A payload is
//! never deserialized unless its checksum matched.

use crate::error::{SwarmError, SwarmResult};
use crate::message::{Message, MessageKind, Payload};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

pub const TYPE_LEN: usize = 1;
pub const LENGTH_LEN: usize = 8;
pub const CHECKSUM_LEN: usize = 4;
pub const HEADER_LEN: usize = TYPE_LEN + LENGTH_LEN + CHECKSUM_LEN;

/// Largest payload a peer may announce. Checked before allocating.
pub const MAX_FRAME_PAYLOAD: u64 = 128 * 1024 * 1024;

/// A checksum-verified frame whose body has not been interpreted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: MessageKind,
    pub payload: Bytes,
}

impl Frame {
    /// Deserialize the body as `P`, refusing frames of another kind.
    pub fn parse<P: Payload>(&self) -> SwarmResult<P> {
        if self.kind != P::KIND {
            return Err(SwarmError::ProtocolMismatch {
                expected: P::KIND,
                actual: self.kind,
            });
        }
        P::from_bytes(&self.payload)
    }

    pub fn into_message(self) -> SwarmResult<Message> {
        Message::from_bytes(self.kind, &self.payload)
    }
}

fn frame(kind: MessageKind, payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_LEN + payload.len());
    buf.put_u8(kind.as_byte());
    buf.put_u64(payload.len() as u64);
    buf.put_u32(crc32fast::hash(payload));
    buf.put_slice(payload);
    buf.freeze()
}

/// Encode a typed payload into a complete frame.
pub fn encode<P: Payload>(payload: &P) -> SwarmResult<Bytes> {
    let body = payload.to_bytes()?;
    Ok(frame(P::KIND, &body))
}

/// Encode any message into a complete frame.
pub fn encode_message(message: &Message) -> SwarmResult<Bytes> {
    let body = message.to_bytes()?;
    Ok(frame(message.kind(), &body))
}

/// Read one frame.
///
/// A stream that ends before a full frame arrived yields
/// [`SwarmError::Disconnected`]; other read failures keep their own kind.
pub async fn decode<R>(reader: &mut R) -> SwarmResult<Frame>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    reader.read_exact(&mut header).await?;

    let mut header = &header[..];
    let kind = MessageKind::try_from(header.get_u8())?;
    let length = header.get_u64();
    let expected = header.get_u32();

    if length > MAX_FRAME_PAYLOAD {
        return Err(SwarmError::FrameTooLarge(length));
    }

    let mut payload = vec![0u8; length as usize];
    reader.read_exact(&mut payload).await?;

    let actual = crc32fast::hash(&payload);
    if actual != expected {
        return Err(SwarmError::Integrity { expected, actual });
    }

    trace!(kind = %kind, length = length, "frame decoded");

    Ok(Frame {
        kind,
        payload: Bytes::from(payload),
    })
}

/// Write an encoded frame and flush it.
pub async fn write_frame<W>(writer: &mut W, frame: &[u8]) -> SwarmResult<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(frame).await?;
    writer.flush().await?;
    Ok(())
}
