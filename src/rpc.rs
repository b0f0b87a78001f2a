//! Request/response over a single connection.
//!
//! One outstanding request per connection; replies are matched by kind only.

use crate::error::SwarmResult;
use crate::message::Payload;
use crate::wire;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::trace;

/// Send a request that expects no reply.
pub async fn send<W, Req>(conn: &mut W, request: &Req) -> SwarmResult<()>
where
    W: AsyncWrite + Unpin,
    Req: Payload,
{
    let frame = wire::encode(request)?;
    wire::write_frame(conn, &frame).await?;
    trace!(kind = %Req::KIND, bytes = frame.len(), "request sent");
    Ok(())
}

/// Send a request and wait for a reply of kind `Resp::KIND`.
///
/// A reply of any other kind fails with `ProtocolMismatch` without its
/// payload being interpreted.
pub async fn call<S, Req, Resp>(conn: &mut S, request: &Req) -> SwarmResult<Resp>
where
    S: AsyncRead + AsyncWrite + Unpin,
    Req: Payload,
    Resp: Payload,
{
    send(conn, request).await?;
    let frame = wire::decode(conn).await?;
    trace!(kind = %frame.kind, bytes = frame.payload.len(), "reply received");
    frame.parse::<Resp>()
}
