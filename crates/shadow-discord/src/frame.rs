//! IPC framing: little-endian `u32` opcode, little-endian `u32` body length,
//! then a JSON body.

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::errors::IpcError;

/// Largest body we will read. Discord replies are a few KiB at most.
pub const MAX_FRAME_LEN: u32 = 64 * 1024;

/// Frame opcodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    /// Client hello carrying the application id.
    Handshake,
    /// Command or event.
    Frame,
    /// Channel shutdown.
    Close,
    /// Keepalive request; answer with [`Opcode::Pong`].
    Ping,
    /// Keepalive reply.
    Pong,
}

impl Opcode {
    /// Wire value.
    pub fn code(self) -> u32 {
        match self {
            Self::Handshake => 0,
            Self::Frame => 1,
            Self::Close => 2,
            Self::Ping => 3,
            Self::Pong => 4,
        }
    }

    /// Parse a wire value.
    pub fn from_code(code: u32) -> Result<Self, IpcError> {
        match code {
            0 => Ok(Self::Handshake),
            1 => Ok(Self::Frame),
            2 => Ok(Self::Close),
            3 => Ok(Self::Ping),
            4 => Ok(Self::Pong),
            other => Err(IpcError::UnknownOpcode(other)),
        }
    }
}

/// One decoded frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Frame kind.
    pub opcode: Opcode,
    /// JSON body.
    pub payload: Value,
}

/// Encode a frame into a single buffer.
pub fn encode(opcode: Opcode, payload: &Value) -> Result<Vec<u8>, IpcError> {
    let body = serde_json::to_vec(payload)?;
    let len = u32::try_from(body.len()).map_err(|_| IpcError::FrameTooLarge(u32::MAX))?;
    let mut buf = Vec::with_capacity(8 + body.len());
    buf.extend_from_slice(&opcode.code().to_le_bytes());
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(&body);
    Ok(buf)
}

/// Write one frame and flush.
pub async fn write_frame<W>(writer: &mut W, opcode: Opcode, payload: &Value) -> Result<(), IpcError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let buf = encode(opcode, payload)?;
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame.
pub async fn read_frame<R>(reader: &mut R) -> Result<Frame, IpcError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut header = [0u8; 8];
    let _ = reader.read_exact(&mut header).await?;
    let [o0, o1, o2, o3, l0, l1, l2, l3] = header;
    let opcode = Opcode::from_code(u32::from_le_bytes([o0, o1, o2, o3]))?;
    let len = u32::from_le_bytes([l0, l1, l2, l3]);
    if len > MAX_FRAME_LEN {
        return Err(IpcError::FrameTooLarge(len));
    }

    let mut body = vec![0u8; len as usize];
    let _ = reader.read_exact(&mut body).await?;
    let payload = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body)?
    };
    Ok(Frame { opcode, payload })
}
