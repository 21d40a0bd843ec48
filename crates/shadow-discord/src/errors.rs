use shadow_core::TransmissionError;
use thiserror::Error;

/// Discord IPC failures.
#[derive(Debug, Error)]
pub enum IpcError {
    /// Socket or pipe I/O failed.
    #[error("ipc io error: {0}")]
    Io(#[from] std::io::Error),
    /// A frame body was not valid JSON.
    #[error("ipc json error: {0}")]
    Json(#[from] serde_json::Error),
    /// A frame declared a body larger than we accept.
    #[error("ipc frame too large: {0} bytes")]
    FrameTooLarge(u32),
    /// A frame carried an opcode outside the protocol.
    #[error("unknown ipc opcode {0}")]
    UnknownOpcode(u32),
    /// Discord closed the channel.
    #[error("discord closed the connection ({code}): {message}")]
    Closed {
        /// Close code sent by Discord.
        code: i64,
        /// Close reason sent by Discord.
        message: String,
    },
    /// Discord refused the handshake.
    #[error("handshake rejected: {0}")]
    Handshake(String),
    /// No IPC endpoint answered.
    #[error("no discord ipc endpoint found")]
    NotFound,
    /// Connect and handshake did not finish in time.
    #[error("timed out connecting to discord")]
    Timeout,
}

impl From<IpcError> for TransmissionError {
    fn from(err: IpcError) -> Self {
        match err {
            IpcError::Io(_) | IpcError::Json(_) | IpcError::FrameTooLarge(_) | IpcError::UnknownOpcode(_) => {
                TransmissionError::Io(err.to_string())
            }
            IpcError::Closed { .. } | IpcError::Handshake(_) | IpcError::NotFound | IpcError::Timeout => {
                TransmissionError::Unavailable(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_maps_to_unavailable() {
        let err: TransmissionError = IpcError::Closed {
            code: 4000,
            message: "Invalid Client ID".into(),
        }
        .into();
        assert_eq!(
            err,
            TransmissionError::Unavailable(
                "discord closed the connection (4000): Invalid Client ID".into()
            )
        );
    }

    #[test]
    fn io_maps_to_io() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "broken pipe");
        let err: TransmissionError = IpcError::from(io).into();
        assert!(matches!(err, TransmissionError::Io(_)));
    }
}
