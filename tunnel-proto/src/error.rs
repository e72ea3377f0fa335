use std::io;

/// Errors arising from framing or interpreting the control protocol.
#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("unrecognized command token: {0:?}")]
    UnknownToken(String),
}

impl From<ProtoError> for io::Error {
    fn from(err: ProtoError) -> Self {
        match err {
            ProtoError::Io(err) => err,
            other => io::Error::new(io::ErrorKind::InvalidData, other.to_string()),
        }
    }
}
