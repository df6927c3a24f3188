use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
/// Everything a protocol operation can fail with. All of these are caught and
/// logged at the boundary of the operation that produced them; none is
/// allowed to take down a background loop or a neighboring handler.
pub enum Error {
    /// No reply arrived within the operation's deadline.
    #[error("timed out waiting for a reply")]
    Timeout,
    /// Malformed or unrecognized message payload.
    #[error("bad message: {0}")]
    Protocol(String),
    /// File missing, unreadable, or unwritable.
    #[error("file operation failed: {0}")]
    Io(#[from] io::Error),
    /// Socket-level failure.
    #[error("transport failure: {0}")]
    Transport(io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Protocol(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_failures_map_to_protocol() {
        let err = serde_json::from_str::<crate::entities::Message>("not json").unwrap_err();
        assert!(matches!(Error::from(err), Error::Protocol(_)));
    }
}
