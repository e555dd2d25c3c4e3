use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Why a name could not be put on the wire.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("label `{0}` exceeds 63 bytes")]
    LabelTooLong(String),

    #[error("name exceeds 255 bytes on the wire")]
    NameTooLong,

    #[error("empty label in `{0}`")]
    EmptyLabel(String),

    #[error("invalid character {0:?} in name")]
    InvalidCharacter(char),
}

/// Why an inbound datagram could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("message truncated at offset {0}")]
    Truncated(usize),

    #[error("malformed name at offset {0}")]
    MalformedName(usize),

    #[error("malformed message: {0}")]
    Malformed(&'static str),
}

/// Outcome of a query or channel operation that did not succeed.
#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("cannot encode query: {0}")]
    Encode(#[from] EncodeError),

    #[error("query timed out")]
    Timeout,

    #[error("query interrupted by channel shutdown")]
    Interrupted,

    #[error("transport error: {0}")]
    Transport(Arc<io::Error>),

    #[error("channel is not connected")]
    NotConnected,

    #[error("all transaction ids are in use")]
    IdsExhausted,

    #[error("invalid channel options: {0}")]
    InvalidOptions(String),

    #[error("a channel must be created inside a tokio runtime")]
    NoRuntime,
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Transport(Arc::new(err))
    }
}

impl Error {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout)
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, Error::Interrupted)
    }
}
