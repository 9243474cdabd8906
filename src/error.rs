use std::{io, path::PathBuf};

use thiserror::Error;

use crate::misc::buf::DecodeError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("EC service unavailable on channel \"{channel}\"")]
    ServiceUnavailable {
        channel: String,
        #[source]
        source: io::Error,
    },

    #[error("short reply from \"{command}\": expected {expected} bytes, received {received}")]
    ShortRead {
        command: &'static str,
        expected: usize,
        received: usize,
    },

    #[error("timed out waiting on channel \"{channel}\"")]
    Timeout { channel: String },

    #[error("I/O failure on channel \"{channel}\"")]
    Io {
        channel: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed reply")]
    Decode(#[from] DecodeError),

    #[error("failed to read config file {}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config")]
    ConfigParse(#[from] serde_yaml::Error),
}

impl Error {
    /// Maps a read/write failure on an already open channel.
    pub(crate) fn transfer(channel: &str, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Error::Timeout {
                channel: channel.to_owned(),
            },
            _ => Error::Io {
                channel: channel.to_owned(),
                source,
            },
        }
    }

    pub(crate) fn unavailable(channel: &str, source: io::Error) -> Self {
        Error::ServiceUnavailable {
            channel: channel.to_owned(),
            source,
        }
    }

    pub fn is_service_unavailable(&self) -> bool {
        matches!(self, Error::ServiceUnavailable { .. })
    }
}
