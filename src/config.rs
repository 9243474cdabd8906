use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Shared channel on which command tokens are announced.
    pub control_channel: String,
    /// Directory holding the service's sockets (Unix only).
    pub socket_dir: PathBuf,
    /// Token written by the liveness probe.
    pub probe_marker: String,
    /// Bounds reads and writes on an open channel. Unset blocks indefinitely.
    pub reply_timeout_ms: Option<u64>,
}

impl ClientConfig {
    pub const CONTROL_CHANNEL: &str = "ClevoEcPipe";
    pub const PROBE_MARKER: &str = "ClevoEcPipeTestConnect";
    pub const SOCKET_DIR: &str = "/tmp";

    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let text = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_owned(),
            source,
        })?;

        Self::from_yaml(&text)
    }

    pub fn reply_timeout(&self) -> Option<Duration> {
        self.reply_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            control_channel: Self::CONTROL_CHANNEL.to_owned(),
            socket_dir: PathBuf::from(Self::SOCKET_DIR),
            probe_marker: Self::PROBE_MARKER.to_owned(),
            reply_timeout_ms: None,
        }
    }
}
