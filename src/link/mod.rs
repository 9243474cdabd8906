use std::{
    io::{self, Read, Write},
    path::PathBuf,
    time::Duration,
};

use crate::config::ClientConfig;

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use self::unix::LocalStream;
#[cfg(windows)]
pub use self::windows::LocalStream;

/// How long a connection attempt may wait for the service.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Wait {
    /// Fail straight away if the endpoint cannot take the connection.
    Immediate,
    /// Wait for a busy endpoint, but not for a missing one.
    Blocking,
}

/// Opens connections to named local endpoints.
///
/// Every returned stream is a single-use handle: it is closed when dropped.
pub trait Connector {
    type Stream: Read + Write;

    fn connect(&self, channel: &str, wait: Wait) -> io::Result<Self::Stream>;
}

/// Connects to the service through the platform's named local channels.
///
/// On Windows a channel `N` is the named pipe `\\.\pipe\N`. Elsewhere it is
/// the Unix socket `N` inside the configured socket directory.
#[derive(Clone, Debug)]
pub struct LocalConnector {
    socket_dir: PathBuf,
    #[cfg_attr(windows, allow(dead_code))]
    timeout: Option<Duration>,
}

impl LocalConnector {
    pub fn new(config: &ClientConfig) -> Self {
        if cfg!(windows) && config.reply_timeout_ms.is_some() {
            tracing::warn!("Reply timeouts are not supported on named pipes, ignoring");
        }

        LocalConnector {
            socket_dir: config.socket_dir.clone(),
            timeout: config.reply_timeout(),
        }
    }

    pub fn endpoint(&self, channel: &str) -> PathBuf {
        if cfg!(windows) {
            PathBuf::from(format!(r"\\.\pipe\{channel}"))
        } else {
            self.socket_dir.join(channel)
        }
    }
}

impl Default for LocalConnector {
    fn default() -> Self {
        Self::new(&ClientConfig::default())
    }
}

impl Connector for LocalConnector {
    type Stream = LocalStream;

    fn connect(&self, channel: &str, wait: Wait) -> io::Result<LocalStream> {
        let endpoint = self.endpoint(channel);
        tracing::trace!("Connecting to {} ({wait:?})", endpoint.display());

        #[cfg(unix)]
        return unix::connect(&endpoint, wait, self.timeout);

        #[cfg(windows)]
        return windows::connect(&endpoint, wait);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_endpoint_in_socket_dir() {
        let config = ClientConfig {
            socket_dir: PathBuf::from("/run/clevo"),
            ..ClientConfig::default()
        };

        let endpoint = LocalConnector::new(&config).endpoint("ClevoEcPipeFanNum");
        assert_eq!(endpoint, PathBuf::from("/run/clevo/ClevoEcPipeFanNum"));
    }

    #[cfg(windows)]
    #[test]
    fn test_endpoint_is_named_pipe() {
        let endpoint = LocalConnector::default().endpoint("ClevoEcPipe");
        assert_eq!(endpoint, PathBuf::from(r"\\.\pipe\ClevoEcPipe"));
    }

    #[cfg(windows)]
    #[test]
    fn test_ignored_timeout_warns_once() {
        use std::sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        };

        use tracing::{Event, Level, Subscriber};
        use tracing_subscriber::{
            Layer, Registry,
            layer::{Context, SubscriberExt},
        };

        struct CountWarnings(Arc<AtomicUsize>);

        impl<S: Subscriber> Layer<S> for CountWarnings {
            fn on_event(&self, event: &Event<'_>, _: Context<'_, S>) {
                if *event.metadata().level() == Level::WARN {
                    self.0.fetch_add(1, Ordering::SeqCst);
                }
            }
        }

        let warnings = Arc::new(AtomicUsize::new(0));
        let subscriber = Registry::default().with(CountWarnings(warnings.clone()));

        tracing::subscriber::with_default(subscriber, || {
            let config = ClientConfig {
                reply_timeout_ms: Some(50),
                ..ClientConfig::default()
            };

            let connector = LocalConnector::new(&config);

            for _ in 0..2 {
                let connection = connector.connect("EcLinkMissingPipe", Wait::Immediate);
                assert!(connection.is_err());
            }
        });

        assert_eq!(warnings.load(Ordering::SeqCst), 1);
    }
}
