use crate::constants::{DEFAULT_BITRATE, DEFAULT_CONNECT_TIMEOUT};
use audiopus::Bitrate;
use std::time::Duration;

/// Configuration for an inner voice connection.
#[derive(Clone, Debug)]
pub struct Config {
    /// Bitrate used when encoding outgoing audio.
    ///
    /// Sensible values range between `BitsPerSecond(512)` and
    /// `BitsPerSecond(512_000)`; defaults to 128 kbps.
    pub bitrate: Bitrate,
    /// Bound on how long the full connection handshake (WebSocket
    /// negotiation plus UDP discovery) may take before it is abandoned.
    pub connect_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bitrate: DEFAULT_BITRATE,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}
