//! Error and disconnect types surfaced to the host application.

use crate::ws::Error as WsError;
use serde_json::Error as JsonError;
use std::error::Error as StdError;
use std::fmt;
use std::io::Error as IoError;

/// Errors encountered while negotiating with or talking to a voice server.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// The handshake did not complete within the configured time limit.
    ConnectTimeout,
    /// An indicator that an endpoint string was invalid.
    EndpointUrl,
    /// Hostname of the voice server did not resolve to a usable address.
    HostnameResolve,
    /// A background task stopped accepting messages.
    InterconnectFailure,
    /// Miscellaneous I/O error.
    Io(IoError),
    /// JSON (de)serialization error.
    Json(JsonError),
    /// The signaling server violated the handshake: an unexpected opcode or a
    /// malformed payload where a specific reply was required.
    SignalingProtocol,
    /// Media-socket failure severe enough that continuing is meaningless.
    TransportSocket(IoError),
    /// The server's reply to UDP address discovery was missing or malformed.
    UdpDiscoveryFailed,
    /// Error communicating with the signaling server over WebSocket.
    Ws(WsError),
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Error {
        Error::Io(e)
    }
}

impl From<JsonError> for Error {
    fn from(e: JsonError) -> Error {
        Error::Json(e)
    }
}

impl From<WsError> for Error {
    fn from(e: WsError) -> Error {
        Error::Ws(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConnectTimeout => f.write_str("connection handshake timed out"),
            Error::EndpointUrl => f.write_str("voice endpoint was not a valid URL"),
            Error::HostnameResolve => f.write_str("voice server hostname did not resolve"),
            Error::InterconnectFailure => f.write_str("voice background task is gone"),
            Error::Io(e) => e.fmt(f),
            Error::Json(e) => e.fmt(f),
            Error::SignalingProtocol => f.write_str("signaling server violated the handshake"),
            Error::TransportSocket(e) => write!(f, "media socket failed: {e}"),
            Error::UdpDiscoveryFailed => f.write_str("UDP address discovery failed"),
            Error::Ws(e) => e.fmt(f),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Io(e) | Error::TransportSocket(e) => Some(e),
            Error::Json(e) => Some(e),
            Error::Ws(e) => Some(e),
            _ => None,
        }
    }
}

/// Why a live voice connection ended.
///
/// Exactly one of these is delivered per ended connection via
/// [`VoiceConnection::disconnects`].
///
/// [`VoiceConnection::disconnects`]: crate::VoiceConnection::disconnects
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum DisconnectReason {
    /// The connection was closed locally.
    Requested,
    /// The media socket reported the route unusable.
    TransportFailed,
    /// The signaling WebSocket was closed by the server or the network.
    WsClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
