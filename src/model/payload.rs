//! Message bodies used on the signaling channel.

use crate::model::id::{GuildId, UserId};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Used to begin a voice websocket connection.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Identify {
    /// Guild or group call which the target voice channel belongs to.
    pub server_id: GuildId,
    /// Authentication session received from the platform's main gateway when
    /// the user's voice state was updated.
    pub session_id: String,
    /// Authentication token received from the platform's main gateway when
    /// the voice server was assigned.
    pub token: String,
    /// UserId of the client who is connecting.
    pub user_id: UserId,
}

/// Server's response to the client's Identify operation: the parameters of
/// the session's media path.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Ready {
    /// Number of milliseconds to wait between sending heartbeat messages.
    pub heartbeat_interval: u64,
    /// Destination media port on the voice server the client connected to.
    pub port: u16,
    /// Synchronisation source assigned by the server to this client.
    pub ssrc: u32,
}

/// Periodic message used to keep the websocket connection alive.
///
/// The payload is a millisecond timestamp which the server echoes back,
/// making it usable for latency measurement.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Heartbeat {
    /// Value echoed back by the server.
    pub nonce: u64,
}

/// Used to select the media transport protocol, reporting the client's
/// discovered external address.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct SelectProtocol {
    /// Client's response to the server's connection offer.
    pub data: ProtocolData,
    /// Transport protocol; `"udp"` is the only accepted value.
    pub protocol: String,
}

/// The client's response to a connection offer.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct ProtocolData {
    /// IP address of the client as seen by the server after hole-punching.
    pub address: IpAddr,
    /// The client's chosen transport mode.
    pub mode: String,
    /// UDP source port of the client as seen by the server, as above.
    pub port: u16,
}

/// Server's confirmation of the selected transport.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct SessionDescription {
    /// The accepted transport mode.
    pub mode: String,
}

/// Used to indicate that a user is speaking, or to inform the server that
/// the client is now speaking.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Speaking {
    /// Set to `Some(0)` when sending this message as a client; absent from
    /// server notifications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<u32>,
    /// Whether audio is being transmitted.
    pub speaking: bool,
    /// Synchronisation source of the speaker, included in messages received
    /// from the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssrc: Option<u32>,
    /// User the notification concerns, included in messages received from
    /// the server. Used alongside the SSRC to map media packets to their
    /// sender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
}
