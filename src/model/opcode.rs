use serde_repr::{Deserialize_repr, Serialize_repr};

/// An enum representing the signaling opcodes.
#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Deserialize_repr, Serialize_repr,
)]
#[non_exhaustive]
#[repr(u8)]
pub enum Opcode {
    /// Used to begin a voice websocket connection.
    Identify = 0,
    /// Used to select the media transport protocol.
    SelectProtocol = 1,
    /// Server's response to Identify: per-session media-path parameters.
    Ready = 2,
    /// Used to keep the websocket connection alive; echoed by the server.
    Heartbeat = 3,
    /// Server's confirmation of the selected transport.
    SessionDescription = 4,
    /// Used to indicate which users are speaking, or to inform the server
    /// that the client is now speaking.
    Speaking = 5,
}
