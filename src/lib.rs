//! # Warbler
//!
//! An async client for a chat platform's real-time voice transport. The
//! library negotiates a signaling session over a WebSocket, discovers the
//! client's externally reachable UDP address via the platform's
//! hole-punching handshake, then streams and receives 20ms frames of
//! Opus-encoded audio over UDP — keeping both paths alive with periodic
//! keepalives.
//!
//! The host application supplies the session parameters (endpoint, session
//! id, token) it received from the platform's main gateway, and plugs audio
//! in and out through two small traits:
//!
//! * [`AudioSendHandler`] — polled once per frame interval for outgoing
//!   audio; speaking-state notifications are derived from whether it
//!   delivers.
//! * [`AudioReceiveHandler`] — receives decoded per-user audio, a combined
//!   mix on a fixed 20ms cadence, and speaking-state changes of other
//!   participants.
//!
//! Everything else — pacing, sequence/timestamp bookkeeping, heartbeats,
//! NAT keepalives, teardown — is handled by a small set of background tasks
//! owned by each [`VoiceConnection`].

#![deny(rustdoc::broken_intra_doc_links)]

mod audio;
mod config;
mod connection;
pub mod constants;
mod discovery;
mod driver;
mod error;
mod info;
pub mod model;
pub mod rtp;
mod tasks;
mod ws;

pub use audiopus::Bitrate;

pub use crate::audio::{AudioFrame, AudioReceiveHandler, AudioSendHandler};
pub use crate::config::Config;
pub use crate::driver::VoiceConnection;
pub use crate::error::{DisconnectReason, Error, Result};
pub use crate::ws::Error as WsError;
pub use crate::info::ConnectionInfo;
pub use crate::model::id::{ChannelId, GuildId, UserId};
