//! Public lifecycle handle for one voice connection.

use crate::audio::{AudioReceiveHandler, AudioSendHandler};
use crate::config::Config;
use crate::error::{DisconnectReason, Error, Result};
use crate::info::ConnectionInfo;
use crate::tasks::{self, message::CoreMessage};

use flume::{Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A handle to one voice connection and the background tasks serving it.
///
/// Dropping the handle tears everything down; sessions are never shared
/// between handles, so a host driving several calls at once simply owns
/// several of these.
pub struct VoiceConnection {
    disconnects: Receiver<DisconnectReason>,
    sender: Sender<CoreMessage>,
    speaking: Arc<AtomicBool>,
}

impl VoiceConnection {
    /// Creates a new, unconnected handle and spawns its core task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: Config) -> Self {
        let (tx, rx) = flume::unbounded();
        let (disconnect_tx, disconnect_rx) = flume::unbounded();
        let speaking = Arc::new(AtomicBool::new(false));

        tasks::start(config, rx, tx.clone(), Arc::clone(&speaking), disconnect_tx);

        VoiceConnection {
            disconnects: disconnect_rx,
            sender: tx,
            speaking,
        }
    }

    /// Negotiates a session with the voice server described by `info`,
    /// returning once audio can flow in both directions.
    ///
    /// Resolves with an error if the handshake fails or exceeds the
    /// configured timeout; no partial connection is left running in that
    /// case. A failed handshake is never retried internally — the host must
    /// request a fresh session from the platform's main gateway and call
    /// this again.
    pub async fn connect(&self, info: ConnectionInfo) -> Result<()> {
        let (tx, rx) = flume::bounded(1);

        self.sender
            .send(CoreMessage::ConnectWithResult(info, tx))
            .map_err(|_| Error::InterconnectFailure)?;

        rx.recv_async().await.map_err(|_| Error::InterconnectFailure)?
    }

    /// Installs (or, with `None`, removes) the source of outgoing audio.
    ///
    /// May be called before or after [`connect`]; without a send handler the
    /// connection stays receive-only.
    ///
    /// [`connect`]: VoiceConnection::connect
    pub fn set_send_handler(&self, handler: Option<Box<dyn AudioSendHandler>>) {
        let _ = self.sender.send(CoreMessage::SetSendHandler(handler));
    }

    /// Installs (or, with `None`, removes) the consumer of incoming audio.
    ///
    /// May be called before or after [`connect`]; without a receive handler
    /// incoming datagrams are discarded unread.
    ///
    /// [`connect`]: VoiceConnection::connect
    pub fn set_receive_handler(&self, handler: Option<Box<dyn AudioReceiveHandler>>) {
        let _ = self.sender.send(CoreMessage::SetReceiveHandler(handler));
    }

    /// Whether this client is currently transmitting audio.
    ///
    /// Only the send loop writes this flag, so readers see a consistent view
    /// without locking.
    pub fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }

    /// Events fired when a live connection ends, one per connection:
    /// either the local [`close`], a server-side WebSocket close, or a dead
    /// media route. The host reacts by requesting a fresh session if it
    /// wants back in.
    ///
    /// [`close`]: VoiceConnection::close
    pub fn disconnects(&self) -> Receiver<DisconnectReason> {
        self.disconnects.clone()
    }

    /// Stops all loops, closes the media socket, and closes the WebSocket
    /// with a proper goodbye.
    ///
    /// Safe to call at any time, including repeatedly or while never having
    /// connected; returns once the core task has acknowledged the teardown.
    pub async fn close(&self) {
        let (tx, rx) = flume::bounded(1);

        if self.sender.send(CoreMessage::Disconnect(tx)).is_ok() {
            let _ = rx.recv_async().await;
        }
    }
}

impl Drop for VoiceConnection {
    fn drop(&mut self) {
        let _ = self.sender.send(CoreMessage::Poison);
    }
}
