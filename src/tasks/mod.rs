//! Long-lived background tasks: one core task per [`VoiceConnection`], plus
//! a fixed set of loops per live connection (signaling, media send, media
//! receive, UDP keepalive). All of them stop on a poison message and none
//! holds the process open.
//!
//! [`VoiceConnection`]: crate::VoiceConnection

pub(crate) mod message;

mod keepalive;
mod udp_rx;
mod udp_tx;
mod ws;

use crate::audio::{AudioReceiveHandler, AudioSendHandler};
use crate::config::Config;
use crate::connection::Connection;
use crate::error::{DisconnectReason, Error};

use flume::{Receiver, Sender};
use message::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{info, instrument};

pub(crate) fn start(
    config: Config,
    rx: Receiver<CoreMessage>,
    tx: Sender<CoreMessage>,
    speaking: Arc<AtomicBool>,
    disconnects: Sender<DisconnectReason>,
) {
    tokio::spawn(async move {
        info!("Voice core task started.");
        runner(config, rx, tx, speaking, disconnects).await;
        info!("Voice core task finished.");
    });
}

/// Handles on every loop of one live connection.
#[derive(Clone)]
pub(crate) struct Interconnect {
    pub keepalive: Sender<KeepaliveMessage>,
    pub udp_rx: Sender<UdpRxMessage>,
    pub udp_tx: Sender<UdpTxMessage>,
    pub ws: Sender<WsMessage>,
}

impl Interconnect {
    fn poison_all(&self) {
        let _ = self.ws.send(WsMessage::Poison);
        let _ = self.udp_tx.send(UdpTxMessage::Poison);
        let _ = self.udp_rx.send(UdpRxMessage::Poison);
        let _ = self.keepalive.send(KeepaliveMessage::Poison);
    }
}

#[instrument(skip_all)]
async fn runner(
    config: Config,
    rx: Receiver<CoreMessage>,
    tx: Sender<CoreMessage>,
    speaking: Arc<AtomicBool>,
    disconnects: Sender<DisconnectReason>,
) {
    let mut live: Option<Interconnect> = None;

    // Handlers parked here until a connection exists to own them.
    let mut send_handler: Option<Box<dyn AudioSendHandler>> = None;
    let mut receive_handler: Option<Box<dyn AudioReceiveHandler>> = None;

    loop {
        match rx.recv_async().await {
            Ok(CoreMessage::ConnectWithResult(info, result_tx)) => {
                // A fresh session always replaces any previous one.
                if let Some(interconnect) = live.take() {
                    interconnect.poison_all();
                    let _ = disconnects.send(DisconnectReason::Requested);
                }
                speaking.store(false, Ordering::SeqCst);

                let result = match timeout(config.connect_timeout, Connection::negotiate(&info))
                    .await
                {
                    Ok(Ok(connection)) => {
                        live = Some(start_loops(
                            connection,
                            &config,
                            tx.clone(),
                            send_handler.take(),
                            receive_handler.take(),
                            Arc::clone(&speaking),
                        ));
                        Ok(())
                    },
                    Ok(Err(e)) => Err(e),
                    Err(_) => Err(Error::ConnectTimeout),
                };

                // Other side may not be listening: this is fine.
                let _ = result_tx.send(result);
            },
            Ok(CoreMessage::Disconnect(done)) => {
                if let Some(interconnect) = live.take() {
                    interconnect.poison_all();
                    speaking.store(false, Ordering::SeqCst);
                    let _ = disconnects.send(DisconnectReason::Requested);
                }

                let _ = done.send(());
            },
            Ok(CoreMessage::SetSendHandler(handler)) => match &live {
                Some(interconnect) => {
                    let _ = interconnect.udp_tx.send(UdpTxMessage::SetHandler(handler));
                },
                None => send_handler = handler,
            },
            Ok(CoreMessage::SetReceiveHandler(handler)) => match &live {
                Some(interconnect) => {
                    let _ = interconnect.udp_rx.send(UdpRxMessage::SetHandler(handler));
                },
                None => receive_handler = handler,
            },
            Ok(CoreMessage::ConnectionLost(reason)) => {
                if let Some(interconnect) = live.take() {
                    interconnect.poison_all();
                    speaking.store(false, Ordering::SeqCst);
                    let _ = disconnects.send(reason);
                }
            },
            Err(_) | Ok(CoreMessage::Poison) => {
                break;
            },
        }
    }

    if let Some(interconnect) = live.take() {
        interconnect.poison_all();
    }
}

fn start_loops(
    connection: Connection,
    config: &Config,
    core: Sender<CoreMessage>,
    send_handler: Option<Box<dyn AudioSendHandler>>,
    receive_handler: Option<Box<dyn AudioReceiveHandler>>,
    speaking: Arc<AtomicBool>,
) -> Interconnect {
    let (ws_tx, ws_rx) = flume::unbounded();
    let (udp_tx_tx, udp_tx_rx) = flume::unbounded();
    let (udp_rx_tx, udp_rx_rx) = flume::unbounded();
    let (keepalive_tx, keepalive_rx) = flume::unbounded();

    let interconnect = Interconnect {
        keepalive: keepalive_tx,
        udp_rx: udp_rx_tx,
        udp_tx: udp_tx_tx,
        ws: ws_tx,
    };

    tokio::spawn(ws::runner(
        core.clone(),
        ws_rx,
        connection.client,
        interconnect.udp_rx.clone(),
        connection.heartbeat_interval,
    ));

    tokio::spawn(udp_tx::runner(
        core,
        udp_tx_rx,
        Arc::clone(&connection.udp),
        connection.ssrc,
        udp_tx::new_encoder(config.bitrate),
        send_handler,
        speaking,
        interconnect.ws.clone(),
    ));

    tokio::spawn(udp_rx::runner(
        udp_rx_rx,
        Arc::clone(&connection.udp),
        receive_handler,
    ));

    tokio::spawn(keepalive::runner(keepalive_rx, connection.udp));

    interconnect
}
