//! Steady-state signaling loop: heartbeats, server notifications, and
//! client speaking updates over the negotiated WebSocket.

use super::message::*;
use crate::error::DisconnectReason;
use crate::model::payload::{Heartbeat, Speaking};
use crate::model::Event;
use crate::ws::{Error as WsError, ReceiverExt, SenderExt, WsStream};

use flume::{Receiver, Sender};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::{self, Instant};
use tracing::{error, info, instrument, trace, warn};

struct Signaling {
    client: WsStream,
    core: Sender<CoreMessage>,
    heartbeat_interval: Duration,
    last_heartbeat: Option<(u64, Instant)>,
    rx: Receiver<WsMessage>,
    speaking: bool,
    udp_rx: Sender<UdpRxMessage>,
}

impl Signaling {
    async fn run(&mut self) {
        let mut next_heartbeat = Instant::now() + self.heartbeat_interval;

        loop {
            let mut ws_error = false;

            let hb = time::sleep_until(next_heartbeat);

            tokio::select! {
                _ = hb => {
                    // Failure to heartbeat is not treated as fatal on its
                    // own; the connection stands until the socket itself is
                    // observed dead.
                    if let Err(e) = self.send_heartbeat().await {
                        warn!("Heartbeat send failure {:?}.", e);
                    }
                    next_heartbeat = Instant::now() + self.heartbeat_interval;
                }
                ws_msg = self.client.recv_json_no_timeout() => {
                    ws_error = match ws_msg {
                        Err(WsError::Json(e)) => {
                            warn!("Unexpected JSON {:?}.", e);
                            false
                        },
                        Err(WsError::WsClosed(frame)) => {
                            info!("Signaling socket closed by remote: {:?}.", frame);
                            true
                        },
                        Err(e) => {
                            error!("Error processing ws {:?}.", e);
                            true
                        },
                        Ok(Some(msg)) => {
                            self.process_ws(msg);
                            false
                        },
                        Ok(None) => false,
                    };
                }
                inner_msg = self.rx.recv_async() => {
                    match inner_msg {
                        Ok(WsMessage::Speaking(state)) => {
                            ws_error = self.send_speaking(state).await;
                        },
                        Err(_) | Ok(WsMessage::Poison) => {
                            // Voluntary leave: close the socket properly so
                            // the server drops the session at once.
                            let _ = self.client.close(None).await;
                            break;
                        },
                    }
                }
            }

            if ws_error {
                let _ = self
                    .core
                    .send(CoreMessage::ConnectionLost(DisconnectReason::WsClosed));
                break;
            }
        }
    }

    async fn send_heartbeat(&mut self) -> crate::ws::Result<()> {
        let nonce = unix_millis();
        self.last_heartbeat = Some((nonce, Instant::now()));

        self.client
            .send_json(&Event::from(Heartbeat { nonce }))
            .await
    }

    async fn send_speaking(&mut self, state: bool) -> bool {
        if self.speaking == state {
            return false;
        }

        self.speaking = state;
        info!("Speaking update: {}", state);

        let status = self
            .client
            .send_json(&Event::from(Speaking {
                delay: Some(0),
                speaking: state,
                ssrc: None,
                user_id: None,
            }))
            .await;

        match status {
            Err(e) => {
                error!("Issue sending speaking update {:?}.", e);
                true
            },
            _ => false,
        }
    }

    fn process_ws(&mut self, value: Event) {
        match value {
            Event::Speaking(ev) => {
                if let (Some(ssrc), Some(user_id)) = (ev.ssrc, ev.user_id) {
                    let _ = self.udp_rx.send(UdpRxMessage::SpeakingUpdate {
                        ssrc,
                        user_id,
                        speaking: ev.speaking,
                    });
                } else {
                    warn!("Speaking notification without attribution: {:?}.", ev);
                }
            },
            Event::Heartbeat(ev) => {
                if let Some((nonce, sent_at)) = self.last_heartbeat.take() {
                    if ev.nonce == nonce {
                        trace!("Heartbeat echo received after {:?}.", sent_at.elapsed());
                    } else {
                        warn!(
                            "Heartbeat nonce mismatch! Expected {}, saw {}.",
                            nonce, ev.nonce
                        );
                    }
                }
            },
            other => {
                trace!("Received other signaling event: {:?}", other);
            },
        }
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[instrument(skip(core, rx, client, udp_rx))]
pub(crate) async fn runner(
    core: Sender<CoreMessage>,
    rx: Receiver<WsMessage>,
    client: WsStream,
    udp_rx: Sender<UdpRxMessage>,
    heartbeat_interval: Duration,
) {
    info!("Signaling loop started.");

    let mut signaling = Signaling {
        client,
        core,
        heartbeat_interval,
        last_heartbeat: None,
        rx,
        speaking: false,
        udp_rx,
    };

    signaling.run().await;

    info!("Signaling loop finished.");
}
