#![allow(dead_code)]

//! An in-process voice server standing in for the real thing: one WebSocket
//! endpoint walking the signaling handshake, and one UDP socket answering
//! address discovery and recording everything sent to it afterwards.

use flume::{Receiver, Sender};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, UdpSocket};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

pub struct MockOptions {
    pub ssrc: u32,
    pub external_ip: String,
    pub external_port: u16,
    pub heartbeat_interval: u64,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            ssrc: 12345,
            external_ip: "203.0.113.9".to_owned(),
            external_port: 6000,
            heartbeat_interval: 45_000,
        }
    }
}

pub struct MockVoiceServer {
    /// Endpoint string to hand to the client, plaintext scheme included.
    pub endpoint: String,
    /// Server-to-client signaling injection: anything sent here goes out on
    /// the WebSocket verbatim.
    pub inject: Sender<Value>,
    /// Every datagram seen after the discovery exchange.
    pub packets: Receiver<Vec<u8>>,
    /// SSRC and sender address of the discovery probe.
    pub probes: Receiver<(u32, SocketAddr)>,
    /// Every signaling message received from the client, as raw JSON.
    pub signals: Receiver<Value>,
    /// The server side of the media path, usable for injecting datagrams.
    pub udp: Arc<UdpSocket>,
}

impl MockVoiceServer {
    pub async fn spawn(options: MockOptions) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let ws_addr = listener.local_addr().unwrap();

        let udp = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let udp_port = udp.local_addr().unwrap().port();

        let (signal_tx, signals) = flume::unbounded();
        let (packet_tx, packets) = flume::unbounded();
        let (probe_tx, probes) = flume::unbounded();

        let media_socket = Arc::clone(&udp);
        let external_ip = options.external_ip.clone();
        let external_port = options.external_port;
        tokio::spawn(async move {
            let mut buf = [0u8; 2048];

            let Ok((len, peer)) = media_socket.recv_from(&mut buf).await else {
                return;
            };
            if len == 70 {
                let ssrc = u32::from_be_bytes(buf[..4].try_into().unwrap());
                let _ = probe_tx.send((ssrc, peer));

                let mut reply = [0u8; 70];
                reply[4..4 + external_ip.len()].copy_from_slice(external_ip.as_bytes());
                reply[68..].copy_from_slice(&external_port.to_le_bytes());
                let _ = media_socket.send_to(&reply, peer).await;
            }

            loop {
                let Ok((len, _)) = media_socket.recv_from(&mut buf).await else {
                    return;
                };
                if packet_tx.send(buf[..len].to_vec()).is_err() {
                    return;
                }
            }
        });

        let (inject_tx, inject_rx) = flume::unbounded::<Value>();

        let ssrc = options.ssrc;
        let heartbeat_interval = options.heartbeat_interval;
        tokio::spawn(async move {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                return;
            };

            loop {
                tokio::select! {
                    msg = ws.next() => {
                        let Some(Ok(msg)) = msg else { return };
                        let Message::Text(text) = msg else { continue };

                        let value: Value = serde_json::from_str(&text).unwrap();
                        let op = value["op"].as_u64().unwrap_or(u64::MAX);
                        let _ = signal_tx.send(value);

                        match op {
                            0 => {
                                let ready = json!({
                                    "op": 2,
                                    "d": {
                                        "ssrc": ssrc,
                                        "port": udp_port,
                                        "heartbeat_interval": heartbeat_interval,
                                    }
                                });
                                let _ = ws.send(Message::Text(ready.to_string())).await;
                            },
                            1 => {
                                let description =
                                    json!({ "op": 4, "d": { "mode": "plain" } });
                                let _ = ws.send(Message::Text(description.to_string())).await;
                            },
                            3 => {
                                let _ = ws.send(Message::Text(text)).await;
                            },
                            _ => {},
                        }
                    }
                    value = inject_rx.recv_async() => {
                        let Ok(value) = value else { return };
                        let _ = ws.send(Message::Text(value.to_string())).await;
                    }
                }
            }
        });

        MockVoiceServer {
            endpoint: format!("ws://{ws_addr}"),
            inject: inject_tx,
            packets,
            probes,
            signals,
            udp,
        }
    }

    /// Next signaling message from the client with the given opcode,
    /// discarding others.
    pub async fn expect_signal(&self, op: u64) -> Value {
        loop {
            let value = timeout(Duration::from_secs(10), self.signals.recv_async())
                .await
                .expect("timed out waiting for a signaling message")
                .expect("mock signaling channel hung up");

            if value["op"] == op {
                return value;
            }
        }
    }

    /// Next media datagram from the client, discarding keepalives and other
    /// non-media traffic.
    pub async fn next_media_packet(&self) -> Vec<u8> {
        loop {
            let bytes = timeout(Duration::from_secs(10), self.packets.recv_async())
                .await
                .expect("timed out waiting for a media packet")
                .expect("mock media channel hung up");

            if bytes.len() >= 2 && bytes[0] == 0x80 && bytes[1] == 0x78 {
                return bytes;
            }
        }
    }
}
