//! Paced media send loop: poll the send handler, encode, frame, transmit —
//! one packet per frame interval.

use super::message::*;
use crate::audio::AudioSendHandler;
use crate::constants::{RTP_HEADER_LEN, SAMPLE_RATE, TIMESTEP_LENGTH, VOICE_PACKET_MAX};
use crate::error::DisconnectReason;
use crate::rtp::{self, StreamTiming};

use audiopus::coder::Encoder as OpusEncoder;
use flume::{Receiver, Sender, TryRecvError};
use std::io::ErrorKind;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::time::{self, Instant};
use tracing::{error, info, instrument, warn};

pub(crate) struct UdpTx {
    core: Sender<CoreMessage>,
    deadline: Instant,
    encoder: OpusEncoder,
    handler: Option<Box<dyn AudioSendHandler>>,
    packet: [u8; VOICE_PACKET_MAX],
    rx: Receiver<UdpTxMessage>,
    speaking: bool,
    speaking_flag: Arc<AtomicBool>,
    ssrc: u32,
    timing: StreamTiming,
    udp: Arc<UdpSocket>,
    ws: Sender<WsMessage>,
}

impl UdpTx {
    async fn run(&mut self) {
        'runner: loop {
            loop {
                match self.rx.try_recv() {
                    Ok(UdpTxMessage::SetHandler(h)) => {
                        self.handler = h;
                    },
                    Err(TryRecvError::Disconnected) | Ok(UdpTxMessage::Poison) => {
                        break 'runner;
                    },
                    Err(TryRecvError::Empty) => {
                        break;
                    },
                }
            }

            if let Err(e) = self.cycle().await {
                error!("Fatal media send error: {:?}.", e);
                let _ = self
                    .core
                    .send(CoreMessage::ConnectionLost(DisconnectReason::TransportFailed));
                break;
            }
        }

        self.set_speaking(false);
    }

    async fn cycle(&mut self) -> Result<(), std::io::Error> {
        let frame = match self.handler.as_mut() {
            Some(handler) => {
                if handler.can_provide() {
                    handler.provide_frame()
                } else {
                    None
                }
            },
            _ => None,
        };

        let frame = match frame {
            Some(frame) => frame,
            None => {
                // One empty poll ends the burst.
                self.set_speaking(false);
                self.march_deadline().await;

                return Ok(());
            },
        };

        // The server gates forwarding on the speaking state, so the
        // transition must be signalled before the burst's first packet.
        self.set_speaking(true);

        let payload_len = match self
            .encoder
            .encode(&frame.samples[..], &mut self.packet[RTP_HEADER_LEN..])
        {
            Ok(len) => len,
            Err(e) => {
                warn!("Frame encode failure: {:?}.", e);
                self.march_deadline().await;

                return Ok(());
            },
        };

        rtp::write_header(
            &mut self.packet,
            self.timing.sequence,
            self.timing.timestamp,
            self.ssrc,
        );

        self.march_deadline().await;

        match self.udp.send(&self.packet[..RTP_HEADER_LEN + payload_len]).await {
            Ok(_) => {},
            Err(e) if is_unreachable(&e) => return Err(e),
            Err(e) => {
                warn!("Media packet send error: {:?}.", e);
            },
        }

        self.timing.advance();

        Ok(())
    }

    fn set_speaking(&mut self, state: bool) {
        if self.speaking == state {
            return;
        }

        self.speaking = state;
        self.speaking_flag.store(state, Ordering::SeqCst);
        let _ = self.ws.send(WsMessage::Speaking(state));
    }

    /// Sleeps out the rest of the current frame interval, then pushes the
    /// deadline one interval ahead. Anchoring on the previous deadline
    /// rather than on `now` keeps scheduling jitter from accumulating over
    /// the life of the stream.
    async fn march_deadline(&mut self) {
        time::sleep_until(self.deadline).await;
        self.deadline += TIMESTEP_LENGTH;
    }
}

fn is_unreachable(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::ConnectionRefused | ErrorKind::HostUnreachable | ErrorKind::NetworkUnreachable
    )
}

#[allow(clippy::too_many_arguments)]
#[instrument(skip_all)]
pub(crate) async fn runner(
    core: Sender<CoreMessage>,
    rx: Receiver<UdpTxMessage>,
    udp: Arc<UdpSocket>,
    ssrc: u32,
    encoder: OpusEncoder,
    handler: Option<Box<dyn AudioSendHandler>>,
    speaking_flag: Arc<AtomicBool>,
    ws: Sender<WsMessage>,
) {
    info!("Media send loop started.");

    let mut state = UdpTx {
        core,
        deadline: Instant::now(),
        encoder,
        handler,
        packet: [0u8; VOICE_PACKET_MAX],
        rx,
        speaking: false,
        speaking_flag,
        ssrc,
        timing: StreamTiming::default(),
        udp,
        ws,
    };

    state.run().await;

    info!("Media send loop stopped.");
}

pub(crate) fn new_encoder(bitrate: audiopus::Bitrate) -> OpusEncoder {
    let mut encoder = OpusEncoder::new(
        SAMPLE_RATE,
        audiopus::Channels::Stereo,
        audiopus::Application::Audio,
    )
    .expect("Failed to create encoder with known-good parameters.");

    if let Err(e) = encoder.set_bitrate(bitrate) {
        warn!("Bitrate set unsuccessfully: {:?}", e);
    }

    encoder
}
