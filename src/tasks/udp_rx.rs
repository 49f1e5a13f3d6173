//! Media receive loop: de-frame, decode, attribute, and dispatch incoming
//! audio, plus the fixed-cadence combined-audio tick.

use super::message::*;
use crate::audio::{AudioFrame, AudioReceiveHandler};
use crate::constants::{RECV_BUFFER_SIZE, SAMPLE_RATE, TIMESTEP_LENGTH};
use crate::model::id::UserId;
use crate::rtp::{self, RtpPacket};

use audiopus::coder::Decoder as OpusDecoder;
use audiopus::Channels;
use flume::Receiver;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, instrument, warn};

pub(crate) struct UdpRx {
    decoder_map: HashMap<u32, OpusDecoder>,
    handler: Option<Box<dyn AudioReceiveHandler>>,
    packet_buffer: [u8; RECV_BUFFER_SIZE],
    rx: Receiver<UdpRxMessage>,
    udp: Arc<UdpSocket>,
    user_map: HashMap<u32, UserId>,
    /// Most recent decoded frame per SSRC within the current mixing window.
    window: HashMap<u32, AudioFrame>,
}

impl UdpRx {
    async fn run(&mut self) {
        let mut mix_interval = time::interval(TIMESTEP_LENGTH);
        mix_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                result = self.udp.recv(&mut self.packet_buffer[..]) => {
                    match result {
                        Ok(len) => self.process_datagram(len),
                        Err(e) => {
                            // Incoming traffic is best-effort; a failed poll
                            // never tears the connection down.
                            error!("Error polling media socket: {:?}.", e);
                        },
                    }
                }
                _ = mix_interval.tick() => {
                    self.dispatch_combined();
                }
                msg = self.rx.recv_async() => {
                    match msg {
                        Ok(UdpRxMessage::SetHandler(h)) => {
                            self.handler = h;
                        },
                        Ok(UdpRxMessage::SpeakingUpdate { ssrc, user_id, speaking }) => {
                            if speaking {
                                self.user_map.insert(ssrc, user_id);
                            }
                            if let Some(handler) = self.handler.as_mut() {
                                handler.on_user_speaking_changed(user_id, speaking);
                            }
                        },
                        Err(_) | Ok(UdpRxMessage::Poison) => break,
                    }
                }
            }
        }
    }

    fn process_datagram(&mut self, len: usize) {
        // Datagrams are adversarial input: anything that does not parse is
        // dropped without further effect.
        let bytes = &self.packet_buffer[..len];

        if !rtp::looks_like_media(bytes) {
            return;
        }

        let packet = match RtpPacket::decode(bytes) {
            Ok(packet) => packet,
            Err(_) => return,
        };

        let (wants_combined, wants_per_user) = match self.handler.as_mut() {
            Some(handler) => (handler.wants_combined(), handler.wants_per_user()),
            None => return,
        };

        if !wants_combined && !wants_per_user {
            return;
        }

        let decoder = self.decoder_map.entry(packet.ssrc).or_insert_with(|| {
            OpusDecoder::new(SAMPLE_RATE, Channels::Stereo)
                .expect("Failed to create decoder for incoming stream.")
        });

        let mut frame = AudioFrame::silence();
        if let Err(e) = decoder.decode(Some(&packet.payload[..]), &mut frame.samples[..], false) {
            warn!("Failed to decode incoming frame: {:?}.", e);
            return;
        }

        self.window.insert(packet.ssrc, frame);

        if wants_per_user {
            if let Some(&user_id) = self.user_map.get(&packet.ssrc) {
                if let Some(handler) = self.handler.as_mut() {
                    handler.on_user_audio(user_id, &frame);
                }
            }
        }
    }

    fn dispatch_combined(&mut self) {
        let Some(handler) = self.handler.as_mut() else {
            self.window.clear();
            return;
        };

        if !handler.wants_combined() {
            self.window.clear();
            return;
        }

        let mut mixed = AudioFrame::silence();
        for frame in self.window.values() {
            for (into, &sample) in mixed.samples.iter_mut().zip(frame.samples.iter()) {
                *into = into.saturating_add(sample);
            }
        }

        handler.on_combined_audio(&mixed);
        self.window.clear();
    }
}

#[instrument(skip_all)]
pub(crate) async fn runner(
    rx: Receiver<UdpRxMessage>,
    udp: Arc<UdpSocket>,
    handler: Option<Box<dyn AudioReceiveHandler>>,
) {
    info!("Media receive loop started.");

    let mut state = UdpRx {
        decoder_map: Default::default(),
        handler,
        packet_buffer: [0u8; RECV_BUFFER_SIZE],
        rx,
        udp,
        user_map: Default::default(),
        window: Default::default(),
    };

    state.run().await;

    info!("Media receive loop stopped.");
}
