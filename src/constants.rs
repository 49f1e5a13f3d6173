//! Constants governing audio framing, pacing, and keepalive behaviour.

use audiopus::{Bitrate, SampleRate};
use std::time::Duration;

/// Sample rate of all audio carried over the media path.
pub const SAMPLE_RATE: SampleRate = SampleRate::Hz48000;

/// Sample rate of all audio carried over the media path, as a raw integer.
pub const SAMPLE_RATE_RAW: usize = 48_000;

/// Number of audio frames/packets to be sent per second.
pub const AUDIO_FRAME_RATE: usize = 50;

/// Length of time between any two audio frames.
pub const TIMESTEP_LENGTH: Duration = Duration::from_millis(1000 / AUDIO_FRAME_RATE as u64);

/// Number of samples in one complete frame of audio per channel.
pub const MONO_FRAME_SIZE: usize = SAMPLE_RATE_RAW / AUDIO_FRAME_RATE;

/// Number of individual samples in one complete frame of stereo audio.
pub const STEREO_FRAME_SIZE: usize = 2 * MONO_FRAME_SIZE;

/// Default bitrate for encoded audio.
pub const DEFAULT_BITRATE: Bitrate = Bitrate::BitsPerSecond(128_000);

/// Length of the fixed header opening every media packet.
pub const RTP_HEADER_LEN: usize = 12;

/// Fixed version/flags byte of every media packet.
pub const RTP_VERSION_FLAGS: u8 = 0x80;

/// Fixed payload-type byte of every media packet.
pub const RTP_PAYLOAD_TYPE: u8 = 0x78;

/// Upper bound on one encoded frame; the codec stays well below this at any
/// usable bitrate.
pub const MAX_OPUS_FRAME_SIZE: usize = 4000;

/// Size of the scratch buffer used to assemble outgoing media packets.
pub const VOICE_PACKET_MAX: usize = RTP_HEADER_LEN + MAX_OPUS_FRAME_SIZE;

/// Size of the receive buffer for incoming datagrams; comfortably holds one
/// frame of encoded audio at the bitrates the servers emit.
pub const RECV_BUFFER_SIZE: usize = 1920;

/// Delay between sends of UDP keepalive packets.
///
/// Observed server behaviour expects these every 5 seconds irrespective of
/// outgoing media traffic, to hold the NAT binding open.
pub const UDP_KEEPALIVE_GAP: Duration = Duration::from_secs(5);

/// Tag byte opening every UDP keepalive packet.
pub const UDP_KEEPALIVE_TAG: u8 = 0xC9;

/// Size of a UDP keepalive packet: one tag byte plus an 8-byte counter.
pub const UDP_KEEPALIVE_LEN: usize = 9;

/// Size of both halves of the external-address discovery exchange.
pub const DISCOVERY_PACKET_LEN: usize = 70;

/// How long the discovery reply may take before the attempt is abandoned.
pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Default bound on how long connection establishment may take end-to-end.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Transport mode requested during protocol selection.
pub const TRANSPORT_MODE: &str = "plain";
