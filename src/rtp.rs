//! Lossless conversion between media packets and their wire form.
//!
//! Every media packet opens with the same fixed 12-byte header: a constant
//! version/flags byte, a constant payload-type byte, then the sequence,
//! timestamp, and synchronisation source in big-endian order. Everything
//! after the header is opaque encoded audio.

use crate::constants::{MONO_FRAME_SIZE, RTP_HEADER_LEN, RTP_PAYLOAD_TYPE, RTP_VERSION_FLAGS};
use byteorder::{BigEndian, ByteOrder};
use std::error::Error as StdError;
use std::fmt;

/// A parsed (or to-be-sent) media packet.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RtpPacket {
    /// Per-packet counter, wrapping modulo 2^16.
    pub sequence: u16,
    /// Sample clock for the first sample of this packet, wrapping modulo 2^32.
    pub timestamp: u32,
    /// Synchronisation source of the sender.
    pub ssrc: u32,
    /// Opaque encoded audio.
    pub payload: Vec<u8>,
}

impl RtpPacket {
    /// Serialises this packet into `header + payload` wire form.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; RTP_HEADER_LEN + self.payload.len()];
        write_header(&mut bytes, self.sequence, self.timestamp, self.ssrc);
        bytes[RTP_HEADER_LEN..].copy_from_slice(&self.payload);

        bytes
    }

    /// Parses a datagram into its header fields and payload.
    ///
    /// Anything shorter than the fixed header is rejected; the payload may be
    /// empty.
    pub fn decode(bytes: &[u8]) -> Result<RtpPacket, MalformedPacket> {
        if bytes.len() < RTP_HEADER_LEN {
            return Err(MalformedPacket);
        }

        Ok(RtpPacket {
            sequence: BigEndian::read_u16(&bytes[2..4]),
            timestamp: BigEndian::read_u32(&bytes[4..8]),
            ssrc: BigEndian::read_u32(&bytes[8..12]),
            payload: bytes[RTP_HEADER_LEN..].to_vec(),
        })
    }
}

/// Writes the fixed header into the first 12 bytes of `packet`.
///
/// Used by the send loop to stamp its preallocated packet buffer without
/// building an [`RtpPacket`] per frame.
pub fn write_header(packet: &mut [u8], sequence: u16, timestamp: u32, ssrc: u32) {
    packet[0] = RTP_VERSION_FLAGS;
    packet[1] = RTP_PAYLOAD_TYPE;
    BigEndian::write_u16(&mut packet[2..4], sequence);
    BigEndian::write_u32(&mut packet[4..8], timestamp);
    BigEndian::write_u32(&mut packet[8..12], ssrc);
}

/// Whether a received datagram opens with the fixed media header bytes.
///
/// Keepalive echoes and other stray traffic fail this check and are dropped
/// before any parse attempt.
pub fn looks_like_media(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == RTP_VERSION_FLAGS && bytes[1] == RTP_PAYLOAD_TYPE
}

/// Header counter state for one outgoing stream.
///
/// The sequence steps by one per packet and the timestamp by one frame's
/// worth of samples, both wrapping; neither depends on wall-clock time.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StreamTiming {
    /// Sequence of the next packet to send.
    pub sequence: u16,
    /// Timestamp of the next packet to send.
    pub timestamp: u32,
}

impl StreamTiming {
    /// Steps both counters past one sent packet.
    pub fn advance(&mut self) {
        self.sequence = self.sequence.wrapping_add(1);
        self.timestamp = self.timestamp.wrapping_add(MONO_FRAME_SIZE as u32);
    }
}

/// Error returned when decoding a datagram shorter than the fixed header.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MalformedPacket;

impl fmt::Display for MalformedPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("datagram too short to hold a media packet header")
    }
}

impl StdError for MalformedPacket {}
