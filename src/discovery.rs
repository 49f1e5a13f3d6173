//! NAT hole-punching: learning the externally visible address of the media
//! socket so the server can deliver audio straight back to it.

use crate::constants::{DISCOVERY_PACKET_LEN, DISCOVERY_TIMEOUT};
use crate::error::{Error, Result};

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::warn;

/// Sends the discovery probe for `ssrc` on the (already connected) media
/// socket and parses the server's view of this socket's public address.
///
/// The probe is a 70-byte packet opening with the big-endian SSRC; everything
/// past that must be zero. The reply reuses the layout, carrying the address
/// as a NUL-terminated ASCII string after the leading word and the port in
/// the final two bytes — little-endian, unlike every header field in the rest
/// of the protocol.
pub(crate) async fn discover_external_addr(udp: &UdpSocket, ssrc: u32) -> Result<SocketAddr> {
    let mut bytes = [0u8; DISCOVERY_PACKET_LEN];
    BigEndian::write_u32(&mut bytes[..4], ssrc);

    udp.send(&bytes).await.map_err(|e| {
        warn!("Discovery probe send failed: {:?}.", e);
        Error::UdpDiscoveryFailed
    })?;

    let len = match timeout(DISCOVERY_TIMEOUT, udp.recv(&mut bytes)).await {
        Ok(Ok(len)) => len,
        Ok(Err(e)) => {
            warn!("Discovery reply receive failed: {:?}.", e);
            return Err(Error::UdpDiscoveryFailed);
        },
        Err(_) => {
            warn!("Discovery reply did not arrive in time.");
            return Err(Error::UdpDiscoveryFailed);
        },
    };

    parse_reply(&bytes[..len])
}

fn parse_reply(bytes: &[u8]) -> Result<SocketAddr> {
    if bytes.len() != DISCOVERY_PACKET_LEN {
        return Err(Error::UdpDiscoveryFailed);
    }

    // The address begins after the leading word and runs until the first
    // NUL of the zero padding.
    let nul_index = bytes[4..]
        .iter()
        .position(|&b| b == 0)
        .ok_or(Error::UdpDiscoveryFailed)?;

    let address_str = std::str::from_utf8(&bytes[4..4 + nul_index])
        .map_err(|_| Error::UdpDiscoveryFailed)?;

    let address = IpAddr::from_str(address_str).map_err(|_| Error::UdpDiscoveryFailed)?;

    let port = LittleEndian::read_u16(&bytes[bytes.len() - 2..]);

    Ok(SocketAddr::new(address, port))
}
