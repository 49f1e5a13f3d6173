//! UDP keepalive ticker, holding the NAT binding open between media bursts.

use super::message::KeepaliveMessage;
use crate::constants::{UDP_KEEPALIVE_GAP, UDP_KEEPALIVE_LEN, UDP_KEEPALIVE_TAG};

use byteorder::{BigEndian, ByteOrder};
use flume::Receiver;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::time::{timeout_at, Instant};
use tracing::{info, instrument, trace, warn};

#[instrument(skip_all)]
pub(crate) async fn runner(rx: Receiver<KeepaliveMessage>, udp: Arc<UdpSocket>) {
    info!("UDP keepalive started.");

    let mut packet = [0u8; UDP_KEEPALIVE_LEN];
    packet[0] = UDP_KEEPALIVE_TAG;
    let mut counter: u64 = 0;

    let mut ka_time = Instant::now() + UDP_KEEPALIVE_GAP;

    loop {
        match timeout_at(ka_time, rx.recv_async()).await {
            Err(_) => {
                trace!("Sending UDP keepalive {}.", counter);
                BigEndian::write_u64(&mut packet[1..], counter);
                counter = counter.wrapping_add(1);

                if let Err(e) = udp.send(&packet).await {
                    warn!("UDP keepalive send error: {:?}.", e);
                }
                ka_time += UDP_KEEPALIVE_GAP;
            },
            Ok(Err(_)) | Ok(Ok(KeepaliveMessage::Poison)) => {
                break;
            },
        }
    }

    info!("UDP keepalive stopped.");
}
