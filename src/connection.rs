//! Setup-phase negotiation with a voice server.
//!
//! One WebSocket connection walks through identification, media-path
//! discovery, and protocol selection; the negotiated pieces are then handed
//! over to the long-lived loops in [`crate::tasks`].

use crate::constants::TRANSPORT_MODE;
use crate::discovery;
use crate::error::{Error, Result};
use crate::info::ConnectionInfo;
use crate::model::payload::{Identify, ProtocolData, SelectProtocol};
use crate::model::Event;
use crate::ws::{self, ReceiverExt, SenderExt, WsStream};

use std::sync::Arc;
use std::time::Duration;
use tokio::net::{lookup_host, UdpSocket};
use tracing::{debug, info};
use url::Url;

/// Everything a freshly negotiated session hands to the steady-state loops.
pub(crate) struct Connection {
    pub(crate) client: WsStream,
    pub(crate) heartbeat_interval: Duration,
    pub(crate) ssrc: u32,
    pub(crate) udp: Arc<UdpSocket>,
}

impl Connection {
    pub(crate) async fn negotiate(info: &ConnectionInfo) -> Result<Connection> {
        let url = generate_url(&info.endpoint)?;

        let mut client = ws::create_client(url).await?;

        client
            .send_json(&Event::from(Identify {
                server_id: info.guild_id,
                session_id: info.session_id.clone(),
                token: info.token.clone(),
                user_id: info.user_id,
            }))
            .await?;

        let ready = loop {
            let value = match client.recv_json().await? {
                Some(value) => value,
                None => continue,
            };

            match value {
                Event::Ready(r) => break r,
                other => {
                    debug!("Expected ready; got: {:?}", other);

                    return Err(Error::SignalingProtocol);
                },
            }
        };

        let destination = lookup_host((endpoint_host(&info.endpoint), ready.port))
            .await?
            .next()
            .ok_or(Error::HostnameResolve)?;

        let udp = UdpSocket::bind("0.0.0.0:0").await?;
        udp.connect(destination).await?;

        let external_addr = discovery::discover_external_addr(&udp, ready.ssrc).await?;

        client
            .send_json(&Event::from(SelectProtocol {
                protocol: "udp".into(),
                data: ProtocolData {
                    address: external_addr.ip(),
                    mode: TRANSPORT_MODE.into(),
                    port: external_addr.port(),
                },
            }))
            .await?;

        loop {
            let value = match client.recv_json().await? {
                Some(value) => value,
                None => continue,
            };

            match value {
                Event::SessionDescription(desc) => {
                    if desc.mode != TRANSPORT_MODE {
                        return Err(Error::SignalingProtocol);
                    }

                    break;
                },
                // Participant chatter may already be flowing; it carries no
                // state for this handshake.
                Event::Speaking(ev) => {
                    debug!("Speaking notification during handshake: {:?}", ev);
                },
                other => {
                    debug!("Expected session description; got: {:?}", other);

                    return Err(Error::SignalingProtocol);
                },
            }
        }

        info!(
            "Negotiated voice session with {} (media to {}, reachable at {})",
            info.endpoint, destination, external_addr
        );

        Ok(Connection {
            client,
            heartbeat_interval: Duration::from_millis(ready.heartbeat_interval),
            ssrc: ready.ssrc,
            udp: Arc::new(udp),
        })
    }
}

fn generate_url(endpoint: &str) -> Result<Url> {
    // An explicit scheme is honoured as given; bare `host[:port]` endpoints,
    // the form the main gateway hands out, always dial TLS.
    if endpoint.starts_with("ws://") || endpoint.starts_with("wss://") {
        return Url::parse(endpoint).or(Err(Error::EndpointUrl));
    }

    let mut endpoint = endpoint.to_owned();
    if endpoint.ends_with(":80") {
        let len = endpoint.len();

        endpoint.truncate(len - 3);
    }

    Url::parse(&format!("wss://{endpoint}")).or(Err(Error::EndpointUrl))
}

fn endpoint_host(endpoint: &str) -> &str {
    let host = endpoint
        .trim_start_matches("wss://")
        .trim_start_matches("ws://");
    let host = host.split('/').next().unwrap_or(host);

    host.split(':').next().unwrap_or(host)
}
