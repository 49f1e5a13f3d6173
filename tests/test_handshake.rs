mod common;

use common::{MockOptions, MockVoiceServer};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use warbler::{
    AudioFrame, AudioReceiveHandler, ChannelId, Config, ConnectionInfo, DisconnectReason, GuildId,
    UserId, VoiceConnection,
};

fn session_info(endpoint: &str) -> ConnectionInfo {
    ConnectionInfo {
        channel_id: ChannelId(42),
        endpoint: endpoint.to_owned(),
        guild_id: GuildId(1),
        session_id: "abc".to_owned(),
        token: "tok".to_owned(),
        user_id: UserId(7),
    }
}

struct UserAudioCounter {
    frames: Arc<AtomicUsize>,
}

impl AudioReceiveHandler for UserAudioCounter {
    fn wants_combined(&mut self) -> bool {
        false
    }

    fn wants_per_user(&mut self) -> bool {
        true
    }

    fn on_combined_audio(&mut self, _mixed: &AudioFrame) {}

    fn on_user_audio(&mut self, _user_id: UserId, _frame: &AudioFrame) {
        self.frames.fetch_add(1, Ordering::SeqCst);
    }

    fn on_user_speaking_changed(&mut self, _user_id: UserId, _speaking: bool) {}
}

#[tokio::test]
async fn handshake_negotiates_media_path() {
    let mock = MockVoiceServer::spawn(MockOptions {
        ssrc: 12345,
        external_ip: "203.0.113.9".to_owned(),
        external_port: 6000,
        ..Default::default()
    })
    .await;

    let connection = VoiceConnection::new(Config::default());
    connection.connect(session_info(&mock.endpoint)).await.unwrap();

    let identify = mock.expect_signal(0).await;
    assert_eq!(identify["d"]["server_id"], "1");
    assert_eq!(identify["d"]["session_id"], "abc");
    assert_eq!(identify["d"]["token"], "tok");
    assert_eq!(identify["d"]["user_id"], "7");

    // The discovery probe must announce the ssrc assigned in Ready.
    let (probe_ssrc, _peer) = mock.probes.recv_async().await.unwrap();
    assert_eq!(probe_ssrc, 12345);

    // The discovered external address is reported back verbatim.
    let select = mock.expect_signal(1).await;
    assert_eq!(select["d"]["protocol"], "udp");
    assert_eq!(select["d"]["data"]["address"], "203.0.113.9");
    assert_eq!(select["d"]["data"]["port"], 6000);
    assert_eq!(select["d"]["data"]["mode"], "plain");

    connection.close().await;
    assert_eq!(
        connection.disconnects().recv_async().await,
        Ok(DisconnectReason::Requested)
    );
}

#[tokio::test]
async fn close_is_idempotent_and_fires_one_event() {
    let mock = MockVoiceServer::spawn(MockOptions::default()).await;

    let connection = VoiceConnection::new(Config::default());
    connection.connect(session_info(&mock.endpoint)).await.unwrap();

    connection.close().await;
    connection.close().await;

    let disconnects = connection.disconnects();
    assert_eq!(disconnects.recv_async().await, Ok(DisconnectReason::Requested));
    assert!(disconnects.try_recv().is_err());
}

#[tokio::test]
async fn close_without_connect_is_a_no_op() {
    let connection = VoiceConnection::new(Config::default());

    connection.close().await;

    assert!(connection.disconnects().try_recv().is_err());
}

#[tokio::test]
async fn runt_datagrams_are_dropped_silently() {
    let mock = MockVoiceServer::spawn(MockOptions::default()).await;

    let connection = VoiceConnection::new(Config::default());
    let frames = Arc::new(AtomicUsize::new(0));
    connection.set_receive_handler(Some(Box::new(UserAudioCounter {
        frames: Arc::clone(&frames),
    })));
    connection.connect(session_info(&mock.endpoint)).await.unwrap();

    let (_ssrc, peer) = mock.probes.recv_async().await.unwrap();

    // Too short to hold a header, and a lone header byte: both must vanish
    // without a callback or a teardown.
    mock.udp.send_to(&[0u8; 8], peer).await.unwrap();
    mock.udp.send_to(&[0x80], peer).await.unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(frames.load(Ordering::SeqCst), 0);
    assert!(connection.disconnects().try_recv().is_err());

    connection.close().await;
}

#[tokio::test]
async fn heartbeats_carry_a_millisecond_timestamp() {
    let mock = MockVoiceServer::spawn(MockOptions {
        heartbeat_interval: 100,
        ..Default::default()
    })
    .await;

    let connection = VoiceConnection::new(Config::default());
    connection.connect(session_info(&mock.endpoint)).await.unwrap();

    let first = mock.expect_signal(3).await;
    assert!(first["d"].is_u64());

    // A second beat proves the loop survives the (echoed) first one.
    let second = mock.expect_signal(3).await;
    assert!(second["d"].as_u64() >= first["d"].as_u64());

    connection.close().await;
}
