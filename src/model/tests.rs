use std::net::Ipv4Addr;

use super::Event;
use crate::model::id::*;
use crate::model::payload::*;

#[test]
fn serialize_identify_json() {
    let event = Event::from(Identify {
        server_id: GuildId(41771983423143937),
        session_id: "my_session_id".into(),
        token: "my_token".into(),
        user_id: UserId(104694319306248192),
    });

    let json = serde_json::to_value(&event).unwrap();

    assert_eq!(json["op"], 0);
    assert_eq!(json["d"]["server_id"], "41771983423143937");
    assert_eq!(json["d"]["user_id"], "104694319306248192");
    assert_eq!(json["d"]["session_id"], "my_session_id");
    assert_eq!(json["d"]["token"], "my_token");
}

#[test]
fn deserialize_identify_json() {
    let json_data = r#"{
      "d": {
        "server_id": "41771983423143937",
        "user_id": "104694319306248192",
        "session_id": "my_session_id",
        "token": "my_token"
      },
      "op": 0
    }"#;

    let event = serde_json::from_str(json_data);

    let ident = Identify {
        session_id: "my_session_id".into(),
        token: "my_token".into(),
        server_id: GuildId(41771983423143937),
        user_id: UserId(104694319306248192),
    };

    assert!(matches!(event, Ok(Event::Identify(i)) if i == ident));
}

#[test]
fn serialize_select_protocol_json() {
    let event = Event::from(SelectProtocol {
        protocol: "udp".into(),
        data: ProtocolData {
            address: Ipv4Addr::new(127, 0, 0, 1).into(),
            mode: "plain".into(),
            port: 1337,
        },
    });

    let json = serde_json::to_value(&event).unwrap();

    assert_eq!(json["op"], 1);
    assert_eq!(json["d"]["protocol"], "udp");
    assert_eq!(json["d"]["data"]["address"], "127.0.0.1");
    assert_eq!(json["d"]["data"]["port"], 1337);
    assert_eq!(json["d"]["data"]["mode"], "plain");
}

#[test]
fn deserialize_ready_json() {
    let json_data = r#"{
        "op": 2,
        "d": {
            "ssrc": 12345,
            "port": 5000,
            "heartbeat_interval": 45000
        }
    }"#;

    let event = serde_json::from_str(json_data);

    let ready = Ready {
        heartbeat_interval: 45000,
        port: 5000,
        ssrc: 12345,
    };

    assert!(matches!(event, Ok(Event::Ready(r)) if r == ready));
}

#[test]
fn heartbeat_payload_is_a_bare_integer() {
    let json_data = r#"{
      "op": 3,
      "d": 1501184119561
    }"#;

    let event = serde_json::from_str(json_data);

    let hb = Heartbeat {
        nonce: 1501184119561,
    };

    assert!(matches!(event, Ok(Event::Heartbeat(h)) if h == hb));

    let json = serde_json::to_value(Event::from(hb)).unwrap();
    assert_eq!(json["d"], 1501184119561u64);
}

#[test]
fn deserialize_session_description_json() {
    let json_data = r#"{
        "op": 4,
        "d": {
            "mode": "plain"
        }
    }"#;

    let event = serde_json::from_str(json_data);

    assert!(matches!(event, Ok(Event::SessionDescription(d)) if d.mode == "plain"));
}

#[test]
fn serialize_client_speaking_json() {
    let event = Event::from(Speaking {
        delay: Some(0),
        speaking: true,
        ssrc: None,
        user_id: None,
    });

    let json = serde_json::to_value(&event).unwrap();

    assert_eq!(json["op"], 5);
    assert_eq!(json["d"]["speaking"], true);
    assert_eq!(json["d"]["delay"], 0);
    assert!(json["d"].get("ssrc").is_none());
    assert!(json["d"].get("user_id").is_none());
}

#[test]
fn deserialize_server_speaking_json() {
    let json_data = r#"{
        "op": 5,
        "d": {
            "speaking": false,
            "ssrc": 54321,
            "user_id": "104694319306248192"
        }
    }"#;

    let event = serde_json::from_str(json_data);

    let speaking = Speaking {
        delay: None,
        speaking: false,
        ssrc: Some(54321),
        user_id: Some(UserId(104694319306248192)),
    };

    assert!(matches!(event, Ok(Event::Speaking(s)) if s == speaking));
}

#[test]
fn deserialize_out_of_order_keys() {
    let json_data = r#"{
        "d": {
            "ssrc": 1,
            "port": 1234,
            "heartbeat_interval": 1
        },
        "op": 2
    }"#;

    let event = serde_json::from_str::<Event>(json_data);

    assert!(matches!(event, Ok(Event::Ready(_))));
}

#[test]
fn unknown_opcode_is_an_error() {
    let json_data = r#"{
        "op": 9,
        "d": null
    }"#;

    assert!(serde_json::from_str::<Event>(json_data).is_err());
}
