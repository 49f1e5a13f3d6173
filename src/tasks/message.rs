//! Messages passed between the public handle, the core task, and the
//! per-connection loops.

use crate::audio::{AudioReceiveHandler, AudioSendHandler};
use crate::error::{DisconnectReason, Error};
use crate::info::ConnectionInfo;
use crate::model::id::UserId;

use flume::Sender;

pub(crate) enum CoreMessage {
    ConnectWithResult(ConnectionInfo, Sender<Result<(), Error>>),
    Disconnect(Sender<()>),
    SetSendHandler(Option<Box<dyn AudioSendHandler>>),
    SetReceiveHandler(Option<Box<dyn AudioReceiveHandler>>),
    ConnectionLost(DisconnectReason),
    Poison,
}

pub(crate) enum WsMessage {
    Speaking(bool),
    Poison,
}

pub(crate) enum UdpTxMessage {
    SetHandler(Option<Box<dyn AudioSendHandler>>),
    Poison,
}

pub(crate) enum UdpRxMessage {
    SetHandler(Option<Box<dyn AudioReceiveHandler>>),
    SpeakingUpdate {
        ssrc: u32,
        user_id: UserId,
        speaking: bool,
    },
    Poison,
}

pub(crate) enum KeepaliveMessage {
    Poison,
}
