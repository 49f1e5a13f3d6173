//! JSON-over-WebSocket plumbing for the signaling channel.

use crate::model::Event;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::Error as JsonError;
use std::error::Error as StdError;
use std::fmt;
use tokio::net::TcpStream;
use tokio::time::{timeout, Duration};
use tokio_tungstenite::tungstenite::error::Error as TungsteniteError;
use tokio_tungstenite::tungstenite::protocol::{CloseFrame, Message, WebSocketConfig};
use tokio_tungstenite::{connect_async_with_config, MaybeTlsStream, WebSocketStream};
use tracing::warn;
use url::Url;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// Failure (de)serialising a JSON payload.
    Json(JsonError),
    /// The voice gateway does not offer compression; only text messages are
    /// expected.
    UnexpectedBinaryMessage(Vec<u8>),
    /// Error in the underlying websocket.
    Ws(TungsteniteError),
    /// The socket was closed by the remote end.
    WsClosed(Option<CloseFrame<'static>>),
}

impl From<JsonError> for Error {
    fn from(e: JsonError) -> Error {
        Error::Json(e)
    }
}

impl From<TungsteniteError> for Error {
    fn from(e: TungsteniteError) -> Error {
        Error::Ws(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Json(e) => e.fmt(f),
            Error::UnexpectedBinaryMessage(_) => {
                f.write_str("unexpected binary message on the signaling socket")
            },
            Error::Ws(e) => e.fmt(f),
            Error::WsClosed(_) => f.write_str("signaling socket closed by the remote end"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Json(e) => Some(e),
            Error::Ws(e) => Some(e),
            _ => None,
        }
    }
}

#[async_trait]
pub trait ReceiverExt {
    /// Receives the next event, giving up with `Ok(None)` after a short wait.
    async fn recv_json(&mut self) -> Result<Option<Event>>;
    /// Receives the next event, waiting as long as it takes; stream end and
    /// close frames surface as [`Error::WsClosed`].
    async fn recv_json_no_timeout(&mut self) -> Result<Option<Event>>;
}

#[async_trait]
pub trait SenderExt {
    async fn send_json(&mut self, value: &Event) -> Result<()>;
}

#[async_trait]
impl ReceiverExt for WsStream {
    async fn recv_json(&mut self) -> Result<Option<Event>> {
        const TIMEOUT: Duration = Duration::from_millis(500);

        let ws_message = match timeout(TIMEOUT, self.next()).await {
            Ok(Some(Ok(v))) => Some(v),
            Ok(Some(Err(e))) => return Err(e.into()),
            Ok(None) => return Err(Error::WsClosed(None)),
            Err(_) => None,
        };

        convert_ws_message(ws_message)
    }

    async fn recv_json_no_timeout(&mut self) -> Result<Option<Event>> {
        match self.next().await {
            Some(Ok(message)) => convert_ws_message(Some(message)),
            Some(Err(e)) => Err(e.into()),
            None => Err(Error::WsClosed(None)),
        }
    }
}

#[async_trait]
impl SenderExt for WsStream {
    async fn send_json(&mut self, value: &Event) -> Result<()> {
        Ok(serde_json::to_string(value)
            .map(Message::Text)
            .map_err(Error::from)
            .map(|m| self.send(m))?
            .await?)
    }
}

#[inline]
pub(crate) fn convert_ws_message(message: Option<Message>) -> Result<Option<Event>> {
    Ok(match message {
        Some(Message::Text(payload)) =>
            serde_json::from_str(&payload).map(Some).map_err(|why| {
                warn!("Err deserializing text: {:?}; text: {}", why, payload);

                why
            })?,
        Some(Message::Binary(bytes)) => {
            return Err(Error::UnexpectedBinaryMessage(bytes));
        },
        Some(Message::Close(frame)) => {
            return Err(Error::WsClosed(frame));
        },
        // Ping/Pong message behaviour is internally handled by tungstenite.
        _ => None,
    })
}

pub(crate) async fn create_client(url: Url) -> Result<WsStream> {
    let mut ws_config = WebSocketConfig::default();
    ws_config.max_message_size = None;
    ws_config.max_frame_size = None;

    let (stream, _) = connect_async_with_config(url.as_str(), Some(ws_config), true).await?;

    Ok(stream)
}
