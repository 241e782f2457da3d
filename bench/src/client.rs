//! WebSocket connection of one simulated client
//!
//! Writes go through the sink half of the socket. The read half is drained by
//! a background task so server broadcasts never pile up in the socket
//! buffer, and so a close frame from the server is observed before the next
//! write.

use crate::error::ClientError;
use crate::protocol::{ChangeMsg, Event, LoginMsg};
use crate::stats::Tally;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite, tungstenite::Message,
};
use tracing::debug;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Username of the client at `index`
pub fn username(index: usize) -> String {
    format!("__test_{}", index)
}

/// Nanosecond timestamps that never repeat or go backwards
#[derive(Debug, Default)]
pub struct Timestamps {
    last: i64,
}

impl Timestamps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self) -> i64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_nanos()).unwrap_or(i64::MAX))
            .unwrap_or(0);
        let ts = now.max(self.last.saturating_add(1));
        self.last = ts;
        ts
    }
}

/// One simulated editor session
pub struct SimulatedClient {
    index: usize,
    username: String,
    session: String,
    clock: Timestamps,
    sink: SplitSink<WsStream, Message>,
    reader: JoinHandle<()>,
    tally: Arc<Tally>,
}

impl SimulatedClient {
    /// Connect to the service
    pub async fn connect(
        url: &str,
        index: usize,
        session: &str,
        tally: Arc<Tally>,
    ) -> Result<Self, ClientError> {
        let (ws, _) = connect_async(url).await.map_err(ClientError::Connect)?;
        let (sink, mut stream) = ws.split();

        let reader_tally = tally.clone();
        let reader = tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(Message::Close(frame)) => {
                        debug!("{}: server closed connection: {:?}", index, frame);
                    }
                    Ok(_) => reader_tally.record_received(),
                    Err(e) => {
                        debug!("{}: read error = {}", index, e);
                        break;
                    }
                }
            }
        });

        Ok(Self {
            index,
            username: username(index),
            session: session.to_string(),
            clock: Timestamps::new(),
            sink,
            reader,
            tally,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Send the login event
    pub async fn login(&mut self) -> Result<(), ClientError> {
        let msg = LoginMsg {
            username: self.username.clone(),
            session_id: self.session.clone(),
        };
        let event = Event::login(&msg, self.clock.next())?;
        let json = event.to_json()?;
        self.write(json, event.data.len())
            .await
            .map_err(ClientError::Login)
    }

    /// Send the `seq`-th scripted change and return its payload size
    pub async fn send_change(&mut self, seq: usize) -> Result<usize, ClientError> {
        let msg = ChangeMsg::scripted_insert(self.index as u64, seq);
        let event = Event::change(&self.username, &self.session, &msg, self.clock.next())?;
        let json = event.to_json()?;
        let bytes = event.data.len();
        self.write(json, bytes).await.map_err(ClientError::Change)?;
        Ok(bytes)
    }

    async fn write(&mut self, json: String, payload_len: usize) -> Result<(), tungstenite::Error> {
        self.sink.send(Message::Text(json.into())).await?;
        self.tally.record_sent(payload_len);
        Ok(())
    }

    /// Send a normal-closure close frame
    pub async fn close(mut self) -> Result<(), ClientError> {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "".into(),
        };
        self.sink
            .send(Message::Close(Some(frame)))
            .await
            .map_err(ClientError::Close)
    }
}

impl Drop for SimulatedClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
