// Connection handle and client event loop over a single WebSocket.

use crate::domain::{ClientState, InputThrottle};
use crate::interface_adapters::input::{ConsoleLine, InputCommand, parse_line};
use crate::interface_adapters::protocol::{ProtocolError, decode_inbound, encode_outbound};
use crate::interface_adapters::view::{View, render};
use crate::use_cases::{
    GameSession, InboundMessage, KeyOutcome, MessageSink, OutboundMessage, SessionError,
};

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use futures_util::stream::{SplitSink, SplitStream};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::{
    self, Message,
    protocol::{CloseFrame, frame::coding::CloseCode},
};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{Instrument, debug, info, info_span, warn};
use url::Url;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const LOG_THROTTLE: Duration = Duration::from_secs(2);
pub const MAX_INVALID_MESSAGES: u32 = 10;

#[derive(Debug)]
pub enum NetError {
    Connect(tungstenite::Error),
    Ws(tungstenite::Error),
    Protocol(ProtocolError),
    Session(SessionError),
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetError::Connect(err) => write!(f, "websocket connect failed: {err}"),
            NetError::Ws(err) => write!(f, "websocket error: {err}"),
            NetError::Protocol(err) => write!(f, "protocol error: {err}"),
            NetError::Session(err) => write!(f, "session error: {err}"),
        }
    }
}

impl std::error::Error for NetError {}

/// The one socket a client owns: opened at start, closed at teardown.
pub struct Connection {
    url: Url,
    stream: WsStream,
}

impl Connection {
    pub async fn open(url: &Url) -> Result<Self, NetError> {
        let (stream, response) = connect_async(url.as_str())
            .await
            .map_err(NetError::Connect)?;
        debug!(status = %response.status(), "websocket handshake complete");
        Ok(Self {
            url: url.clone(),
            stream,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn split(self) -> (ConnectionWriter, ConnectionReader) {
        let (sink, stream) = self.stream.split();
        let now = Instant::now()
            .checked_sub(LOG_THROTTLE)
            .unwrap_or_else(Instant::now);
        (
            ConnectionWriter {
                sink,
                msgs_out: 0,
                bytes_out: 0,
            },
            ConnectionReader {
                stream,
                msgs_in: 0,
                bytes_in: 0,
                invalid_messages: 0,
                last_invalid_log: now,
            },
        )
    }
}

/// Outbound half: serializes tagged JSON and writes text frames.
pub struct ConnectionWriter {
    sink: SplitSink<WsStream, Message>,
    msgs_out: u64,
    bytes_out: u64,
}

impl ConnectionWriter {
    pub async fn send_message(&mut self, message: &OutboundMessage) -> Result<usize, NetError> {
        let txt = encode_outbound(message).map_err(NetError::Protocol)?;
        let bytes = txt.len();
        self.sink
            .send(Message::Text(txt.into()))
            .await
            .map_err(NetError::Ws)?;
        self.msgs_out += 1;
        self.bytes_out += bytes as u64;
        Ok(bytes)
    }

    pub async fn close(&mut self, frame: Option<CloseFrame>) -> Result<(), NetError> {
        if let Some(frame) = frame {
            // Best effort; the peer may already be gone.
            let _ = self.sink.send(Message::Close(Some(frame))).await;
        }
        self.sink.close().await.map_err(NetError::Ws)
    }
}

#[async_trait]
impl MessageSink for ConnectionWriter {
    async fn send(&mut self, message: OutboundMessage) -> Result<(), String> {
        self.send_message(&message)
            .await
            .map(|_| ())
            .map_err(|err| err.to_string())
    }
}

/// One step of the inbound stream.
#[derive(Debug)]
pub enum ReadEvent {
    Message(InboundMessage),
    Invalid(ProtocolError),
    // Ping/Pong/Binary: nothing for the session to do.
    Ignored,
    Closed,
}

/// Inbound half: decodes text frames and tracks connection stats.
pub struct ConnectionReader {
    stream: SplitStream<WsStream>,
    msgs_in: u64,
    bytes_in: u64,
    invalid_messages: u32,
    last_invalid_log: Instant,
}

impl ConnectionReader {
    pub async fn next_event(&mut self) -> ReadEvent {
        match self.stream.next().await {
            Some(Ok(Message::Text(text))) => {
                self.msgs_in += 1;
                self.bytes_in += text.len() as u64;
                match decode_inbound(text.as_str()) {
                    Ok(message) => ReadEvent::Message(message),
                    Err(err) => {
                        self.invalid_messages += 1;
                        if should_log(&mut self.last_invalid_log) {
                            warn!(
                                bytes = text.len(),
                                error = %err,
                                invalid = self.invalid_messages,
                                "failed to parse server message"
                            );
                        }
                        ReadEvent::Invalid(err)
                    }
                }
            }
            Some(Ok(Message::Binary(bytes))) => {
                if should_log(&mut self.last_invalid_log) {
                    warn!(bytes = bytes.len(), "binary messages not supported; ignoring");
                }
                ReadEvent::Ignored
            }
            // tungstenite answers pings on the next write/flush.
            Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {
                ReadEvent::Ignored
            }
            Some(Ok(Message::Close(frame))) => {
                info!(?frame, "server closed connection");
                ReadEvent::Closed
            }
            Some(Err(err)) => {
                warn!(error = %err, "websocket recv error");
                ReadEvent::Closed
            }
            None => {
                info!("websocket closed");
                ReadEvent::Closed
            }
        }
    }

    pub fn invalid_messages(&self) -> u32 {
        self.invalid_messages
    }
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

/// Loop settings that come from configuration.
#[derive(Debug, Clone, Copy)]
pub struct LoopSettings {
    pub throttle_window: Duration,
    pub render_scale: i32,
}

enum LoopControl {
    Continue,
    Disconnect,
}

/// Drives one session until the user quits, input ends, the server closes
/// the socket or `shutdown` flips. Returns the final client state.
pub async fn run_client_loop<F>(
    connection: Connection,
    mut commands: mpsc::Receiver<ConsoleLine>,
    mut shutdown: watch::Receiver<bool>,
    settings: LoopSettings,
    mut on_render: F,
) -> Result<ClientState, NetError>
where
    F: FnMut(&View),
{
    let span = info_span!("conn", url = %connection.url());
    async move {
        let (writer, mut reader) = connection.split();
        let mut session = GameSession::new(writer, InputThrottle::new(settings.throttle_window));
        let mut fatal: Option<NetError> = None;
        let mut close_frame: Option<CloseFrame> = None;

        info!("connected");
        on_render(&render(session.state(), settings.render_scale));

        loop {
            let disconnect: bool = tokio::select! {
                // Typed input from the console
                line = commands.recv() => {
                    match line {
                        Some(line) => {
                            match handle_command(&mut session, line).await {
                                Ok((LoopControl::Continue, changed)) => {
                                    if changed {
                                        on_render(&render(session.state(), settings.render_scale));
                                    }
                                    false
                                }
                                Ok((LoopControl::Disconnect, _)) => true,
                                Err(err) => {
                                    warn!(error = %err, "failed to send; disconnecting");
                                    fatal = Some(NetError::Session(err));
                                    true
                                }
                            }
                        }
                        None => {
                            info!("input closed");
                            true
                        }
                    }
                }

                // Incoming message from the server
                event = reader.next_event() => {
                    match event {
                        ReadEvent::Message(message) => {
                            session.apply_inbound(message);
                            on_render(&render(session.state(), settings.render_scale));
                            false
                        }
                        ReadEvent::Invalid(err) => {
                            if reader.invalid_messages() > MAX_INVALID_MESSAGES {
                                close_frame = Some(CloseFrame {
                                    code: CloseCode::Policy,
                                    reason: "too many invalid messages".into(),
                                });
                                fatal = Some(NetError::Protocol(err));
                                true
                            } else {
                                false
                            }
                        }
                        ReadEvent::Ignored => false,
                        ReadEvent::Closed => true,
                    }
                }

                changed = shutdown.changed() => {
                    // A dropped sender also means "stop".
                    if changed.is_err() || *shutdown.borrow() {
                        info!("shutdown requested");
                        true
                    } else {
                        false
                    }
                }
            };

            if disconnect {
                break;
            }
        }

        let (state, mut writer) = session.into_parts();
        if let Err(err) = writer.close(close_frame).await {
            debug!(error = %err, "socket close error");
        }

        debug!(
            msgs_in = reader.msgs_in,
            msgs_out = writer.msgs_out,
            bytes_in = reader.bytes_in,
            bytes_out = writer.bytes_out,
            invalid_messages = reader.invalid_messages,
            "connection stats"
        );
        info!("disconnected");

        match fatal {
            Some(err) => Err(err),
            None => Ok(state),
        }
    }
    .instrument(span)
    .await
}

// Returns whether the loop should go on and whether the state changed.
async fn handle_command<S>(
    session: &mut GameSession<S>,
    line: ConsoleLine,
) -> Result<(LoopControl, bool), SessionError>
where
    S: MessageSink,
{
    match parse_line(&line.text) {
        InputCommand::Keys(keys) => {
            let mut changed = false;
            for key in keys {
                if let KeyOutcome::Moved(_) = session.handle_key(key, line.received_at).await? {
                    changed = true;
                }
            }
            Ok((LoopControl::Continue, changed))
        }
        InputCommand::Chat(text) => {
            session.state_mut().set_chat_input(text);
            session.submit_chat().await?;
            Ok((LoopControl::Continue, true))
        }
        InputCommand::Quit => Ok((LoopControl::Disconnect, false)),
        InputCommand::Nothing => Ok((LoopControl::Continue, false)),
    }
}
