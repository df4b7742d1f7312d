//! TCP connection handling: login, dispatch and the bot's tick loop.

use crate::config::ClientConfig;
use crate::framing::FrameReader;
use crate::protocol::{self, InboundMessage, OutboundRpc};
use crate::session::GameSession;
use bomber_core::GameAction;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot::error::TryRecvError;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Transport-fatal failures. Any of them ends the connection.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Connection lost")]
    ConnectionLost,

    #[error("Server is closing")]
    ServerClosing,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Queue of serialized lines waiting to be written to the socket
pub type Outbox = mpsc::UnboundedSender<String>;

/// The running game, shared by the read path and the tick loop.
pub type SharedSession = Arc<Mutex<Option<GameSession>>>;

/// Connect to the server and play until the connection ends.
pub async fn run_client(config: ClientConfig) -> anyhow::Result<()> {
    let stream = TcpStream::connect(&config.server_addr).await?;
    info!("Connected to {}", config.server_addr);

    let (reader, writer) = stream.into_split();
    let (tx, rx) = mpsc::unbounded_channel::<String>();
    let send_task = tokio::spawn(write_loop(writer, rx));

    let mut connection = Connection::new(config.identity, config.tick, tx);
    let result = connection.read_loop(reader).await;

    // dropping the connection stops the ticker and closes the outbox
    drop(connection);
    if let Err(e) = send_task.await {
        warn!("Writer task failed: {}", e);
    }

    match result {
        Err(e) => {
            error!("Disconnected: {}", e);
            Err(e.into())
        }
        Ok(()) => Ok(()),
    }
}

/// Forward queued lines to the socket until the outbox closes.
async fn write_loop<W: AsyncWrite + Unpin>(mut writer: W, mut rx: mpsc::UnboundedReceiver<String>) {
    while let Some(line) = rx.recv().await {
        if let Err(e) = writer.write_all(line.as_bytes()).await {
            warn!("Failed to send {}: {}", line.trim_end(), e);
            break;
        }
    }
    if let Err(e) = writer.shutdown().await {
        debug!("Socket shutdown: {}", e);
    }
}

/// Queue an RPC for sending. Sends are fire-and-forget: a call that cannot
/// be queued is dropped with a warning.
pub fn send_rpc(outbox: &Outbox, rpc: &OutboundRpc) {
    let line = match rpc.to_line() {
        Ok(line) => line,
        Err(e) => {
            warn!("Failed to encode {}: {}", rpc.method, e);
            return;
        }
    };
    debug!("-> {}", line.trim_end());
    if outbox.send(line).is_err() {
        warn!("Not connected, dropping {}", rpc.method);
    }
}

fn send_actions(outbox: &Outbox, actions: &[GameAction]) {
    for action in actions {
        send_rpc(outbox, &OutboundRpc::from_action(action));
    }
}

/// Per-connection dispatcher state.
pub struct Connection {
    identity: Uuid,
    tick: Duration,
    outbox: Outbox,
    session: SharedSession,
    ticker: Option<Ticker>,
}

/// Handle on a running tick loop
struct Ticker {
    cancel: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl Connection {
    pub fn new(identity: Uuid, tick: Duration, outbox: Outbox) -> Self {
        Self {
            identity,
            tick,
            outbox,
            session: Arc::new(Mutex::new(None)),
            ticker: None,
        }
    }

    /// Read and dispatch frames until the stream ends or the server closes.
    pub async fn read_loop<R: AsyncRead + Unpin>(&mut self, reader: R) -> Result<(), ClientError> {
        let mut frames = FrameReader::new(reader);
        loop {
            let frame = frames.next_frame().await?;
            debug!("<- {}", frame);

            match protocol::decode(&frame) {
                Ok(message) => self.dispatch(message).await?,
                Err(e) => warn!("Dropping message: {}", e),
            }
        }
    }

    /// Handle one decoded message.
    pub async fn dispatch(&mut self, message: InboundMessage) -> Result<(), ClientError> {
        match message {
            InboundMessage::Login => {
                info!("Logging in as {}", self.identity);
                send_rpc(&self.outbox, &OutboundRpc::login(self.identity));
            }

            InboundMessage::ServerClosing => {
                warn!("Server is closing");
                self.stop_ticker().await;
                return Err(ClientError::ServerClosing);
            }

            InboundMessage::Help(text) => info!("Server help: {}", text),

            InboundMessage::Notice(name) => info!("Server event {}", name),

            InboundMessage::Unhandled(method) => debug!("Unhandled method {}", method),

            InboundMessage::GameStart(setup) => {
                // the old loop must be gone before the new session is visible
                self.stop_ticker().await;
                match GameSession::start(setup) {
                    Ok(session) => {
                        *self.session.lock().await = Some(session);
                        self.start_ticker();
                    }
                    Err(e) => {
                        warn!("Cannot start game: {}", e);
                        *self.session.lock().await = None;
                    }
                }
            }

            InboundMessage::Game(event) => {
                let mut guard = self.session.lock().await;
                match guard.as_mut() {
                    Some(session) => {
                        let actions = session.apply(&event);
                        send_actions(&self.outbox, &actions);
                    }
                    None => debug!("No game running, ignoring {}", event.name()),
                }
            }
        }
        Ok(())
    }

    fn start_ticker(&mut self) {
        let (cancel, cancel_rx) = oneshot::channel();
        let task = tokio::spawn(tick_loop(
            Arc::clone(&self.session),
            self.outbox.clone(),
            self.tick,
            cancel_rx,
        ));
        self.ticker = Some(Ticker { cancel, task });
    }

    /// Signal the running loop to stop without waiting for it.
    fn cancel_ticker(&mut self) -> Option<JoinHandle<()>> {
        let ticker = self.ticker.take()?;
        // the loop may already be gone
        let _ = ticker.cancel.send(());
        Some(ticker.task)
    }

    /// Stop the running loop and wait until it has exited.
    async fn stop_ticker(&mut self) {
        if let Some(task) = self.cancel_ticker() {
            if let Err(e) = task.await {
                warn!("Tick loop failed: {}", e);
            }
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.cancel_ticker();
    }
}

/// Periodically let the bot act until cancelled.
///
/// Cancellation is checked between ticks and again once the session lock
/// is held, so a loop that was waiting on the lock never ticks a session
/// installed after it was cancelled. Dropping the sender also cancels.
async fn tick_loop(
    session: SharedSession,
    outbox: Outbox,
    period: Duration,
    mut cancel: oneshot::Receiver<()>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    debug!("Tick loop started every {:?}", period);

    loop {
        tokio::select! {
            biased;
            _ = &mut cancel => break,
            _ = ticker.tick() => {
                let mut guard = session.lock().await;
                if !matches!(cancel.try_recv(), Err(TryRecvError::Empty)) {
                    break;
                }
                if let Some(session) = guard.as_mut() {
                    let actions = session.tick();
                    send_actions(&outbox, &actions);
                }
            }
        }
    }

    debug!("Tick loop stopped");
}
