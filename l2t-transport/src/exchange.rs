//! One reliable request/reply exchange over UDP.
//!
//! # Architecture
//!
//! ```text
//!   send()  (control)                        receive_loop (spawned)
//!   ┌───────────────────────────┐            ┌─────────────────────────┐
//!   │ select! {                 │  deadline  │ select! {               │
//!   │   abort      ─────────────┼──(watch)──▶│   deadline moved        │
//!   │   ticker     → resend     │            │   deadline reached      │
//!   │   receiver   → finish     │◀──join─────┤   datagram (filtered)   │
//!   │ }                         │            │ }                       │
//!   └───────────┬───────────────┘            └─────────────────────────┘
//!               │ Arc<ExchangeSocket>
//! ```
//!
//! The control side is the only writer; the receive task is the only reader
//! until it finishes.  Every way out of the exchange (reply, ceiling, abort,
//! read error) is observed by the receive task, so the control side always
//! joins it before deciding the outcome.  Aborting moves the read deadline to
//! "now", which turns the pending read into an ordinary timeout.
//!
//! After the outcome is decided the socket may be handed to a short drain
//! task that absorbs replies to copies already in flight.

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::TransportConfig;
use crate::socket::{local_addr_for, ExchangeSocket, SocketMode, TransportError, MAX_DATAGRAM};
use crate::state::ExchangeState;
use crate::ticker::Ticker;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Everything needed to run one exchange.
#[derive(Debug, Clone)]
pub struct Request {
    pub payload: Vec<u8>,
    pub dest: SocketAddr,
    /// Only datagrams from this address complete the exchange.  `None`
    /// accepts any source.
    pub expected_reply_from: Option<IpAddr>,
    pub config: TransportConfig,
}

impl Request {
    pub fn new(payload: Vec<u8>, dest: SocketAddr) -> Self {
        Self {
            payload,
            dest,
            expected_reply_from: None,
            config: TransportConfig::default(),
        }
    }

    pub fn expect_reply_from(mut self, source: Option<IpAddr>) -> Self {
        self.expected_reply_from = source;
        self
    }

    pub fn with_config(mut self, config: TransportConfig) -> Self {
        self.config = config;
        self
    }

    pub fn mode(&self) -> SocketMode {
        SocketMode::select(self.dest, self.expected_reply_from)
    }
}

/// A qualifying reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub from: SocketAddr,
    pub bytes: Vec<u8>,
    /// Time between the most recent transmission and the reply's arrival.
    pub rtt: Duration,
}

/// What happened during an exchange.
#[derive(Debug)]
pub struct Outcome {
    pub state: ExchangeState,
    /// Set only when the exchange ended because the caller aborted it.
    pub aborted: bool,
    /// Number of copies of the payload transmitted.
    pub sent: u32,
    pub mode: SocketMode,
    /// Local end of the exchange socket, once one was opened.
    pub local_addr: Option<SocketAddr>,
    pub dest: SocketAddr,
    pub result: Result<Reply, TransportError>,
}

impl Outcome {
    pub fn is_delivered(&self) -> bool {
        self.state == ExchangeState::Delivered
    }

    pub fn rtt(&self) -> Option<Duration> {
        self.result.as_ref().ok().map(|r| r.rtt)
    }

    pub fn into_result(self) -> Result<Reply, TransportError> {
        self.result
    }
}

// ---------------------------------------------------------------------------
// Exchange
// ---------------------------------------------------------------------------

/// How the receive task finished.
enum ReadEnd {
    Datagram {
        from: SocketAddr,
        bytes: Vec<u8>,
        at: Instant,
    },
    DeadlinePassed,
    Failed(TransportError),
}

/// Send `request.payload` to `request.dest`, retransmitting on a doubling
/// schedule until a qualifying reply arrives, the ceiling passes, or `abort`
/// is cancelled.
///
/// Socket and write failures end the exchange at once.  Running out of time
/// yields [`TransportError::Timeout`]; an abort yields the same error with
/// [`Outcome::aborted`] set.
pub async fn send(request: &Request, abort: &CancellationToken) -> Outcome {
    let dest = request.dest;
    let mode = request.mode();
    let mut outcome = Outcome {
        state: ExchangeState::Idle,
        aborted: false,
        sent: 0,
        mode,
        local_addr: None,
        dest,
        result: Err(TransportError::Timeout {
            dest,
            elapsed: Duration::ZERO,
        }),
    };

    let socket = match open_socket(mode, dest).await {
        Ok(socket) => Arc::new(socket),
        Err(e) => {
            log::warn!("[exchange] {dest}: {e}");
            outcome.state = ExchangeState::Failed;
            outcome.result = Err(e);
            return outcome;
        }
    };
    outcome.local_addr = Some(socket.local_addr());
    outcome.state = ExchangeState::Sending;

    let start = Instant::now();
    let (deadline_tx, deadline_rx) = watch::channel(start + request.config.ceiling);
    let mut receiver: JoinHandle<ReadEnd> = tokio::spawn(receive_loop(
        Arc::clone(&socket),
        request.expected_reply_from,
        deadline_rx,
    ));
    let mut ticker = Ticker::start(request.config.rtt_guess);
    let mut sent_at: Vec<Instant> = Vec::new();
    let mut write_error: Option<TransportError> = None;

    let joined = loop {
        let sending = !outcome.aborted && write_error.is_none();
        tokio::select! {
            biased;
            _ = abort.cancelled(), if !outcome.aborted => {
                log::debug!("[exchange] {dest}: abort requested after {} send(s)", sent_at.len());
                outcome.aborted = true;
                let _ = deadline_tx.send(Instant::now());
            }
            joined = &mut receiver => break joined,
            Some(_) = ticker.tick(), if sending => {
                match socket.send(&request.payload).await {
                    Ok(()) => {
                        sent_at.push(Instant::now());
                        outcome.state = ExchangeState::AwaitingReply;
                        log::debug!(
                            "[exchange] → {dest} ({mode}) copy #{} len={}",
                            sent_at.len(),
                            request.payload.len()
                        );
                    }
                    Err(e) => {
                        log::warn!("[exchange] {dest}: {e}");
                        write_error = Some(e);
                        let _ = deadline_tx.send(Instant::now());
                    }
                }
            }
        }
    };
    ticker.stop();
    outcome.sent = sent_at.len() as u32;

    let end = match joined {
        Ok(end) => end,
        Err(e) => ReadEnd::Failed(TransportError::Read {
            dest,
            source: io::Error::new(io::ErrorKind::Other, e),
        }),
    };

    let mut replies = 0;
    match (end, write_error) {
        (_, Some(e)) => {
            outcome.state = ExchangeState::Failed;
            outcome.aborted = false;
            outcome.result = Err(e);
        }
        (ReadEnd::Datagram { from, bytes, at }, None) => {
            let last_send = sent_at
                .iter()
                .rev()
                .find(|t| **t <= at)
                .copied()
                .unwrap_or(start);
            let rtt = at.saturating_duration_since(last_send);
            log::debug!("[exchange] ← {from} len={} rtt={rtt:?}", bytes.len());
            replies = 1;
            outcome.state = ExchangeState::Delivered;
            outcome.aborted = false;
            outcome.result = Ok(Reply { from, bytes, rtt });
        }
        (ReadEnd::DeadlinePassed, None) => {
            let elapsed = start.elapsed();
            if outcome.aborted {
                outcome.state = ExchangeState::Aborted;
            } else {
                log::debug!("[exchange] {dest}: no reply after {elapsed:?}");
                outcome.state = ExchangeState::Failed;
            }
            outcome.result = Err(TransportError::Timeout { dest, elapsed });
        }
        (ReadEnd::Failed(e), None) => {
            log::debug!("[exchange] {dest}: {e}");
            outcome.state = ExchangeState::Failed;
            outcome.aborted = false;
            outcome.result = Err(e);
        }
    }

    let outstanding = outcome.sent.saturating_sub(replies);
    let healthy = outcome.result.is_ok() || outcome.result.as_ref().is_err_and(|e| e.is_timeout());
    if outstanding > 0 && healthy {
        drain(socket, outstanding, request.config.drain_window);
    }
    outcome
}

async fn open_socket(mode: SocketMode, dest: SocketAddr) -> Result<ExchangeSocket, TransportError> {
    let local_ip = local_addr_for(dest).await?;
    ExchangeSocket::open(mode, local_ip, dest).await
}

async fn receive_loop(
    socket: Arc<ExchangeSocket>,
    expected: Option<IpAddr>,
    mut deadline: watch::Receiver<Instant>,
) -> ReadEnd {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    loop {
        let due = *deadline.borrow_and_update();
        tokio::select! {
            biased;
            changed = deadline.changed() => {
                if changed.is_err() {
                    return ReadEnd::DeadlinePassed;
                }
            }
            _ = tokio::time::sleep_until(due) => return ReadEnd::DeadlinePassed,
            read = socket.recv(&mut buf) => match read {
                Ok((n, from)) => {
                    if expected.is_some_and(|ip| ip != from.ip()) {
                        log::trace!("[exchange] discarding alien datagram from {from}");
                        continue;
                    }
                    return ReadEnd::Datagram {
                        from,
                        bytes: buf[..n].to_vec(),
                        at: Instant::now(),
                    };
                }
                Err(e) => return ReadEnd::Failed(e),
            },
        }
    }
}

/// Keep the socket open long enough to absorb replies to copies already in
/// flight.  Fire-and-forget; the socket closes when this task ends.
fn drain(socket: Arc<ExchangeSocket>, outstanding: u32, window: Duration) {
    tokio::spawn(async move {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        for _ in 0..outstanding {
            match tokio::time::timeout(window, socket.recv(&mut buf)).await {
                Ok(Ok((n, from))) => log::trace!("[exchange] drained {n} bytes from {from}"),
                _ => break,
            }
        }
    });
}
