//! `l2t-transport`, single request/reply exchanges over unreliable UDP.
//!
//! # Architecture
//!
//! ```text
//!  caller ── Request ──▶ exchange::send ──▶ Outcome
//!                          │      ▲
//!              ticks       │      │ first qualifying datagram,
//!           ┌──────────────┘      │ deadline, or read error
//!           ▼                     │
//!       ┌────────┐  resend   ┌────┴───────────┐
//!       │ Ticker │──────────▶│ ExchangeSocket │  connected or listening
//!       └────────┘           └────────────────┘
//! ```
//!
//! Each module has a single responsibility:
//! - [`ticker`]: doubling retransmit schedule with drop-if-full delivery
//! - [`socket`]: route lookup and connected/listening socket shapes
//! - [`exchange`]: the retransmit / receive / abort state machine
//! - [`state`]: exchange state enum
//! - [`config`]: timing defaults and the default L2T port

pub mod config;
pub mod exchange;
pub mod socket;
pub mod state;
pub mod ticker;

pub use config::{TransportConfig, DEFAULT_PORT};
pub use exchange::{send, Outcome, Reply, Request};
pub use socket::{local_addr_for, SocketMode, TransportError};
pub use state::ExchangeState;
pub use ticker::Ticker;
