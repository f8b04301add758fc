//! Exchange finite-state machine types.
//!
//! ```text
//!  IDLE ──socket open──▶ SENDING ──first datagram out──▶ AWAITING_REPLY
//!                           │                                  │
//!                           │ write error                      ├── reply ──▶ DELIVERED
//!                           ▼                                  ├── abort ──▶ ABORTED
//!                         FAILED ◀──── timeout / read error ───┘
//! ```

/// Every state one exchange can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExchangeState {
    /// Nothing opened yet.
    #[default]
    Idle,
    /// Socket open, first transmission in progress.
    Sending,
    /// At least one copy sent; waiting for a qualifying reply.
    AwaitingReply,
    /// A reply from the expected source arrived.
    Delivered,
    /// The caller cancelled the exchange.
    Aborted,
    /// Socket, write or read failure, or the ceiling expired.
    Failed,
}

impl ExchangeState {
    /// True once the exchange can no longer change state.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ExchangeState::Delivered | ExchangeState::Aborted | ExchangeState::Failed
        )
    }
}

impl std::fmt::Display for ExchangeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ExchangeState::Idle => "idle",
            ExchangeState::Sending => "sending",
            ExchangeState::AwaitingReply => "awaiting-reply",
            ExchangeState::Delivered => "delivered",
            ExchangeState::Aborted => "aborted",
            ExchangeState::Failed => "failed",
        };
        f.write_str(name)
    }
}
