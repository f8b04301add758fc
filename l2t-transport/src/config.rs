//! Tunables for a single request/reply exchange.

use std::time::Duration;

/// UDP port Cisco switches listen on for Layer-2 traceroute.
pub const DEFAULT_PORT: u16 = 2228;

/// Initial retransmit interval before any RTT is known.
pub const DEFAULT_RTT_GUESS: Duration = Duration::from_millis(100);

/// Hard cap on how long one exchange may run, retransmissions included.
pub const DEFAULT_CEILING: Duration = Duration::from_secs(10);

/// How long a finished exchange keeps its socket open to soak up replies to
/// retransmitted copies.
pub const DEFAULT_DRAIN_WINDOW: Duration = Duration::from_secs(1);

/// Per-exchange timing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    /// First retransmit interval; later intervals double.
    pub rtt_guess: Duration,
    /// Total time allowed before the exchange gives up.
    pub ceiling: Duration,
    /// Read timeout applied to each straggler reply after the exchange ends.
    pub drain_window: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            rtt_guess: DEFAULT_RTT_GUESS,
            ceiling: DEFAULT_CEILING,
            drain_window: DEFAULT_DRAIN_WINDOW,
        }
    }
}

impl TransportConfig {
    pub fn with_rtt_guess(mut self, rtt_guess: Duration) -> Self {
        self.rtt_guess = rtt_guess;
        self
    }

    pub fn with_ceiling(mut self, ceiling: Duration) -> Self {
        self.ceiling = ceiling;
        self
    }

    pub fn with_drain_window(mut self, drain_window: Duration) -> Self {
        self.drain_window = drain_window;
        self
    }
}
