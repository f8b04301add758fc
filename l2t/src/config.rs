//! Prober tunables.

use std::time::Duration;

use l2t_transport::config::{DEFAULT_CEILING, DEFAULT_RTT_GUESS};
use l2t_transport::{TransportConfig, DEFAULT_PORT};

/// Exchanges run against each address once it has answered.
pub const DEFAULT_ATTEMPTS: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeConfig {
    /// UDP port the switches listen on.
    pub port: u16,
    pub rtt_guess: Duration,
    pub ceiling: Duration,
    /// Probe exchanges per address.  Extra attempts only run while the
    /// address keeps answering and add RTT samples.
    pub attempts: u32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            rtt_guess: DEFAULT_RTT_GUESS,
            ceiling: DEFAULT_CEILING,
            attempts: DEFAULT_ATTEMPTS,
        }
    }
}

impl ProbeConfig {
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_rtt_guess(mut self, rtt_guess: Duration) -> Self {
        self.rtt_guess = rtt_guess;
        self
    }

    pub fn with_ceiling(mut self, ceiling: Duration) -> Self {
        self.ceiling = ceiling;
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// Timing handed to every exchange the prober starts.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig::default()
            .with_rtt_guess(self.rtt_guess)
            .with_ceiling(self.ceiling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_transport() {
        let cfg = ProbeConfig::default();
        assert_eq!(cfg.port, 2228);
        assert_eq!(cfg.attempts, 1);
        assert_eq!(cfg.transport(), TransportConfig::default());
    }

    #[test]
    fn transport_carries_timing() {
        let cfg = ProbeConfig::default()
            .with_rtt_guess(Duration::from_millis(20))
            .with_ceiling(Duration::from_millis(500));
        let t = cfg.transport();
        assert_eq!(t.rtt_guess, Duration::from_millis(20));
        assert_eq!(t.ceiling, Duration::from_millis(500));
    }
}
