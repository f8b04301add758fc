use std::net::IpAddr;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use l2t::{ProbeConfig, Target};
use l2t_transport::DEFAULT_PORT;

/// Probe switches for Layer-2 traceroute support
#[derive(Parser, Debug)]
#[command(name = "l2t")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Switch addresses to probe
    #[arg(required = true)]
    addrs: Vec<IpAddr>,

    /// L2T UDP port
    #[arg(short = 'p', long = "port", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Initial retransmit interval in milliseconds
    #[arg(long = "rtt-guess", default_value = "100")]
    rtt_guess_ms: u64,

    /// Give up on an address after this many seconds
    #[arg(short = 't', long = "timeout", default_value = "10")]
    timeout: u64,

    /// Probe exchanges per answering address
    #[arg(short = 'n', long = "attempts", default_value = "1")]
    attempts: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = ProbeConfig::default()
        .with_port(args.port)
        .with_rtt_guess(Duration::from_millis(args.rtt_guess_ms))
        .with_ceiling(Duration::from_secs(args.timeout))
        .with_attempts(args.attempts);

    let target = Target::probe(&args.addrs, config).await?;
    println!("{target}");
    Ok(())
}
