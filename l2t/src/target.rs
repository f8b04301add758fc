//! Target discovery and conversation.
//!
//! [`Target::probe`] sends a harmless request to every candidate address,
//! follows reply sources it has not seen yet, and settles on the address
//! that answered fastest.  The resulting [`Target`] then carries ordinary
//! requests with [`Target::send`].
//!
//! Each probe exchange is a race between a connected socket, which learns
//! about closed ports from ICMP, and a listening socket, which still hears
//! replies rewritten by NAT or sent from another interface.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use futures::future::join_all;
use l2t_transport::{exchange, local_addr_for, Outcome, Request, TransportConfig};
use log::{debug, trace};
use tokio_util::sync::CancellationToken;

use crate::attribute::{AttrType, Attribute};
use crate::config::ProbeConfig;
use crate::error::TargetError;
use crate::message::{Message, MsgType};

/// MAC placed in probe requests.  No switch has it in a forwarding table, so
/// every live switch answers with a "not found" style reply.
const PLACEHOLDER_MAC: &str = "ffff.ffff.ffff";

const PROBE_VLAN: u64 = 1;

/// What probing learned about one address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReachabilitySample {
    pub addr: IpAddr,
    /// At least one reply came back.
    pub reachable: bool,
    pub rtts: Vec<Duration>,
    pub best_rtt: Option<Duration>,
    /// Source of the first reply; differs from `addr` behind NAT.
    pub reply_from: Option<IpAddr>,
    /// Local interface address used to reach `addr`.
    pub local_addr: Option<IpAddr>,
}

impl ReachabilitySample {
    fn new(addr: IpAddr) -> Self {
        Self {
            addr,
            reachable: false,
            rtts: Vec::new(),
            best_rtt: None,
            reply_from: None,
            local_addr: None,
        }
    }

    fn record(&mut self, rtt: Duration, from: IpAddr) {
        self.reachable = true;
        self.rtts.push(rtt);
        self.best_rtt = Some(self.best_rtt.map_or(rtt, |best| best.min(rtt)));
        self.reply_from.get_or_insert(from);
    }
}

impl fmt::Display for ReachabilitySample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.best_rtt {
            Some(rtt) if self.reachable => write!(f, "{} reachable rtt={rtt:?}", self.addr)?,
            _ => write!(f, "{} unreachable", self.addr)?,
        }
        if let Some(from) = self.reply_from.filter(|from| *from != self.addr) {
            write!(f, " (replies from {from})")?;
        }
        Ok(())
    }
}

/// One address's probe results, merged by the control loop.
struct ProbeReport {
    sample: ReachabilitySample,
    hostname: Option<String>,
    platform: Option<String>,
}

/// A switch that answered probing.
#[derive(Debug, Clone)]
pub struct Target {
    /// Every address probed, reachable ones first in order of best RTT.  The
    /// head is the working address.
    candidates: Vec<ReachabilitySample>,
    hostname: Option<String>,
    platform: Option<String>,
    config: ProbeConfig,
}

impl Target {
    /// Probe `addrs` and every address that replies point to.
    ///
    /// Fails only when no address answered at all.
    pub async fn probe(addrs: &[IpAddr], config: ProbeConfig) -> Result<Self, TargetError> {
        if addrs.is_empty() {
            return Err(TargetError::NoCandidates);
        }

        let mut queue: VecDeque<IpAddr> = VecDeque::new();
        let mut seen: HashSet<IpAddr> = HashSet::new();
        for &addr in addrs {
            if seen.insert(addr) {
                queue.push_back(addr);
            }
        }

        let mut candidates = Vec::new();
        let mut hostname = None;
        let mut platform = None;

        while !queue.is_empty() {
            let round: Vec<IpAddr> = queue.drain(..).collect();
            debug!("[probe] round of {} address(es)", round.len());
            let reports = join_all(round.iter().map(|&addr| probe_address(addr, &config))).await;

            for report in reports {
                if let Some(from) = report.sample.reply_from {
                    if seen.insert(from) {
                        debug!("[probe] {} answered from new address {from}", report.sample.addr);
                        queue.push_back(from);
                    }
                }
                if hostname.is_none() {
                    hostname = report.hostname;
                }
                if platform.is_none() {
                    platform = report.platform;
                }
                candidates.push(report.sample);
            }
        }

        // Stable: equal RTTs keep probe order.
        candidates.sort_by_key(|s| (!s.reachable, s.best_rtt));
        if !candidates.first().is_some_and(|s| s.reachable) {
            return Err(TargetError::Unreachable {
                tried: candidates.iter().map(|s| s.addr).collect(),
            });
        }

        let target = Self {
            candidates,
            hostname,
            platform,
            config,
        };
        debug!("[probe] selected {}", target.candidates[0]);
        Ok(target)
    }

    pub fn is_reachable(&self) -> bool {
        self.best_sample().is_some()
    }

    /// Address with the lowest observed RTT.
    pub fn best(&self) -> Option<IpAddr> {
        self.best_sample().map(|s| s.addr)
    }

    pub fn best_sample(&self) -> Option<&ReachabilitySample> {
        self.candidates.first().filter(|s| s.reachable)
    }

    pub fn candidates(&self) -> &[ReachabilitySample] {
        &self.candidates
    }

    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    pub fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    /// Local interface address facing the best address.
    pub fn local_addr(&self) -> Option<IpAddr> {
        self.best_sample().and_then(|s| s.local_addr)
    }

    /// Send `msg` to the best address and return the parsed reply.
    pub async fn send(&self, msg: &Message) -> Result<Message, TargetError> {
        self.send_with_abort(msg, &CancellationToken::new()).await
    }

    /// [`send`](Self::send) that gives up early once `abort` is cancelled.
    pub async fn send_with_abort(
        &self,
        msg: &Message,
        abort: &CancellationToken,
    ) -> Result<Message, TargetError> {
        let sample = self.best_sample().ok_or_else(|| TargetError::Unreachable {
            tried: self.candidates.iter().map(|s| s.addr).collect(),
        })?;
        let dest = SocketAddr::new(sample.addr, self.config.port);

        let mut extra = Vec::new();
        if msg.needs_source_ip() {
            let local = match sample.local_addr {
                Some(ip) => ip,
                None => local_addr_for(dest).await?,
            };
            extra.push(source_ip_attr(local)?);
        }
        let payload = msg.serialize(&extra)?;

        let request = Request::new(payload, dest)
            .expect_reply_from(Some(sample.reply_from.unwrap_or(sample.addr)))
            .with_config(self.config.transport());
        let outcome = exchange::send(&request, abort).await;
        let reply = outcome.into_result()?;
        Ok(Message::parse(&reply.bytes)?)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.best() {
            Some(best) => write!(f, "target {best}")?,
            None => write!(f, "target unreachable")?,
        }
        if let Some(name) = &self.hostname {
            write!(f, " hostname={name}")?;
        }
        if let Some(platform) = &self.platform {
            write!(f, " platform={platform}")?;
        }
        if let Some(local) = self.local_addr() {
            write!(f, " local={local}")?;
        }
        for sample in &self.candidates {
            write!(f, "\n  {sample}")?;
        }
        Ok(())
    }
}

fn source_ip_attr(local: IpAddr) -> Result<Attribute, TargetError> {
    match local {
        IpAddr::V4(v4) => Ok(Attribute::build(AttrType::SrcIpv4, v4)?),
        other => Err(TargetError::NotIpv4(other)),
    }
}

fn probe_message(local: IpAddr) -> Result<Vec<u8>, TargetError> {
    let msg = Message::builder(MsgType::RequestSrc)
        .attr(Attribute::build(AttrType::SrcMac, PLACEHOLDER_MAC)?)
        .attr(Attribute::build(AttrType::DstMac, PLACEHOLDER_MAC)?)
        .attr(Attribute::build(AttrType::Vlan, PROBE_VLAN)?)
        .build();
    Ok(msg.serialize(&[source_ip_attr(local)?])?)
}

/// Run up to `config.attempts` raced exchanges against one address.
async fn probe_address(addr: IpAddr, config: &ProbeConfig) -> ProbeReport {
    let mut report = ProbeReport {
        sample: ReachabilitySample::new(addr),
        hostname: None,
        platform: None,
    };
    let dest = SocketAddr::new(addr, config.port);

    let local = match local_addr_for(dest).await {
        Ok(ip) => ip,
        Err(e) => {
            debug!("[probe] {addr}: {e}");
            return report;
        }
    };
    report.sample.local_addr = Some(local);

    let payload = match probe_message(local) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("[probe] {addr}: cannot build probe: {e}");
            return report;
        }
    };

    for attempt in 1..=config.attempts.max(1) {
        let outcome = race(&payload, dest, config.transport()).await;
        let reply = match outcome.result {
            Ok(reply) => reply,
            Err(e) => {
                debug!("[probe] {addr}: attempt {attempt} via {}: {e}", outcome.mode);
                break;
            }
        };
        debug!(
            "[probe] {addr}: attempt {attempt} answered by {} in {:?} via {}",
            reply.from, reply.rtt, outcome.mode
        );
        report.sample.record(reply.rtt, reply.from.ip());

        match Message::parse(&reply.bytes) {
            Ok(msg) => {
                if report.hostname.is_none() {
                    report.hostname = non_empty(msg.attr_text(AttrType::DevName));
                }
                if report.platform.is_none() {
                    report.platform = non_empty(msg.attr_text(AttrType::DevType));
                }
            }
            // Any reply proves liveness even when it does not decode.
            Err(e) => trace!("[probe] {addr}: undecodable reply: {e}"),
        }
    }
    report
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|s| !s.is_empty())
}

/// Run a connected and a listening exchange side by side and keep whichever
/// finishes first.  The other is aborted and awaited so its socket drains.
async fn race(payload: &[u8], dest: SocketAddr, config: TransportConfig) -> Outcome {
    let connected_req = Request::new(payload.to_vec(), dest)
        .expect_reply_from(Some(dest.ip()))
        .with_config(config);
    let listening_req = Request::new(payload.to_vec(), dest).with_config(config);
    let connected_abort = CancellationToken::new();
    let listening_abort = CancellationToken::new();

    let connected = exchange::send(&connected_req, &connected_abort);
    let listening = exchange::send(&listening_req, &listening_abort);
    tokio::pin!(connected, listening);

    tokio::select! {
        outcome = &mut connected => {
            listening_abort.cancel();
            let _ = listening.await;
            outcome
        }
        outcome = &mut listening => {
            connected_abort.cancel();
            let _ = connected.await;
            outcome
        }
    }
}
