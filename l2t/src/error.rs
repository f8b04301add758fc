//! Error taxonomy for the codec and the prober.

use std::net::IpAddr;

use l2t_transport::TransportError;
use thiserror::Error;

/// Malformed wire data or unusable build input.  Never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("attribute of {observed} bytes is outside 2..=255")]
    AttrSize { observed: usize },
    #[error("attribute length byte claims {claimed} bytes, found {observed}")]
    AttrLengthByte { claimed: usize, observed: usize },
    #[error("unknown attribute type {0}")]
    UnknownAttrType(u8),
    #[error("{attr} payload must be {expected} bytes, found {observed}")]
    PayloadLength {
        attr: &'static str,
        expected: usize,
        observed: usize,
    },
    #[error("{attr} string: {reason}")]
    BadString { attr: &'static str, reason: String },
    #[error("{attr}: VLAN {vlan} outside 1..=4094")]
    VlanRange { attr: &'static str, vlan: u64 },
    #[error("{attr}: invalid value {value}")]
    BadValue { attr: &'static str, value: String },
    #[error("{attr}: cannot build from {input}")]
    BadInput { attr: &'static str, input: String },

    #[error("message of {observed} bytes is shorter than the 5-byte header")]
    MessageTooShort { observed: usize },
    #[error("message header claims {claimed} bytes, found {observed}")]
    MessageLength { claimed: usize, observed: usize },
    #[error("message header claims {claimed} attributes, found {observed}")]
    AttrCount { claimed: usize, observed: usize },
    #[error("truncated attribute at offset {offset}: {remaining} bytes left")]
    TruncatedAttr { offset: usize, remaining: usize },
    #[error("unsupported protocol version {0}")]
    BadVersion(u8),
    #[error("unknown message type {0}")]
    UnknownMessageType(u8),
    #[error("{msg} is missing required attribute {attr}")]
    MissingAttr {
        msg: &'static str,
        attr: &'static str,
    },
    #[error("attribute {0} appears more than once")]
    DuplicateAttr(&'static str),
    #[error("message would be {0} bytes, limit is 65535")]
    MessageTooLong(usize),
    #[error("message would carry {0} attributes, limit is 255")]
    TooManyAttrs(usize),
}

/// Failures surfaced by target discovery and conversation.
#[derive(Error, Debug)]
pub enum TargetError {
    #[error("no candidate addresses to probe")]
    NoCandidates,
    #[error("target unreachable, tried {}", format_addrs(.tried))]
    Unreachable { tried: Vec<IpAddr> },
    #[error("local address {0} is not IPv4; cannot fill the source IP attribute")]
    NotIpv4(IpAddr),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

fn format_addrs(addrs: &[IpAddr]) -> String {
    addrs
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
