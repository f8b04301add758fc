//! L2T messages: a fixed header followed by attributes.
//!
//! # Wire format
//!
//! ```text
//!  0               1               2               3               4
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     Type      |    Version    |         Total Length          |  Attr Count   |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |  Attributes ...
//! +-+-+-+-+-+-+-+-+
//! ```
//!
//! `Total Length` is big-endian and includes the header.  Parsing is
//! structural: it checks lengths and decodes every attribute.  Whether the
//! message makes sense (version, type, required attributes) is decided by
//! [`Message::validate`], so half-built messages can exist inside a builder.

use std::fmt;

use crate::attribute::{AttrType, Attribute};
use crate::error::CodecError;

/// Header size on the wire.
pub const HEADER_LEN: usize = 5;

/// The only protocol version spoken.
pub const VERSION: u8 = 1;

const OFF_TYPE: usize = 0;
const OFF_VERSION: usize = 1;
const OFF_LEN: usize = 2;
const OFF_COUNT: usize = 4;

/// Attributes every outbound request must carry.
const REQUIRED_IN_REQUESTS: [AttrType; 2] = [AttrType::SrcMac, AttrType::DstMac];

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MsgType {
    /// Trace request addressed to the switch that knows the destination MAC.
    RequestDst = 1,
    /// Trace request addressed to the switch that knows the source MAC.
    RequestSrc = 2,
    ReplyDst = 3,
    ReplySrc = 4,
}

impl MsgType {
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            1 => MsgType::RequestDst,
            2 => MsgType::RequestSrc,
            3 => MsgType::ReplyDst,
            4 => MsgType::ReplySrc,
            _ => return None,
        })
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }

    pub fn is_request(self) -> bool {
        matches!(self, MsgType::RequestDst | MsgType::RequestSrc)
    }

    pub fn name(self) -> &'static str {
        match self {
            MsgType::RequestDst => "RequestDst",
            MsgType::RequestSrc => "RequestSrc",
            MsgType::ReplyDst => "ReplyDst",
            MsgType::ReplySrc => "ReplySrc",
        }
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A decoded or built message.  Type and version are kept as raw bytes so a
/// parsed message with a bad header can still be inspected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    msg_type: u8,
    version: u8,
    attrs: Vec<Attribute>,
}

impl Message {
    /// An empty version-1 message.
    pub fn new(msg_type: MsgType) -> Self {
        MessageBuilder::new(msg_type).build()
    }

    pub fn builder(msg_type: MsgType) -> MessageBuilder {
        MessageBuilder::new(msg_type)
    }

    /// Decode a whole datagram.
    pub fn parse(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() < HEADER_LEN {
            return Err(CodecError::MessageTooShort {
                observed: bytes.len(),
            });
        }
        let claimed = usize::from(u16::from_be_bytes([bytes[OFF_LEN], bytes[OFF_LEN + 1]]));
        if claimed != bytes.len() {
            return Err(CodecError::MessageLength {
                claimed,
                observed: bytes.len(),
            });
        }

        let mut attrs = Vec::new();
        let mut offset = HEADER_LEN;
        while offset < bytes.len() {
            let remaining = bytes.len() - offset;
            let attr_len = match bytes.get(offset + 1) {
                Some(&len) if usize::from(len) <= remaining => usize::from(len),
                _ => return Err(CodecError::TruncatedAttr { offset, remaining }),
            };
            // A length byte below 2 is rejected here, so the walk always advances.
            attrs.push(Attribute::parse(&bytes[offset..offset + attr_len])?);
            offset += attr_len;
        }

        let claimed_count = usize::from(bytes[OFF_COUNT]);
        if claimed_count != attrs.len() {
            return Err(CodecError::AttrCount {
                claimed: claimed_count,
                observed: attrs.len(),
            });
        }

        Ok(Self {
            msg_type: bytes[OFF_TYPE],
            version: bytes[OFF_VERSION],
            attrs,
        })
    }

    /// Check version, type, attribute uniqueness and, for requests, the
    /// attributes a switch needs to identify the traced flow.
    pub fn validate(&self) -> Result<(), CodecError> {
        if self.version != VERSION {
            return Err(CodecError::BadVersion(self.version));
        }
        let msg_type =
            MsgType::from_u8(self.msg_type).ok_or(CodecError::UnknownMessageType(self.msg_type))?;

        for (i, attr) in self.attrs.iter().enumerate() {
            attr.validate()?;
            if self.attrs[..i]
                .iter()
                .any(|a| a.attr_type() == attr.attr_type())
            {
                return Err(CodecError::DuplicateAttr(attr.attr_type().name()));
            }
        }

        if msg_type.is_request() {
            for required in REQUIRED_IN_REQUESTS {
                if self.attr(required).is_none() {
                    return Err(CodecError::MissingAttr {
                        msg: msg_type.name(),
                        attr: required.name(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Encode the message with `extra` merged in.  An extra attribute replaces
    /// a stored one of the same type; others are appended.
    pub fn serialize(&self, extra: &[Attribute]) -> Result<Vec<u8>, CodecError> {
        let mut merged = self.clone();
        for attr in extra {
            replace_or_push(&mut merged.attrs, attr.clone());
        }
        merged.validate()?;

        if merged.attrs.len() > usize::from(u8::MAX) {
            return Err(CodecError::TooManyAttrs(merged.attrs.len()));
        }
        let total = HEADER_LEN + merged.attrs.iter().map(Attribute::wire_len).sum::<usize>();
        let total16 = u16::try_from(total).map_err(|_| CodecError::MessageTooLong(total))?;

        let mut out = Vec::with_capacity(total);
        out.push(merged.msg_type);
        out.push(merged.version);
        out.extend_from_slice(&total16.to_be_bytes());
        out.push(merged.attrs.len() as u8);
        for attr in &merged.attrs {
            out.extend_from_slice(&attr.serialize()?);
        }
        Ok(out)
    }

    /// True for requests that still lack a source IP attribute; the sender
    /// must fill in its outbound interface address before transmitting.
    pub fn needs_source_ip(&self) -> bool {
        self.msg_type().is_some_and(MsgType::is_request) && self.attr(AttrType::SrcIpv4).is_none()
    }

    pub fn msg_type(&self) -> Option<MsgType> {
        MsgType::from_u8(self.msg_type)
    }

    pub fn raw_type(&self) -> u8 {
        self.msg_type
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn attr(&self, attr_type: AttrType) -> Option<&Attribute> {
        self.attrs.iter().find(|a| a.attr_type() == attr_type)
    }

    /// Rendered value of an attribute, if present and valid.
    pub fn attr_text(&self, attr_type: AttrType) -> Option<String> {
        self.attr(attr_type).and_then(|a| a.render().ok())
    }

    pub fn attrs(&self) -> &[Attribute] {
        &self.attrs
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.msg_type() {
            Some(t) => write!(f, "{t}")?,
            None => write!(f, "type {}", self.msg_type)?,
        }
        write!(f, " v{} ({} attributes)", self.version, self.attrs.len())?;
        for attr in &self.attrs {
            write!(f, "\n  {attr}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Accumulates a message.  Setting an attribute whose type is already present
/// replaces it in place.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    msg_type: u8,
    version: u8,
    attrs: Vec<Attribute>,
}

impl MessageBuilder {
    pub fn new(msg_type: MsgType) -> Self {
        Self {
            msg_type: msg_type.to_u8(),
            version: VERSION,
            attrs: Vec::new(),
        }
    }

    pub fn msg_type(mut self, msg_type: MsgType) -> Self {
        self.msg_type = msg_type.to_u8();
        self
    }

    pub fn version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    pub fn attr(mut self, attr: Attribute) -> Self {
        self.set_attr(attr);
        self
    }

    pub fn set_attr(&mut self, attr: Attribute) {
        replace_or_push(&mut self.attrs, attr);
    }

    /// Finish without validating.
    pub fn build(self) -> Message {
        Message {
            msg_type: self.msg_type,
            version: self.version,
            attrs: self.attrs,
        }
    }
}

/// Replace the attribute of the same type in place, or append.
fn replace_or_push(attrs: &mut Vec<Attribute>, attr: Attribute) {
    match attrs.iter_mut().find(|a| a.attr_type() == attr.attr_type()) {
        Some(slot) => *slot = attr,
        None => attrs.push(attr),
    }
}
