//! `l2t`, client side of Cisco Layer-2 Traceroute.
//!
//! - [`attribute`]: TLV fields and their per-category rules
//! - [`message`]: header plus attributes, request/reply validation
//! - [`target`]: address discovery over the reliable transport
//! - [`config`]: prober tunables
//! - [`error`]: codec and prober errors
//!
//! Datagram delivery lives in the `l2t-transport` crate.

pub mod attribute;
pub mod config;
pub mod error;
pub mod message;
pub mod target;

pub use attribute::{AttrType, Attribute, Category, PayloadSpec};
pub use config::ProbeConfig;
pub use error::{CodecError, TargetError};
pub use message::{Message, MessageBuilder, MsgType};
pub use target::{ReachabilitySample, Target};
