//! Type-Length-Value attributes.
//!
//! # Wire format
//!
//! ```text
//!  0               1               2
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-
//! |     Type      |    Length     |  Payload ...
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-
//! ```
//!
//! `Length` counts the whole attribute, type and length bytes included, so
//! an attribute is 2..=255 bytes on the wire.  Every attribute type belongs
//! to exactly one [`Category`], and the category alone decides how long the
//! payload must be, what content is legal, how it is rendered, and what
//! inputs it can be built from.  Those rules live in the [`CATEGORIES`]
//! table.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::error::CodecError;

/// Smallest and largest attribute on the wire.
pub const MIN_ATTR_LEN: usize = 2;
pub const MAX_ATTR_LEN: usize = 255;

/// Type and length bytes.
const ATTR_HEADER_LEN: usize = 2;

// ---------------------------------------------------------------------------
// Attribute types
// ---------------------------------------------------------------------------

/// The sixteen attribute kinds defined by protocol version 1.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttrType {
    SrcMac = 1,
    DstMac = 2,
    Vlan = 3,
    DevName = 4,
    DevType = 5,
    DevIpv4 = 6,
    InPortName = 7,
    OutPortName = 8,
    InPortSpeed = 9,
    OutPortSpeed = 10,
    InPortDuplex = 11,
    OutPortDuplex = 12,
    NbrIpv4 = 13,
    SrcIpv4 = 14,
    ReplyStatus = 15,
    NbrDevId = 16,
}

impl AttrType {
    pub const ALL: [AttrType; 16] = [
        AttrType::SrcMac,
        AttrType::DstMac,
        AttrType::Vlan,
        AttrType::DevName,
        AttrType::DevType,
        AttrType::DevIpv4,
        AttrType::InPortName,
        AttrType::OutPortName,
        AttrType::InPortSpeed,
        AttrType::OutPortSpeed,
        AttrType::InPortDuplex,
        AttrType::OutPortDuplex,
        AttrType::NbrIpv4,
        AttrType::SrcIpv4,
        AttrType::ReplyStatus,
        AttrType::NbrDevId,
    ];

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value).checked_sub(1)?).copied()
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }

    pub fn category(self) -> Category {
        match self {
            AttrType::SrcMac | AttrType::DstMac => Category::Mac,
            AttrType::Vlan => Category::Vlan,
            AttrType::DevName
            | AttrType::DevType
            | AttrType::InPortName
            | AttrType::OutPortName
            | AttrType::NbrDevId => Category::String,
            AttrType::DevIpv4 | AttrType::NbrIpv4 | AttrType::SrcIpv4 => Category::Ipv4,
            AttrType::InPortSpeed | AttrType::OutPortSpeed => Category::Speed,
            AttrType::InPortDuplex | AttrType::OutPortDuplex => Category::Duplex,
            AttrType::ReplyStatus => Category::Status,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AttrType::SrcMac => "SrcMac",
            AttrType::DstMac => "DstMac",
            AttrType::Vlan => "Vlan",
            AttrType::DevName => "DevName",
            AttrType::DevType => "DevType",
            AttrType::DevIpv4 => "DevIpv4",
            AttrType::InPortName => "InPortName",
            AttrType::OutPortName => "OutPortName",
            AttrType::InPortSpeed => "InPortSpeed",
            AttrType::OutPortSpeed => "OutPortSpeed",
            AttrType::InPortDuplex => "InPortDuplex",
            AttrType::OutPortDuplex => "OutPortDuplex",
            AttrType::NbrIpv4 => "NbrIpv4",
            AttrType::SrcIpv4 => "SrcIpv4",
            AttrType::ReplyStatus => "ReplyStatus",
            AttrType::NbrDevId => "NbrDevId",
        }
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AttrType {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| CodecError::BadInput {
                attr: "attribute type",
                input: s.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Payload families.  Discriminants index [`CATEGORIES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Mac = 0,
    Ipv4 = 1,
    Vlan = 2,
    Duplex = 3,
    Speed = 4,
    Status = 5,
    String = 6,
}

type CheckFn = fn(AttrType, &[u8]) -> Result<(), CodecError>;
type RenderFn = fn(&[u8]) -> String;
type BuildFn = fn(AttrType, PayloadSpec) -> Result<Vec<u8>, CodecError>;

/// The contract of one category.
pub struct CategorySpec {
    pub name: &'static str,
    /// Exact payload length, `None` for variable-length strings.
    pub len: Option<usize>,
    /// Content rules applied after the length check.
    pub check: CheckFn,
    pub render: RenderFn,
    pub build: BuildFn,
}

impl fmt::Debug for CategorySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CategorySpec")
            .field("name", &self.name)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

pub static CATEGORIES: [CategorySpec; 7] = [
    CategorySpec {
        name: "mac",
        len: Some(6),
        check: check_any,
        render: render_mac,
        build: build_mac,
    },
    CategorySpec {
        name: "ipv4",
        len: Some(4),
        check: check_any,
        render: render_ipv4,
        build: build_ipv4,
    },
    CategorySpec {
        name: "vlan",
        len: Some(2),
        check: check_vlan,
        render: render_vlan,
        build: build_vlan,
    },
    CategorySpec {
        name: "duplex",
        len: Some(1),
        check: check_duplex,
        render: render_duplex,
        build: build_duplex,
    },
    CategorySpec {
        name: "speed",
        len: Some(4),
        check: check_any,
        render: render_speed,
        build: build_speed,
    },
    CategorySpec {
        name: "status",
        len: Some(1),
        check: check_any,
        render: render_status,
        build: build_status,
    },
    CategorySpec {
        name: "string",
        len: None,
        check: check_string,
        render: render_string,
        build: build_string,
    },
];

impl Category {
    pub fn spec(self) -> &'static CategorySpec {
        &CATEGORIES[self as usize]
    }
}

// ---------------------------------------------------------------------------
// Build input
// ---------------------------------------------------------------------------

/// What an attribute is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadSpec {
    /// Payload bytes exactly as they go on the wire.
    Raw(Vec<u8>),
    /// A numeric value; meaning depends on the category.
    Int(u64),
    /// Human-readable text, e.g. `"00:11:22:33:44:55"` or `"full"`.
    Text(String),
}

impl fmt::Display for PayloadSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadSpec::Raw(b) => write!(f, "raw bytes {b:02x?}"),
            PayloadSpec::Int(v) => write!(f, "integer {v}"),
            PayloadSpec::Text(s) => write!(f, "text {s:?}"),
        }
    }
}

impl From<&str> for PayloadSpec {
    fn from(s: &str) -> Self {
        PayloadSpec::Text(s.to_string())
    }
}

impl From<String> for PayloadSpec {
    fn from(s: String) -> Self {
        PayloadSpec::Text(s)
    }
}

impl From<u64> for PayloadSpec {
    fn from(v: u64) -> Self {
        PayloadSpec::Int(v)
    }
}

impl From<Vec<u8>> for PayloadSpec {
    fn from(b: Vec<u8>) -> Self {
        PayloadSpec::Raw(b)
    }
}

impl From<&[u8]> for PayloadSpec {
    fn from(b: &[u8]) -> Self {
        PayloadSpec::Raw(b.to_vec())
    }
}

impl From<Ipv4Addr> for PayloadSpec {
    fn from(ip: Ipv4Addr) -> Self {
        PayloadSpec::Raw(ip.octets().to_vec())
    }
}

// ---------------------------------------------------------------------------
// Attribute
// ---------------------------------------------------------------------------

/// One TLV field.  Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    attr_type: AttrType,
    payload: Vec<u8>,
}

impl Attribute {
    /// Parse one attribute occupying all of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self, CodecError> {
        if !(MIN_ATTR_LEN..=MAX_ATTR_LEN).contains(&bytes.len()) {
            return Err(CodecError::AttrSize {
                observed: bytes.len(),
            });
        }
        let claimed = usize::from(bytes[1]);
        if claimed != bytes.len() {
            return Err(CodecError::AttrLengthByte {
                claimed,
                observed: bytes.len(),
            });
        }
        let attr_type = AttrType::from_u8(bytes[0]).ok_or(CodecError::UnknownAttrType(bytes[0]))?;
        let attr = Self {
            attr_type,
            payload: bytes[ATTR_HEADER_LEN..].to_vec(),
        };
        attr.validate()?;
        Ok(attr)
    }

    /// Build an attribute from raw bytes, an integer, or text.
    pub fn build(attr_type: AttrType, spec: impl Into<PayloadSpec>) -> Result<Self, CodecError> {
        let payload = (attr_type.category().spec().build)(attr_type, spec.into())?;
        let attr = Self { attr_type, payload };
        attr.validate()?;
        Ok(attr)
    }

    /// Pair a type with a payload without checking anything.  The result is
    /// re-checked by [`validate`](Self::validate) before it can be
    /// serialized or rendered.
    pub fn from_parts(attr_type: AttrType, payload: Vec<u8>) -> Self {
        Self { attr_type, payload }
    }

    /// Re-derive the category from the type and apply its rules.
    pub fn validate(&self) -> Result<(), CodecError> {
        let spec = self.attr_type.category().spec();
        if let Some(len) = spec.len {
            if self.payload.len() != len {
                return Err(CodecError::PayloadLength {
                    attr: self.attr_type.name(),
                    expected: len,
                    observed: self.payload.len(),
                });
            }
        }
        (spec.check)(self.attr_type, &self.payload)
    }

    /// `[type][length][payload]`.
    pub fn serialize(&self) -> Result<Vec<u8>, CodecError> {
        self.validate()?;
        let mut out = Vec::with_capacity(self.wire_len());
        out.push(self.attr_type.to_u8());
        out.push(self.wire_len() as u8);
        out.extend_from_slice(&self.payload);
        Ok(out)
    }

    /// Category-specific human-readable value.
    pub fn render(&self) -> Result<String, CodecError> {
        self.validate()?;
        Ok((self.attr_type.category().spec().render)(&self.payload))
    }

    pub fn attr_type(&self) -> AttrType {
        self.attr_type
    }

    pub fn category(&self) -> Category {
        self.attr_type.category()
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn wire_len(&self) -> usize {
        ATTR_HEADER_LEN + self.payload.len()
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render() {
            Ok(value) => write!(f, "{}: {}", self.attr_type, value),
            Err(e) => write!(f, "{}: <invalid: {}>", self.attr_type, e),
        }
    }
}

/* ============================
Content checks
============================ */

fn check_any(_: AttrType, _: &[u8]) -> Result<(), CodecError> {
    Ok(())
}

fn check_vlan(attr_type: AttrType, payload: &[u8]) -> Result<(), CodecError> {
    let vlan = u16::from_be_bytes([payload[0], payload[1]]);
    if !(1..=4094).contains(&vlan) {
        return Err(CodecError::VlanRange {
            attr: attr_type.name(),
            vlan: u64::from(vlan),
        });
    }
    Ok(())
}

fn check_duplex(attr_type: AttrType, payload: &[u8]) -> Result<(), CodecError> {
    if payload[0] > 2 {
        return Err(CodecError::BadValue {
            attr: attr_type.name(),
            value: payload[0].to_string(),
        });
    }
    Ok(())
}

fn check_string(attr_type: AttrType, payload: &[u8]) -> Result<(), CodecError> {
    let bad = |reason: &str| CodecError::BadString {
        attr: attr_type.name(),
        reason: reason.to_string(),
    };
    if ATTR_HEADER_LEN + payload.len() > MAX_ATTR_LEN {
        return Err(bad("longer than 253 bytes"));
    }
    let Some((&last, text)) = payload.split_last() else {
        return Err(bad("empty payload"));
    };
    if last != 0 {
        return Err(bad("missing zero terminator"));
    }
    if text.is_empty() {
        return Err(bad("empty string"));
    }
    if let Some(pos) = text.iter().position(|b| !is_printable(*b)) {
        return Err(bad(&format!(
            "non-printable byte 0x{:02x} at offset {pos}",
            text[pos]
        )));
    }
    Ok(())
}

fn is_printable(b: u8) -> bool {
    (0x20..=0x7e).contains(&b)
}

/* ============================
Renderers
============================ */

fn render_mac(payload: &[u8]) -> String {
    payload
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

fn render_ipv4(payload: &[u8]) -> String {
    Ipv4Addr::new(payload[0], payload[1], payload[2], payload[3]).to_string()
}

fn render_vlan(payload: &[u8]) -> String {
    u16::from_be_bytes([payload[0], payload[1]]).to_string()
}

fn render_duplex(payload: &[u8]) -> String {
    match payload[0] {
        0 => "Auto".to_string(),
        1 => "Half".to_string(),
        _ => "Full".to_string(),
    }
}

fn render_speed(payload: &[u8]) -> String {
    let v = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);
    if v == 0 {
        return "Auto".to_string();
    }
    let (exp, unit) = if v >= 3 { (v - 3, "Gb/s") } else { (v, "Mb/s") };
    match 10u64.checked_pow(exp) {
        Some(magnitude) => format!("{magnitude}{unit}"),
        None => format!("{v} Unknown"),
    }
}

fn render_status(payload: &[u8]) -> String {
    match payload[0] {
        1 => "1 Success".to_string(),
        9 => "9 No CDP Neighbor".to_string(),
        n => format!("{n} Unknown"),
    }
}

fn render_string(payload: &[u8]) -> String {
    let text = payload.strip_suffix(&[0]).unwrap_or(payload);
    String::from_utf8_lossy(text).into_owned()
}

/* ============================
Builders
============================ */

fn bad_input(attr_type: AttrType, input: &PayloadSpec) -> CodecError {
    CodecError::BadInput {
        attr: attr_type.name(),
        input: input.to_string(),
    }
}

fn build_mac(attr_type: AttrType, input: PayloadSpec) -> Result<Vec<u8>, CodecError> {
    match input {
        PayloadSpec::Raw(bytes) => Ok(bytes),
        PayloadSpec::Int(v) => Ok(v.to_be_bytes()[2..].to_vec()),
        PayloadSpec::Text(ref s) => parse_mac(s).ok_or_else(|| bad_input(attr_type, &input)),
    }
}

/// Accepts `00:11:22:33:44:55`, `00-11-22-33-44-55` and `0011.2233.4455`.
fn parse_mac(s: &str) -> Option<Vec<u8>> {
    let s = s.trim();
    let (sep, groups, width) = if s.contains(':') {
        (':', 6, 2)
    } else if s.contains('-') {
        ('-', 6, 2)
    } else if s.contains('.') {
        ('.', 3, 4)
    } else {
        return None;
    };
    let parts: Vec<&str> = s.split(sep).collect();
    if parts.len() != groups
        || parts
            .iter()
            .any(|p| p.len() != width || !p.bytes().all(|b| b.is_ascii_hexdigit()))
    {
        return None;
    }
    let hex: String = parts.concat();
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok())
        .collect()
}

fn build_ipv4(attr_type: AttrType, input: PayloadSpec) -> Result<Vec<u8>, CodecError> {
    match input {
        PayloadSpec::Raw(bytes) => Ok(bytes),
        PayloadSpec::Int(v) => u32::try_from(v)
            .map(|v| v.to_be_bytes().to_vec())
            .map_err(|_| bad_input(attr_type, &input)),
        PayloadSpec::Text(ref s) => s
            .trim()
            .parse::<Ipv4Addr>()
            .map(|ip| ip.octets().to_vec())
            .map_err(|_| bad_input(attr_type, &input)),
    }
}

fn build_vlan(attr_type: AttrType, input: PayloadSpec) -> Result<Vec<u8>, CodecError> {
    let vlan = match input {
        PayloadSpec::Raw(bytes) => return Ok(bytes),
        PayloadSpec::Int(v) => v,
        PayloadSpec::Text(ref s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| bad_input(attr_type, &input))?,
    };
    if !(1..=4094).contains(&vlan) {
        return Err(CodecError::VlanRange {
            attr: attr_type.name(),
            vlan,
        });
    }
    Ok((vlan as u16).to_be_bytes().to_vec())
}

fn build_duplex(attr_type: AttrType, input: PayloadSpec) -> Result<Vec<u8>, CodecError> {
    let code = match input {
        PayloadSpec::Raw(bytes) => return Ok(bytes),
        PayloadSpec::Int(v @ 0..=2) => v as u8,
        PayloadSpec::Text(ref s) => match s.trim().to_ascii_lowercase().as_str() {
            "auto" => 0,
            "half" => 1,
            "full" => 2,
            _ => return Err(bad_input(attr_type, &input)),
        },
        PayloadSpec::Int(_) => return Err(bad_input(attr_type, &input)),
    };
    Ok(vec![code])
}

fn build_speed(attr_type: AttrType, input: PayloadSpec) -> Result<Vec<u8>, CodecError> {
    let code = match input {
        PayloadSpec::Raw(bytes) => return Ok(bytes),
        PayloadSpec::Int(v) => u32::try_from(v).map_err(|_| bad_input(attr_type, &input))?,
        PayloadSpec::Text(ref s) => parse_speed(s).ok_or_else(|| bad_input(attr_type, &input))?,
    };
    Ok(code.to_be_bytes().to_vec())
}

/// `auto`, `10Mb/s`, `100mb`, `1Gb/s`, `10gb` ...  The numeric part must be a
/// power of ten.
fn parse_speed(s: &str) -> Option<u32> {
    let s = s.trim().to_ascii_lowercase();
    if s == "auto" {
        return Some(0);
    }
    let s = s.strip_suffix("/s").unwrap_or(s.as_str());
    let (digits, giga) = if let Some(d) = s.strip_suffix("gb") {
        (d, true)
    } else if let Some(d) = s.strip_suffix("mb") {
        (d, false)
    } else {
        return None;
    };
    let zeros = digits.strip_prefix('1')?;
    if !zeros.bytes().all(|b| b == b'0') {
        return None;
    }
    let exp = u32::try_from(zeros.len()).ok()?;
    if giga {
        exp.checked_add(3)
    } else if exp == 0 {
        // 1Mb/s has no encoding; 0 means auto.
        None
    } else {
        Some(exp)
    }
}

fn build_status(attr_type: AttrType, input: PayloadSpec) -> Result<Vec<u8>, CodecError> {
    match input {
        PayloadSpec::Raw(bytes) => Ok(bytes),
        PayloadSpec::Int(v) => u8::try_from(v)
            .map(|v| vec![v])
            .map_err(|_| bad_input(attr_type, &input)),
        PayloadSpec::Text(ref s) => s
            .trim()
            .parse::<u8>()
            .map(|v| vec![v])
            .map_err(|_| bad_input(attr_type, &input)),
    }
}

fn build_string(attr_type: AttrType, input: PayloadSpec) -> Result<Vec<u8>, CodecError> {
    match input {
        PayloadSpec::Raw(bytes) => Ok(bytes),
        PayloadSpec::Text(s) => {
            let mut bytes = s.into_bytes();
            // A NUL inside the text would pass as the terminator; reject it here.
            if let Some(pos) = bytes.iter().position(|b| !is_printable(*b)) {
                return Err(CodecError::BadString {
                    attr: attr_type.name(),
                    reason: format!("non-printable byte 0x{:02x} at offset {pos}", bytes[pos]),
                });
            }
            bytes.push(0);
            Ok(bytes)
        }
        PayloadSpec::Int(_) => Err(bad_input(attr_type, &input)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(attr_type: AttrType, spec: impl Into<PayloadSpec>) -> String {
        Attribute::build(attr_type, spec).unwrap().render().unwrap()
    }

    fn roundtrip_render(attr: &Attribute) -> String {
        Attribute::parse(&attr.serialize().unwrap())
            .unwrap()
            .render()
            .unwrap()
    }

    // -- types ------------------------------------------------------------

    #[test]
    fn type_codes_cover_one_through_sixteen() {
        for (i, t) in AttrType::ALL.iter().enumerate() {
            assert_eq!(t.to_u8() as usize, i + 1);
            assert_eq!(AttrType::from_u8(t.to_u8()), Some(*t));
        }
        assert_eq!(AttrType::from_u8(0), None);
        assert_eq!(AttrType::from_u8(17), None);
    }

    #[test]
    fn type_names_parse_case_insensitively() {
        assert_eq!("devname".parse::<AttrType>().unwrap(), AttrType::DevName);
        assert_eq!("SRCIPV4".parse::<AttrType>().unwrap(), AttrType::SrcIpv4);
        assert!("bogus".parse::<AttrType>().is_err());
    }

    #[test]
    fn category_table_lengths() {
        assert_eq!(Category::Mac.spec().len, Some(6));
        assert_eq!(Category::Ipv4.spec().len, Some(4));
        assert_eq!(Category::Vlan.spec().len, Some(2));
        assert_eq!(Category::Duplex.spec().len, Some(1));
        assert_eq!(Category::Speed.spec().len, Some(4));
        assert_eq!(Category::Status.spec().len, Some(1));
        assert_eq!(Category::String.spec().len, None);
        assert_eq!(Category::String.spec().name, "string");
    }

    // -- parse ------------------------------------------------------------

    #[test]
    fn parse_rejects_out_of_range_sizes() {
        assert_eq!(
            Attribute::parse(&[1]),
            Err(CodecError::AttrSize { observed: 1 })
        );
        let huge = vec![4u8; 256];
        assert_eq!(
            Attribute::parse(&huge),
            Err(CodecError::AttrSize { observed: 256 })
        );
    }

    #[test]
    fn parse_requires_self_describing_length() {
        let err = Attribute::parse(&[3, 5, 0, 10]).unwrap_err();
        assert_eq!(
            err,
            CodecError::AttrLengthByte {
                claimed: 5,
                observed: 4
            }
        );
    }

    #[test]
    fn parse_rejects_unknown_type() {
        assert_eq!(
            Attribute::parse(&[17, 3, 1]),
            Err(CodecError::UnknownAttrType(17))
        );
        assert_eq!(
            Attribute::parse(&[0, 2]),
            Err(CodecError::UnknownAttrType(0))
        );
    }

    #[test]
    fn parse_validates_category_length() {
        let err = Attribute::parse(&[1, 7, 0, 1, 2, 3, 4]).unwrap_err();
        assert!(matches!(
            err,
            CodecError::PayloadLength {
                expected: 6,
                observed: 5,
                ..
            }
        ));
    }

    // -- MAC --------------------------------------------------------------

    #[test]
    fn mac_accepts_three_notations() {
        let want = "00:1b:2c:3d:4e:5f";
        assert_eq!(rendered(AttrType::SrcMac, "00:1b:2c:3d:4e:5f"), want);
        assert_eq!(rendered(AttrType::SrcMac, "00-1B-2C-3D-4E-5F"), want);
        assert_eq!(rendered(AttrType::DstMac, "001b.2c3d.4e5f"), want);
    }

    #[test]
    fn mac_from_integer_keeps_low_48_bits() {
        let attr = Attribute::build(AttrType::SrcMac, 0xdead_0011_2233_4455u64).unwrap();
        assert_eq!(attr.payload(), &[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
    }

    #[test]
    fn mac_rejects_garbage_text() {
        for s in ["bogus", "00:11:22:33:44", "0011.2233", "00:11:22:33:44:gg", "001122334455"] {
            assert!(
                matches!(
                    Attribute::build(AttrType::SrcMac, s),
                    Err(CodecError::BadInput { .. })
                ),
                "{s}"
            );
        }
    }

    #[test]
    fn mac_payload_length_must_be_six() {
        for len in [0usize, 1, 5, 7, 12] {
            let attr = Attribute::from_parts(AttrType::SrcMac, vec![0xab; len]);
            assert!(attr.validate().is_err(), "len {len}");
            assert!(attr.serialize().is_err());
            assert!(attr.render().is_err());
        }
        for fill in [0x00u8, 0x7f, 0xff] {
            assert!(Attribute::from_parts(AttrType::DstMac, vec![fill; 6])
                .validate()
                .is_ok());
        }
    }

    // -- IPv4 -------------------------------------------------------------

    #[test]
    fn ipv4_from_text_and_integer() {
        assert_eq!(rendered(AttrType::SrcIpv4, "10.1.2.3"), "10.1.2.3");
        assert_eq!(rendered(AttrType::NbrIpv4, 0xc000_0201u64), "192.0.2.1");
        assert_eq!(
            rendered(AttrType::DevIpv4, Ipv4Addr::new(198, 51, 100, 7)),
            "198.51.100.7"
        );
        assert!(Attribute::build(AttrType::SrcIpv4, "10.1.2").is_err());
        assert!(Attribute::build(AttrType::SrcIpv4, 1u64 << 32).is_err());
    }

    // -- VLAN -------------------------------------------------------------

    #[test]
    fn vlan_range_is_one_to_4094() {
        for v in [0u64, 4095, 4096, 65536] {
            assert!(
                matches!(
                    Attribute::build(AttrType::Vlan, v),
                    Err(CodecError::VlanRange { .. })
                ),
                "{v}"
            );
        }
        for v in [1u64, 2, 100, 4093, 4094] {
            let attr = Attribute::build(AttrType::Vlan, v).unwrap();
            assert_eq!(attr.payload(), &(v as u16).to_be_bytes());
        }
    }

    #[test]
    fn vlan_wire_values_zero_and_4095_fail_parse() {
        assert!(Attribute::parse(&[3, 4, 0x00, 0x00]).is_err());
        assert!(Attribute::parse(&[3, 4, 0x0f, 0xff]).is_err());
        assert_eq!(
            Attribute::parse(&[3, 4, 0x0f, 0xfe]).unwrap().render().unwrap(),
            "4094"
        );
    }

    #[test]
    fn vlan_from_text() {
        assert_eq!(rendered(AttrType::Vlan, "100"), "100");
        assert!(Attribute::build(AttrType::Vlan, "vlan100").is_err());
    }

    // -- duplex -----------------------------------------------------------

    #[test]
    fn duplex_words_and_codes() {
        assert_eq!(rendered(AttrType::InPortDuplex, "AUTO"), "Auto");
        assert_eq!(rendered(AttrType::InPortDuplex, "half"), "Half");
        assert_eq!(rendered(AttrType::OutPortDuplex, "Full"), "Full");
        assert_eq!(rendered(AttrType::OutPortDuplex, 1u64), "Half");
        assert!(Attribute::build(AttrType::InPortDuplex, 3u64).is_err());
        assert!(Attribute::build(AttrType::InPortDuplex, "quarter").is_err());
        assert!(Attribute::parse(&[11, 3, 7]).is_err());
    }

    // -- speed ------------------------------------------------------------

    #[test]
    fn speed_decoding_table() {
        let cases = [
            (0u64, "Auto"),
            (1, "10Mb/s"),
            (2, "100Mb/s"),
            (3, "1Gb/s"),
            (4, "10Gb/s"),
            (5, "100Gb/s"),
        ];
        for (code, want) in cases {
            assert_eq!(rendered(AttrType::InPortSpeed, code), want);
        }
    }

    #[test]
    fn speed_text_encodes_to_codes() {
        let code = |s: &str| {
            let attr = Attribute::build(AttrType::OutPortSpeed, s).unwrap();
            u32::from_be_bytes(attr.payload().try_into().unwrap())
        };
        assert_eq!(code("auto"), 0);
        assert_eq!(code("10Mb/s"), 1);
        assert_eq!(code("100mb"), 2);
        assert_eq!(code("1Gb/s"), 3);
        assert_eq!(code("1000Mb/s"), 3);
        assert_eq!(code("100Gb/s"), 5);
        assert!(Attribute::build(AttrType::OutPortSpeed, "1Mb/s").is_err());
        assert!(Attribute::build(AttrType::OutPortSpeed, "25Gb/s").is_err());
    }

    #[test]
    fn speed_overflow_renders_unknown() {
        assert_eq!(
            rendered(AttrType::InPortSpeed, u64::from(u32::MAX)),
            format!("{} Unknown", u32::MAX)
        );
    }

    // -- status -----------------------------------------------------------

    #[test]
    fn status_codes() {
        assert_eq!(rendered(AttrType::ReplyStatus, 1u64), "1 Success");
        assert_eq!(rendered(AttrType::ReplyStatus, 9u64), "9 No CDP Neighbor");
        assert_eq!(rendered(AttrType::ReplyStatus, 7u64), "7 Unknown");
        assert_eq!(
            Attribute::parse(&[15, 3, 200]).unwrap().render().unwrap(),
            "200 Unknown"
        );
        assert!(Attribute::build(AttrType::ReplyStatus, 256u64).is_err());
    }

    // -- string -----------------------------------------------------------

    #[test]
    fn string_gets_terminator() {
        let attr = Attribute::build(AttrType::DevName, "core-sw1").unwrap();
        assert_eq!(attr.payload(), b"core-sw1\0");
        assert_eq!(attr.wire_len(), 2 + 9);
        assert_eq!(attr.render().unwrap(), "core-sw1");
    }

    #[test]
    fn string_rejects_empty_nonprintable_and_integers() {
        assert!(Attribute::build(AttrType::DevName, "").is_err());
        assert!(Attribute::build(AttrType::DevName, "tab\there").is_err());
        assert!(Attribute::build(AttrType::DevName, "nul\0inside").is_err());
        assert!(Attribute::build(AttrType::DevName, "caf\u{e9}").is_err());
        assert!(Attribute::build(AttrType::DevType, 5u64).is_err());
    }

    #[test]
    fn string_length_limit() {
        let max = "x".repeat(252);
        assert_eq!(Attribute::build(AttrType::NbrDevId, max.as_str()).unwrap().wire_len(), 255);
        let over = "x".repeat(253);
        assert!(Attribute::build(AttrType::NbrDevId, over.as_str()).is_err());
    }

    #[test]
    fn string_wire_rules() {
        // missing terminator
        assert!(Attribute::parse(&[4, 5, b'a', b'b', b'c']).is_err());
        // terminator only
        assert!(Attribute::parse(&[4, 3, 0]).is_err());
        // empty payload
        assert!(Attribute::parse(&[4, 2]).is_err());
        // extra terminator
        assert!(Attribute::parse(&[4, 5, b'a', 0, 0]).is_err());
        // non-ASCII
        assert!(Attribute::parse(&[4, 4, 0xc3, 0]).is_err());
        assert_eq!(
            Attribute::parse(&[4, 5, b'a', b'b', 0]).unwrap().render().unwrap(),
            "ab"
        );
    }

    // -- round trips ------------------------------------------------------

    #[test]
    fn every_category_survives_the_wire() {
        let samples: Vec<Attribute> = vec![
            Attribute::build(AttrType::SrcMac, "aa:bb:cc:dd:ee:ff").unwrap(),
            Attribute::build(AttrType::SrcIpv4, "192.0.2.55").unwrap(),
            Attribute::build(AttrType::Vlan, 42u64).unwrap(),
            Attribute::build(AttrType::InPortDuplex, "full").unwrap(),
            Attribute::build(AttrType::InPortSpeed, 4u64).unwrap(),
            Attribute::build(AttrType::ReplyStatus, 9u64).unwrap(),
            Attribute::build(AttrType::InPortName, "Gi1/0/24").unwrap(),
        ];
        for attr in &samples {
            assert_eq!(roundtrip_render(attr), attr.render().unwrap(), "{attr}");
        }
    }

    #[test]
    fn serialize_layout() {
        let attr = Attribute::build(AttrType::Vlan, 0x0123u64).unwrap();
        assert_eq!(attr.serialize().unwrap(), vec![3, 4, 0x01, 0x23]);
    }

    #[test]
    fn display_includes_type_name() {
        let attr = Attribute::build(AttrType::Vlan, 10u64).unwrap();
        assert_eq!(attr.to_string(), "Vlan: 10");
        let broken = Attribute::from_parts(AttrType::Vlan, vec![0, 0]);
        assert!(broken.to_string().starts_with("Vlan: <invalid"));
    }
}
