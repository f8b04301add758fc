use l2t::{AttrType, Attribute, Message, MsgType};
use rand::Rng;

/// ------------------------------------------------------------
/// Helpers
/// ------------------------------------------------------------

fn sample_message() -> Vec<u8> {
    Message::builder(MsgType::ReplyDst)
        .attr(Attribute::build(AttrType::SrcMac, "0000.5e00.5301").unwrap())
        .attr(Attribute::build(AttrType::DstMac, "00-00-5e-00-53-02").unwrap())
        .attr(Attribute::build(AttrType::Vlan, 42u64).unwrap())
        .attr(Attribute::build(AttrType::DevName, "core-sw1").unwrap())
        .attr(Attribute::build(AttrType::InPortSpeed, "1Gb/s").unwrap())
        .attr(Attribute::build(AttrType::InPortDuplex, "full").unwrap())
        .attr(Attribute::build(AttrType::NbrIpv4, "192.0.2.77").unwrap())
        .build()
        .serialize(&[])
        .unwrap()
}

/// Whatever parses must validate, render and re-encode to the same bytes.
fn check_consistent(bytes: &[u8]) {
    if let Ok(msg) = Message::parse(bytes) {
        let _ = msg.to_string();
        if msg.validate().is_ok() {
            assert_eq!(msg.serialize(&[]).unwrap(), bytes);
        }
    }
}

/// ------------------------------------------------------------
/// Random garbage
/// ------------------------------------------------------------

#[test]
fn random_bytes_never_panic() {
    let mut rng = rand::thread_rng();
    for _ in 0..5_000 {
        let len = rng.gen_range(0..300);
        let bytes: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        let _ = Attribute::parse(&bytes);
        check_consistent(&bytes);
    }
}

#[test]
fn random_bytes_with_plausible_header() {
    let mut rng = rand::thread_rng();
    for _ in 0..5_000 {
        let body_len = rng.gen_range(0..200usize);
        let mut bytes = vec![rng.gen_range(1..=4u8), 1, 0, 0, rng.gen_range(0..8u8)];
        bytes.extend((0..body_len).map(|_| rng.gen::<u8>()));
        let total = bytes.len() as u16;
        bytes[2..4].copy_from_slice(&total.to_be_bytes());
        check_consistent(&bytes);
    }
}

/// ------------------------------------------------------------
/// Mutations of a valid message
/// ------------------------------------------------------------

#[test]
fn single_byte_mutations_never_panic() {
    let original = sample_message();
    let mut rng = rand::thread_rng();
    for _ in 0..5_000 {
        let mut bytes = original.clone();
        let at = rng.gen_range(0..bytes.len());
        bytes[at] = rng.gen();
        check_consistent(&bytes);
    }
}

#[test]
fn every_truncation_is_rejected() {
    let original = sample_message();
    for cut in 0..original.len() {
        assert!(
            Message::parse(&original[..cut]).is_err(),
            "prefix of {cut} bytes parsed"
        );
    }
    assert!(Message::parse(&original).is_ok());
}

#[test]
fn random_attribute_payloads_respect_categories() {
    let mut rng = rand::thread_rng();
    for _ in 0..5_000 {
        let attr_type = AttrType::ALL[rng.gen_range(0..AttrType::ALL.len())];
        let len = rng.gen_range(0..12usize);
        let payload: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        let attr = Attribute::from_parts(attr_type, payload);
        match attr.validate() {
            Ok(()) => {
                let wire = attr.serialize().unwrap();
                assert_eq!(Attribute::parse(&wire).unwrap(), attr);
                assert!(attr.render().is_ok());
            }
            Err(_) => {
                assert!(attr.serialize().is_err());
                assert!(attr.to_string().contains("<invalid"));
            }
        }
    }
}
