use actpack::action::Action;
use actpack::calldata;
use actpack::codec::{
    self, AddressRegistry, DecodeError, DecodeOptions, EncodeOptions, NoResolution,
    RegistryResolution, StreamDecoder, StreamEncoder, pseudo_float, vlq,
};
use alloy_primitives::Address;
use num_bigint::BigUint;

fn addr(b: u8) -> Address {
    Address::repeat_byte(b)
}

fn pow10(e: u32) -> BigUint {
    BigUint::from(10u32).pow(e)
}

fn sample_batch() -> Vec<Action> {
    vec![
        Action::new(addr(0xA1), pow10(18), vec![0xA9, 0x05, 0x9C, 0xBB]),
        Action::transfer(addr(0xB2), 12345u32),
        Action::new(addr(0xA1), BigUint::from(0u8), vec![]),
        Action::new(addr(0xC3), BigUint::from(25u32) * pow10(16), vec![0u8; 100]),
        Action::transfer(addr(0xB2), pow10(30)),
    ]
}

#[test]
fn vlq_boundaries() {
    let cases: &[(u64, &[u8])] = &[
        (0, &[0x00]),
        (127, &[0x7F]),
        (128, &[0x81, 0x00]),
        (16383, &[0xFF, 0x7F]),
        (16384, &[0x81, 0x80, 0x00]),
    ];
    for &(value, bytes) in cases {
        assert_eq!(vlq::encode_biguint(&BigUint::from(value)), bytes, "value {value}");
    }
}

#[test]
fn pseudo_float_exactness() {
    let (pf, _) = pseudo_float::read(&pseudo_float::encode(&pow10(18)), 64, 1024).unwrap();
    assert_eq!(pf.to_value().to_string(), "1000000000000000000");

    let zero = pseudo_float::PseudoFloat::from_value(&BigUint::from(0u8));
    assert_eq!((zero.mantissa, zero.exponent), (BigUint::from(0u8), 0));

    let plain = pseudo_float::PseudoFloat::from_value(&BigUint::from(12345u32));
    assert_eq!((plain.mantissa, plain.exponent), (BigUint::from(12345u32), 0));
}

#[test]
fn single_raw_address_action() {
    let actions = [Action::new(addr(0x11), pow10(18), vec![0x00])];
    let stream = codec::encode(&actions, AddressRegistry::new(), NoResolution).unwrap();

    let mut expected = vec![0x01]; // VLQ(1)
    expected.push(0x00); // bit-stack, flag clear
    expected.extend_from_slice(&[0x11; 20]);
    expected.extend_from_slice(&[0x12, 0x01]); // exponent 18, mantissa 1
    expected.extend_from_slice(&[0x01, 0x00]); // VLQ(1), data
    assert_eq!(stream, expected);
}

#[test]
fn mixed_batch_resolves_reference_to_first_registration() {
    let actions = [
        Action::transfer(addr(0x11), pow10(17)),
        Action::new(addr(0x11), pow10(17), vec![0x01]),
    ];
    let stream = codec::encode(&actions, AddressRegistry::new(), RegistryResolution).unwrap();
    assert_eq!(stream[0], 0x02);
    assert_eq!(stream[1], 0b0100_0000);

    let mut registry = AddressRegistry::new();
    let decoded = codec::decode(&stream, &mut registry).unwrap();
    assert_eq!(decoded, actions);
    assert_eq!(registry.lookup(0), Some(addr(0x11)));
    assert_eq!(registry.len(), 1);
}

#[test]
fn roundtrip_with_matching_registry_state() {
    let snapshot: AddressRegistry = [addr(0xC3), addr(0xB2)].into_iter().collect();
    let encoded = StreamEncoder::with_resolver(RegistryResolution)
        .encode(&sample_batch(), snapshot.clone())
        .unwrap();
    // 0xB2 and 0xC3 known up front, 0xA1 registered by the first action.
    assert_eq!(encoded.stats.references, 4);
    assert_eq!(encoded.stats.raw_addresses, 1);
    assert!(encoded.stats.ratio() < 1.0);

    let mut registry = snapshot;
    let decoded = codec::decode(&encoded.bytes, &mut registry).unwrap();
    assert_eq!(decoded, sample_batch());
    assert_eq!(registry.entries(), &[addr(0xC3), addr(0xB2), addr(0xA1)]);
}

#[test]
fn stale_decoder_registry_is_caught() {
    // Encoder believes 0xB2 sits at index 1; decoder registry is empty.
    let snapshot: AddressRegistry = [addr(0xC3), addr(0xB2)].into_iter().collect();
    let stream =
        codec::encode(&[Action::transfer(addr(0xB2), 1u32)], snapshot, RegistryResolution)
            .unwrap();
    let err = codec::decode(&stream, &mut AddressRegistry::new()).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::InvalidReference {
            index: 1,
            registry_len: 0,
            ..
        }
    ));
}

#[test]
fn every_prefix_is_truncated() {
    let snapshot: AddressRegistry = [addr(0xB2)].into_iter().collect();
    let stream = codec::encode(&sample_batch(), snapshot.clone(), RegistryResolution).unwrap();
    for len in 0..stream.len() {
        let mut registry = snapshot.clone();
        let err = codec::decode(&stream[..len], &mut registry).unwrap_err();
        assert!(
            matches!(err, DecodeError::TruncatedStream { .. }),
            "prefix {len}: {err:?}"
        );
        assert_eq!(registry, snapshot, "prefix {len} left registrations behind");
    }
}

#[test]
fn strict_encoder_refuses_unverifiable_reference() {
    let claim_two = |_: &Address, _: &AddressRegistry| Some(2usize);
    let err = StreamEncoder::with_resolver(claim_two)
        .with_options(EncodeOptions {
            strict_references: true,
            ..Default::default()
        })
        .encode(&sample_batch(), AddressRegistry::new())
        .unwrap_err();
    assert_eq!(err.kind(), "AddressResolutionFailure");
}

#[test]
fn decode_limits_are_configurable() {
    let actions = [Action::transfer(addr(0x01), pow10(100))];
    let stream = codec::encode(&actions, AddressRegistry::new(), NoResolution).unwrap();

    let tight = StreamDecoder::with_options(DecodeOptions {
        max_exponent: 50,
        ..Default::default()
    });
    let err = tight.decode(&stream, &mut AddressRegistry::new()).unwrap_err();
    assert_eq!(err.kind(), "MalformedNumber");

    let decoded = StreamDecoder::new()
        .decode(&stream, &mut AddressRegistry::new())
        .unwrap();
    assert_eq!(decoded, actions);
}

#[test]
fn calldata_carries_stream() {
    let stream = codec::encode(&sample_batch(), AddressRegistry::new(), NoResolution).unwrap();
    let cd = calldata::wrap(&stream);
    assert_eq!(cd[..4], calldata::selector());
    assert_eq!((cd.len() - 4) % 32, 0);

    let unwrapped = calldata::unwrap(&cd).unwrap();
    let decoded = codec::decode(&unwrapped, &mut AddressRegistry::new()).unwrap();
    assert_eq!(decoded, sample_batch());
}

#[test]
fn encoder_refuses_what_the_default_decoder_would_reject() {
    let round = [Action::transfer(addr(0x01), pow10(1025))];
    let err = codec::encode(&round, AddressRegistry::new(), NoResolution).unwrap_err();
    assert_eq!(err.kind(), "ExponentTooLarge");

    let wide = (BigUint::from(1u8) << 460u32) + BigUint::from(1u8);
    let err = codec::encode(&[Action::transfer(addr(0x01), wide)], AddressRegistry::new(), NoResolution)
        .unwrap_err();
    assert_eq!(err.kind(), "VlqTooLong");

    // Largest values inside the limits still round-trip.
    let edge = [
        Action::transfer(addr(0x01), pow10(1024)),
        Action::transfer(addr(0x02), (BigUint::from(1u8) << 448u32) - BigUint::from(1u8)),
    ];
    let stream = codec::encode(&edge, AddressRegistry::new(), NoResolution).unwrap();
    assert_eq!(codec::decode(&stream, &mut AddressRegistry::new()).unwrap(), edge);
}
