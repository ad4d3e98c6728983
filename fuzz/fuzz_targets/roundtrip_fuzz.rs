#![no_main]
use actpack::action::Action;
use actpack::codec::{self, AddressRegistry, RegistryResolution};
use alloy_primitives::Address;
use libfuzzer_sys::fuzz_target;
use num_bigint::BigUint;

fuzz_target!(|data: &[u8]| {
    // Carve the input into actions: [to, value_len, value.., data_len, data..]*
    let mut actions = Vec::new();
    let mut rest = data;
    while rest.len() >= 3 {
        let to = Address::repeat_byte(rest[0] % 8);
        let value_len = (rest[1] as usize % 40).min(rest.len() - 2);
        let value = BigUint::from_bytes_be(&rest[2..2 + value_len]);
        rest = &rest[2 + value_len..];
        let Some((&data_len, tail)) = rest.split_first() else {
            break;
        };
        let data_len = (data_len as usize).min(tail.len());
        actions.push(Action::new(to, value, &tail[..data_len]));
        rest = &tail[data_len..];
    }

    let snapshot: AddressRegistry = (0..4).map(Address::repeat_byte).collect();
    let stream = codec::encode(&actions, snapshot.clone(), RegistryResolution).unwrap();
    let mut registry = snapshot;
    let decoded = codec::decode(&stream, &mut registry).unwrap();
    assert_eq!(decoded, actions);
});
