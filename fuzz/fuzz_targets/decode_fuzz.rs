#![no_main]
use actpack::codec::{self, AddressRegistry};
use alloy_primitives::Address;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // The decoder must never panic, only return errors.
    let mut registry = AddressRegistry::new();
    let _ = codec::decode(data, &mut registry);

    // Also fuzz with a populated registry so references can resolve.
    let mut registry: AddressRegistry = (1..=4).map(Address::repeat_byte).collect();
    let before = registry.clone();
    if codec::decode(data, &mut registry).is_err() {
        assert_eq!(registry, before);
    }
});
