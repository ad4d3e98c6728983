#![no_main]
use actpack::calldata;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = calldata::unwrap(data);
    assert_eq!(calldata::unwrap(&calldata::wrap(data)).unwrap(), data);
});
