// Calldata for the wallet's `decompressAndPerform(bytes)` entry point.
//
// The stream travels as the single `bytes` argument of that call. ABI
// layout and the selector come from the `sol!` declaration below.

use alloy_primitives::Bytes;
use alloy_sol_types::{SolCall, sol};

sol! {
    function decompressAndPerform(bytes stream);
}

/// Signature of the decompressing entry point.
pub const DECOMPRESS_AND_PERFORM: &str = decompressAndPerformCall::SIGNATURE;

/// Four-byte function selector of [`DECOMPRESS_AND_PERFORM`].
pub fn selector() -> [u8; 4] {
    decompressAndPerformCall::SELECTOR
}

/// Wrap an encoded stream as `decompressAndPerform(stream)` calldata.
pub fn wrap(stream: &[u8]) -> Vec<u8> {
    decompressAndPerformCall {
        stream: Bytes::copy_from_slice(stream),
    }
    .abi_encode()
}

/// Extract the stream from `decompressAndPerform` calldata.
///
/// Only the canonical encoding is accepted: the input must be exactly what
/// [`wrap`] would produce for the stream it carries.
pub fn unwrap(calldata: &[u8]) -> Result<Vec<u8>, CalldataError> {
    let (sel, args) = calldata
        .split_at_checked(4)
        .ok_or(CalldataError::TooShort { len: calldata.len() })?;
    if sel != decompressAndPerformCall::SELECTOR.as_slice() {
        return Err(CalldataError::Selector {
            found: u32::from_be_bytes([sel[0], sel[1], sel[2], sel[3]]),
            expected: u32::from_be_bytes(decompressAndPerformCall::SELECTOR),
        });
    }
    let call = decompressAndPerformCall::abi_decode_raw(args, true)?;
    if call.abi_encode() != calldata {
        return Err(CalldataError::NonCanonical);
    }
    Ok(call.stream.to_vec())
}

#[derive(Debug, thiserror::Error)]
pub enum CalldataError {
    #[error("calldata too short ({len} bytes)")]
    TooShort { len: usize },
    #[error("selector {found:#010x} is not decompressAndPerform ({expected:#010x})")]
    Selector { found: u32, expected: u32 },
    #[error("abi decoding failed: {0}")]
    Abi(#[from] alloy_sol_types::Error),
    #[error("argument encoding is not canonical (offset, padding or trailing bytes)")]
    NonCanonical,
}
