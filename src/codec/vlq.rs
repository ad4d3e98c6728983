// Variable-length quantity (VLQ) encoding.
//
// Base-128, big-endian: most-significant group first.
// Each byte has bit 7 set except the final byte.
// Zero encodes as a single 0x00 byte.
//
// Values are unbounded (`BigUint`); counts, lengths and registry indices
// use the `usize` fast path, which produces identical bytes.

use num_bigint::BigUint;
use num_traits::Zero;

/// Maximum encoded length for a 64-bit value (ceil(64/7) = 10).
const MAX_U64_LEN: usize = 10;

/// Overflow guard for 64-bit accumulator: if these bits are set before a
/// shift, the next `<< 7` would overflow.
const U64_OVERFLOW_MASK: u64 = 0xFE00_0000_0000_0000;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VlqError {
    /// Not enough input bytes to complete the integer.
    #[error("vlq underflow (truncated input)")]
    Underflow,
    /// Value would overflow the target integer type.
    #[error("vlq overflow")]
    Overflow,
    /// More continuation bytes than the caller allows.
    #[error("vlq longer than {limit} bytes")]
    TooLong { limit: usize },
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode a `u64` into `buf`, filling from the end.
/// Returns the number of bytes written (1..=10).
#[inline]
pub fn encode_u64(mut num: u64, buf: &mut [u8; MAX_U64_LEN]) -> usize {
    let mut i = MAX_U64_LEN;
    loop {
        i -= 1;
        buf[i] = (num as u8 & 0x7F) | 0x80;
        num >>= 7;
        if num == 0 {
            break;
        }
    }
    buf[MAX_U64_LEN - 1] &= 0x7F; // clear MSB on last byte
    MAX_U64_LEN - i
}

/// Append the VLQ encoding of `num` to `out`.
pub fn write_usize(out: &mut Vec<u8>, num: usize) {
    let mut buf = [0u8; MAX_U64_LEN];
    let len = encode_u64(num as u64, &mut buf);
    out.extend_from_slice(&buf[MAX_U64_LEN - len..]);
}

/// Append the VLQ encoding of an unbounded integer to `out`.
pub fn write_biguint(out: &mut Vec<u8>, num: &BigUint) {
    if num.is_zero() {
        out.push(0);
        return;
    }
    let digits = num.to_radix_be(128);
    let last = digits.len() - 1;
    out.extend(
        digits
            .iter()
            .enumerate()
            .map(|(i, &d)| if i == last { d } else { d | 0x80 }),
    );
}

/// Encode an unbounded integer into a fresh buffer.
pub fn encode_biguint(num: &BigUint) -> Vec<u8> {
    let mut out = Vec::with_capacity(sizeof_biguint(num));
    write_biguint(&mut out, num);
    out
}

// ---------------------------------------------------------------------------
// Decoding from byte slices
// ---------------------------------------------------------------------------

/// Decode a `u64` from the front of `data`.
/// Returns `(value, bytes_consumed)`.
pub fn read_u64(data: &[u8]) -> Result<(u64, usize), VlqError> {
    let mut val: u64 = 0;
    for (i, &byte) in data.iter().enumerate() {
        if val & U64_OVERFLOW_MASK != 0 {
            return Err(VlqError::Overflow);
        }
        val = (val << 7) | u64::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Ok((val, i + 1));
        }
    }
    Err(VlqError::Underflow)
}

/// Decode a `usize` from the front of `data`.
pub fn read_usize(data: &[u8]) -> Result<(usize, usize), VlqError> {
    let (val, len) = read_u64(data)?;
    let val = usize::try_from(val).map_err(|_| VlqError::Overflow)?;
    Ok((val, len))
}

/// Like [`read_usize`], but fails with `TooLong` when the integer does not
/// terminate within `max_len` bytes.
pub fn read_usize_bounded(data: &[u8], max_len: usize) -> Result<(usize, usize), VlqError> {
    let end = terminator(data, max_len)?;
    read_usize(&data[..=end])
}

/// Decode an unbounded integer from the front of `data`, reading at most
/// `max_len` bytes. Returns `(value, bytes_consumed)`.
///
/// Non-canonical leading `0x80` groups are accepted, as the on-chain
/// decoder accepts them.
pub fn read_biguint(data: &[u8], max_len: usize) -> Result<(BigUint, usize), VlqError> {
    let end = terminator(data, max_len)?;
    let digits: Vec<u8> = data[..=end].iter().map(|b| b & 0x7F).collect();
    let val = BigUint::from_radix_be(&digits, 128).ok_or(VlqError::Overflow)?;
    Ok((val, end + 1))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Index of the final byte of the integer at the front of `data`.
fn terminator(data: &[u8], max_len: usize) -> Result<usize, VlqError> {
    match data.iter().take(max_len).position(|&b| b & 0x80 == 0) {
        Some(end) => Ok(end),
        None if data.len() >= max_len => Err(VlqError::TooLong { limit: max_len }),
        None => Err(VlqError::Underflow),
    }
}

/// Encoded byte-length of a `usize` value.
#[inline]
pub fn sizeof_usize(num: usize) -> usize {
    let bits = usize::BITS - num.leading_zeros();
    bits.max(1).div_ceil(7) as usize
}

/// Encoded byte-length of an unbounded integer.
pub fn sizeof_biguint(num: &BigUint) -> usize {
    (num.bits().max(1)).div_ceil(7) as usize
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
