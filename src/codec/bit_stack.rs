// Bit-stack: dense MSB-first packing of a boolean sequence.
//
// Bit `i` occupies bit `7 - i % 8` of byte `i / 8`. Pad bits in the last
// byte are zero on encode and ignored on decode. The bit count is not
// stored; the caller supplies it.

/// Number of bytes needed for `count` bits.
#[inline]
pub fn byte_len(count: usize) -> usize {
    count.div_ceil(8)
}

/// Append the packed form of `bits` to `out`.
pub fn write(out: &mut Vec<u8>, bits: &[bool]) {
    out.extend(bits.chunks(8).map(|chunk| {
        chunk
            .iter()
            .enumerate()
            .fold(0u8, |byte, (i, &bit)| byte | (u8::from(bit) << (7 - i)))
    }));
}

/// Pack `bits` into a fresh buffer.
pub fn encode(bits: &[bool]) -> Vec<u8> {
    let mut out = Vec::with_capacity(byte_len(bits.len()));
    write(&mut out, bits);
    out
}

/// Unpack `count` bits from the front of `data`.
///
/// Returns `None` when fewer than `byte_len(count)` bytes are available.
pub fn read(data: &[u8], count: usize) -> Option<Vec<bool>> {
    let packed = data.get(..byte_len(count))?;
    Some(
        (0..count)
            .map(|i| packed[i / 8] & (0x80u8 >> (i % 8)) != 0)
            .collect(),
    )
}
