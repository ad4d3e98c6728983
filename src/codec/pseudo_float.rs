// Pseudo-float encoding for monetary amounts.
//
// A value is split into `mantissa * 10^exponent` with every trailing
// decimal zero moved into the exponent. Wire form:
//
//   VLQ(exponent) VLQ(mantissa)
//
// The representation is exact; it only compacts round amounts.

use num_bigint::BigUint;
use num_traits::{Pow, Zero};

use super::vlq::{self, VlqError};

/// Hard ceiling on a decoded exponent, whatever limit the caller asks for.
pub const MAX_EXPONENT: usize = u32::MAX as usize;

/// Exact base-10 decomposition of a non-negative integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PseudoFloat {
    pub mantissa: BigUint,
    pub exponent: usize,
}

impl PseudoFloat {
    /// Strip trailing decimal zeros from `value`. Zero maps to `(0, 0)`.
    pub fn from_value(value: &BigUint) -> Self {
        if value.is_zero() {
            return Self {
                mantissa: BigUint::zero(),
                exponent: 0,
            };
        }
        let mut mantissa = value.clone();
        let mut exponent = 0;
        while (&mantissa % 10u32).is_zero() {
            mantissa /= 10u32;
            exponent += 1;
        }
        Self { mantissa, exponent }
    }

    /// Reconstruct `mantissa * 10^exponent`.
    pub fn to_value(&self) -> BigUint {
        if self.mantissa.is_zero() {
            return BigUint::zero();
        }
        &self.mantissa * Pow::pow(BigUint::from(10u32), self.exponent)
    }

    /// Append `VLQ(exponent) ++ VLQ(mantissa)` to `out`.
    pub fn write(&self, out: &mut Vec<u8>) {
        vlq::write_usize(out, self.exponent);
        vlq::write_biguint(out, &self.mantissa);
    }

    /// Encoded byte-length.
    pub fn encoded_len(&self) -> usize {
        vlq::sizeof_usize(self.exponent) + vlq::sizeof_biguint(&self.mantissa)
    }
}

/// Append the pseudo-float encoding of `value` to `out`.
pub fn write(out: &mut Vec<u8>, value: &BigUint) {
    PseudoFloat::from_value(value).write(out);
}

/// Pseudo-float encoding of `value` in a fresh buffer.
pub fn encode(value: &BigUint) -> Vec<u8> {
    let pf = PseudoFloat::from_value(value);
    let mut out = Vec::with_capacity(pf.encoded_len());
    pf.write(&mut out);
    out
}

/// Decode a pseudo-float from the front of `data`.
///
/// Returns the parsed pair and the number of bytes consumed. Both VLQs are
/// limited to `max_vlq_len` bytes. The exponent is checked against
/// `max_exponent`, itself capped at [`MAX_EXPONENT`], so that the
/// `10^exponent` expansion in [`PseudoFloat::to_value`] stays bounded.
pub fn read(
    data: &[u8],
    max_vlq_len: usize,
    max_exponent: usize,
) -> Result<(PseudoFloat, usize), PseudoFloatError> {
    let (exponent, exp_len) =
        vlq::read_usize_bounded(data, max_vlq_len).map_err(PseudoFloatError::Exponent)?;
    let limit = max_exponent.min(MAX_EXPONENT);
    if exponent > limit {
        return Err(PseudoFloatError::ExponentTooLarge { exponent, limit });
    }
    let (mantissa, mant_len) =
        vlq::read_biguint(&data[exp_len..], max_vlq_len).map_err(PseudoFloatError::Mantissa)?;
    Ok((PseudoFloat { mantissa, exponent }, exp_len + mant_len))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PseudoFloatError {
    #[error("exponent: {0}")]
    Exponent(VlqError),
    #[error("mantissa: {0}")]
    Mantissa(VlqError),
    #[error("exponent {exponent} exceeds limit {limit}")]
    ExponentTooLarge { exponent: usize, limit: usize },
}

impl PseudoFloatError {
    /// True when the failure is running out of input rather than bad data.
    pub fn is_truncation(&self) -> bool {
        matches!(
            self,
            Self::Exponent(VlqError::Underflow) | Self::Mantissa(VlqError::Underflow)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pow10(e: u32) -> BigUint {
        BigUint::from(10u32).pow(e)
    }

    #[test]
    fn one_ether_strips_eighteen_zeros() {
        let wei = pow10(18);
        let pf = PseudoFloat::from_value(&wei);
        assert_eq!(pf.mantissa, BigUint::from(1u32));
        assert_eq!(pf.exponent, 18);
        assert_eq!(encode(&wei), [0x12, 0x01]);

        let (decoded, consumed) = read(&[0x12, 0x01], 64, 1024).unwrap();
        assert_eq!(consumed, 2);
        assert_eq!(decoded.to_value().to_string(), "1000000000000000000");
    }

    #[test]
    fn zero_is_zero_zero() {
        let pf = PseudoFloat::from_value(&BigUint::zero());
        assert_eq!(pf.mantissa, BigUint::zero());
        assert_eq!(pf.exponent, 0);
        assert_eq!(encode(&BigUint::zero()), [0x00, 0x00]);
    }

    #[test]
    fn no_trailing_zero_keeps_exponent_zero() {
        let pf = PseudoFloat::from_value(&BigUint::from(12345u32));
        assert_eq!(pf.mantissa, BigUint::from(12345u32));
        assert_eq!(pf.exponent, 0);
    }

    #[test]
    fn interior_zeros_stay_in_mantissa() {
        let v = BigUint::from(1_050_000u32);
        let pf = PseudoFloat::from_value(&v);
        assert_eq!(pf.mantissa, BigUint::from(105u32));
        assert_eq!(pf.exponent, 4);
        assert_eq!(pf.to_value(), v);
    }

    #[test]
    fn exact_for_wide_values() {
        // 2^256 - 1 has no trailing zero; must survive untouched.
        let max = (BigUint::from(1u8) << 256u32) - BigUint::from(1u8);
        let bytes = encode(&max);
        let (pf, consumed) = read(&bytes, 64, 1024).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(pf.to_value(), max);

        let round = BigUint::from(123u32) * pow10(70);
        let (pf, _) = read(&encode(&round), 64, 1024).unwrap();
        assert_eq!(pf.exponent, 70);
        assert_eq!(pf.to_value(), round);
    }

    #[test]
    fn encoded_len_matches_output() {
        for v in [0u64, 7, 100, 12345, 1_000_000_000_000_000_000, u64::MAX] {
            let pf = PseudoFloat::from_value(&BigUint::from(v));
            let mut out = Vec::new();
            pf.write(&mut out);
            assert_eq!(out.len(), pf.encoded_len(), "value {v}");
        }
    }

    #[test]
    fn truncated_mantissa_is_truncation() {
        let err = read(&[0x12], 64, 1024).unwrap_err();
        assert!(err.is_truncation());
        let err = read(&[], 64, 1024).unwrap_err();
        assert!(err.is_truncation());
    }

    #[test]
    fn exponent_limit_enforced() {
        let mut bytes = Vec::new();
        vlq::write_usize(&mut bytes, 2000);
        bytes.push(0x01);
        assert_eq!(
            read(&bytes, 64, 1024),
            Err(PseudoFloatError::ExponentTooLarge {
                exponent: 2000,
                limit: 1024
            })
        );
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn exponent_beyond_u32_is_rejected_even_without_limit() {
        let exponent = (1usize << 32) + 1;
        let mut bytes = Vec::new();
        vlq::write_usize(&mut bytes, exponent);
        bytes.push(0x07);
        assert_eq!(
            read(&bytes, 64, usize::MAX),
            Err(PseudoFloatError::ExponentTooLarge {
                exponent,
                limit: MAX_EXPONENT
            })
        );
    }

    #[test]
    fn to_value_uses_full_exponent() {
        let pf = PseudoFloat {
            mantissa: BigUint::from(7u32),
            exponent: 300,
        };
        assert_eq!(pf.to_value(), BigUint::from(7u32) * pow10(300));
    }

    #[test]
    fn overlong_exponent_vlq_is_rejected() {
        let mut bytes = vec![0x80; 10];
        bytes.extend_from_slice(&[0x01, 0x01]);
        assert_eq!(
            read(&bytes, 8, 1024),
            Err(PseudoFloatError::Exponent(VlqError::TooLong { limit: 8 }))
        );
        assert!(read(&bytes, 64, 1024).is_ok());
    }
}
