// A single call within a batch.

use alloy_primitives::Address;
use num_bigint::{BigInt, BigUint};

use crate::codec::error::EncodeError;

/// One on-chain call request: destination, value and payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Action {
    pub to: Address,
    pub value: BigUint,
    pub data: Vec<u8>,
}

impl Action {
    pub fn new(to: Address, value: impl Into<BigUint>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            to,
            value: value.into(),
            data: data.into(),
        }
    }

    /// Build from a signed amount, rejecting anything below zero.
    pub fn try_from_signed(
        to: Address,
        value: BigInt,
        data: impl Into<Vec<u8>>,
    ) -> Result<Self, EncodeError> {
        let unsigned = value
            .to_biguint()
            .ok_or(EncodeError::NegativeValue { value })?;
        Ok(Self::new(to, unsigned, data))
    }

    /// A plain value transfer with no payload.
    pub fn transfer(to: Address, value: impl Into<BigUint>) -> Self {
        Self::new(to, value, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_value_is_rejected() {
        let to = Address::repeat_byte(0x22);
        let err = Action::try_from_signed(to, BigInt::from(-1), vec![]).unwrap_err();
        assert_eq!(
            err,
            EncodeError::NegativeValue {
                value: BigInt::from(-1)
            }
        );
    }

    #[test]
    fn zero_and_positive_values_are_accepted() {
        let to = Address::repeat_byte(0x22);
        let a = Action::try_from_signed(to, BigInt::from(0), vec![1, 2]).unwrap();
        assert_eq!(a.value, BigUint::from(0u8));
        assert_eq!(a.data, [1, 2]);

        let b = Action::try_from_signed(to, BigInt::from(5), vec![]).unwrap();
        assert_eq!(b, Action::transfer(to, 5u32));
    }
}
