//! Actpack: compression codec for batched smart-contract wallet calls.
//!
//! A batch of actions (destination, value, payload) is packed into the byte
//! stream that the wallet's on-chain decompressor expands before executing
//! each call in order. The format is a fixed wire contract, so encoding is
//! deterministic and decoding is exact.
//!
//! The crate provides:
//! - The stream codec and its building blocks (`codec`)
//! - The `Action` type (`action`)
//! - `decompressAndPerform(bytes)` calldata wrapping (`calldata`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```no_run
//! use actpack::action::Action;
//! use actpack::codec::{self, AddressRegistry, NoResolution};
//! use alloy_primitives::Address;
//! use num_bigint::BigUint;
//!
//! let actions = vec![Action::new(
//!     Address::repeat_byte(0x11),
//!     BigUint::from(10u32).pow(18),
//!     vec![0x00],
//! )];
//!
//! let stream = codec::encode(&actions, AddressRegistry::new(), NoResolution).unwrap();
//! let mut registry = AddressRegistry::new();
//! let decoded = codec::decode(&stream, &mut registry).unwrap();
//! assert_eq!(decoded, actions);
//! ```

pub mod action;
pub mod calldata;
pub mod codec;

#[cfg(feature = "cli")]
pub mod cli;

pub use action::Action;
