// Action-stream compression codec.
//
// Encodes a batch of calls into the byte stream accepted by the on-chain
// decompressor, and decodes it back for conformance checks.
//
// # Modules
//
// - `vlq`          : Variable-length integers (base-128, big-endian)
// - `pseudo_float` : Exact mantissa/exponent form for round amounts
// - `bit_stack`    : MSB-first packed flag bits
// - `address_ref`  : Raw addresses, registry references, the registry
// - `stream`       : Batch encoder and decoder
// - `error`        : Encode and decode error kinds

pub mod address_ref;
pub mod bit_stack;
pub mod error;
pub mod pseudo_float;
pub mod stream;
pub mod vlq;

// Re-export key types for convenience.
pub use address_ref::{
    AddressField, AddressRegistry, AddressResolver, NoResolution, RegistryResolution,
};
pub use error::{DecodeError, EncodeError};
pub use pseudo_float::PseudoFloat;
pub use stream::{
    DecodeOptions, EncodeOptions, EncodeStats, EncodedStream, StreamDecoder, StreamEncoder, decode,
    encode,
};
