// Error types for the action-stream codec.

use alloy_primitives::Address;
use num_bigint::BigInt;

/// Failures while building or encoding a batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("value {value} is negative")]
    NegativeValue { value: BigInt },

    #[error(
        "action {action}: registry cannot confirm {address} at index {claimed} \
         (registry holds {registry_len} entries)"
    )]
    AddressResolutionFailure {
        action: usize,
        address: Address,
        claimed: usize,
        registry_len: usize,
    },

    #[error("{field} needs a {len}-byte VLQ, decoder limit is {limit}")]
    VlqTooLong {
        field: String,
        len: usize,
        limit: usize,
    },

    #[error("action {action}: value exponent {exponent} exceeds decoder limit {limit}")]
    ExponentTooLarge {
        action: usize,
        exponent: usize,
        limit: usize,
    },
}

/// Failures while parsing a stream. All are terminal for the call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("truncated stream at offset {offset}: {context}")]
    TruncatedStream { offset: usize, context: &'static str },

    #[error("malformed number at offset {offset} ({context}): {reason}")]
    MalformedNumber {
        offset: usize,
        context: &'static str,
        reason: String,
    },

    #[error("invalid registry reference {index} at offset {offset} (registry holds {registry_len} entries)")]
    InvalidReference {
        offset: usize,
        index: usize,
        registry_len: usize,
    },

    #[error("{count} trailing byte(s) after offset {offset}")]
    TrailingBytes { offset: usize, count: usize },
}

impl DecodeError {
    /// Stable name of the error kind, for logs and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TruncatedStream { .. } => "TruncatedStream",
            Self::MalformedNumber { .. } => "MalformedNumber",
            Self::InvalidReference { .. } => "InvalidReference",
            Self::TrailingBytes { .. } => "TrailingBytes",
        }
    }
}

impl EncodeError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NegativeValue { .. } => "NegativeValue",
            Self::AddressResolutionFailure { .. } => "AddressResolutionFailure",
            Self::VlqTooLong { .. } => "VlqTooLong",
            Self::ExponentTooLarge { .. } => "ExponentTooLarge",
        }
    }
}
