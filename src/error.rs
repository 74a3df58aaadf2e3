//! Errors surfaced while decoding or encoding packets.

/// Reason a decoded key was rejected.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InvalidTagReason {
    /// Field number zero is never assigned to a field.
    ZeroFieldNumber,
    /// Field number does not fit in the 29 bits available to it.
    FieldNumberTooLarge,
}

impl core::fmt::Display for InvalidTagReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            InvalidTagReason::ZeroFieldNumber => f.write_str("field number 0"),
            InvalidTagReason::FieldNumberTooLarge => f.write_str("field number out of range"),
        }
    }
}

/// A packet could not be decoded. Callers should drop the packet.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed varint")]
    MalformedVarint,
    #[error("truncated message: needed {needed} bytes, {remaining} remaining")]
    TruncatedMessage { needed: usize, remaining: usize },
    #[error("invalid tag: {reason}")]
    InvalidTag { reason: InvalidTagReason },
    #[error("invalid 'wire type' value: {value}")]
    InvalidWireType { value: u8 },
    #[error("deprecated group encoding not supported")]
    DeprecatedGroupEncoding,
    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,
    #[error("length prefix {value} exceeds platform addressable memory")]
    LengthOverflow { value: u64 },
    #[error("nested messages exceed the recursion limit of {limit}")]
    RecursionLimitExceeded { limit: u32 },
}

impl DecodeError {
    #[cold]
    pub(crate) fn truncated(needed: usize, remaining: usize) -> Self {
        DecodeError::TruncatedMessage { needed, remaining }
    }

    #[cold]
    pub(crate) fn invalid_tag(reason: InvalidTagReason) -> Self {
        DecodeError::InvalidTag { reason }
    }
}

/// A packet could not be encoded into the provided sink.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("insufficient buffer capacity: required {required} bytes, {remaining} remaining")]
    InsufficientCapacity { required: usize, remaining: usize },
}
