//! Default value checks for sparse encoding.
//!
//! Fields holding their default value are left off the wire entirely. For
//! scalars that is zero, for bare strings and blobs it is empty, and for
//! optional values it is `None`. A present but empty `Some("")` is still
//! encoded.

use bytes::Bytes;

use super::Message;

/// Trait for checking if a value is its wire default, and so can be omitted.
pub trait IsWireDefault {
    /// Returns true if this value is omitted when encoding.
    fn is_wire_default(&self) -> bool;
}

impl IsWireDefault for u32 {
    #[inline(always)]
    fn is_wire_default(&self) -> bool {
        *self == 0
    }
}

impl IsWireDefault for u64 {
    #[inline(always)]
    fn is_wire_default(&self) -> bool {
        *self == 0
    }
}

impl IsWireDefault for String {
    #[inline(always)]
    fn is_wire_default(&self) -> bool {
        self.is_empty()
    }
}

impl IsWireDefault for Bytes {
    #[inline(always)]
    fn is_wire_default(&self) -> bool {
        self.is_empty()
    }
}

impl<T> IsWireDefault for Option<T> {
    #[inline(always)]
    fn is_wire_default(&self) -> bool {
        self.is_none()
    }
}

// A message held directly, not behind an `Option`, is always present.
impl<M: Message> IsWireDefault for M {
    #[inline(always)]
    fn is_wire_default(&self) -> bool {
        false
    }
}
