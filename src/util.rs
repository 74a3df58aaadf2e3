//! Small helpers shared across the codec.

#[inline(always)]
#[cold]
fn cold_path() {}

/// "Annotation" to hint that a branch of an if-statement is likely to occur.
#[inline(always)]
pub(crate) fn likely(b: bool) -> bool {
    if b {
        true
    } else {
        cold_path();
        false
    }
}

/// "Annotation" to hint that a branch of an if-statement is _not likely_ to occur.
#[inline(always)]
pub(crate) fn unlikely(b: bool) -> bool {
    if b {
        cold_path();
        true
    } else {
        false
    }
}

/// Lossless conversion between integer widths, for the casts `From` does not
/// cover on every platform we build for.
pub(crate) trait CastFrom<T> {
    fn cast_from(from: T) -> Self;
}

// N.B. We only support 32- and 64-bit targets, where both conversions are lossless.
static_assertions::const_assert!(core::mem::size_of::<usize>() >= 4);
static_assertions::const_assert!(core::mem::size_of::<usize>() <= 8);

#[allow(clippy::as_conversions)]
impl CastFrom<usize> for u64 {
    #[inline(always)]
    fn cast_from(from: usize) -> Self {
        from as u64
    }
}
