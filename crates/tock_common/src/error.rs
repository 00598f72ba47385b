//! Errors produced by [`Value`](crate::Value) operations.

/// An invalid `[lo, hi)` slice of a value.
///
/// Slices must satisfy `lo < hi <= width`. This is always a construction
/// error in the model that requested the slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid slice [{lo}:{hi}) of a {width}-bit value")]
pub struct RangeError {
    /// Low bit index (inclusive).
    pub lo: u32,
    /// High bit index (exclusive).
    pub hi: u32,
    /// Width of the value being sliced.
    pub width: u32,
}

/// Advisory raised when a magnitude does not fit in the destination width.
///
/// The value is still written, truncated to `width` bits. Callers surface
/// this as a diagnostic and carry on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("magnitude {magnitude:#x} does not fit in {width} bits and was truncated")]
pub struct WidthOverflow {
    /// Width of the destination.
    pub width: u32,
    /// The magnitude before truncation (low 64 bits).
    pub magnitude: u64,
}

/// A serialized value that breaks the width and word-count rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MalformedValue {
    /// The width is zero.
    #[error("a value must be at least one bit wide")]
    ZeroWidth,
    /// The word list does not match the width.
    #[error("a {width}-bit value packs into {expected} words, found {found}")]
    WordCount {
        /// Declared width.
        width: u32,
        /// Words required by `width`.
        expected: usize,
        /// Words present.
        found: usize,
    },
}
