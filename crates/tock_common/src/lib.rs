//! Shared foundational types for the Tock hardware simulation kernel.
//!
//! This crate provides the fixed-width [`Value`] bit-vector with hardware
//! truncation semantics, the advisory and fatal errors it can report, and
//! interned identifiers for signal and model names.

#![warn(missing_docs)]

pub mod error;
pub mod ident;
pub mod value;

pub use error::{MalformedValue, RangeError, WidthOverflow};
pub use ident::{Ident, Interner};
pub use value::Value;
