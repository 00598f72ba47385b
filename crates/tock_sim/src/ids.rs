//! Opaque ID newtypes for models, signals, and behaviour blocks.

use crate::arena::ArenaId;
use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }

            /// Returns the index for use with dense side tables.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }
    };
}

define_id!(
    /// ID of a model instance in the design hierarchy.
    ModelId
);

define_id!(
    /// ID of a signal (port or wire). Unique across the whole design.
    SignalId
);

define_id!(
    /// ID of a combinational, sequential, or connection block.
    BlockId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_roundtrip() {
        assert_eq!(SignalId::from_raw(42).as_raw(), 42);
        assert_eq!(<BlockId as ArenaId>::from_raw(7).as_raw(), 7);
    }

    #[test]
    fn ids_order_by_index() {
        assert!(BlockId::from_raw(1) < BlockId::from_raw(2));
    }

    #[test]
    fn serde_roundtrip() {
        let id = ModelId::from_raw(3);
        let json = serde_json::to_string(&id).unwrap();
        let back: ModelId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
