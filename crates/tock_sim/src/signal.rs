//! Signal storage: ports and wires holding one committed value each.
//!
//! A [`SignalState`] keeps the last committed [`Value`] and at most one
//! pending write. Readers only ever see the committed value; the kernel
//! decides when a pending write becomes visible by calling
//! [`commit`](SignalState::commit).

use serde::{Deserialize, Serialize};
use tock_common::{Ident, Value, WidthOverflow};

use crate::ids::ModelId;

/// Direction of a model boundary terminal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Direction {
    /// Driven from outside the model.
    Input,
    /// Driven from inside the model.
    Output,
}

/// Whether a signal is a port or an internal wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum SignalKind {
    /// A model boundary terminal.
    Port(Direction),
    /// Internal storage, not visible outside the owning model.
    Wire,
}

/// Runtime state of one signal.
#[derive(Clone, Debug)]
pub struct SignalState {
    /// Local name within the owning model.
    pub name: Ident,
    /// The model that declared this signal.
    pub owner: ModelId,
    /// Port direction or wire.
    pub kind: SignalKind,
    /// Declared width in bits. Zero is rejected at elaboration.
    pub width: u32,
    /// Last committed value.
    value: Value,
    /// Most recent uncommitted write.
    pending: Option<Value>,
    /// Whether the committed value changed in the current cycle.
    changed: bool,
}

impl SignalState {
    /// Creates a signal initialized to zero.
    pub fn new(name: Ident, owner: ModelId, kind: SignalKind, width: u32) -> Self {
        Self {
            name,
            owner,
            kind,
            width,
            value: Value::new(width.max(1)),
            pending: None,
            changed: false,
        }
    }

    /// Returns the last committed value.
    pub fn read(&self) -> &Value {
        &self.value
    }

    /// Buffers a pending write, resized to the signal width.
    ///
    /// A later `assign` before the next commit replaces the earlier one.
    /// Returns an advisory when significant bits were dropped.
    pub fn assign(&mut self, value: Value) -> Option<WidthOverflow> {
        let width = self.value.width();
        let overflow = (!value.fits_in(width)).then(|| WidthOverflow {
            width,
            magnitude: value.as_u64(),
        });
        self.pending = Some(value.resize(width));
        overflow
    }

    /// Makes the pending write the committed value.
    ///
    /// Returns true if the committed value changed. Without a pending write
    /// this is a no-op returning false.
    pub fn commit(&mut self) -> bool {
        match self.pending.take() {
            Some(next) if next != self.value => {
                self.value = next;
                self.changed = true;
                true
            }
            _ => false,
        }
    }

    /// Returns true if a write is waiting for commit.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns true if the committed value changed in the current cycle.
    pub fn changed(&self) -> bool {
        self.changed
    }

    /// Forgets the per-cycle change flag.
    pub fn clear_changed(&mut self) {
        self.changed = false;
    }

    /// Returns true for input ports.
    pub fn is_input(&self) -> bool {
        self.kind == SignalKind::Port(Direction::Input)
    }

    /// Returns true for output ports.
    pub fn is_output(&self) -> bool {
        self.kind == SignalKind::Port(Direction::Output)
    }

    /// Returns true for ports of either direction.
    pub fn is_port(&self) -> bool {
        matches!(self.kind, SignalKind::Port(_))
    }
}
