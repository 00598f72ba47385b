//! Behaviour blocks and the evaluation context handed to them.
//!
//! Every block declares its read-set and write-set when it is built. The
//! kernel relies on those sets for scheduling, so [`BlockCtx`] refuses any
//! access outside them: the stray access is recorded and the evaluation
//! fails once the block returns.

use std::cell::Cell;
use std::fmt;

use tock_common::{Ident, RangeError, Value};

use crate::arena::Arena;
use crate::error::Access;
use crate::ids::{ModelId, SignalId};
use crate::signal::SignalState;

/// When a block runs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BlockKind {
    /// Re-evaluated whenever a signal it reads changes, until settled.
    Combinational,
    /// Evaluated once per clock edge; its writes commit together.
    Sequential,
}

/// Signature of a user-supplied block body.
pub type EvalFn = dyn Fn(&mut BlockCtx<'_>);

/// What a block computes.
pub(crate) enum Behavior {
    /// A user closure.
    Func(Box<EvalFn>),
    /// A structural connection, optionally taking the slice `[lo, hi)` of `src`.
    Forward {
        src: SignalId,
        dst: SignalId,
        range: Option<(u32, u32)>,
    },
    /// A constant driver.
    Const { dst: SignalId, magnitude: u64 },
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Behavior::Func(_) => f.write_str("Func(..)"),
            Behavior::Forward { src, dst, range } => f
                .debug_struct("Forward")
                .field("src", src)
                .field("dst", dst)
                .field("range", range)
                .finish(),
            Behavior::Const { dst, magnitude } => f
                .debug_struct("Const")
                .field("dst", dst)
                .field("magnitude", magnitude)
                .finish(),
        }
    }
}

/// A combinational or sequential block, or a lowered connection.
#[derive(Debug)]
pub struct Block {
    /// Local name within the owning model.
    pub name: Ident,
    /// The model that declared this block.
    pub owner: ModelId,
    /// When the block runs.
    pub kind: BlockKind,
    /// Signals the block may read, sorted.
    pub reads: Vec<SignalId>,
    /// Signals the block may write, sorted.
    pub writes: Vec<SignalId>,
    pub(crate) behavior: Behavior,
    /// Reset values for sequential blocks; `None` means the block ignores reset.
    pub reset: Option<Vec<(SignalId, u64)>>,
}

/// Why a block evaluation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BlockFault {
    Stray(SignalId, Access),
    Range(RangeError),
}

impl Block {
    /// Returns true for lowered `connect`/`connect_slice`/`connect_const` blocks.
    pub fn is_connection(&self) -> bool {
        !matches!(self.behavior, Behavior::Func(_))
    }

    /// Returns the connection source and slice, if this is a forwarding block.
    pub(crate) fn forward(&self) -> Option<(SignalId, SignalId, Option<(u32, u32)>)> {
        match self.behavior {
            Behavior::Forward { src, dst, range } => Some((src, dst, range)),
            _ => None,
        }
    }

    /// Computes the block's outputs from the committed signal values.
    ///
    /// Nothing is written back; the caller decides when the returned values
    /// are assigned and committed.
    pub(crate) fn evaluate(
        &self,
        signals: &Arena<SignalId, SignalState>,
    ) -> Result<Vec<(SignalId, Value)>, BlockFault> {
        match &self.behavior {
            Behavior::Func(f) => {
                let mut ctx = BlockCtx::new(signals, &self.reads, &self.writes);
                f(&mut ctx);
                ctx.finish()
            }
            Behavior::Forward { src, dst, range } => {
                let value = signals[*src].read();
                let value = match range {
                    Some((lo, hi)) => value.slice(*lo, *hi).map_err(BlockFault::Range)?,
                    None => value.clone(),
                };
                Ok(vec![(*dst, value)])
            }
            Behavior::Const { dst, magnitude } => Ok(vec![(*dst, Value::from_u64(*magnitude, 64))]),
        }
    }

    /// The values a sequential block loads while its model is in reset.
    pub(crate) fn reset_values(&self) -> Option<Vec<(SignalId, Value)>> {
        self.reset.as_ref().map(|values| {
            values
                .iter()
                .map(|&(id, magnitude)| (id, Value::from_u64(magnitude, 64)))
                .collect()
        })
    }
}

/// Access to the committed signal values during one block evaluation.
///
/// Reads return the last committed value, never one written earlier in the
/// same evaluation. If a signal is written more than once, the last write
/// wins.
pub struct BlockCtx<'a> {
    signals: &'a Arena<SignalId, SignalState>,
    reads: &'a [SignalId],
    writes: &'a [SignalId],
    outputs: Vec<(SignalId, Value)>,
    stray: Cell<Option<(SignalId, Access)>>,
}

impl<'a> BlockCtx<'a> {
    fn new(
        signals: &'a Arena<SignalId, SignalState>,
        reads: &'a [SignalId],
        writes: &'a [SignalId],
    ) -> Self {
        Self {
            signals,
            reads,
            writes,
            outputs: Vec::with_capacity(writes.len()),
            stray: Cell::new(None),
        }
    }

    /// Reads the committed value of a signal in the read-set.
    pub fn read(&self, id: SignalId) -> Value {
        if self.reads.binary_search(&id).is_err() {
            self.flag(id, Access::Read);
        }
        self.signals[id].read().clone()
    }

    /// Reads the low 64 bits of a signal.
    pub fn read_u64(&self, id: SignalId) -> u64 {
        self.read(id).as_u64()
    }

    /// Reads bit 0 of a signal.
    pub fn read_bool(&self, id: SignalId) -> bool {
        self.read(id).as_bool()
    }

    /// Writes a signal in the write-set. The value is resized to the
    /// signal's width when it is assigned.
    pub fn write(&mut self, id: SignalId, value: Value) {
        if self.writes.binary_search(&id).is_err() {
            self.flag(id, Access::Write);
            return;
        }
        match self.outputs.iter_mut().find(|(out, _)| *out == id) {
            Some(slot) => slot.1 = value,
            None => self.outputs.push((id, value)),
        }
    }

    /// Writes a `u64` magnitude, truncated to the signal's width.
    pub fn write_u64(&mut self, id: SignalId, magnitude: u64) {
        self.write(id, Value::from_u64(magnitude, 64));
    }

    /// Writes a single bit.
    pub fn write_bool(&mut self, id: SignalId, bit: bool) {
        self.write(id, Value::from_bool(bit));
    }

    /// Returns the width of any signal, declared or not.
    pub fn width(&self, id: SignalId) -> u32 {
        self.signals[id].width
    }

    fn flag(&self, id: SignalId, access: Access) {
        if self.stray.get().is_none() {
            self.stray.set(Some((id, access)));
        }
    }

    fn finish(self) -> Result<Vec<(SignalId, Value)>, BlockFault> {
        match self.stray.get() {
            Some((id, access)) => Err(BlockFault::Stray(id, access)),
            None => Ok(self.outputs),
        }
    }
}
