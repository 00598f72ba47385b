//! Combinational settling.
//!
//! Blocks whose inputs changed wait in a [`Worklist`]. [`settle`] pops one
//! at a time, evaluates it against the committed values, commits its
//! outputs immediately, and schedules the readers of every output that
//! changed. It stops when the worklist drains or the evaluation budget is
//! spent.
//!
//! Because blocks are pure functions of their read-sets, the fixpoint does
//! not depend on the visitation order. The order only changes how many
//! evaluations it takes: ranked order settles acyclic logic with one
//! evaluation per scheduled block.

use std::collections::{BTreeSet, VecDeque};

use tock_common::WidthOverflow;
use tock_config::SettleOrder;
use tracing::trace;

use crate::arena::Arena;
use crate::block::{Block, BlockFault};
use crate::elaborate::Netlist;
use crate::ids::{BlockId, SignalId};
use crate::signal::SignalState;

/// Pending combinational blocks, each queued at most once.
#[derive(Debug, Clone)]
pub(crate) struct Worklist {
    order: SettleOrder,
    ranked: BTreeSet<(u32, BlockId)>,
    queue: VecDeque<BlockId>,
    queued: Vec<bool>,
}

impl Worklist {
    pub(crate) fn new(order: SettleOrder, blocks: usize) -> Self {
        Self {
            order,
            ranked: BTreeSet::new(),
            queue: VecDeque::new(),
            queued: vec![false; blocks],
        }
    }

    /// Schedules a block unless it is already waiting.
    pub(crate) fn push(&mut self, id: BlockId, rank: u32) {
        if std::mem::replace(&mut self.queued[id.index()], true) {
            return;
        }
        match self.order {
            SettleOrder::Ranked => {
                self.ranked.insert((rank, id));
            }
            SettleOrder::Fifo | SettleOrder::Lifo => self.queue.push_back(id),
        }
    }

    pub(crate) fn pop(&mut self) -> Option<BlockId> {
        let id = match self.order {
            SettleOrder::Ranked => self.ranked.pop_first().map(|(_, id)| id),
            SettleOrder::Fifo => self.queue.pop_front(),
            SettleOrder::Lifo => self.queue.pop_back(),
        }?;
        self.queued[id.index()] = false;
        Some(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.ranked.len() + self.queue.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Waiting blocks, sorted by ID.
    pub(crate) fn pending(&self) -> Vec<BlockId> {
        let mut ids: Vec<BlockId> = self
            .ranked
            .iter()
            .map(|&(_, id)| id)
            .chain(self.queue.iter().copied())
            .collect();
        ids.sort();
        ids
    }
}

/// What one settle did.
#[derive(Debug, Default)]
pub(crate) struct Settled {
    pub(crate) evaluations: u64,
    pub(crate) overflows: Vec<(SignalId, WidthOverflow)>,
}

/// Why settling stopped early.
#[derive(Debug)]
pub(crate) enum SettleFault {
    /// The budget ran out with blocks still waiting.
    Loop {
        evaluations: u64,
        pending: Vec<BlockId>,
    },
    /// A block evaluation failed.
    Block(BlockId, BlockFault),
}

/// Runs scheduled blocks until nothing changes or `limit` evaluations pass.
pub(crate) fn settle(
    signals: &mut Arena<SignalId, SignalState>,
    blocks: &Arena<BlockId, Block>,
    net: &Netlist,
    worklist: &mut Worklist,
    limit: u64,
) -> Result<Settled, SettleFault> {
    let mut settled = Settled::default();
    while let Some(id) = worklist.pop() {
        if settled.evaluations == limit {
            worklist.push(id, net.rank(id));
            return Err(SettleFault::Loop {
                evaluations: settled.evaluations,
                pending: worklist.pending(),
            });
        }
        settled.evaluations += 1;
        let outputs = blocks[id]
            .evaluate(signals)
            .map_err(|fault| SettleFault::Block(id, fault))?;
        for (sig, value) in outputs {
            if let Some(overflow) = signals[sig].assign(value) {
                settled.overflows.push((sig, overflow));
            }
            if signals[sig].commit() {
                trace!(block = id.as_raw(), signal = sig.as_raw(), value = %signals[sig].read(), "changed");
                for &reader in net.readers(sig) {
                    worklist.push(reader, net.rank(reader));
                }
            }
        }
    }
    Ok(settled)
}
