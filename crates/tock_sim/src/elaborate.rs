//! Design validation and netlist construction.
//!
//! [`elaborate`] checks the structural rules a design must obey before it
//! can run, then derives the scheduling data the kernel needs: the
//! combinational readers of every signal and a dependency rank for every
//! block.
//!
//! Ranks come from the strongly connected components of the block graph
//! (block -> block edges through the signals one writes and the other
//! reads). Blocks in a non-trivial component form a combinational cycle.
//! Such a cycle may still converge, so it is only warned about here; a
//! cycle that never settles fails at run time with
//! [`SimError::CombinationalLoop`].

use std::collections::BTreeSet;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use tock_common::RangeError;
use tock_config::SimConfig;
use tock_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use tracing::{debug, warn};

use crate::block::BlockKind;
use crate::error::{ElaborationError, SimError};
use crate::ids::{BlockId, ModelId, SignalId};
use crate::model::Design;

/// Writer name recorded for top-level inputs, which the harness drives.
const EXTERNAL: &str = "<external>";

/// Scheduling data derived from a validated design.
#[derive(Debug, Clone)]
pub struct Netlist {
    /// Combinational blocks reading each signal, indexed by signal.
    pub(crate) readers: Vec<Vec<BlockId>>,
    /// Dependency rank of each block, indexed by block. Writers rank below
    /// their readers unless both sit in one cycle.
    pub(crate) rank: Vec<u32>,
    /// Combinational blocks (including connections) in declaration order.
    pub(crate) comb: Vec<BlockId>,
    /// Sequential blocks in declaration order.
    pub(crate) seq: Vec<BlockId>,
    /// Whether each signal is a top-level input.
    pub(crate) external: Vec<bool>,
    /// Combinational cycles found in the block graph.
    pub(crate) cycles: Vec<Vec<BlockId>>,
}

impl Netlist {
    /// Returns the dependency rank of a block.
    pub fn rank(&self, id: BlockId) -> u32 {
        self.rank[id.index()]
    }

    /// Returns the combinational blocks that read `id`.
    pub fn readers(&self, id: SignalId) -> &[BlockId] {
        &self.readers[id.index()]
    }

    /// Returns true if the harness may drive `id`.
    pub fn is_external(&self, id: SignalId) -> bool {
        self.external[id.index()]
    }

    /// Number of combinational blocks, connections included.
    pub fn comb_count(&self) -> usize {
        self.comb.len()
    }

    /// Number of sequential blocks.
    pub fn seq_count(&self) -> usize {
        self.seq.len()
    }

    /// Combinational cycles, each as a sorted list of blocks.
    pub fn cycles(&self) -> &[Vec<BlockId>] {
        &self.cycles
    }
}

/// Validates `design` and builds its netlist.
///
/// Every violation is emitted to `sink` as an error diagnostic and the
/// first one is returned. Advisories (undriven signals, combinational
/// cycles) are emitted as warnings according to `config`.
pub fn elaborate(
    design: &Design,
    config: &SimConfig,
    sink: &DiagnosticSink,
) -> Result<Netlist, SimError> {
    let mut errors: Vec<SimError> = design.deferred.iter().cloned().map(SimError::from).collect();
    check_widths(design, &mut errors);
    check_access(design, &mut errors);
    check_connections(design, &mut errors);
    check_writers(design, config, sink, &mut errors);

    for e in &errors {
        sink.emit(error_diagnostic(e));
    }
    if let Some(first) = errors.into_iter().next() {
        return Err(first);
    }

    let netlist = build_netlist(design, config, sink);
    debug!(
        models = design.model_count(),
        signals = design.signal_count(),
        comb = netlist.comb.len(),
        seq = netlist.seq.len(),
        cycles = netlist.cycles.len(),
        "elaborated design `{}`",
        design.model_path(design.top())
    );
    Ok(netlist)
}

fn error_diagnostic(e: &SimError) -> Diagnostic {
    let code = match e {
        SimError::Elaboration(inner) => inner.code(),
        // slice bounds are a connection shape error, like a width mismatch
        _ => DiagnosticCode::new(Category::Error, 102),
    };
    Diagnostic::new(code, e.to_string())
}

fn check_widths(design: &Design, errors: &mut Vec<SimError>) {
    for (id, sig) in design.signals.iter() {
        if sig.width == 0 {
            errors.push(
                ElaborationError::ZeroWidth {
                    signal: design.signal_path(id),
                }
                .into(),
            );
        }
    }
}

/// True if a block in `model` may touch `id`.
fn visible(design: &Design, model: ModelId, id: SignalId) -> bool {
    let sig = &design.signals[id];
    sig.owner == model || (sig.is_port() && design.models[sig.owner].parent == Some(model))
}

fn check_access(design: &Design, errors: &mut Vec<SimError>) {
    for (id, block) in design.blocks.iter() {
        let touched: BTreeSet<SignalId> = block.reads.iter().chain(&block.writes).copied().collect();
        for &sig in &touched {
            if !visible(design, block.owner, sig) {
                errors.push(
                    ElaborationError::NotVisible {
                        block: design.block_path(id),
                        signal: design.signal_path(sig),
                    }
                    .into(),
                );
            }
        }
        for &sig in &block.writes {
            let state = &design.signals[sig];
            let against = if state.owner == block.owner {
                state.is_input()
            } else {
                state.is_output()
            };
            if against && visible(design, block.owner, sig) {
                errors.push(
                    ElaborationError::DirectionViolation {
                        block: design.block_path(id),
                        port: design.signal_path(sig),
                    }
                    .into(),
                );
            }
        }
    }
}

fn check_connections(design: &Design, errors: &mut Vec<SimError>) {
    for (_, block) in design.blocks.iter() {
        let Some((src, dst, range)) = block.forward() else {
            continue;
        };
        let src_width = design.signals[src].width;
        let dst_width = design.signals[dst].width;
        if src_width == 0 || dst_width == 0 {
            continue;
        }
        let (src_name, width) = match range {
            Some((lo, hi)) if lo >= hi || hi > src_width => {
                errors.push(
                    RangeError {
                        lo,
                        hi,
                        width: src_width,
                    }
                    .into(),
                );
                continue;
            }
            Some((lo, hi)) => (format!("{}[{lo}:{hi}]", design.signal_path(src)), hi - lo),
            None => (design.signal_path(src), src_width),
        };
        if width != dst_width {
            errors.push(
                ElaborationError::WidthMismatch {
                    src: src_name,
                    src_width: width,
                    dst: design.signal_path(dst),
                    dst_width,
                }
                .into(),
            );
        }
    }
}

fn check_writers(
    design: &Design,
    config: &SimConfig,
    sink: &DiagnosticSink,
    errors: &mut Vec<SimError>,
) {
    let top = design.top();
    let mut writers: Vec<Vec<String>> = vec![Vec::new(); design.signal_count()];
    for (id, sig) in design.signals.iter() {
        if sig.owner == top && sig.is_input() {
            writers[id.index()].push(EXTERNAL.to_string());
        }
    }
    for (id, block) in design.blocks.iter() {
        for &w in &block.writes {
            writers[w.index()].push(design.block_path(id));
        }
    }

    for (id, sig) in design.signals.iter() {
        let found = &writers[id.index()];
        match found.len() {
            0 if sig.is_input() => errors.push(
                ElaborationError::UnconnectedInput {
                    port: design.signal_path(id),
                }
                .into(),
            ),
            0 => {
                if config.diagnostics.undriven.enabled() {
                    let path = design.signal_path(id);
                    sink.emit(
                        Diagnostic::new(
                            DiagnosticCode::UNDRIVEN,
                            format!("`{path}` is never driven and stays zero"),
                        )
                        .at(path),
                    );
                }
            }
            1 => {}
            _ => errors.push(
                ElaborationError::MultipleWriters {
                    signal: design.signal_path(id),
                    writers: found.clone(),
                }
                .into(),
            ),
        }
    }
}

fn build_netlist(design: &Design, config: &SimConfig, sink: &DiagnosticSink) -> Netlist {
    let mut readers = vec![Vec::new(); design.signal_count()];
    let mut comb = Vec::new();
    let mut seq = Vec::new();
    for (id, block) in design.blocks.iter() {
        match block.kind {
            BlockKind::Combinational => {
                comb.push(id);
                for &r in &block.reads {
                    readers[r.index()].push(id);
                }
            }
            BlockKind::Sequential => seq.push(id),
        }
    }

    // One node per block, in block order, so node `i` is block `i`.
    let mut graph: DiGraph<BlockId, ()> = DiGraph::with_capacity(design.block_count(), 0);
    for (id, _) in design.blocks.iter() {
        graph.add_node(id);
    }
    for &id in &comb {
        for &w in &design.blocks[id].writes {
            for &r in &readers[w.index()] {
                graph.update_edge(NodeIndex::new(id.index()), NodeIndex::new(r.index()), ());
            }
        }
    }

    // tarjan_scc yields components sinks first.
    let sccs = tarjan_scc(&graph);
    let mut rank = vec![0; design.block_count()];
    let mut cycles = Vec::new();
    for (i, scc) in sccs.iter().enumerate() {
        let r = (sccs.len() - 1 - i) as u32;
        for &n in scc {
            rank[graph[n].index()] = r;
        }
        let cyclic = scc.len() > 1 || scc.iter().any(|&n| graph.contains_edge(n, n));
        if cyclic {
            let mut blocks: Vec<BlockId> = scc.iter().map(|&n| graph[n]).collect();
            blocks.sort();
            cycles.push(blocks);
        }
    }
    cycles.sort();

    if config.diagnostics.combinational_cycles.enabled() {
        for cycle in &cycles {
            let names: Vec<String> = cycle.iter().map(|&b| design.block_path(b)).collect();
            warn!(blocks = ?names, "combinational cycle");
            let mut diag = Diagnostic::new(
                DiagnosticCode::COMBINATIONAL_CYCLE,
                format!("combinational cycle through {} block(s)", names.len()),
            )
            .at(names[0].clone());
            for name in &names {
                diag = diag.with_note(format!("`{name}` is part of the cycle"));
            }
            sink.emit(diag);
        }
    }

    let top = design.top();
    let external = design
        .signals
        .iter()
        .map(|(_, sig)| sig.owner == top && sig.is_input())
        .collect();

    Netlist {
        readers,
        rank,
        comb,
        seq,
        external,
        cycles,
    }
}
