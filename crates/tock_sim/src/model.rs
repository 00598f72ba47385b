//! Hierarchical model construction.
//!
//! A [`Design`] is built once through [`Design::build`] and is frozen
//! afterwards. The closure passed to `build` receives a [`ModelBuilder`] for
//! the top model and returns a caller-defined handle, usually a struct of
//! [`SignalId`]s naming the model's ports. Submodels are added with
//! [`ModelBuilder::instance`], which works the same way one level down.
//!
//! Signals, blocks and models live in flat arenas owned by the design.
//! Names are interned and resolved to hierarchical paths such as
//! `top.reg1.out` only for diagnostics and lookups.
//!
//! Every model gets an implicit 1-bit `reset` input, connected from its
//! parent's `reset` when the model is instantiated.

use std::collections::HashMap;

use tock_common::{Ident, Interner};

use crate::arena::Arena;
use crate::block::{Behavior, Block, BlockCtx, BlockKind};
use crate::error::ElaborationError;
use crate::ids::{BlockId, ModelId, SignalId};
use crate::signal::{Direction, SignalKind, SignalState};

/// Name of the implicit reset input every model carries.
pub const RESET: &str = "reset";

/// Something a model declares under a local name.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Member {
    /// A port or wire.
    Signal(SignalId),
    /// A submodel instance.
    Child(ModelId),
    /// A combinational or sequential block.
    Block(BlockId),
}

/// One node of the model tree.
#[derive(Debug)]
pub struct ModelInfo {
    /// Instance name (the top model uses the design name).
    pub name: Ident,
    /// Containing model, `None` for the top.
    pub parent: Option<ModelId>,
    /// Direct submodels in declaration order.
    pub children: Vec<ModelId>,
    /// Local names of everything this model declares.
    pub scope: HashMap<Ident, Member>,
    /// The implicit reset input.
    pub reset: SignalId,
}

/// A complete model hierarchy ready for elaboration.
#[derive(Debug)]
pub struct Design {
    pub(crate) models: Arena<ModelId, ModelInfo>,
    pub(crate) signals: Arena<SignalId, SignalState>,
    pub(crate) blocks: Arena<BlockId, Block>,
    pub(crate) interner: Interner,
    /// Problems found while building, reported at elaboration.
    pub(crate) deferred: Vec<ElaborationError>,
}

impl Design {
    /// Builds a design whose top model is named `name`.
    ///
    /// Returns the design together with whatever `f` returns.
    pub fn build<T>(name: &str, f: impl FnOnce(&mut ModelBuilder<'_>) -> T) -> (Design, T) {
        let mut design = Design {
            models: Arena::new(),
            signals: Arena::new(),
            blocks: Arena::new(),
            interner: Interner::new(),
            deferred: Vec::new(),
        };
        let top = design.new_model(name, None);
        let handle = f(&mut ModelBuilder {
            design: &mut design,
            model: top,
        });
        (design, handle)
    }

    fn new_model(&mut self, name: &str, parent: Option<ModelId>) -> ModelId {
        let id = self.models.next_id();
        let reset_name = self.interner.get_or_intern(RESET);
        let reset = self.signals.alloc(SignalState::new(
            reset_name,
            id,
            SignalKind::Port(Direction::Input),
            1,
        ));
        self.models.alloc(ModelInfo {
            name: self.interner.get_or_intern(name),
            parent,
            children: Vec::new(),
            scope: HashMap::from([(reset_name, Member::Signal(reset))]),
            reset,
        })
    }

    /// Returns the top model.
    pub fn top(&self) -> ModelId {
        ModelId::from_raw(0)
    }

    /// Returns the model with the given ID.
    pub fn model(&self, id: ModelId) -> &ModelInfo {
        &self.models[id]
    }

    /// Returns the signal with the given ID.
    pub fn signal(&self, id: SignalId) -> &SignalState {
        &self.signals[id]
    }

    /// Returns the block with the given ID.
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id]
    }

    /// Returns the string interner holding every local name.
    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Number of model instances, including the top.
    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Number of signals, including every implicit `reset`.
    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    /// Number of blocks, including lowered connections.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Hierarchical path of a model, e.g. `top.reg1`.
    pub fn model_path(&self, id: ModelId) -> String {
        let mut names = Vec::new();
        let mut cur = Some(id);
        while let Some(m) = cur {
            names.push(self.models[m].name);
            cur = self.models[m].parent;
        }
        self.interner.path(names.into_iter().rev())
    }

    /// Hierarchical path of a signal, e.g. `top.reg1.out`.
    pub fn signal_path(&self, id: SignalId) -> String {
        let sig = &self.signals[id];
        format!(
            "{}.{}",
            self.model_path(sig.owner),
            self.interner.resolve(sig.name)
        )
    }

    /// Hierarchical path of a block, e.g. `top.adder.logic`.
    pub fn block_path(&self, id: BlockId) -> String {
        let block = &self.blocks[id];
        format!(
            "{}.{}",
            self.model_path(block.owner),
            self.interner.resolve(block.name)
        )
    }

    /// Looks up a signal by hierarchical path.
    ///
    /// The first segment must name the top model. Returns `None` for
    /// unknown paths and for paths naming a model or block.
    pub fn find(&self, path: &str) -> Option<SignalId> {
        let mut segments = path.split('.');
        let top = self.top();
        if self.interner.get(segments.next()?)? != self.models[top].name {
            return None;
        }
        let mut model = top;
        let mut found = None;
        for segment in segments {
            if found.is_some() {
                return None;
            }
            match self.models[model].scope.get(&self.interner.get(segment)?)? {
                Member::Child(child) => model = *child,
                Member::Signal(sig) => found = Some(*sig),
                Member::Block(_) => return None,
            }
        }
        found
    }

    /// Signal-relative name used for connection blocks: the local name for
    /// the model's own signals, `child.port` for a submodel's ports.
    fn local_name(&self, model: ModelId, id: SignalId) -> String {
        let sig = &self.signals[id];
        let name = self.interner.resolve(sig.name);
        if sig.owner == model {
            name.to_string()
        } else {
            match self.models[sig.owner].parent {
                Some(parent) if parent == model => format!(
                    "{}.{name}",
                    self.interner.resolve(self.models[sig.owner].name)
                ),
                _ => self.signal_path(id),
            }
        }
    }
}

/// Declares the contents of one model.
pub struct ModelBuilder<'d> {
    design: &'d mut Design,
    model: ModelId,
}

impl<'d> ModelBuilder<'d> {
    /// Returns the model being built.
    pub fn id(&self) -> ModelId {
        self.model
    }

    /// Returns this model's implicit reset input.
    pub fn reset(&self) -> SignalId {
        self.design.models[self.model].reset
    }

    /// Returns the declared width of a signal.
    pub fn width(&self, id: SignalId) -> u32 {
        self.design.signals[id].width
    }

    /// Declares an input port.
    pub fn input(&mut self, name: &str, width: u32) -> SignalId {
        self.signal(name, SignalKind::Port(Direction::Input), width)
    }

    /// Declares an output port.
    pub fn output(&mut self, name: &str, width: u32) -> SignalId {
        self.signal(name, SignalKind::Port(Direction::Output), width)
    }

    /// Declares an internal wire.
    pub fn wire(&mut self, name: &str, width: u32) -> SignalId {
        self.signal(name, SignalKind::Wire, width)
    }

    /// Declares `count` input ports named `prefix[0]`, `prefix[1]`, ...
    pub fn inputs(&mut self, prefix: &str, count: usize, width: u32) -> Vec<SignalId> {
        (0..count)
            .map(|i| self.input(&format!("{prefix}[{i}]"), width))
            .collect()
    }

    /// Declares `count` output ports named `prefix[0]`, `prefix[1]`, ...
    pub fn outputs(&mut self, prefix: &str, count: usize, width: u32) -> Vec<SignalId> {
        (0..count)
            .map(|i| self.output(&format!("{prefix}[{i}]"), width))
            .collect()
    }

    fn signal(&mut self, name: &str, kind: SignalKind, width: u32) -> SignalId {
        let id = self.design.signals.next_id();
        let ident = self.declare(name, Member::Signal(id));
        self.design
            .signals
            .alloc(SignalState::new(ident, self.model, kind, width))
    }

    /// Adds `name` to the scope, deferring a `DuplicateName` if taken.
    fn declare(&mut self, name: &str, member: Member) -> Ident {
        let ident = self.design.interner.get_or_intern(name);
        let scope = &mut self.design.models[self.model].scope;
        if scope.contains_key(&ident) {
            let model = self.design.model_path(self.model);
            self.design.deferred.push(ElaborationError::DuplicateName {
                model,
                name: name.to_string(),
            });
        } else {
            scope.insert(ident, member);
        }
        ident
    }

    /// Records that this model was built from unusable parameters.
    ///
    /// Like a duplicate name, the error surfaces when the design is
    /// elaborated; the builder carries on so the caller can still return
    /// its handle.
    pub fn reject(&mut self, reason: impl Into<String>) {
        let model = self.design.model_path(self.model);
        self.design.deferred.push(ElaborationError::InvalidParameter {
            model,
            reason: reason.into(),
        });
    }

    /// Instantiates a submodel named `name`, built by `f`.
    ///
    /// The child's `reset` is connected from this model's `reset`.
    pub fn instance<T>(&mut self, name: &str, f: impl FnOnce(&mut ModelBuilder<'_>) -> T) -> T {
        let child = self.design.new_model(name, Some(self.model));
        self.declare(name, Member::Child(child));
        self.design.models[self.model].children.push(child);
        let handle = f(&mut ModelBuilder {
            design: &mut *self.design,
            model: child,
        });
        let child_reset = self.design.models[child].reset;
        self.connect(self.reset(), child_reset);
        handle
    }

    /// Connects `src` to `dst`; the widths must match.
    pub fn connect(&mut self, src: SignalId, dst: SignalId) -> BlockId {
        self.forward(src, dst, None)
    }

    /// Connects bits `[lo, hi)` of `src` to `dst`, which must be `hi - lo` bits wide.
    pub fn connect_slice(&mut self, src: SignalId, lo: u32, hi: u32, dst: SignalId) -> BlockId {
        self.forward(src, dst, Some((lo, hi)))
    }

    /// Drives `dst` with a constant.
    pub fn connect_const(&mut self, dst: SignalId, magnitude: u64) -> BlockId {
        let name = format!("{magnitude:#x}->{}", self.design.local_name(self.model, dst));
        self.push_block(
            &name,
            BlockKind::Combinational,
            Vec::new(),
            vec![dst],
            Behavior::Const { dst, magnitude },
            None,
        )
    }

    fn forward(&mut self, src: SignalId, dst: SignalId, range: Option<(u32, u32)>) -> BlockId {
        let mut name = self.design.local_name(self.model, src);
        if let Some((lo, hi)) = range {
            name.push_str(&format!("[{lo}:{hi}]"));
        }
        name.push_str("->");
        name.push_str(&self.design.local_name(self.model, dst));
        self.push_block(
            &name,
            BlockKind::Combinational,
            vec![src],
            vec![dst],
            Behavior::Forward { src, dst, range },
            None,
        )
    }

    fn push_block(
        &mut self,
        name: &str,
        kind: BlockKind,
        mut reads: Vec<SignalId>,
        mut writes: Vec<SignalId>,
        behavior: Behavior,
        reset: Option<Vec<(SignalId, u64)>>,
    ) -> BlockId {
        reads.sort();
        reads.dedup();
        writes.sort();
        writes.dedup();
        let name = self.design.interner.get_or_intern(name);
        self.design.blocks.alloc(Block {
            name,
            owner: self.model,
            kind,
            reads,
            writes,
            behavior,
            reset,
        })
    }

    /// Starts a combinational block.
    pub fn comb(&mut self, name: &str) -> BlockBuilder<'_, 'd> {
        BlockBuilder::new(self, name, BlockKind::Combinational)
    }

    /// Starts a sequential block. By default every written signal resets to zero.
    pub fn seq(&mut self, name: &str) -> BlockBuilder<'_, 'd> {
        BlockBuilder::new(self, name, BlockKind::Sequential)
    }
}

/// Collects a block's read-set, write-set and reset policy.
pub struct BlockBuilder<'b, 'd> {
    model: &'b mut ModelBuilder<'d>,
    name: String,
    kind: BlockKind,
    reads: Vec<SignalId>,
    writes: Vec<SignalId>,
    resets: Vec<(SignalId, u64)>,
    no_reset: bool,
}

impl<'b, 'd> BlockBuilder<'b, 'd> {
    fn new(model: &'b mut ModelBuilder<'d>, name: &str, kind: BlockKind) -> Self {
        Self {
            model,
            name: name.to_string(),
            kind,
            reads: Vec::new(),
            writes: Vec::new(),
            resets: Vec::new(),
            no_reset: false,
        }
    }

    /// Adds signals to the read-set.
    pub fn reads(mut self, signals: &[SignalId]) -> Self {
        self.reads.extend_from_slice(signals);
        self
    }

    /// Adds signals to the write-set.
    pub fn writes(mut self, signals: &[SignalId]) -> Self {
        self.writes.extend_from_slice(signals);
        self
    }

    /// Overrides the value `signal` takes while the model is in reset.
    pub fn reset(mut self, signal: SignalId, magnitude: u64) -> Self {
        self.resets.push((signal, magnitude));
        self
    }

    /// Makes the block ignore reset: it evaluates normally while reset is high.
    pub fn no_reset(mut self) -> Self {
        self.no_reset = true;
        self
    }

    /// Finishes the block with its body.
    ///
    /// Sequential blocks also read their model's `reset`.
    pub fn eval(self, f: impl Fn(&mut BlockCtx<'_>) + 'static) -> BlockId {
        let BlockBuilder {
            model,
            name,
            kind,
            mut reads,
            writes,
            resets,
            no_reset,
        } = self;
        let reset = match kind {
            BlockKind::Sequential if !no_reset => {
                reads.push(model.reset());
                Some(
                    writes
                        .iter()
                        .map(|&w| {
                            let value = resets
                                .iter()
                                .rev()
                                .find(|(s, _)| *s == w)
                                .map_or(0, |&(_, v)| v);
                            (w, value)
                        })
                        .collect(),
                )
            }
            _ => None,
        };
        let id = model.design.blocks.next_id();
        model.declare(&name, Member::Block(id));
        model.push_block(&name, kind, reads, writes, Behavior::Func(Box::new(f)), reset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_returns_handle_and_top() {
        let (design, (a, b)) = Design::build("top", |m| (m.input("a", 4), m.output("b", 4)));
        assert_eq!(design.model_count(), 1);
        // a, b and the implicit reset
        assert_eq!(design.signal_count(), 3);
        assert_eq!(design.signal_path(a), "top.a");
        assert_eq!(design.signal_path(b), "top.b");
        assert!(design.signal(a).is_input());
        assert!(design.signal(b).is_output());
        assert!(design.deferred.is_empty());
    }

    #[test]
    fn instances_nest_and_connect_reset() {
        let (design, (child_in, child_out)) = Design::build("top", |m| {
            m.instance("inner", |c| (c.input("x", 1), c.output("y", 1)))
        });
        assert_eq!(design.model_count(), 2);
        assert_eq!(design.signal_path(child_in), "top.inner.x");
        assert_eq!(design.signal_path(child_out), "top.inner.y");
        let child = design.model(design.top()).children[0];
        assert_eq!(design.model_path(child), "top.inner");
        // the only block is the reset forward
        assert_eq!(design.block_count(), 1);
        let block = design.block(BlockId::from_raw(0));
        assert_eq!(block.reads, vec![design.model(design.top()).reset]);
        assert_eq!(block.writes, vec![design.model(child).reset]);
        assert_eq!(design.block_path(BlockId::from_raw(0)), "top.reset->inner.reset");
    }

    #[test]
    fn find_resolves_paths() {
        let (design, out) = Design::build("top", |m| {
            m.instance("reg1", |c| {
                c.input("in", 8);
                c.output("out", 8)
            })
        });
        assert_eq!(design.find("top.reg1.out"), Some(out));
        assert!(design.find("top.reg1.reset").is_some());
        assert_eq!(design.find("top.reg1"), None);
        assert_eq!(design.find("top.reg2.out"), None);
        assert_eq!(design.find("other.reg1.out"), None);
        assert_eq!(design.find("top.reg1.out.more"), None);
    }

    #[test]
    fn port_arrays_are_indexed() {
        let (design, outs) = Design::build("top", |m| m.outputs("out", 3, 1));
        assert_eq!(outs.len(), 3);
        assert_eq!(design.signal_path(outs[2]), "top.out[2]");
        assert_eq!(design.find("top.out[1]"), Some(outs[1]));
    }

    #[test]
    fn duplicate_names_are_deferred() {
        let (design, _) = Design::build("top", |m| {
            m.wire("x", 1);
            m.wire("x", 2);
            m.input("reset", 1);
        });
        assert_eq!(design.deferred.len(), 2);
        assert_eq!(
            design.deferred[0],
            ElaborationError::DuplicateName {
                model: "top".into(),
                name: "x".into()
            }
        );
    }

    #[test]
    fn rejected_parameters_are_deferred() {
        let (design, _) = Design::build("top", |m| {
            m.instance("child", |c| c.reject("needs at least one lane"));
        });
        assert_eq!(
            design.deferred,
            vec![ElaborationError::InvalidParameter {
                model: "top.child".into(),
                reason: "needs at least one lane".into(),
            }]
        );
    }

    #[test]
    fn seq_blocks_default_to_zero_reset_and_read_reset() {
        let (design, (d, q, blk)) = Design::build("top", |m| {
            let d = m.input("d", 8);
            let q = m.output("q", 8);
            let blk = m
                .seq("r")
                .reads(&[d])
                .writes(&[q])
                .eval(move |ctx| {
                    let v = ctx.read(d);
                    ctx.write(q, v);
                });
            (d, q, blk)
        });
        let block = design.block(blk);
        assert_eq!(block.kind, BlockKind::Sequential);
        assert_eq!(block.reset, Some(vec![(q, 0)]));
        assert!(block.reads.contains(&d));
        assert!(block.reads.contains(&design.model(design.top()).reset));
        assert!(!block.is_connection());
    }

    #[test]
    fn reset_overrides_and_no_reset() {
        let (design, (a, b)) = Design::build("top", |m| {
            let q = m.wire("q", 4);
            let a = m.seq("a").writes(&[q]).reset(q, 9).eval(|_| {});
            let w = m.wire("w", 4);
            let b = m.seq("b").writes(&[w]).no_reset().eval(|_| {});
            (a, b)
        });
        assert_eq!(design.block(a).reset.as_ref().unwrap()[0].1, 9);
        assert!(design.block(b).reset.is_none());
        assert!(design.block(b).reads.is_empty());
    }

    #[test]
    fn connection_names_are_local() {
        let (design, blocks) = Design::build("top", |m| {
            let msg = m.input("msg", 8);
            let lo = m.wire("lo", 4);
            let sink = m.instance("sink", |c| c.input("d", 4));
            vec![
                m.connect_slice(msg, 0, 4, lo),
                m.connect(lo, sink),
                m.connect_const(lo, 3),
            ]
        });
        let names: Vec<_> = blocks.iter().map(|&b| design.block_path(b)).collect();
        assert_eq!(
            names,
            vec!["top.msg[0:4]->lo", "top.lo->sink.d", "top.0x3->lo"]
        );
        assert!(blocks.iter().all(|&b| design.block(b).is_connection()));
    }

    #[test]
    fn duplicate_block_name_is_deferred() {
        let (design, _) = Design::build("top", |m| {
            m.comb("logic").eval(|_| {});
            m.comb("logic").eval(|_| {});
        });
        assert_eq!(design.deferred.len(), 1);
    }
}
