//! The cycle-based simulation driver.
//!
//! [`Simulator`] owns an elaborated [`Design`] and advances it one clock
//! cycle at a time:
//!
//! 1. settle combinational logic,
//! 2. evaluate every sequential block against the settled values and
//!    commit all of their writes together,
//! 3. settle again so outputs read between cycles are consistent,
//! 4. advance the cycle counter.
//!
//! Top-level inputs may be written between cycles. A write commits at once
//! and schedules the input's readers; the propagation happens at the next
//! [`settle`](Simulator::settle) or [`step_cycle`](Simulator::step_cycle).

use tock_common::{Value, WidthOverflow};
use tock_config::SimConfig;
use tock_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use tracing::{debug, debug_span, trace, warn};

use crate::block::BlockFault;
use crate::elaborate::{elaborate, Netlist};
use crate::error::SimError;
use crate::ids::{BlockId, SignalId};
use crate::model::Design;
use crate::settle::{settle, SettleFault, Worklist};

/// Summary of one completed [`Simulator::step_cycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// The cycle that just completed, counting from zero.
    pub cycle: u64,
    /// Block evaluations performed, sequential blocks included.
    pub evaluations: u64,
    /// Signals whose value changed during the cycle.
    pub changed: usize,
}

/// A running simulation of one design.
#[derive(Debug)]
pub struct Simulator {
    design: Design,
    net: Netlist,
    config: SimConfig,
    diagnostics: DiagnosticSink,
    worklist: Worklist,
    cycle: u64,
}

impl Simulator {
    /// Elaborates `design` with the default configuration and settles it.
    pub fn new(design: Design) -> Result<Self, SimError> {
        Self::with_config(design, &SimConfig::default())
    }

    /// Elaborates `design` and settles it once, so every combinational
    /// output reflects the initial (all-zero) register and input values.
    ///
    /// The configuration is checked first; a zero settle factor or reset
    /// length is a [`SimError::Config`].
    pub fn with_config(design: Design, config: &SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        let diagnostics = DiagnosticSink::new();
        let net = elaborate(&design, config, &diagnostics)?;
        let mut worklist = Worklist::new(config.sim.settle_order, design.block_count());
        for &id in &net.comb {
            worklist.push(id, net.rank(id));
        }
        let mut sim = Self {
            design,
            net,
            config: config.clone(),
            diagnostics,
            worklist,
            cycle: 0,
        };
        let evaluations = sim.settle()?;
        debug!(evaluations, "initial settle");
        Ok(sim)
    }

    /// Returns the simulated design.
    pub fn design(&self) -> &Design {
        &self.design
    }

    /// Returns the scheduling data derived at elaboration.
    pub fn netlist(&self) -> &Netlist {
        &self.net
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Returns the advisories collected so far.
    pub fn diagnostics(&self) -> &DiagnosticSink {
        &self.diagnostics
    }

    /// Number of completed cycles.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Looks up a signal by hierarchical path, e.g. `top.reg1.out`.
    pub fn find(&self, path: &str) -> Result<SignalId, SimError> {
        self.design
            .find(path)
            .ok_or_else(|| SimError::UnknownSignal(path.to_string()))
    }

    /// Returns the committed value of a signal.
    pub fn read(&self, id: SignalId) -> &Value {
        self.design.signals[id].read()
    }

    /// Returns the low 64 bits of a signal.
    pub fn read_u64(&self, id: SignalId) -> u64 {
        self.read(id).as_u64()
    }

    /// Returns bit 0 of a signal.
    pub fn read_bool(&self, id: SignalId) -> bool {
        self.read(id).as_bool()
    }

    /// Returns true if no input change is waiting to propagate.
    pub fn is_settled(&self) -> bool {
        self.worklist.is_empty()
    }

    /// Returns true if the signal changed during the current cycle.
    pub fn changed(&self, id: SignalId) -> bool {
        self.design.signals[id].changed()
    }

    /// Drives a top-level input port, including the top `reset`.
    ///
    /// The value is resized to the port width; dropped bits are reported
    /// as a width-overflow warning.
    pub fn write(&mut self, id: SignalId, value: Value) -> Result<(), SimError> {
        if !self.net.is_external(id) {
            return Err(SimError::NotExternallyDriven {
                signal: self.design.signal_path(id),
            });
        }
        let signal = &mut self.design.signals[id];
        let overflow = signal.assign(value);
        if signal.commit() {
            for &reader in self.net.readers(id) {
                self.worklist.push(reader, self.net.rank(reader));
            }
        }
        if let Some(overflow) = overflow {
            self.report_overflows(vec![(id, overflow)]);
        }
        Ok(())
    }

    /// Drives a top-level input with a `u64` magnitude.
    pub fn write_u64(&mut self, id: SignalId, magnitude: u64) -> Result<(), SimError> {
        self.write(id, Value::from_u64(magnitude, 64))
    }

    /// Drives a top-level input with a single bit.
    pub fn write_bool(&mut self, id: SignalId, bit: bool) -> Result<(), SimError> {
        self.write(id, Value::from_bool(bit))
    }

    /// Propagates pending input changes without a clock edge.
    ///
    /// Returns the number of block evaluations.
    pub fn settle(&mut self) -> Result<u64, SimError> {
        let limit = u64::from(self.config.sim.settle_limit_factor) * self.net.comb.len().max(1) as u64;
        match settle(
            &mut self.design.signals,
            &self.design.blocks,
            &self.net,
            &mut self.worklist,
            limit,
        ) {
            Ok(settled) => {
                self.report_overflows(settled.overflows);
                Ok(settled.evaluations)
            }
            Err(SettleFault::Loop {
                evaluations,
                pending,
            }) => Err(SimError::CombinationalLoop {
                cycle: self.cycle,
                evaluations,
                limit,
                blocks: pending.iter().map(|&b| self.design.block_path(b)).collect(),
            }),
            Err(SettleFault::Block(id, fault)) => Err(self.block_error(id, fault)),
        }
    }

    /// Runs one clock cycle: settle, clock edge, settle, advance.
    pub fn step_cycle(&mut self) -> Result<CycleReport, SimError> {
        let _span = debug_span!("cycle", n = self.cycle).entered();
        for signal in self.design.signals.values_mut() {
            signal.clear_changed();
        }
        let mut evaluations = self.settle()?;
        evaluations += self.clock_edge()?;
        evaluations += self.settle()?;

        let report = CycleReport {
            cycle: self.cycle,
            evaluations,
            changed: self
                .design
                .signals
                .iter()
                .filter(|(_, s)| s.changed())
                .count(),
        };
        debug!(evaluations, changed = report.changed, "cycle complete");
        self.cycle += 1;
        Ok(report)
    }

    /// Runs `cycles` clock cycles.
    pub fn run(&mut self, cycles: u64) -> Result<(), SimError> {
        for _ in 0..cycles {
            self.step_cycle()?;
        }
        Ok(())
    }

    /// Holds the top `reset` high for the configured number of cycles, then
    /// releases it and settles.
    pub fn reset(&mut self) -> Result<(), SimError> {
        let reset = self.design.model(self.design.top()).reset;
        self.write_bool(reset, true)?;
        self.run(u64::from(self.config.sim.reset_cycles))?;
        self.write_bool(reset, false)?;
        self.settle()?;
        Ok(())
    }

    /// Evaluates every sequential block against the settled values, then
    /// commits all of their writes together.
    fn clock_edge(&mut self) -> Result<u64, SimError> {
        let signals = &self.design.signals;
        let mut next = Vec::new();
        for &id in &self.net.seq {
            let block = &self.design.blocks[id];
            let reset = self.design.models[block.owner].reset;
            let values = match &block.reset {
                Some(_) if signals[reset].read().as_bool() => block.reset_values().unwrap_or_default(),
                _ => block
                    .evaluate(signals)
                    .map_err(|fault| self.block_error(id, fault))?,
            };
            next.extend(values);
        }
        let evaluations = self.net.seq.len() as u64;

        let mut overflows = Vec::new();
        for (id, value) in &next {
            if let Some(overflow) = self.design.signals[*id].assign(value.clone()) {
                overflows.push((*id, overflow));
            }
        }
        for (id, _) in &next {
            if self.design.signals[*id].commit() {
                trace!(signal = id.as_raw(), value = %self.design.signals[*id].read(), "register committed");
                for &reader in self.net.readers(*id) {
                    self.worklist.push(reader, self.net.rank(reader));
                }
            }
        }
        self.report_overflows(overflows);
        Ok(evaluations)
    }

    fn block_error(&self, id: BlockId, fault: BlockFault) -> SimError {
        match fault {
            BlockFault::Stray(signal, access) => SimError::UndeclaredAccess {
                block: self.design.block_path(id),
                signal: self.design.signal_path(signal),
                access,
            },
            BlockFault::Range(e) => SimError::Range(e),
        }
    }

    fn report_overflows(&self, overflows: Vec<(SignalId, WidthOverflow)>) {
        if !self.config.diagnostics.width_overflow.enabled() {
            return;
        }
        for (id, overflow) in overflows {
            let path = self.design.signal_path(id);
            warn!(signal = %path, cycle = self.cycle, "{overflow}");
            self.diagnostics.emit(
                Diagnostic::new(DiagnosticCode::WIDTH_OVERFLOW, overflow.to_string())
                    .at(path)
                    .in_cycle(self.cycle),
            );
        }
    }
}
