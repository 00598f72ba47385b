//! Data registers and small register networks.

use tock_sim::{ModelBuilder, SignalId};

use crate::split::SimpleSplitter;

/// A data register: `out` takes `in` at every clock edge.
///
/// It has no reset value; `out` keeps loading `in` while reset is high.
#[derive(Debug, Clone, Copy)]
pub struct Register {
    /// Input port `in`.
    pub inp: SignalId,
    /// Output port `out`.
    pub out: SignalId,
}

impl Register {
    /// Declares the ports and the sequential block.
    pub fn build(m: &mut ModelBuilder<'_>, width: u32) -> Self {
        let inp = m.input("in", width);
        let out = m.output("out", width);
        m.seq("seq_logic")
            .reads(&[inp])
            .writes(&[out])
            .no_reset()
            .eval(move |ctx| {
                let v = ctx.read(inp);
                ctx.write(out, v);
            });
        Self { inp, out }
    }
}

/// A [`Register`] behind another level of hierarchy.
#[derive(Debug, Clone, Copy)]
pub struct RegisterWrapper {
    /// Input port `in`.
    pub inp: SignalId,
    /// Output port `out`.
    pub out: SignalId,
    /// The wrapped register, `reg0`.
    pub reg0: Register,
}

impl RegisterWrapper {
    /// Declares the ports and the inner register.
    pub fn build(m: &mut ModelBuilder<'_>, width: u32) -> Self {
        let inp = m.input("in", width);
        let out = m.output("out", width);
        let reg0 = m.instance("reg0", |c| Register::build(c, width));
        m.connect(inp, reg0.inp);
        m.connect(reg0.out, out);
        Self { inp, out, reg0 }
    }
}

/// Three registers in series: `out` lags `in` by three cycles.
#[derive(Debug, Clone, Copy)]
pub struct RegisterChain {
    /// Input port `in`.
    pub inp: SignalId,
    /// Output port `out`.
    pub out: SignalId,
    /// First stage.
    pub reg1: Register,
    /// Second stage.
    pub reg2: Register,
    /// Third stage.
    pub reg3: Register,
}

impl RegisterChain {
    /// Declares the ports and the three stages.
    pub fn build(m: &mut ModelBuilder<'_>, width: u32) -> Self {
        let inp = m.input("in", width);
        let out = m.output("out", width);
        let reg1 = m.instance("reg1", |c| Register::build(c, width));
        let reg2 = m.instance("reg2", |c| Register::build(c, width));
        let reg3 = m.instance("reg3", |c| Register::build(c, width));
        m.connect(inp, reg1.inp);
        m.connect(reg1.out, reg2.inp);
        m.connect(reg2.out, reg3.inp);
        m.connect(reg3.out, out);
        Self {
            inp,
            out,
            reg1,
            reg2,
            reg3,
        }
    }
}

/// One register fanned out to three outputs.
#[derive(Debug, Clone, Copy)]
pub struct FanOutOne {
    /// Input port `in`.
    pub inp: SignalId,
    /// First copy.
    pub out1: SignalId,
    /// Second copy.
    pub out2: SignalId,
    /// Third copy.
    pub out3: SignalId,
    /// The shared register.
    pub reg0: Register,
}

impl FanOutOne {
    /// Declares the ports, the register, and the three connections.
    pub fn build(m: &mut ModelBuilder<'_>, width: u32) -> Self {
        let inp = m.input("in", width);
        let out1 = m.output("out1", width);
        let out2 = m.output("out2", width);
        let out3 = m.output("out3", width);
        let reg0 = m.instance("reg0", |c| Register::build(c, width));
        m.connect(inp, reg0.inp);
        for out in [out1, out2, out3] {
            m.connect(reg0.out, out);
        }
        Self {
            inp,
            out1,
            out2,
            out3,
            reg0,
        }
    }
}

/// One register feeding three more, so outputs lag by two cycles.
#[derive(Debug, Clone, Copy)]
pub struct FanOutTwo {
    /// Input port `in`.
    pub inp: SignalId,
    /// Output of `reg1`.
    pub out1: SignalId,
    /// Output of `reg2`.
    pub out2: SignalId,
    /// Output of `reg3`.
    pub out3: SignalId,
    /// The first stage.
    pub reg0: Register,
    /// Second-stage registers.
    pub fanout: [Register; 3],
}

impl FanOutTwo {
    /// Declares the ports and both register stages.
    pub fn build(m: &mut ModelBuilder<'_>, width: u32) -> Self {
        let inp = m.input("in", width);
        let out1 = m.output("out1", width);
        let out2 = m.output("out2", width);
        let out3 = m.output("out3", width);
        let reg0 = m.instance("reg0", |c| Register::build(c, width));
        let fanout = [
            m.instance("reg1", |c| Register::build(c, width)),
            m.instance("reg2", |c| Register::build(c, width)),
            m.instance("reg3", |c| Register::build(c, width)),
        ];
        m.connect(inp, reg0.inp);
        for (reg, out) in fanout.iter().zip([out1, out2, out3]) {
            m.connect(reg0.out, reg.inp);
            m.connect(reg.out, out);
        }
        Self {
            inp,
            out1,
            out2,
            out3,
            reg0,
            fanout,
        }
    }
}

/// A register whose output is split into single bits.
#[derive(Debug, Clone)]
pub struct RegisterSplitter {
    /// Input port `in`.
    pub inp: SignalId,
    /// `out[i]` is bit `i` of the register.
    pub out: Vec<SignalId>,
    /// The register.
    pub reg0: Register,
    /// The splitter after it.
    pub split: SimpleSplitter,
}

impl RegisterSplitter {
    /// Declares the ports, the register, and the splitter.
    pub fn build(m: &mut ModelBuilder<'_>, width: u32) -> Self {
        let inp = m.input("in", width);
        let out = m.outputs("out", width as usize, 1);
        let reg0 = m.instance("reg0", |c| Register::build(c, width));
        let split = m.instance("split", |c| SimpleSplitter::build(c, width));
        m.connect(inp, reg0.inp);
        m.connect(reg0.out, split.inp);
        for (&bit, &port) in split.out.iter().zip(&out) {
            m.connect(bit, port);
        }
        Self {
            inp,
            out,
            reg0,
            split,
        }
    }
}
