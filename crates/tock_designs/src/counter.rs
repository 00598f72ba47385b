//! Incrementers and a wrapping counter, alone and composed with registers.

use tock_sim::{ModelBuilder, SignalId};

use crate::register::Register;

/// Drives `dst` with `src + 1`, resized to the width of `dst`.
fn plus_one(m: &mut ModelBuilder<'_>, name: &str, src: SignalId, dst: SignalId) {
    let width = m.width(dst);
    m.comb(name).reads(&[src]).writes(&[dst]).eval(move |ctx| {
        let v = ctx.read(src).resize(width).wrapping_add_u64(1);
        ctx.write(dst, v);
    });
}

/// Number of bits needed to hold `max`.
fn bits_for(max: u64) -> u32 {
    (u64::BITS - max.leading_zeros()).max(1)
}

/// A registered incrementer: `out` becomes `in + 1` at each clock edge.
#[derive(Debug, Clone, Copy)]
pub struct Incrementer {
    /// Input port `in`.
    pub inp: SignalId,
    /// Output port `out`.
    pub out: SignalId,
}

impl Incrementer {
    /// Declares the ports and the sequential block.
    pub fn build(m: &mut ModelBuilder<'_>, width: u32) -> Self {
        let inp = m.input("in", width);
        let out = m.output("out", width);
        m.seq("incr").reads(&[inp]).writes(&[out]).eval(move |ctx| {
            let v = ctx.read(inp).wrapping_add_u64(1);
            ctx.write(out, v);
        });
        Self { inp, out }
    }
}

/// Counts `0, 1, ..., max, 0, ...`, one step per cycle.
///
/// `clear` forces the count back to zero at the next edge, as does reset.
#[derive(Debug, Clone, Copy)]
pub struct Counter {
    /// Synchronous clear.
    pub clear: SignalId,
    /// The current count, just wide enough for `max`.
    pub count: SignalId,
}

impl Counter {
    /// Declares the ports and the counting block.
    pub fn build(m: &mut ModelBuilder<'_>, max: u64) -> Self {
        let clear = m.input("clear", 1);
        let count = m.output("count", bits_for(max));
        m.seq("seq_logic")
            .reads(&[clear, count])
            .writes(&[count])
            .eval(move |ctx| {
                let current = ctx.read_u64(count);
                let next = if ctx.read_bool(clear) || current == max {
                    0
                } else {
                    current + 1
                };
                ctx.write_u64(count, next);
            });
        Self { clear, count }
    }
}

/// A [`Counter`] followed by a combinational `+ 1`.
///
/// The output is one bit wider than the counter so `max + 1` fits.
#[derive(Debug, Clone, Copy)]
pub struct CountIncr {
    /// Synchronous clear.
    pub clear: SignalId,
    /// The counter value plus one.
    pub count: SignalId,
    /// The inner counter.
    pub counter: Counter,
}

impl CountIncr {
    /// Declares the ports, the counter, and the incrementing block.
    pub fn build(m: &mut ModelBuilder<'_>, max: u64) -> Self {
        let clear = m.input("clear", 1);
        let count = m.output("count", bits_for(max) + 1);
        let counter = m.instance("counter", |c| Counter::build(c, max));
        m.connect(clear, counter.clear);
        plus_one(m, "incr", counter.count, count);
        Self {
            clear,
            count,
            counter,
        }
    }
}

/// A [`Register`] followed by a combinational `+ 1`.
#[derive(Debug, Clone, Copy)]
pub struct RegIncr {
    /// Input port `in`.
    pub inp: SignalId,
    /// Output port `out`.
    pub out: SignalId,
    /// The register.
    pub reg0: Register,
}

impl RegIncr {
    /// Declares the ports, the register, and the incrementing block.
    pub fn build(m: &mut ModelBuilder<'_>, width: u32) -> Self {
        let inp = m.input("in", width);
        let out = m.output("out", width);
        let reg0 = m.instance("reg0", |c| Register::build(c, width));
        m.connect(inp, reg0.inp);
        plus_one(m, "incr", reg0.out, out);
        Self { inp, out, reg0 }
    }
}

/// A combinational `+ 1` followed by a [`Register`].
#[derive(Debug, Clone, Copy)]
pub struct IncrReg {
    /// Input port `in`.
    pub inp: SignalId,
    /// Output port `out`.
    pub out: SignalId,
    /// The register.
    pub reg0: Register,
}

impl IncrReg {
    /// Declares the ports, the incrementing block, and the register.
    pub fn build(m: &mut ModelBuilder<'_>, width: u32) -> Self {
        let inp = m.input("in", width);
        let out = m.output("out", width);
        let reg0 = m.instance("reg0", |c| Register::build(c, width));
        plus_one(m, "incr", inp, reg0.inp);
        m.connect(reg0.out, out);
        Self { inp, out, reg0 }
    }
}
