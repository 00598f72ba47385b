//! Euclid's algorithm by subtract-and-swap, one step per cycle.

use tock_sim::{ModelBuilder, SignalId};

const IDLE: u64 = 0;
const CALC: u64 = 1;
const DONE: u64 = 2;

/// Greatest common divisor unit.
///
/// Operands are loaded while idle and `in_val` is high. Each cycle then
/// either swaps the operands (when `a < b`) or subtracts `b` from `a`,
/// until `b` is zero. `out_val` is high for the one cycle `out` holds the
/// result; the unit is idle again on the next cycle.
#[derive(Debug, Clone, Copy)]
pub struct Gcd {
    /// First operand.
    pub in_a: SignalId,
    /// Second operand.
    pub in_b: SignalId,
    /// Load strobe.
    pub in_val: SignalId,
    /// The result, valid while `out_val` is high.
    pub out: SignalId,
    /// Result strobe.
    pub out_val: SignalId,
}

impl Gcd {
    /// Declares the ports, the operand and state registers, and the output logic.
    pub fn build(m: &mut ModelBuilder<'_>, width: u32) -> Self {
        let in_a = m.input("in_a", width);
        let in_b = m.input("in_b", width);
        let in_val = m.input("in_val", 1);
        let out = m.output("out", width);
        let out_val = m.output("out_val", 1);
        let a = m.wire("a", width);
        let b = m.wire("b", width);
        let state = m.wire("state", 2);

        m.seq("step")
            .reads(&[in_a, in_b, in_val, a, b, state])
            .writes(&[a, b, state])
            .eval(move |ctx| match ctx.read_u64(state) {
                IDLE => {
                    if ctx.read_bool(in_val) {
                        let (va, vb) = (ctx.read(in_a), ctx.read(in_b));
                        ctx.write(a, va);
                        ctx.write(b, vb);
                        ctx.write_u64(state, CALC);
                    }
                }
                CALC => {
                    let (va, vb) = (ctx.read(a), ctx.read(b));
                    if va.cmp_magnitude(&vb).is_lt() {
                        ctx.write(a, vb);
                        ctx.write(b, va);
                    } else if !vb.is_zero() {
                        ctx.write(a, &va - &vb);
                    } else {
                        ctx.write_u64(state, DONE);
                    }
                }
                _ => ctx.write_u64(state, IDLE),
            });

        m.connect(a, out);
        m.comb("status")
            .reads(&[state])
            .writes(&[out_val])
            .eval(move |ctx| {
                let done = ctx.read_u64(state) == DONE;
                ctx.write_bool(out_val, done);
            });

        Self {
            in_a,
            in_b,
            in_val,
            out,
            out_val,
        }
    }
}
