//! Bit-level adders.

use tock_common::Value;
use tock_sim::{ModelBuilder, SignalId};

/// One-bit full adder.
#[derive(Debug, Clone, Copy)]
pub struct FullAdder {
    /// First operand bit.
    pub in0: SignalId,
    /// Second operand bit.
    pub in1: SignalId,
    /// Carry in.
    pub cin: SignalId,
    /// `in0 ^ in1 ^ cin`.
    pub sum: SignalId,
    /// Majority of the three inputs.
    pub cout: SignalId,
}

impl FullAdder {
    /// Declares the ports and the combinational logic.
    pub fn build(m: &mut ModelBuilder<'_>) -> Self {
        let in0 = m.input("in0", 1);
        let in1 = m.input("in1", 1);
        let cin = m.input("cin", 1);
        let sum = m.output("sum", 1);
        let cout = m.output("cout", 1);
        m.comb("logic")
            .reads(&[in0, in1, cin])
            .writes(&[sum, cout])
            .eval(move |ctx| {
                let (a, b, c) = (ctx.read_bool(in0), ctx.read_bool(in1), ctx.read_bool(cin));
                ctx.write_bool(sum, a ^ b ^ c);
                ctx.write_bool(cout, (a && b) || (a && c) || (b && c));
            });
        Self {
            in0,
            in1,
            cin,
            sum,
            cout,
        }
    }
}

/// `nbits`-wide adder built from a chain of [`FullAdder`]s.
///
/// The final carry-out is dropped, so the sum wraps at `2^nbits`.
#[derive(Debug, Clone)]
pub struct RippleCarryAdder {
    /// First operand.
    pub in0: SignalId,
    /// Second operand.
    pub in1: SignalId,
    /// Truncated sum.
    pub sum: SignalId,
    /// The bit slices, `adder[0]` being the least significant.
    pub adders: Vec<FullAdder>,
}

impl RippleCarryAdder {
    /// Declares the ports, the full-adder chain, and the sum assembly.
    pub fn build(m: &mut ModelBuilder<'_>, nbits: u32) -> Self {
        let in0 = m.input("in0", nbits);
        let in1 = m.input("in1", nbits);
        let sum = m.output("sum", nbits);
        let adders: Vec<FullAdder> = (0..nbits)
            .map(|i| m.instance(&format!("adder[{i}]"), FullAdder::build))
            .collect();

        let mut carry: Option<SignalId> = None;
        for (i, fa) in (0..nbits).zip(&adders) {
            m.connect_slice(in0, i, i + 1, fa.in0);
            m.connect_slice(in1, i, i + 1, fa.in1);
            match carry {
                Some(cout) => {
                    m.connect(cout, fa.cin);
                }
                None => {
                    m.connect_const(fa.cin, 0);
                }
            }
            carry = Some(fa.cout);
        }

        let bits: Vec<SignalId> = adders.iter().map(|fa| fa.sum).collect();
        m.comb("collect")
            .reads(&bits)
            .writes(&[sum])
            .eval(move |ctx| {
                let mut value = Value::new(nbits);
                for (i, &bit) in (0..nbits).zip(&bits) {
                    value.set_bit(i, ctx.read_bool(bit));
                }
                ctx.write(sum, value);
            });

        Self {
            in0,
            in1,
            sum,
            adders,
        }
    }
}
