//! Splitting a bus into groups of bits and merging groups back.

use tock_sim::{ModelBuilder, SignalId};

/// Splits `in` into `width / group` outputs of `group` bits, lowest first.
#[derive(Debug, Clone)]
pub struct ComplexSplitter {
    /// The bus, `in`.
    pub inp: SignalId,
    /// `out[i]` carries bits `[i * group, (i + 1) * group)`.
    pub out: Vec<SignalId>,
}

impl ComplexSplitter {
    /// Declares the ports and one slice connection per group.
    ///
    /// A `group` that is zero or does not divide `width` is rejected at
    /// elaboration; the splitter is then built without outputs.
    pub fn build(m: &mut ModelBuilder<'_>, width: u32, group: u32) -> Self {
        let inp = m.input("in", width);
        if group == 0 || width % group != 0 {
            m.reject(format!(
                "a {width}-bit bus cannot be split into {group}-bit groups"
            ));
            return Self {
                inp,
                out: Vec::new(),
            };
        }
        let out = m.outputs("out", (width / group) as usize, group);
        for (i, &port) in (0..).zip(&out) {
            m.connect_slice(inp, i * group, (i + 1) * group, port);
        }
        Self { inp, out }
    }
}

/// Splits `in` into single bits.
#[derive(Debug, Clone)]
pub struct SimpleSplitter {
    /// The bus, `in`.
    pub inp: SignalId,
    /// `out[i]` is bit `i`.
    pub out: Vec<SignalId>,
}

impl SimpleSplitter {
    /// Declares the ports and one slice connection per bit.
    pub fn build(m: &mut ModelBuilder<'_>, width: u32) -> Self {
        let ComplexSplitter { inp, out } = ComplexSplitter::build(m, width, 1);
        Self { inp, out }
    }
}

/// Concatenates `width / group` inputs of `group` bits, `in[0]` lowest.
#[derive(Debug, Clone)]
pub struct ComplexMerger {
    /// The groups, `in[i]`.
    pub inp: Vec<SignalId>,
    /// The merged bus, `out`.
    pub out: SignalId,
}

impl ComplexMerger {
    /// Declares the ports and the concatenating block.
    ///
    /// A `group` that is zero or does not divide `width` is rejected at
    /// elaboration; the merger is then built without inputs.
    pub fn build(m: &mut ModelBuilder<'_>, width: u32, group: u32) -> Self {
        let out = m.output("out", width);
        if group == 0 || width % group != 0 {
            m.reject(format!("{group}-bit groups cannot form a {width}-bit bus"));
            return Self {
                inp: Vec::new(),
                out,
            };
        }
        let inp = m.inputs("in", (width / group) as usize, group);
        let parts = inp.clone();
        m.comb("merge")
            .reads(&inp)
            .writes(&[out])
            .eval(move |ctx| {
                let merged = parts[1..]
                    .iter()
                    .fold(ctx.read(parts[0]), |acc, &part| acc.concat(&ctx.read(part)));
                ctx.write(out, merged);
            });
        Self { inp, out }
    }
}

/// Concatenates single bits into a bus.
#[derive(Debug, Clone)]
pub struct SimpleMerger {
    /// The bits, `in[i]`.
    pub inp: Vec<SignalId>,
    /// The merged bus, `out`.
    pub out: SignalId,
}

impl SimpleMerger {
    /// Declares the ports and the concatenating block.
    pub fn build(m: &mut ModelBuilder<'_>, width: u32) -> Self {
        let ComplexMerger { inp, out } = ComplexMerger::build(m, width, 1);
        Self { inp, out }
    }
}
