//! Pure pass-through models.

use tock_sim::{ModelBuilder, SignalId};

/// `out` follows `in` with no logic in between.
#[derive(Debug, Clone, Copy)]
pub struct OneWire {
    /// Input port `in`.
    pub inp: SignalId,
    /// Output port `out`.
    pub out: SignalId,
}

impl OneWire {
    /// Declares the ports and the connection.
    pub fn build(m: &mut ModelBuilder<'_>, width: u32) -> Self {
        let inp = m.input("in", width);
        let out = m.output("out", width);
        m.connect(inp, out);
        Self { inp, out }
    }
}

/// A [`OneWire`] wrapped in another level of hierarchy.
#[derive(Debug, Clone, Copy)]
pub struct OneWireWrapped {
    /// Input port `in`.
    pub inp: SignalId,
    /// Output port `out`.
    pub out: SignalId,
    /// The wrapped instance, `wire`.
    pub wire: OneWire,
}

impl OneWireWrapped {
    /// Declares the ports and instantiates the inner wire.
    pub fn build(m: &mut ModelBuilder<'_>, width: u32) -> Self {
        let inp = m.input("in", width);
        let out = m.output("out", width);
        let wire = m.instance("wire", |c| OneWire::build(c, width));
        m.connect(inp, wire.inp);
        m.connect(wire.out, out);
        Self { inp, out, wire }
    }
}
