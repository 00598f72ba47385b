//! Controller for a set of parallel compute lanes.
//!
//! The CPU configures the lanes through a valid/ready handshake. Each
//! accepted packet writes one configuration register; writing 1 to `go`
//! starts a run. The controller then waits until every lane has reported
//! `done` at least once and returns to idle.
//!
//! ```text
//!            accepted write            go seen           all done latched
//!   IDLE ----------------> CONFIGURED ---------> COMPUTING ----------------> IDLE
//! ```
//!
//! `ready` is high in `IDLE`, high in `CONFIGURED` until `go` is set, and
//! low throughout `COMPUTING`. Lane completion pulses are OR-latched into
//! `done_reg` while the next state is `COMPUTING`. Every accepted write
//! clears `done_reg`, including writes that arrive while already
//! configured.

use tock_common::Value;
use tock_sim::{ModelBuilder, SignalId};

/// Default width of the packet address field.
pub const ADDR_NBITS: u32 = 3;

/// Default width of the packet data field and of the configuration words.
pub const DATA_NBITS: u32 = 32;

/// Controller states, as held in the 2-bit `state` register.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ControllerState {
    /// Waiting for configuration.
    Idle,
    /// At least one configuration write accepted; waiting for `go`.
    Configured,
    /// Lanes running; waiting for every lane to report done.
    Computing,
}

impl ControllerState {
    /// The register encoding.
    pub const fn bits(self) -> u64 {
        match self {
            ControllerState::Idle => 0,
            ControllerState::Configured => 1,
            ControllerState::Computing => 2,
        }
    }

    /// Decodes a register value; `None` for the unused encoding 3.
    pub fn from_bits(bits: u64) -> Option<Self> {
        match bits {
            0 => Some(ControllerState::Idle),
            1 => Some(ControllerState::Configured),
            2 => Some(ControllerState::Computing),
            _ => None,
        }
    }
}

/// Configuration register selected by a packet's address field.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ConfigAddr {
    /// Bit 0 of the data starts a run.
    Go,
    /// Problem size.
    Size,
    /// Base address of the `r` operand.
    RBase,
    /// Base address of the `v` operand.
    VBase,
    /// Base address of the destination.
    DBase,
}

impl ConfigAddr {
    /// The address field value.
    pub const fn addr(self) -> u64 {
        match self {
            ConfigAddr::Go => 0,
            ConfigAddr::Size => 1,
            ConfigAddr::RBase => 2,
            ConfigAddr::VBase => 3,
            ConfigAddr::DBase => 4,
        }
    }
}

/// Ports of a [`LaneManager`] instance.
#[derive(Debug, Clone)]
pub struct LaneManager {
    /// Configuration packet: address above data.
    pub msg: SignalId,
    /// Packet valid, driven by the CPU.
    pub val: SignalId,
    /// Packet ready, driven by the controller.
    pub rdy: SignalId,
    /// Start strobe broadcast to the lanes.
    pub go: SignalId,
    /// Problem size broadcast to the lanes.
    pub size: SignalId,
    /// `r` base address broadcast to the lanes.
    pub r_base: SignalId,
    /// `v` base address broadcast to the lanes.
    pub v_base: SignalId,
    /// Destination base address broadcast to the lanes.
    pub d_base: SignalId,
    /// One completion input per lane.
    pub done: Vec<SignalId>,
    addr_nbits: u32,
    data_nbits: u32,
}

impl LaneManager {
    /// Builds a controller for `nlanes` lanes with the default field widths.
    pub fn build(m: &mut ModelBuilder<'_>, nlanes: usize) -> Self {
        Self::with_widths(m, nlanes, ADDR_NBITS, DATA_NBITS)
    }

    /// Builds a controller with explicit address and data field widths.
    pub fn with_widths(
        m: &mut ModelBuilder<'_>,
        nlanes: usize,
        addr_nbits: u32,
        data_nbits: u32,
    ) -> Self {
        let msg = m.input("from_cpu_msg", addr_nbits + data_nbits);
        let val = m.input("from_cpu_val", 1);
        let rdy = m.output("from_cpu_rdy", 1);
        let size = m.output("size", data_nbits);
        let r_base = m.output("r_base", data_nbits);
        let v_base = m.output("v_base", data_nbits);
        let d_base = m.output("d_base", data_nbits);
        let go = m.output("go", 1);
        let done = m.inputs("done", nlanes, 1);

        let state = m.wire("state", 2);
        let state_next = m.wire("state_next", 2);
        let addr = m.wire("addr", addr_nbits);
        let data = m.wire("data", data_nbits);
        let done_reg = m.wire("done_reg", nlanes as u32);

        m.connect_slice(msg, data_nbits, data_nbits + addr_nbits, addr);
        m.connect_slice(msg, 0, data_nbits, data);

        m.seq("state_update")
            .reads(&[state_next])
            .writes(&[state])
            .reset(state, ControllerState::Idle.bits())
            .eval(move |ctx| {
                let next = ctx.read(state_next);
                ctx.write(state, next);
            });

        let mut config_reads = vec![val, rdy, addr, data, state_next, done_reg];
        config_reads.extend_from_slice(&done);
        let lanes = done.clone();
        m.seq("config_update")
            .reads(&config_reads)
            .writes(&[go, size, r_base, v_base, d_base, done_reg])
            .eval(move |ctx| {
                if ctx.read_bool(val) && ctx.read_bool(rdy) {
                    let word = ctx.read(data);
                    match ctx.read_u64(addr) {
                        0 => ctx.write_bool(go, word.bit(0)),
                        1 => ctx.write(size, word),
                        2 => ctx.write(r_base, word),
                        3 => ctx.write(v_base, word),
                        4 => ctx.write(d_base, word),
                        _ => {}
                    }
                    ctx.write_u64(done_reg, 0);
                } else if ctx.read_u64(state_next) == ControllerState::Computing.bits() {
                    ctx.write_bool(go, false);
                    let mut latched = ctx.read(done_reg);
                    for (i, &lane) in (0..).zip(&lanes) {
                        if ctx.read_bool(lane) {
                            latched.set_bit(i, true);
                        }
                    }
                    ctx.write(done_reg, latched);
                }
            });

        m.comb("state_transition")
            .reads(&[val, go, done_reg, state])
            .writes(&[state_next, rdy])
            .eval(move |ctx| {
                let current = ctx.read_u64(state);
                let go_set = ctx.read_bool(go);
                let ready = match ControllerState::from_bits(current) {
                    Some(ControllerState::Idle) => true,
                    Some(ControllerState::Configured) => !go_set,
                    _ => false,
                };
                let do_config = ctx.read_bool(val) && ready;
                let all_done = ctx.read(done_reg).reduce_and().as_bool();
                let next = match ControllerState::from_bits(current) {
                    Some(ControllerState::Idle) if do_config => ControllerState::Configured.bits(),
                    Some(ControllerState::Configured) if go_set => ControllerState::Computing.bits(),
                    Some(ControllerState::Computing) if all_done => ControllerState::Idle.bits(),
                    _ => current,
                };
                ctx.write_u64(state_next, next);
                ctx.write_bool(rdy, ready);
            });

        Self {
            msg,
            val,
            rdy,
            go,
            size,
            r_base,
            v_base,
            d_base,
            done,
            addr_nbits,
            data_nbits,
        }
    }

    /// Encodes a configuration packet for this controller's field widths.
    pub fn packet(&self, reg: ConfigAddr, data: u64) -> Value {
        Value::from_u64(data, self.data_nbits).concat(&Value::from_u64(reg.addr(), self.addr_nbits))
    }

    /// Number of lanes.
    pub fn nlanes(&self) -> usize {
        self.done.len()
    }
}
