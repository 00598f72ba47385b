//! Stand-in compute lanes and a controller driving several of them.

use tock_common::Value;
use tock_sim::{ModelBuilder, SignalId};

use crate::lane_manager::{ConfigAddr, LaneManager};

/// A lane that pulses `done` a fixed number of cycles after seeing `go`.
#[derive(Debug, Clone, Copy)]
pub struct DelayLane {
    /// Start strobe.
    pub go: SignalId,
    /// One-cycle completion pulse.
    pub done: SignalId,
}

impl DelayLane {
    /// Builds a lane whose `done` rises `delay` edges after the edge that
    /// sampled `go`. A zero `delay` is rejected at elaboration.
    pub fn build(m: &mut ModelBuilder<'_>, delay: u8) -> Self {
        if delay == 0 {
            m.reject("a lane needs at least one cycle of latency");
        }
        let go = m.input("go", 1);
        let done = m.output("done", 1);
        let remaining = m.wire("remaining", 8);
        m.seq("countdown")
            .reads(&[go, remaining])
            .writes(&[remaining, done])
            .eval(move |ctx| {
                let left = ctx.read_u64(remaining);
                if ctx.read_bool(go) {
                    ctx.write_u64(remaining, u64::from(delay));
                    ctx.write_bool(done, false);
                } else if left > 0 {
                    ctx.write_u64(remaining, left - 1);
                    ctx.write_bool(done, left == 1);
                } else {
                    ctx.write_bool(done, false);
                }
            });
        Self { go, done }
    }
}

/// A [`LaneManager`] wired to one [`DelayLane`] per entry of `delays`.
///
/// Only the configuration handshake is exposed; the lane interface is
/// internal.
#[derive(Debug, Clone)]
pub struct LaneArray {
    /// Configuration packet.
    pub msg: SignalId,
    /// Packet valid.
    pub val: SignalId,
    /// Packet ready.
    pub rdy: SignalId,
    /// The controller instance, `manager`.
    pub manager: LaneManager,
    /// The lanes, `lane[i]`.
    pub lanes: Vec<DelayLane>,
}

impl LaneArray {
    /// Instantiates the controller and the lanes and wires them together.
    pub fn build(m: &mut ModelBuilder<'_>, delays: &[u8]) -> Self {
        let manager = m.instance("manager", |c| LaneManager::build(c, delays.len()));
        let msg = m.input("from_cpu_msg", m.width(manager.msg));
        let val = m.input("from_cpu_val", 1);
        let rdy = m.output("from_cpu_rdy", 1);
        m.connect(msg, manager.msg);
        m.connect(val, manager.val);
        m.connect(manager.rdy, rdy);

        let lanes: Vec<DelayLane> = delays
            .iter()
            .enumerate()
            .map(|(i, &delay)| m.instance(&format!("lane[{i}]"), |c| DelayLane::build(c, delay)))
            .collect();
        for (lane, &done) in lanes.iter().zip(&manager.done) {
            m.connect(manager.go, lane.go);
            m.connect(lane.done, done);
        }

        Self {
            msg,
            val,
            rdy,
            manager,
            lanes,
        }
    }

    /// Encodes a configuration packet.
    pub fn packet(&self, reg: ConfigAddr, data: u64) -> Value {
        self.manager.packet(reg, data)
    }
}
