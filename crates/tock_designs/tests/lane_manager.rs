//! Handshake and lane-completion behaviour of the lane-manager controller.
//!
//! The first group drives a bare controller, playing both the CPU and the
//! lanes from the test. The second group runs the controller against
//! [`DelayLane`]s, and the last loads the kernel settings from a
//! `tock.toml` on disk.

use proptest::prelude::*;
use tock_config::{load_config, SettleOrder, SimConfig};
use tock_designs::{ConfigAddr, ControllerState, LaneArray, LaneManager};
use tock_diagnostics::{DiagnosticCode, Severity};
use tock_sim::{Design, ElaborationError, SignalId, SimError, Simulator};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn manager(nlanes: usize) -> (Simulator, LaneManager) {
    let (design, lm) = Design::build("top", |m| LaneManager::build(m, nlanes));
    (Simulator::new(design).expect("controller should elaborate"), lm)
}

fn internal(sim: &Simulator, name: &str) -> SignalId {
    sim.find(&format!("top.{name}")).expect("controller wire")
}

fn state(sim: &Simulator) -> ControllerState {
    let bits = sim.read_u64(internal(sim, "state"));
    ControllerState::from_bits(bits).expect("state register holds a valid encoding")
}

fn next_state(sim: &Simulator) -> ControllerState {
    let bits = sim.read_u64(internal(sim, "state_next"));
    ControllerState::from_bits(bits).expect("next state holds a valid encoding")
}

/// Offers one packet for one cycle and reports whether it was accepted.
fn send(sim: &mut Simulator, lm: &LaneManager, reg: ConfigAddr, data: u64) -> bool {
    sim.write(lm.msg, lm.packet(reg, data)).unwrap();
    sim.write_bool(lm.val, true).unwrap();
    let accepted = sim.read_bool(lm.rdy);
    sim.step_cycle().unwrap();
    sim.write_bool(lm.val, false).unwrap();
    sim.settle().unwrap();
    accepted
}

/// Writes the operand registers and then `go`.
fn configure(sim: &mut Simulator, lm: &LaneManager) {
    for (reg, data) in [
        (ConfigAddr::Size, 1),
        (ConfigAddr::RBase, 0),
        (ConfigAddr::VBase, 0),
        (ConfigAddr::DBase, 0),
        (ConfigAddr::Go, 1),
    ] {
        assert!(send(sim, lm, reg, data), "{reg:?} packet refused");
    }
}

fn set_done(sim: &mut Simulator, lm: &LaneManager, lanes: &[bool]) {
    for (&port, &bit) in lm.done.iter().zip(lanes) {
        sim.write_bool(port, bit).unwrap();
    }
}

// ---------------------------------------------------------------------------
// Bare controller
// ---------------------------------------------------------------------------

#[test]
fn starts_idle_and_ready() {
    let (sim, lm) = manager(2);
    assert_eq!(state(&sim), ControllerState::Idle);
    assert!(sim.read_bool(lm.rdy));
    assert!(!sim.read_bool(lm.go));
    assert_eq!(sim.read_u64(internal(&sim, "done_reg")), 0);
}

#[test]
fn first_write_moves_to_configured() {
    let (mut sim, lm) = manager(2);
    assert!(send(&mut sim, &lm, ConfigAddr::Size, 7));
    assert_eq!(state(&sim), ControllerState::Configured);
    assert_eq!(sim.read_u64(lm.size), 7);
    assert!(sim.read_bool(lm.rdy));
}

#[test]
fn configuration_registers_follow_the_address_field() {
    let (mut sim, lm) = manager(1);
    send(&mut sim, &lm, ConfigAddr::Size, 16);
    send(&mut sim, &lm, ConfigAddr::RBase, 0x1000);
    send(&mut sim, &lm, ConfigAddr::VBase, 0x2000);
    send(&mut sim, &lm, ConfigAddr::DBase, 0xffff_fff0);
    assert_eq!(sim.read_u64(lm.size), 16);
    assert_eq!(sim.read_u64(lm.r_base), 0x1000);
    assert_eq!(sim.read_u64(lm.v_base), 0x2000);
    assert_eq!(sim.read_u64(lm.d_base), 0xffff_fff0);
    assert!(!sim.read_bool(lm.go));
}

#[test]
fn unused_addresses_are_accepted_but_write_nothing() {
    let (mut sim, lm) = manager(1);
    for addr in 5..8 {
        let packet = tock_common::Value::from_u64((addr << 32) | 99, 35);
        sim.write(lm.msg, packet).unwrap();
        sim.write_bool(lm.val, true).unwrap();
        sim.step_cycle().unwrap();
    }
    assert_eq!(state(&sim), ControllerState::Configured);
    for reg in [lm.size, lm.r_base, lm.v_base, lm.d_base, lm.go] {
        assert_eq!(sim.read_u64(reg), 0);
    }
}

#[test]
fn go_drops_ready_before_computing() {
    let (mut sim, lm) = manager(2);
    configure(&mut sim, &lm);
    assert_eq!(state(&sim), ControllerState::Configured);
    assert!(sim.read_bool(lm.go));
    assert!(!sim.read_bool(lm.rdy));
    assert_eq!(next_state(&sim), ControllerState::Computing);

    // a packet offered now is not taken
    assert!(!send(&mut sim, &lm, ConfigAddr::Size, 42));
    assert_eq!(sim.read_u64(lm.size), 1);
    assert_eq!(state(&sim), ControllerState::Computing);
    assert!(!sim.read_bool(lm.go));
}

#[test]
fn full_handshake() {
    let (mut sim, lm) = manager(2);
    assert_eq!(state(&sim), ControllerState::Idle);
    configure(&mut sim, &lm);
    sim.step_cycle().unwrap();
    assert_eq!(state(&sim), ControllerState::Computing);

    let mut trace = vec![];
    for lanes in [[false, false], [true, false], [false, false], [false, true]] {
        assert!(!sim.read_bool(lm.rdy), "ready while computing");
        set_done(&mut sim, &lm, &lanes);
        sim.step_cycle().unwrap();
        trace.push(sim.read_u64(internal(&sim, "done_reg")));
    }
    assert_eq!(trace, [0b00, 0b01, 0b01, 0b11]);

    // every bit latched: the next state is already idle
    assert_eq!(state(&sim), ControllerState::Computing);
    assert_eq!(next_state(&sim), ControllerState::Idle);
    assert!(!sim.read_bool(lm.rdy));

    set_done(&mut sim, &lm, &[false, false]);
    sim.step_cycle().unwrap();
    assert_eq!(state(&sim), ControllerState::Idle);
    assert!(sim.read_bool(lm.rdy));
    assert_eq!(sim.read_u64(internal(&sim, "done_reg")), 0b11);
}

#[test]
fn done_pulses_before_computing_are_ignored() {
    let (mut sim, lm) = manager(2);
    set_done(&mut sim, &lm, &[true, true]);
    send(&mut sim, &lm, ConfigAddr::Size, 3);
    sim.run(3).unwrap();
    assert_eq!(sim.read_u64(internal(&sim, "done_reg")), 0);
    assert_eq!(state(&sim), ControllerState::Configured);
}

#[test]
fn accepted_write_clears_latched_done() {
    let (mut sim, lm) = manager(1);
    configure(&mut sim, &lm);
    sim.step_cycle().unwrap();
    set_done(&mut sim, &lm, &[true]);
    sim.run(2).unwrap();
    set_done(&mut sim, &lm, &[false]);
    assert_eq!(state(&sim), ControllerState::Idle);
    assert_eq!(sim.read_u64(internal(&sim, "done_reg")), 1);

    assert!(send(&mut sim, &lm, ConfigAddr::Size, 2));
    assert_eq!(sim.read_u64(internal(&sim, "done_reg")), 0);
    assert_eq!(state(&sim), ControllerState::Configured);
}

#[test]
fn reset_returns_to_idle_and_clears_registers() {
    let (mut sim, lm) = manager(2);
    configure(&mut sim, &lm);
    sim.step_cycle().unwrap();
    set_done(&mut sim, &lm, &[true, false]);
    sim.step_cycle().unwrap();
    set_done(&mut sim, &lm, &[false, false]);
    assert_eq!(state(&sim), ControllerState::Computing);

    sim.reset().unwrap();
    assert_eq!(state(&sim), ControllerState::Idle);
    assert!(sim.read_bool(lm.rdy));
    for reg in [lm.size, lm.r_base, lm.v_base, lm.d_base, lm.go] {
        assert_eq!(sim.read_u64(reg), 0);
    }
    assert_eq!(sim.read_u64(internal(&sim, "done_reg")), 0);
}

#[test]
fn narrow_fields() {
    let (design, lm) = Design::build("top", |m| LaneManager::with_widths(m, 1, 3, 8));
    let mut sim = Simulator::new(design).unwrap();
    assert_eq!(sim.design().signal(lm.msg).width, 11);
    assert!(send(&mut sim, &lm, ConfigAddr::DBase, 0xab));
    assert_eq!(sim.read_u64(lm.d_base), 0xab);
}

#[test]
fn over_wide_strobe_is_truncated_with_a_warning() {
    let (mut sim, lm) = manager(1);
    sim.write_u64(lm.val, 2).unwrap();
    sim.settle().unwrap();
    assert!(!sim.read_bool(lm.val));
    assert_eq!(sim.diagnostics().len(), 1);
    let diags = sim.diagnostics().with_code(DiagnosticCode::WIDTH_OVERFLOW);
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].severity, Severity::Warning);
    assert_eq!(diags[0].location.as_deref(), Some("top.from_cpu_val"));
    assert_eq!(diags[0].cycle, Some(0));
}

// ---------------------------------------------------------------------------
// Controller with lanes
// ---------------------------------------------------------------------------

fn lane_array(delays: &[u8], config: &SimConfig) -> (Simulator, LaneArray) {
    let (design, array) = Design::build("top", |m| LaneArray::build(m, delays));
    let sim = Simulator::with_config(design, config).expect("lane array should elaborate");
    (sim, array)
}

/// Configures the array, starts a run, and counts the cycles until the
/// controller is ready again.
fn run_to_completion(sim: &mut Simulator, array: &LaneArray, limit: u32) -> Option<u32> {
    for (reg, data) in [(ConfigAddr::Size, 4), (ConfigAddr::Go, 1)] {
        sim.write(array.msg, array.packet(reg, data)).unwrap();
        sim.write_bool(array.val, true).unwrap();
        sim.step_cycle().unwrap();
    }
    sim.write_bool(array.val, false).unwrap();
    for cycles in 1..=limit {
        sim.step_cycle().unwrap();
        if sim.read_bool(array.rdy) {
            return Some(cycles);
        }
    }
    None
}

#[test]
fn lane_array_completes_after_slowest_lane() {
    let (mut sim, array) = lane_array(&[1, 3, 2], &SimConfig::default());
    assert_eq!(array.lanes.len(), 3);
    assert_eq!(run_to_completion(&mut sim, &array, 20), Some(6));
    assert_eq!(sim.read_u64(sim.find("top.manager.done_reg").unwrap()), 0b111);
    assert_eq!(sim.read_u64(array.manager.size), 4);
    assert!(sim.diagnostics().is_empty());
}

#[test]
fn lane_array_runs_twice() {
    let (mut sim, array) = lane_array(&[2, 2], &SimConfig::default());
    assert_eq!(run_to_completion(&mut sim, &array, 20), Some(5));
    assert_eq!(run_to_completion(&mut sim, &array, 20), Some(5));
}

#[test]
fn lane_array_lanes_see_go_for_one_cycle() {
    let (mut sim, array) = lane_array(&[4], &SimConfig::default());
    let go = array.lanes[0].go;
    sim.write(array.msg, array.packet(ConfigAddr::Go, 1)).unwrap();
    sim.write_bool(array.val, true).unwrap();
    sim.step_cycle().unwrap();
    sim.write_bool(array.val, false).unwrap();
    let mut high = 0;
    for _ in 0..8 {
        high += u32::from(sim.read_bool(go));
        sim.step_cycle().unwrap();
    }
    assert_eq!(high, 1);
}

#[test]
fn zero_delay_lane_fails_elaboration() {
    let (design, _) = Design::build("top", |m| LaneArray::build(m, &[2, 0]));
    assert_eq!(
        Simulator::new(design).unwrap_err(),
        SimError::Elaboration(ElaborationError::InvalidParameter {
            model: "top.lane[1]".into(),
            reason: "a lane needs at least one cycle of latency".into(),
        })
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn completion_tracks_the_slowest_lane(delays in prop::collection::vec(1u8..8, 1..6)) {
        let (mut sim, array) = lane_array(&delays, &SimConfig::default());
        let slowest = u32::from(*delays.iter().max().unwrap());
        prop_assert_eq!(run_to_completion(&mut sim, &array, 40), Some(slowest + 3));
    }
}

// ---------------------------------------------------------------------------
// Configuration from disk
// ---------------------------------------------------------------------------

#[test]
fn settle_order_from_tock_toml_does_not_change_results() {
    for order in ["ranked", "fifo", "lifo"] {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("tock.toml"),
            format!("[sim]\nsettle_order = \"{order}\"\nreset_cycles = 2\n"),
        )
        .unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.sim.reset_cycles, 2);

        let (mut sim, array) = lane_array(&[1, 3, 2], &config);
        assert_eq!(run_to_completion(&mut sim, &array, 20), Some(6), "order {order}");
        sim.reset().unwrap();
        assert_eq!(sim.cycle(), 2 + 6 + 2);
        assert!(sim.read_bool(array.rdy));
    }
}

#[test]
fn missing_tock_toml_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config(dir.path()).unwrap();
    assert_eq!(config.sim.settle_order, SettleOrder::Ranked);
    let (mut sim, array) = lane_array(&[2], &config);
    assert_eq!(run_to_completion(&mut sim, &array, 20), Some(5));
}
