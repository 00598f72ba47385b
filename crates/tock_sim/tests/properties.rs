//! Property tests for the settle/commit discipline.

use proptest::prelude::*;
use tock_sim::{Design, SettleOrder, SignalId, SimConfig, Simulator};

/// A random acyclic network of 8-bit operators over four inputs and one
/// register fed back from the last operator.
struct Network {
    inputs: Vec<SignalId>,
    observed: Vec<SignalId>,
}

fn network(nodes: &[(u8, usize, usize)]) -> (Design, Network) {
    Design::build("top", |m| {
        let inputs = m.inputs("in", 4, 8);
        let acc = m.wire("acc", 8);
        let mut pool = inputs.clone();
        pool.push(acc);
        let mut observed = vec![acc];
        for (i, &(op, a, b)) in nodes.iter().enumerate() {
            let x = pool[a % pool.len()];
            let y = pool[b % pool.len()];
            let w = m.wire(&format!("n{i}"), 8);
            m.comb(&format!("op{i}"))
                .reads(&[x, y])
                .writes(&[w])
                .eval(move |ctx| {
                    let (vx, vy) = (ctx.read(x), ctx.read(y));
                    let v = match op % 4 {
                        0 => &vx + &vy,
                        1 => &vx ^ &vy,
                        2 => &vx & &vy,
                        _ => &vx | &vy,
                    };
                    ctx.write(w, v);
                });
            pool.push(w);
            observed.push(w);
        }
        let last = pool[pool.len() - 1];
        m.seq("accumulate")
            .reads(&[last])
            .writes(&[acc])
            .eval(move |ctx| {
                let v = ctx.read(last);
                ctx.write(acc, v);
            });
        Network { inputs, observed }
    })
}

fn trace(
    nodes: &[(u8, usize, usize)],
    stimulus: &[Vec<u8>],
    order: SettleOrder,
) -> Vec<Vec<u64>> {
    let (design, net) = network(nodes);
    let mut config = SimConfig::default();
    config.sim.settle_order = order;
    config.sim.settle_limit_factor = 4096;
    let mut sim = Simulator::with_config(design, &config).unwrap();
    let mut out = Vec::new();
    for values in stimulus {
        for (&port, &v) in net.inputs.iter().zip(values) {
            sim.write_u64(port, u64::from(v)).unwrap();
        }
        sim.settle().unwrap();
        out.push(net.observed.iter().map(|&s| sim.read_u64(s)).collect());
        sim.step_cycle().unwrap();
        out.push(net.observed.iter().map(|&s| sim.read_u64(s)).collect());
    }
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn fixpoint_does_not_depend_on_visit_order(
        nodes in prop::collection::vec((0u8..4, 0usize..32, 0usize..32), 1..10),
        stimulus in prop::collection::vec(prop::collection::vec(any::<u8>(), 4), 1..4),
    ) {
        let ranked = trace(&nodes, &stimulus, SettleOrder::Ranked);
        let fifo = trace(&nodes, &stimulus, SettleOrder::Fifo);
        let lifo = trace(&nodes, &stimulus, SettleOrder::Lifo);
        prop_assert_eq!(&ranked, &fifo);
        prop_assert_eq!(&ranked, &lifo);
    }

    #[test]
    fn addition_wraps_at_the_signal_width(width in 1u32..=32, a in any::<u32>(), b in any::<u32>()) {
        let mask = (1u64 << width) - 1;
        let (a, b) = (u64::from(a) & mask, u64::from(b) & mask);
        let (design, (pa, pb, sum)) = Design::build("top", |m| {
            let pa = m.input("a", width);
            let pb = m.input("b", width);
            let sum = m.output("sum", width);
            m.comb("add").reads(&[pa, pb]).writes(&[sum]).eval(move |ctx| {
                let v = &ctx.read(pa) + &ctx.read(pb);
                ctx.write(sum, v);
            });
            (pa, pb, sum)
        });
        let mut sim = Simulator::new(design).unwrap();
        sim.write_u64(pa, a).unwrap();
        sim.write_u64(pb, b).unwrap();
        sim.settle().unwrap();
        prop_assert_eq!(sim.read_u64(sum), (a + b) % (1u64 << width));
        prop_assert!(sim.diagnostics().is_empty());
    }

    #[test]
    fn registers_see_pre_edge_values(a in any::<u16>(), b in any::<u16>(), swaps in 1u32..6) {
        let (design, (load, da, db, x, y)) = Design::build("top", |m| {
            let load = m.input("load", 1);
            let da = m.input("da", 16);
            let db = m.input("db", 16);
            let x = m.output("x", 16);
            let y = m.output("y", 16);
            m.seq("rx").reads(&[load, da, y]).writes(&[x]).eval(move |ctx| {
                let v = if ctx.read_bool(load) { ctx.read(da) } else { ctx.read(y) };
                ctx.write(x, v);
            });
            m.seq("ry").reads(&[load, db, x]).writes(&[y]).eval(move |ctx| {
                let v = if ctx.read_bool(load) { ctx.read(db) } else { ctx.read(x) };
                ctx.write(y, v);
            });
            (load, da, db, x, y)
        });
        let mut sim = Simulator::new(design).unwrap();
        sim.write_bool(load, true).unwrap();
        sim.write_u64(da, u64::from(a)).unwrap();
        sim.write_u64(db, u64::from(b)).unwrap();
        sim.step_cycle().unwrap();
        sim.write_bool(load, false).unwrap();
        sim.run(u64::from(swaps)).unwrap();
        let expected = if swaps % 2 == 1 { (b, a) } else { (a, b) };
        prop_assert_eq!((sim.read_u64(x), sim.read_u64(y)), (u64::from(expected.0), u64::from(expected.1)));
    }
}
