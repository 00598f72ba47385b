//! Cycle-based simulation kernel for synchronous hardware models.
//!
//! Designs are built structurally: models declare ports, wires, submodels,
//! connections, and two kinds of behaviour block. Combinational blocks are
//! pure functions of a declared read-set and are re-evaluated until nothing
//! changes. Sequential blocks sample the settled values and commit their
//! writes together at the clock edge.
//!
//! # Architecture
//!
//! [`Design::build`] records the model tree into flat arenas of signals,
//! blocks and models. [`elaborate`] validates the single-writer, width,
//! visibility and direction rules, and ranks blocks by their position in
//! the dependency graph. [`Simulator`] then alternates settling and clock
//! edges, one [`step_cycle`](Simulator::step_cycle) at a time.
//!
//! # Usage
//!
//! ```ignore
//! use tock_sim::{Design, Simulator};
//!
//! let (design, (d, q)) = Design::build("top", |m| {
//!     let d = m.input("d", 16);
//!     let q = m.output("q", 16);
//!     m.seq("reg").reads(&[d]).writes(&[q]).eval(move |ctx| {
//!         let v = ctx.read(d);
//!         ctx.write(q, v);
//!     });
//!     (d, q)
//! });
//! let mut sim = Simulator::new(design)?;
//! sim.write_u64(d, 10)?;
//! sim.step_cycle()?;
//! assert_eq!(sim.read_u64(q), 10);
//! ```
//!
//! # Modules
//!
//! - `signal` — Signal storage with pending writes and change tracking
//! - `block` — Behaviour blocks and the evaluation context
//! - `model` — Hierarchical model construction
//! - `elaborate` — Design validation and netlist construction
//! - `settle` — Combinational fixpoint iteration
//! - `kernel` — The cycle driver

#![warn(missing_docs)]

pub mod arena;
pub mod block;
pub mod elaborate;
pub mod error;
pub mod ids;
pub mod kernel;
pub mod model;
pub(crate) mod settle;
pub mod signal;

pub use block::{BlockCtx, BlockKind};
pub use elaborate::{elaborate, Netlist};
pub use error::{Access, ElaborationError, SimError};
pub use ids::{BlockId, ModelId, SignalId};
pub use kernel::{CycleReport, Simulator};
pub use model::{BlockBuilder, Design, ModelBuilder};
pub use signal::{Direction, SignalKind};
pub use tock_common::Value;
pub use tock_config::{SettleOrder, SimConfig};
