//! Library models built on the tock simulation kernel.
//!
//! Each model is a port struct with a `build` constructor taking a
//! [`ModelBuilder`](tock_sim::ModelBuilder). Use it as the top of a design
//! or as a submodel:
//!
//! ```ignore
//! use tock_designs::RegisterChain;
//! use tock_sim::{Design, Simulator};
//!
//! let (design, chain) = Design::build("top", |m| RegisterChain::build(m, 16));
//! let mut sim = Simulator::new(design)?;
//! sim.write_u64(chain.inp, 8)?;
//! sim.run(3)?;
//! assert_eq!(sim.read_u64(chain.out), 8);
//! ```
//!
//! The [`LaneManager`] controller is the largest example: a state register,
//! combinational next-state logic, and a bank of configuration registers
//! behind a valid/ready handshake.

#![warn(missing_docs)]

pub mod adder;
pub mod counter;
pub mod gcd;
pub mod lane_manager;
pub mod lanes;
pub mod register;
pub mod split;
pub mod wiring;

pub use adder::{FullAdder, RippleCarryAdder};
pub use counter::{CountIncr, Counter, IncrReg, Incrementer, RegIncr};
pub use gcd::Gcd;
pub use lane_manager::{ConfigAddr, ControllerState, LaneManager};
pub use lanes::{DelayLane, LaneArray};
pub use register::{FanOutOne, FanOutTwo, Register, RegisterChain, RegisterSplitter, RegisterWrapper};
pub use split::{ComplexMerger, ComplexSplitter, SimpleMerger, SimpleSplitter};
pub use wiring::{OneWire, OneWireWrapped};
