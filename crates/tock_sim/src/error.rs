//! Error types for elaboration and simulation.
//!
//! Elaboration errors describe a malformed design and are reported once,
//! before any cycle runs. [`SimError`] wraps them together with the faults
//! that can stop a cycle. Width overflow is not an error: it is reported as
//! a warning diagnostic and the truncated value is kept.

use std::fmt;

use tock_common::RangeError;
use tock_config::InvalidSetting;
use tock_diagnostics::{Category, DiagnosticCode};

/// A structural defect found while elaborating a design.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ElaborationError {
    /// More than one block, connection, or the external harness writes a signal.
    #[error("signal `{signal}` has multiple writers: {}", writers.join(", "))]
    MultipleWriters {
        /// Hierarchical path of the signal.
        signal: String,
        /// Names of every writer found.
        writers: Vec<String>,
    },

    /// The two ends of a connection have different widths.
    #[error("connection `{src}` ({src_width} bits) -> `{dst}` ({dst_width} bits) has mismatched widths")]
    WidthMismatch {
        /// Source signal (with slice bounds, if any).
        src: String,
        /// Width of the source or source slice.
        src_width: u32,
        /// Destination signal.
        dst: String,
        /// Width of the destination.
        dst_width: u32,
    },

    /// An input port of a submodel is never driven by its parent.
    #[error("input port `{port}` is not connected")]
    UnconnectedInput {
        /// Hierarchical path of the port.
        port: String,
    },

    /// Two members of one model share a name.
    #[error("model `{model}` declares `{name}` more than once")]
    DuplicateName {
        /// Hierarchical path of the model.
        model: String,
        /// The repeated local name.
        name: String,
    },

    /// A signal was declared with zero bits.
    #[error("signal `{signal}` has zero width")]
    ZeroWidth {
        /// Hierarchical path of the signal.
        signal: String,
    },

    /// A block or connection touches a signal outside its model's scope.
    #[error("`{block}` cannot access `{signal}`: only the model's own signals and its submodels' ports are visible")]
    NotVisible {
        /// Hierarchical path of the block.
        block: String,
        /// Hierarchical path of the signal.
        signal: String,
    },

    /// A block drives its own model's input or a submodel's output.
    #[error("`{block}` drives `{port}` against its direction")]
    DirectionViolation {
        /// Hierarchical path of the block.
        block: String,
        /// Hierarchical path of the port.
        port: String,
    },

    /// A model builder was given parameters it cannot realise.
    #[error("model `{model}`: {reason}")]
    InvalidParameter {
        /// Hierarchical path of the model.
        model: String,
        /// What was wrong with the parameters.
        reason: String,
    },
}

impl ElaborationError {
    /// Returns the diagnostic code this error is reported under.
    pub fn code(&self) -> DiagnosticCode {
        let number = match self {
            ElaborationError::MultipleWriters { .. } => 101,
            ElaborationError::WidthMismatch { .. } => 102,
            ElaborationError::UnconnectedInput { .. } => 103,
            ElaborationError::DuplicateName { .. } => 104,
            ElaborationError::ZeroWidth { .. } => 105,
            ElaborationError::NotVisible { .. } => 106,
            ElaborationError::DirectionViolation { .. } => 107,
            ElaborationError::InvalidParameter { .. } => 108,
        };
        DiagnosticCode::new(Category::Error, number)
    }
}

/// Whether a stray access was a read or a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    /// The block read a signal outside its read-set.
    Read,
    /// The block wrote a signal outside its write-set.
    Write,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Read => write!(f, "read"),
            Access::Write => write!(f, "write"),
        }
    }
}

/// Errors that can occur during elaboration or simulation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    /// The design failed validation; simulation cannot start.
    #[error("elaboration failed: {0}")]
    Elaboration(#[from] ElaborationError),

    /// The kernel settings cannot drive a simulation.
    #[error("invalid configuration: {0}")]
    Config(#[from] InvalidSetting),

    /// A slice connection has invalid bounds.
    #[error(transparent)]
    Range(#[from] RangeError),

    /// Settling did not reach a fixpoint within the evaluation budget.
    #[error("combinational loop in cycle {cycle}: no fixpoint after {evaluations} evaluations (limit {limit}); still pending: {}", blocks.join(", "))]
    CombinationalLoop {
        /// The cycle being settled.
        cycle: u64,
        /// Block evaluations performed before giving up.
        evaluations: u64,
        /// The evaluation budget.
        limit: u64,
        /// Blocks still scheduled when the budget ran out.
        blocks: Vec<String>,
    },

    /// A block touched a signal outside its declared read- or write-set.
    #[error("`{block}` performed an undeclared {access} of `{signal}`")]
    UndeclaredAccess {
        /// Hierarchical path of the block.
        block: String,
        /// Hierarchical path of the signal.
        signal: String,
        /// Kind of access.
        access: Access,
    },

    /// An external write targeted something other than a top-level input.
    #[error("`{signal}` is not a top-level input port and cannot be driven externally")]
    NotExternallyDriven {
        /// Hierarchical path of the signal.
        signal: String,
    },

    /// No signal exists at the given hierarchical path.
    #[error("no signal named `{0}`")]
    UnknownSignal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiple_writers_display() {
        let e = ElaborationError::MultipleWriters {
            signal: "top.out".into(),
            writers: vec!["top.a".into(), "top.b".into()],
        };
        assert_eq!(
            e.to_string(),
            "signal `top.out` has multiple writers: top.a, top.b"
        );
        assert_eq!(e.code().to_string(), "E101");
    }

    #[test]
    fn width_mismatch_display() {
        let e = ElaborationError::WidthMismatch {
            src: "top.a".into(),
            src_width: 8,
            dst: "top.b".into(),
            dst_width: 4,
        };
        assert_eq!(
            e.to_string(),
            "connection `top.a` (8 bits) -> `top.b` (4 bits) has mismatched widths"
        );
    }

    #[test]
    fn elaboration_wraps_into_sim_error() {
        let e: SimError = ElaborationError::UnconnectedInput {
            port: "top.child.inp".into(),
        }
        .into();
        assert_eq!(
            e.to_string(),
            "elaboration failed: input port `top.child.inp` is not connected"
        );
    }

    #[test]
    fn range_error_is_transparent() {
        let e: SimError = RangeError {
            lo: 0,
            hi: 9,
            width: 8,
        }
        .into();
        assert_eq!(e.to_string(), "invalid slice [0:9) of a 8-bit value");
    }

    #[test]
    fn combinational_loop_display() {
        let e = SimError::CombinationalLoop {
            cycle: 3,
            evaluations: 129,
            limit: 128,
            blocks: vec!["top.inv".into()],
        };
        assert_eq!(
            e.to_string(),
            "combinational loop in cycle 3: no fixpoint after 129 evaluations (limit 128); still pending: top.inv"
        );
    }

    #[test]
    fn undeclared_access_display() {
        let e = SimError::UndeclaredAccess {
            block: "top.logic".into(),
            signal: "top.x".into(),
            access: Access::Write,
        };
        assert_eq!(
            e.to_string(),
            "`top.logic` performed an undeclared write of `top.x`"
        );
    }

    #[test]
    fn codes_are_distinct() {
        let errors = [
            ElaborationError::UnconnectedInput { port: "p".into() },
            ElaborationError::DuplicateName {
                model: "m".into(),
                name: "n".into(),
            },
            ElaborationError::ZeroWidth { signal: "s".into() },
            ElaborationError::NotVisible {
                block: "b".into(),
                signal: "s".into(),
            },
            ElaborationError::DirectionViolation {
                block: "b".into(),
                port: "p".into(),
            },
            ElaborationError::InvalidParameter {
                model: "m".into(),
                reason: "r".into(),
            },
        ];
        let codes: std::collections::HashSet<_> = errors.iter().map(|e| e.code()).collect();
        assert_eq!(codes.len(), errors.len());
    }
}
