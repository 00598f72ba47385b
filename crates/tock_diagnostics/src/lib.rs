//! Diagnostic creation and accumulation for elaboration and simulation.
//!
//! This crate provides structured [`Diagnostic`] messages with severity levels,
//! codes, hierarchical signal locations, and the cycle at which they were
//! raised. The thread-safe [`DiagnosticSink`] accumulates them for the caller
//! to inspect between cycles.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use severity::Severity;
pub use sink::DiagnosticSink;
