//! Thread-safe diagnostic accumulator.

use crate::code::DiagnosticCode;
use crate::diagnostic::Diagnostic;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A thread-safe accumulator for diagnostics.
///
/// The error count is tracked atomically for fast `has_errors` checks
/// without locking the diagnostic vector.
#[derive(Debug)]
pub struct DiagnosticSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
    error_count: AtomicUsize,
}

impl DiagnosticSink {
    /// Creates a new empty diagnostic sink.
    pub fn new() -> Self {
        Self {
            diagnostics: Mutex::new(Vec::new()),
            error_count: AtomicUsize::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Records a diagnostic. Errors also bump the cumulative error count.
    pub fn emit(&self, diag: Diagnostic) {
        if diag.severity.is_error() {
            self.error_count.fetch_add(1, Ordering::Relaxed);
        }
        self.lock().push(diag);
    }

    /// Returns `true` if any error-severity diagnostics have been emitted.
    pub fn has_errors(&self) -> bool {
        self.error_count.load(Ordering::Relaxed) > 0
    }

    /// Returns the number of error-severity diagnostics emitted so far.
    pub fn error_count(&self) -> usize {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Returns the number of diagnostics currently held.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if the sink holds no diagnostics.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Takes all accumulated diagnostics, leaving the sink empty.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.lock())
    }

    /// Returns a snapshot of all accumulated diagnostics without draining.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.lock().clone()
    }

    /// Returns the held diagnostics carrying `code`, in emission order.
    pub fn with_code(&self, code: DiagnosticCode) -> Vec<Diagnostic> {
        self.lock().iter().filter(|d| d.code == code).cloned().collect()
    }
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Category;

    const MULTIPLE_WRITERS: DiagnosticCode = DiagnosticCode::new(Category::Error, 101);

    fn two_writers() -> Diagnostic {
        Diagnostic::new(MULTIPLE_WRITERS, "`top.x` has 2 writers").at("top.x")
    }

    fn truncated(cycle: u64) -> Diagnostic {
        Diagnostic::new(DiagnosticCode::WIDTH_OVERFLOW, "value 0x1ff truncated to 8 bits")
            .at("top.sum")
            .in_cycle(cycle)
    }

    #[test]
    fn empty_sink() {
        let sink = DiagnosticSink::default();
        assert!(!sink.has_errors());
        assert!(sink.is_empty());
        assert!(sink.take_all().is_empty());
    }

    #[test]
    fn warnings_do_not_count_as_errors() {
        let sink = DiagnosticSink::new();
        sink.emit(truncated(0));
        sink.emit(truncated(1));
        assert!(!sink.has_errors());
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn filter_by_code() {
        let sink = DiagnosticSink::new();
        sink.emit(truncated(4));
        sink.emit(two_writers());
        sink.emit(truncated(9));
        let cycles: Vec<_> = sink
            .with_code(DiagnosticCode::WIDTH_OVERFLOW)
            .iter()
            .map(|d| d.cycle)
            .collect();
        assert_eq!(cycles, [Some(4), Some(9)]);
        assert!(sink.with_code(DiagnosticCode::UNDRIVEN).is_empty());
    }

    #[test]
    fn error_count_survives_take_all() {
        let sink = DiagnosticSink::new();
        sink.emit(two_writers());
        sink.emit(truncated(0));
        assert_eq!(sink.take_all().len(), 2);
        assert!(sink.is_empty());
        assert_eq!(sink.error_count(), 1);
    }

    #[test]
    fn concurrent_emitters() {
        use std::sync::Arc;
        use std::thread;

        let sink = Arc::new(DiagnosticSink::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let sink = Arc::clone(&sink);
                thread::spawn(move || {
                    for i in 0..25 {
                        sink.emit(two_writers());
                        sink.emit(truncated(t * 100 + i));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(sink.error_count(), 100);
        assert_eq!(sink.with_code(DiagnosticCode::WIDTH_OVERFLOW).len(), 100);
    }
}
