//! Ordered diagnostic collection.
//!
//! Resolution can reach the same broken declaration from several paths, so
//! the queue drops exact duplicates while keeping first-report order.

use rustc_hash::FxHashSet;

use crate::Diagnostic;

#[derive(Default, Debug, Clone)]
pub struct DiagnosticQueue {
    diagnostics: Vec<Diagnostic>,
    seen: FxHashSet<Diagnostic>,
}

impl DiagnosticQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic. Returns `false` if an identical one was already queued.
    pub fn push(&mut self, diag: Diagnostic) -> bool {
        if !self.seen.insert(diag.clone()) {
            return false;
        }
        self.diagnostics.push(diag);
        true
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn peek(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Drop everything queued after the first `len` diagnostics.
    pub fn truncate(&mut self, len: usize) {
        for diag in self.diagnostics.drain(len.min(self.diagnostics.len())..) {
            self.seen.remove(&diag);
        }
    }

    /// Take all queued diagnostics.
    pub fn flush(&mut self) -> Vec<Diagnostic> {
        self.seen.clear();
        std::mem::take(&mut self.diagnostics)
    }
}
