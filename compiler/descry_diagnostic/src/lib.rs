//! Diagnostic system for resolution reports.
//!
//! Every user-visible report carries:
//! - an error code for searchability
//! - a message saying what went wrong
//! - labels pointing at where it went wrong
//! - notes for extra context
//!
//! Internal invariant violations are not diagnostics; they travel as
//! `ResolveError` values and only become a diagnostic at the file analysis
//! boundary.

mod diagnostic;
mod error_code;
pub mod queue;

pub use diagnostic::{
    exception_while_analyzing, incompatible_abi_version, unresolved_supertype, Diagnostic, Label,
    Severity,
};
pub use error_code::ErrorCode;
pub use queue::DiagnosticQueue;
