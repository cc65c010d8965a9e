//! Descry lazy - demand-driven resolution of source syntax.
//!
//! A [`LazyResolveSession`] sits on top of a [`ResolutionSession`] and
//! resolves the compiler's own declarations only when someone asks about
//! them. Adding a file declares its classes and members shallowly; asking
//! about any element resolves the smallest piece of syntax that contains it
//! (its granule) and caches the result.
//!
//! # Layout
//!
//! - [`syntax`]: the syntax tree handed in by the front end
//! - [`trace`]: binding contexts and the per-request trace
//! - [`granule`]: which syntax is resolved as a unit
//! - [`body`]: hooks into the body-level type checker
//! - [`cancel`]: cooperative cancellation
//! - [`session`]: the session itself
//! - [`analyze_file`]: whole-file analysis and its failure boundary
//!
//! [`ResolutionSession`]: descry_resolve::ResolutionSession

mod analyze;
pub mod body;
pub mod cancel;
mod declarations;
pub mod granule;
pub mod session;
pub mod syntax;
pub mod trace;
mod types;

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod testing;

pub use analyze::analyze_file;
pub use body::{BodyResolver, BodyScope, DeclarationsOnly};
pub use cancel::CancellationFlag;
pub use declarations::NO_NAME;
pub use granule::{find_granule, Granule};
pub use session::{GranuleStatus, LazyResolveSession};
pub use syntax::{ElementId, FileId, Node, NodeId, NodeKind, SyntaxTree};
pub use trace::{BindingContext, Declaration, DelegatingTrace, ReferenceTarget};
