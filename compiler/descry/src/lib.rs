//! Descry - descriptor resolution.
//!
//! One entry point for the resolution crates. Foreign classes are resolved
//! through a [`ResolutionSession`]; the compiler's own declarations through
//! a [`LazyResolveSession`] layered on top of it.
//!
//! ```text
//! ClassFinder / MetadataReader / ExternalAnnotationStore
//!     │
//!     ▼
//! ResolutionSession ──► descriptors, class cache
//!     │
//!     ▼
//! LazyResolveSession ──► BindingContext per granule
//!     │
//!     ▼
//! analyze_file() ──► BindingContext per file
//! ```
//!
//! The sub-crates are re-exported whole ([`ir`], [`diagnostic`],
//! [`descriptors`], [`resolve`], [`lazy`]) and their most used types at the
//! crate root.

use std::sync::Once;

pub use descry_descriptors as descriptors;
pub use descry_diagnostic as diagnostic;
pub use descry_ir as ir;
pub use descry_lazy as lazy;
pub use descry_resolve as resolve;

pub use descry_descriptors::{ClassDescriptor, ClassId, Descriptors, Type};
pub use descry_diagnostic::{Diagnostic, ErrorCode};
pub use descry_ir::{FqName, FqNameUnsafe, Name, SharedInterner, StringInterner};
pub use descry_lazy::{
    analyze_file, BindingContext, BodyResolver, CancellationFlag, ElementId, FileId,
    LazyResolveSession, SyntaxTree,
};
pub use descry_resolve::{
    ClassFinder, ExternalAnnotationStore, MetadataReader, ResolutionSession, ResolveError,
    ResolverConfig, SearchRule,
};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call more than once. Nothing is installed unless `RUST_LOG` is
/// set, e.g. `RUST_LOG=descry_resolve=debug` or `RUST_LOG=descry_lazy=trace`.
/// Spans print as an indented tree, so nested class resolutions read in
/// the order they happened.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_targets(true)
                        .with_indent_lines(true),
                )
                .with(filter)
                .init();
        }
    });
}
