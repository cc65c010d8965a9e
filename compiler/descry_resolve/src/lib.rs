//! Descry resolve - foreign classes to descriptors.
//!
//! Turns declarations seen through a [`ClassFinder`] (raw foreign classes)
//! or a [`MetadataReader`] (compiled metadata) into descriptors, resolving
//! their type parameters, supertypes, annotations and, on demand, their
//! members. Every class is built once per [`ResolutionSession`]: the class
//! cache remembers both hits and misses for the session's lifetime.
//!
//! # Layout
//!
//! - [`raw`]: declaration shapes the providers hand over
//! - [`providers`]: the collaborator traits
//! - [`signature`]: the generic-signature parser
//! - [`cache`]: positive and negative class cache, native class index
//! - [`postponed`]: tasks run after a pass returns
//! - `resolver`: the passes over [`ResolverState`]
//! - [`session`]: locking, rollback and reporting around the passes
//!
//! # Failure
//!
//! Expected failures become negative cache entries, error types or
//! diagnostics. A [`ResolveError`] is a broken invariant: the pass stops
//! and every write it made is rolled back.

pub mod cache;
pub mod config;
mod error;
pub mod postponed;
pub mod providers;
pub mod raw;
mod resolver;
pub mod session;
pub mod signature;
mod stack;

pub use cache::{CacheLookup, ClassCache, NativeClassIndex};
pub use config::{ResolverConfig, CURRENT_ABI_VERSION};
pub use error::ResolveError;
pub use postponed::{PostponedTask, PostponedTasks};
pub use providers::{
    AbiVersionReport, ClassFinder, CollectingErrorReporter, ErrorReporter,
    ExternalAnnotationStore, MetadataReader, Providers, SilentErrorReporter,
};
pub use resolver::annotations::AnnotationProbe;
pub use resolver::{Resolver, ResolverState, SearchRule, StateCheckpoint, TypeVariableScope};
pub use session::{ResolutionSession, ResolutionSessionBuilder};
pub use stack::ensure_sufficient_stack;
