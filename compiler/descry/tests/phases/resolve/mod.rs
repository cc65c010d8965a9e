//! Foreign class resolution through a `ResolutionSession`.
//!
//! - `caching` - memoization, negative entries and rollback
//! - `classes` - class objects, enums, generic self-reference
//! - `annotations` - own, external and internal annotations
//! - `metadata` - compiled metadata and its version check

mod annotations;
mod caching;
mod classes;
mod metadata;
