//! Demand-driven resolution of source syntax through a
//! `LazyResolveSession` layered on a foreign-class session.
//!
//! - `analysis` - whole-file analysis and body hooks
//! - `mixed` - source declarations that meet foreign classes

mod analysis;
mod mixed;
