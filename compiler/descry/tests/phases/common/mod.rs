//! Shared test utilities for phase tests.
//!
//! In-memory stand-ins for every collaborator a session needs, and a
//! [`World`] that wires them together.

mod bodies;
mod providers;

pub use bodies::*;
pub use providers::*;
