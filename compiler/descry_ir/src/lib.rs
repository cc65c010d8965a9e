//! Descry IR - identity and naming primitives
//!
//! This crate contains the leaf data structures every other Descry crate
//! agrees on:
//! - `Name` for interned identifiers and the sharded `StringInterner`
//! - `FqName` / `FqNameUnsafe` for qualified names, with the class-object
//!   canonicalization rule
//! - `Span` for source locations
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: segments are `Name(u32)`, so qualified names
//!   compare and hash without touching string data.
//! - **One Identity**: both qualified-name flavors with the same segments are
//!   equal and hash the same, so caches can be probed with either.

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-allocated types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

mod fq_name;
mod interner;
mod name;
mod span;

pub use fq_name::{
    canonicalize, class_object_name, is_identifier, FqName, FqNameDisplay, FqNameError,
    FqNameUnsafe, Segments, CLASS_OBJECT_MARKER,
};
pub use interner::{InternError, SharedInterner, StringInterner, StringLookup};
pub use name::Name;
pub use span::Span;

static_assert_size!(Name, 4);
static_assert_size!(Span, 8);
