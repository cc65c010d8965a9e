//! Stack growth for recursive resolution.
//!
//! Class resolution recurses through parents, supertypes, bounds, annotation
//! types and member signatures; long chains of freshly-seen classes can go
//! deep, so every full class resolution runs under [`ensure_sufficient_stack`].

/// If less than this remains, grow the stack.
const RED_ZONE: usize = 128 * 1024;

/// Size of each new stack segment.
const STACK_PER_RECURSION: usize = 2 * 1024 * 1024;

#[cfg(not(target_arch = "wasm32"))]
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[cfg(target_arch = "wasm32")]
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
