//! Fatal resolution errors.
//!
//! These are defects in the resolver or its inputs, never user mistakes:
//! a pass that hits one is aborted and rolled back. Expected failures
//! (missing classes, unresolved supertypes) are negative cache entries,
//! error types or diagnostics instead.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// A name was inserted into the class cache twice, or into both halves.
    #[error("class cache rewrite at `{name}` (already {existing})")]
    CacheRewrite { name: String, existing: &'static str },

    #[error("requested `{requested}` but the declaration found reports `{found}`")]
    NameMismatch { requested: String, found: String },

    /// The provider returned the compiler's own mirror of a native class.
    #[error("`{name}` is a mirror of a native declaration")]
    MirrorDeclaration { name: String },

    #[error("outer class `{parent}` of `{name}` cannot be resolved")]
    ParentUnresolved { name: String, parent: String },

    /// A native class was found where only foreign ones were allowed.
    #[error("`{name}` is a native class")]
    FoundNative { name: String },

    #[error("malformed metadata for `{name}`: {detail}")]
    MalformedMetadata { name: String, detail: String },

    /// A syntax element from a file the session was never given.
    #[error("element {element} does not belong to a file of this session")]
    UnknownElement { element: String },

    #[error("resolution cancelled")]
    Cancelled,
}

impl ResolveError {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ResolveError::Cancelled)
    }
}
