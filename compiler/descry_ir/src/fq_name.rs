//! Qualified names.
//!
//! Two flavors share one identity: [`FqName`] guarantees every segment is an
//! identifier, [`FqNameUnsafe`] accepts any segment (synthetic class-object
//! segments, error recovery). A safe and an unsafe name with the same
//! segments are equal and hash identically, and `FqName: Borrow<FqNameUnsafe>`
//! so maps keyed by the unsafe flavor can be probed with either.

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

use smallvec::SmallVec;

use crate::{Name, StringInterner, StringLookup};

/// Raw segment naming the class object of the preceding segment.
pub const CLASS_OBJECT_MARKER: &str = "ClassObject$";

/// Inline storage covers the common `pkg.sub.Outer.Inner` depth.
pub type Segments = SmallVec<[Name; 4]>;

/// Error building an [`FqName`] from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FqNameError {
    #[error("empty segment in qualified name `{text}`")]
    EmptySegment { text: String },
    #[error("`{segment}` is not an identifier (in `{text}`)")]
    InvalidSegment { text: String, segment: String },
}

/// Identifier rule for safe names: non-empty, no leading digit, and only
/// alphanumerics, `_` or `$`.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if !first.is_ascii_digit() && is_identifier_char(first) => {
            chars.all(is_identifier_char)
        }
        _ => false,
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Qualified name whose segments may hold arbitrary content.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FqNameUnsafe {
    segments: Segments,
}

impl FqNameUnsafe {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: impl IntoIterator<Item = Name>) -> Self {
        FqNameUnsafe {
            segments: segments.into_iter().collect(),
        }
    }

    /// Split dotted text into segments. The empty string is the root.
    pub fn parse(interner: &StringInterner, text: &str) -> Self {
        if text.is_empty() {
            return Self::root();
        }
        Self::from_segments(text.split('.').map(|s| interner.intern(s)))
    }

    #[inline]
    pub fn segments(&self) -> &[Name] {
        &self.segments
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment, `None` for the root.
    pub fn short_name(&self) -> Option<Name> {
        self.segments.last().copied()
    }

    /// Name without its last segment, `None` for the root.
    pub fn parent(&self) -> Option<FqNameUnsafe> {
        let (_, init) = self.segments.split_last()?;
        Some(Self::from_segments(init.iter().copied()))
    }

    #[must_use]
    pub fn child(&self, name: Name) -> FqNameUnsafe {
        let mut segments = self.segments.clone();
        segments.push(name);
        FqNameUnsafe { segments }
    }

    /// First `len` segments (clamped).
    #[must_use]
    pub fn prefix(&self, len: usize) -> FqNameUnsafe {
        let len = len.min(self.segments.len());
        Self::from_segments(self.segments[..len].iter().copied())
    }

    /// Segments from `start` onwards (clamped).
    #[must_use]
    pub fn suffix_from(&self, start: usize) -> FqNameUnsafe {
        let start = start.min(self.segments.len());
        Self::from_segments(self.segments[start..].iter().copied())
    }

    pub fn starts_with(&self, prefix: &FqNameUnsafe) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    pub fn first_segment_is(&self, name: Name) -> bool {
        self.segments.first() == Some(&name)
    }

    /// Promote to the safe flavor, checking every segment.
    pub fn to_safe<L: StringLookup + ?Sized>(&self, lookup: &L) -> Result<FqName, FqNameError> {
        for &segment in &self.segments {
            let text = lookup.lookup(segment);
            if text.is_empty() {
                return Err(FqNameError::EmptySegment {
                    text: self.display(lookup).to_string(),
                });
            }
            if !is_identifier(text) {
                return Err(FqNameError::InvalidSegment {
                    text: self.display(lookup).to_string(),
                    segment: text.to_owned(),
                });
            }
        }
        Ok(FqName {
            inner: self.clone(),
        })
    }

    pub fn display<'a, L: StringLookup + ?Sized>(&'a self, lookup: &'a L) -> FqNameDisplay<'a, L> {
        FqNameDisplay { fq: self, lookup }
    }
}

impl fmt::Debug for FqNameUnsafe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.segments.iter()).finish()
    }
}

/// Qualified name whose segments are all identifiers.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FqName {
    inner: FqNameUnsafe,
}

impl FqName {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(interner: &StringInterner, text: &str) -> Result<Self, FqNameError> {
        if text.is_empty() {
            return Ok(Self::root());
        }
        let mut segments = Segments::new();
        for segment in text.split('.') {
            if segment.is_empty() {
                return Err(FqNameError::EmptySegment {
                    text: text.to_owned(),
                });
            }
            if !is_identifier(segment) {
                return Err(FqNameError::InvalidSegment {
                    text: text.to_owned(),
                    segment: segment.to_owned(),
                });
            }
            segments.push(interner.intern(segment));
        }
        Ok(FqName {
            inner: FqNameUnsafe { segments },
        })
    }

    pub fn parent(&self) -> Option<FqName> {
        self.inner.parent().map(|inner| FqName { inner })
    }

    /// Append a segment. `name` must already be an identifier; use
    /// [`FqNameUnsafe::child`] for synthetic segments.
    #[must_use]
    pub fn child(&self, name: Name) -> FqName {
        FqName {
            inner: self.inner.child(name),
        }
    }

    #[must_use]
    pub fn prefix(&self, len: usize) -> FqName {
        FqName {
            inner: self.inner.prefix(len),
        }
    }

    #[must_use]
    pub fn suffix_from(&self, start: usize) -> FqName {
        FqName {
            inner: self.inner.suffix_from(start),
        }
    }

    pub fn as_unsafe(&self) -> &FqNameUnsafe {
        &self.inner
    }

    pub fn to_unsafe(&self) -> FqNameUnsafe {
        self.inner.clone()
    }
}

impl Deref for FqName {
    type Target = FqNameUnsafe;

    fn deref(&self) -> &FqNameUnsafe {
        &self.inner
    }
}

impl Borrow<FqNameUnsafe> for FqName {
    fn borrow(&self) -> &FqNameUnsafe {
        &self.inner
    }
}

impl AsRef<FqNameUnsafe> for FqName {
    fn as_ref(&self) -> &FqNameUnsafe {
        &self.inner
    }
}

impl From<FqName> for FqNameUnsafe {
    fn from(fq: FqName) -> Self {
        fq.inner
    }
}

impl PartialEq<FqNameUnsafe> for FqName {
    fn eq(&self, other: &FqNameUnsafe) -> bool {
        self.inner == *other
    }
}

impl PartialEq<FqName> for FqNameUnsafe {
    fn eq(&self, other: &FqName) -> bool {
        *self == other.inner
    }
}

impl fmt::Debug for FqName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

/// Renders a qualified name as dotted text.
pub struct FqNameDisplay<'a, L: StringLookup + ?Sized> {
    fq: &'a FqNameUnsafe,
    lookup: &'a L,
}

impl<L: StringLookup + ?Sized> fmt::Display for FqNameDisplay<'_, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fq.is_root() {
            return f.write_str("<root>");
        }
        for (i, &segment) in self.fq.segments().iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(self.lookup.lookup(segment))?;
        }
        Ok(())
    }
}

/// Name of the synthetic class object owned by `owner`.
pub fn class_object_name(interner: &StringInterner, owner: Name) -> Name {
    interner.intern(&format!("<class-object-for-{}>", interner.lookup(owner)))
}

/// Rewrite raw class-object segments into the internal naming scheme.
///
/// Every [`CLASS_OBJECT_MARKER`] segment that follows a segment `P` becomes
/// `<class-object-for-P>`. A leading marker has no owner and is kept.
pub fn canonicalize(interner: &StringInterner, fq: &FqNameUnsafe) -> FqNameUnsafe {
    let Some(marker) = interner.get(CLASS_OBJECT_MARKER) else {
        return fq.clone();
    };
    let segments = fq.segments();
    if !segments.contains(&marker) {
        return fq.clone();
    }
    let mut canonical = Segments::with_capacity(segments.len());
    for (i, &segment) in segments.iter().enumerate() {
        if segment == marker && i > 0 {
            canonical.push(class_object_name(interner, segments[i - 1]));
        } else {
            canonical.push(segment);
        }
    }
    FqNameUnsafe {
        segments: canonical,
    }
}
