//! Interned identifiers.

use std::fmt;

const SHARD_SHIFT: u32 = 28;

/// Handle to an interned string.
///
/// The top four bits pick the interner shard that owns the string and the
/// rest index into that shard, so a lookup locks one shard only.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[repr(transparent)]
pub struct Name(u32);

impl Name {
    /// The empty string, interned before anything else.
    pub const EMPTY: Name = Name(0);

    pub const MAX_LOCAL: u32 = (1 << SHARD_SHIFT) - 1;

    pub const NUM_SHARDS: usize = 1 << (u32::BITS - SHARD_SHIFT);

    #[inline]
    pub const fn new(shard: u32, local: u32) -> Self {
        debug_assert!((shard as usize) < Self::NUM_SHARDS);
        debug_assert!(local <= Self::MAX_LOCAL);
        Name((shard << SHARD_SHIFT) | local)
    }

    #[inline]
    pub const fn shard(self) -> usize {
        (self.0 >> SHARD_SHIFT) as usize
    }

    #[inline]
    pub const fn local(self) -> usize {
        (self.0 & Self::MAX_LOCAL) as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({}:{})", self.shard(), self.local())
    }
}

#[cfg(test)]
mod tests;
