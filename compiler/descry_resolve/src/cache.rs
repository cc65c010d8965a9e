//! Class identity cache and native class index.
//!
//! The positive map and the negative set are disjoint and write-once: a
//! name, once decided, stays decided for the session. Every insertion is
//! journaled so a failed pass can be unwound with [`ClassCache::rollback`].

use descry_descriptors::ClassId;
use descry_ir::{FqName, FqNameUnsafe};
use rustc_hash::{FxHashMap, FxHashSet};

/// Outcome of probing the cache.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CacheLookup {
    Resolved(ClassId),
    /// Known to have no resolvable class.
    Unresolvable,
    /// Not attempted yet.
    Unknown,
}

/// Attempted second write for a canonical name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConflict {
    pub name: FqNameUnsafe,
    /// What the name is already bound to.
    pub existing: CacheLookup,
}

impl CacheConflict {
    pub fn describe_existing(&self) -> &'static str {
        match self.existing {
            CacheLookup::Resolved(_) => "resolved",
            CacheLookup::Unresolvable => "unresolvable",
            CacheLookup::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Default, Debug)]
pub struct ClassCache {
    positive: FxHashMap<FqNameUnsafe, ClassId>,
    negative: FxHashSet<FqNameUnsafe>,
    journal: Vec<FqNameUnsafe>,
}

impl ClassCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe with a canonical name.
    pub fn lookup(&self, name: &FqNameUnsafe) -> CacheLookup {
        if let Some(&id) = self.positive.get(name) {
            CacheLookup::Resolved(id)
        } else if self.negative.contains(name) {
            CacheLookup::Unresolvable
        } else {
            CacheLookup::Unknown
        }
    }

    pub fn insert(&mut self, name: FqNameUnsafe, class: ClassId) -> Result<(), CacheConflict> {
        self.check_vacant(&name)?;
        self.journal.push(name.clone());
        self.positive.insert(name, class);
        Ok(())
    }

    pub fn insert_negative(&mut self, name: FqNameUnsafe) -> Result<(), CacheConflict> {
        self.check_vacant(&name)?;
        self.journal.push(name.clone());
        self.negative.insert(name);
        Ok(())
    }

    fn check_vacant(&self, name: &FqNameUnsafe) -> Result<(), CacheConflict> {
        match self.lookup(name) {
            CacheLookup::Unknown => Ok(()),
            existing => Err(CacheConflict {
                name: name.clone(),
                existing,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.positive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positive.is_empty()
    }

    pub fn negative_len(&self) -> usize {
        self.negative.len()
    }

    /// Journal position to roll back to.
    pub fn mark(&self) -> usize {
        self.journal.len()
    }

    /// Forget every entry inserted after `mark`.
    pub fn rollback(&mut self, mark: usize) {
        for name in self.journal.drain(mark..) {
            self.positive.remove(&name);
            self.negative.remove(&name);
        }
    }
}

/// Classes known from the compiler's own source, by foreign-looking name.
#[derive(Clone, Default, Debug)]
pub struct NativeClassIndex {
    classes: FxHashMap<FqName, ClassId>,
    journal: Vec<FqName>,
}

impl NativeClassIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, fq_name: &FqNameUnsafe) -> Option<ClassId> {
        self.classes.get(fq_name).copied()
    }

    /// Returns `false` if the name was already registered; the first
    /// registration wins.
    pub fn register(&mut self, fq_name: FqName, class: ClassId) -> bool {
        if self.classes.contains_key(fq_name.as_unsafe()) {
            return false;
        }
        self.journal.push(fq_name.clone());
        self.classes.insert(fq_name, class);
        true
    }

    pub fn mark(&self) -> usize {
        self.journal.len()
    }

    pub fn rollback(&mut self, mark: usize) {
        for name in self.journal.drain(mark..) {
            self.classes.remove(name.as_unsafe());
        }
    }
}
