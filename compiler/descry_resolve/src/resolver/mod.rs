//! The resolver context and its passes.
//!
//! [`ResolverState`] is everything a session remembers between requests.
//! [`Resolver`] bundles that state with the session's collaborators for the
//! duration of one pass; every pass is a free function over `&mut
//! Resolver<'_>`.
//!
//! ```text
//! resolve_class
//! ├── compiled metadata ── compiled::resolve_compiled
//! └── raw declaration  ─── class::build_foreign_class
//!     ├── signatures::resolve_type_parameters   (two-phase)
//!     ├── supertypes::resolve_supertypes
//!     ├── annotations::resolve_annotations      (types postponed)
//!     ├── sam::detect_single_abstract_method    (interfaces)
//!     └── enum_class::synthesize_class_object   (enums)
//!
//! members::ensure_members (on demand)
//! └── functions, properties, constructors, override propagation
//! ```

use std::sync::Arc;

use descry_descriptors::{
    BuiltIns, ClassId, Descriptors, Members, Origin, PackageId, PlatformClassMap,
};
use descry_diagnostic::{Diagnostic, DiagnosticQueue};
use descry_ir::{canonicalize, FqName, FqNameUnsafe, StringInterner};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::cache::{CacheConflict, CacheLookup, ClassCache, NativeClassIndex};
use crate::config::ResolverConfig;
use crate::postponed::PostponedTasks;
use crate::providers::{ErrorReporter, Providers, SilentErrorReporter};
use crate::raw::{AnnotationOwner, ClassProto, RawClass};
use crate::ResolveError;

pub(crate) mod annotations;
mod class;
mod compiled;
mod constants;
mod enum_class;
pub(crate) mod members;
mod sam;
mod signatures;
mod supertypes;
mod transform;
pub(crate) mod well_known;

pub use transform::TypeVariableScope;
use well_known::WellKnownNames;

/// What to do when a name turns out to belong to a native class.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SearchRule {
    /// Report absent so the caller resolves it natively.
    IgnoreIfNative,
    /// Return the native class.
    IncludeNative,
    /// Treat the hit as a fatal error.
    ErrorIfNative,
}

/// Session-lifetime resolver state.
///
/// # Component Structure
///
/// ```text
/// ResolverState
/// ├── descriptors: Descriptors       (arena, built-ins at fixed ids)
/// ├── cache: ClassCache              (positive + negative, journaled)
/// ├── native: NativeClassIndex       (classes from the compiler's own source)
/// ├── raw_classes / protos           (inputs kept for lazy member loading)
/// └── diagnostics: DiagnosticQueue
/// ```
pub struct ResolverState {
    // === Descriptor Storage ===
    descriptors: Descriptors,
    builtins: BuiltIns,
    platform: PlatformClassMap,

    // === Caches ===
    cache: ClassCache,
    native: NativeClassIndex,
    raw_classes: FxHashMap<ClassId, Arc<RawClass>>,
    protos: FxHashMap<ClassId, Arc<ClassProto>>,
    /// Classes whose member scope is being built.
    loading_members: FxHashSet<ClassId>,

    // === Name Cache ===
    names: WellKnownNames,

    // === Diagnostics ===
    diagnostics: DiagnosticQueue,
}

/// Everything a pass may have written, for [`ResolverState::rollback`].
#[derive(Copy, Clone, Debug)]
pub struct StateCheckpoint {
    descriptors: descry_descriptors::Checkpoint,
    classes: usize,
    cache: usize,
    native: usize,
    diagnostics: usize,
}

impl ResolverState {
    pub fn new(interner: &StringInterner) -> Self {
        let mut descriptors = Descriptors::new();
        let builtins = BuiltIns::install(&mut descriptors, interner);
        ResolverState {
            descriptors,
            builtins,
            platform: PlatformClassMap::new(interner),
            cache: ClassCache::new(),
            native: NativeClassIndex::new(),
            raw_classes: FxHashMap::default(),
            protos: FxHashMap::default(),
            loading_members: FxHashSet::default(),
            names: WellKnownNames::new(interner),
            diagnostics: DiagnosticQueue::new(),
        }
    }

    // ========================================
    // Accessors
    // ========================================

    pub fn descriptors(&self) -> &Descriptors {
        &self.descriptors
    }

    pub fn builtins(&self) -> &BuiltIns {
        &self.builtins
    }

    pub fn platform(&self) -> &PlatformClassMap {
        &self.platform
    }

    pub fn cache(&self) -> &ClassCache {
        &self.cache
    }

    /// Probe the class cache; `fq_name` must already be canonical.
    pub fn lookup_cached(&self, fq_name: &FqNameUnsafe) -> CacheLookup {
        self.cache.lookup(fq_name)
    }

    /// Answer `resolve_class` from what is already known, if possible.
    pub(crate) fn settled_lookup(
        &self,
        interner: &StringInterner,
        fq_name: &FqName,
    ) -> Option<Option<ClassId>> {
        class::settled_lookup(self, interner, fq_name)
    }

    pub fn native_class(&self, fq_name: &FqNameUnsafe) -> Option<ClassId> {
        self.native.get(fq_name)
    }

    /// Raw declaration a foreign class was built from.
    pub fn raw_class(&self, class: ClassId) -> Option<&Arc<RawClass>> {
        self.raw_classes.get(&class)
    }

    pub fn diagnostics(&self) -> &DiagnosticQueue {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.flush()
    }

    pub(crate) fn descriptors_mut(&mut self) -> &mut Descriptors {
        &mut self.descriptors
    }

    pub(crate) fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub(crate) fn names(&self) -> &WellKnownNames {
        &self.names
    }

    // ========================================
    // Rollback
    // ========================================

    /// Start a pass. Descriptor writes are journaled until [`commit`](Self::commit)
    /// or [`rollback`](Self::rollback).
    pub fn checkpoint(&mut self) -> StateCheckpoint {
        StateCheckpoint {
            descriptors: self.descriptors.checkpoint(),
            classes: self.descriptors.class_count(),
            cache: self.cache.mark(),
            native: self.native.mark(),
            diagnostics: self.diagnostics.len(),
        }
    }

    pub fn commit(&mut self) {
        self.descriptors.commit();
    }

    /// Undo every write made since `checkpoint`.
    pub fn rollback(&mut self, checkpoint: StateCheckpoint) {
        self.descriptors.rollback(checkpoint.descriptors);
        self.cache.rollback(checkpoint.cache);
        self.native.rollback(checkpoint.native);
        self.diagnostics.truncate(checkpoint.diagnostics);
        let live = checkpoint.classes;
        self.raw_classes.retain(|id, _| id.index() < live);
        self.protos.retain(|id, _| id.index() < live);
        self.loading_members.clear();
    }
}

impl std::fmt::Debug for ResolverState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverState")
            .field("classes", &self.descriptors.class_count())
            .field("cached", &self.cache.len())
            .field("unresolvable", &self.cache.negative_len())
            .field("diagnostics", &self.diagnostics.len())
            .finish_non_exhaustive()
    }
}

/// One resolution pass over the session state.
pub struct Resolver<'a> {
    state: &'a mut ResolverState,
    providers: &'a Providers,
    interner: &'a StringInterner,
    config: &'a ResolverConfig,
    reporter: &'a dyn ErrorReporter,
    tasks: &'a mut PostponedTasks,
    /// Nesting of full class resolutions on the stack.
    depth: u32,
}

impl<'a> Resolver<'a> {
    pub fn new(
        state: &'a mut ResolverState,
        providers: &'a Providers,
        interner: &'a StringInterner,
        config: &'a ResolverConfig,
        reporter: &'a dyn ErrorReporter,
        tasks: &'a mut PostponedTasks,
    ) -> Self {
        Resolver {
            state,
            providers,
            interner,
            config,
            reporter,
            tasks,
            depth: 0,
        }
    }

    // ========================================
    // Accessors
    // ========================================

    pub fn interner(&self) -> &'a StringInterner {
        self.interner
    }

    pub fn state(&self) -> &ResolverState {
        &*self.state
    }

    pub fn descriptors(&self) -> &Descriptors {
        &self.state.descriptors
    }

    pub fn descriptors_mut(&mut self) -> &mut Descriptors {
        &mut self.state.descriptors
    }

    pub fn builtins(&self) -> &BuiltIns {
        &self.state.builtins
    }

    pub fn tasks(&mut self) -> &mut PostponedTasks {
        &mut *self.tasks
    }

    /// Reporter for the current nesting level. Nested resolutions are
    /// speculative, so only the outermost request reports.
    fn reporter(&self) -> &'a dyn ErrorReporter {
        if self.depth <= 1 {
            self.reporter
        } else {
            &SilentErrorReporter
        }
    }

    fn names(&self) -> &WellKnownNames {
        &self.state.names
    }

    // ========================================
    // Operations
    // ========================================

    pub fn resolve_class(
        &mut self,
        fq_name: &FqName,
        rule: SearchRule,
    ) -> Result<Option<ClassId>, ResolveError> {
        class::resolve_class(self, fq_name, rule)
    }

    pub fn resolve_annotations(
        &mut self,
        owner: AnnotationOwner<'_>,
    ) -> Result<Vec<descry_descriptors::AnnotationId>, ResolveError> {
        annotations::resolve_annotations(self, owner)
    }

    /// Member scope of `class`, loading it on first request.
    pub fn class_members(&mut self, class: ClassId) -> Result<Members, ResolveError> {
        members::ensure_members(self, class)?;
        Ok(self
            .state
            .descriptors
            .class(class)
            .members
            .loaded()
            .cloned()
            .unwrap_or_default())
    }

    /// Bind a foreign-looking name to a class from the compiler's own
    /// source. Returns `false` if the name was already bound.
    pub fn register_native_class(&mut self, fq_name: FqName, class: ClassId) -> bool {
        self.state.native.register(fq_name, class)
    }

    pub fn ensure_package(&mut self, fq_name: &FqName) -> PackageId {
        self.state.descriptors.ensure_package(fq_name, Origin::Native)
    }

    pub fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.state.push_diagnostic(diagnostic);
    }

    // ========================================
    // Cache helpers
    // ========================================

    fn canonical(&self, fq_name: &FqNameUnsafe) -> FqNameUnsafe {
        canonicalize(self.interner, fq_name)
    }

    fn cache_insert(&mut self, name: FqNameUnsafe, class: ClassId) -> Result<(), ResolveError> {
        self.state
            .cache
            .insert(name, class)
            .map_err(|conflict| self.cache_rewrite(&conflict))
    }

    fn cache_insert_negative(&mut self, name: FqNameUnsafe) -> Result<(), ResolveError> {
        self.state
            .cache
            .insert_negative(name)
            .map_err(|conflict| self.cache_rewrite(&conflict))
    }

    fn cache_rewrite(&self, conflict: &CacheConflict) -> ResolveError {
        tracing::error!(
            name = %conflict.name.display(self.interner),
            existing = conflict.describe_existing(),
            "class cache rewrite"
        );
        ResolveError::CacheRewrite {
            name: self.render(&conflict.name),
            existing: conflict.describe_existing(),
        }
    }

    fn render(&self, fq_name: &FqNameUnsafe) -> String {
        fq_name.display(self.interner).to_string()
    }
}
