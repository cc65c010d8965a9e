//! The resolution session.
//!
//! Owns the resolver state for one compilation and serializes every pass
//! over it. A pass runs under the write lock, flushes its postponed tasks
//! on success, and rolls back every write when it fails or panics.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use descry_descriptors::{AnnotationId, ClassId, Members, Origin, PackageId};
use descry_diagnostic::{incompatible_abi_version, Diagnostic};
use descry_ir::{canonicalize, FqName, FqNameUnsafe, SharedInterner, StringInterner};
use parking_lot::{RwLock, RwLockReadGuard};

use crate::cache::CacheLookup;
use crate::config::ResolverConfig;
use crate::postponed::PostponedTasks;
use crate::providers::{
    AbiVersionReport, ClassFinder, CollectingErrorReporter, ErrorReporter,
    ExternalAnnotationStore, MetadataReader, Providers,
};
use crate::raw::{AnnotationOwner, AnnotationOwnerKey, RawAnnotation};
use crate::resolver::annotations::{marker_present, AnnotationProbe};
use crate::resolver::{Resolver, ResolverState, SearchRule};
use crate::ResolveError;

pub struct ResolutionSession {
    interner: SharedInterner,
    config: ResolverConfig,
    providers: Providers,
    state: RwLock<ResolverState>,
}

/// Collaborators and settings, fixed once the session is built.
#[must_use]
pub struct ResolutionSessionBuilder {
    providers: Providers,
    config: ResolverConfig,
    interner: Option<SharedInterner>,
}

impl ResolutionSessionBuilder {
    pub fn with_metadata(mut self, metadata: Arc<dyn MetadataReader>) -> Self {
        self.providers = self.providers.with_metadata(metadata);
        self
    }

    pub fn with_external_annotations(mut self, store: Arc<dyn ExternalAnnotationStore>) -> Self {
        self.providers = self.providers.with_external_annotations(store);
        self
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Share an interner with the caller; names parsed against it can be
    /// passed straight to the session.
    pub fn with_interner(mut self, interner: SharedInterner) -> Self {
        self.interner = Some(interner);
        self
    }

    pub fn build(self) -> ResolutionSession {
        let interner = self.interner.unwrap_or_default();
        let state = ResolverState::new(&interner);
        tracing::debug!(config = ?self.config, "resolution session created");
        ResolutionSession {
            interner,
            config: self.config,
            providers: self.providers,
            state: RwLock::new(state),
        }
    }
}

impl ResolutionSession {
    pub fn builder(class_finder: Arc<dyn ClassFinder>) -> ResolutionSessionBuilder {
        ResolutionSessionBuilder {
            providers: Providers::new(class_finder),
            config: ResolverConfig::default(),
            interner: None,
        }
    }

    // ========================================
    // Accessors
    // ========================================

    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    pub fn shared_interner(&self) -> &SharedInterner {
        &self.interner
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn providers(&self) -> &Providers {
        &self.providers
    }

    /// Shared view of the resolver state. Blocks while a pass is running.
    pub fn read(&self) -> RwLockReadGuard<'_, ResolverState> {
        self.state.read()
    }

    pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
        self.state.write().take_diagnostics()
    }

    /// Cache state of `fq_name` after canonicalization.
    pub fn cached(&self, fq_name: &FqNameUnsafe) -> CacheLookup {
        let canonical = canonicalize(&self.interner, fq_name);
        self.state.read().lookup_cached(&canonical)
    }

    // ========================================
    // Class resolution
    // ========================================

    /// Resolve a foreign class. A native class under this name is a fatal
    /// error.
    pub fn resolve_class(&self, fq_name: &FqName) -> Result<Option<ClassId>, ResolveError> {
        self.resolve_class_with(fq_name, SearchRule::ErrorIfNative)
    }

    /// Resolve under `rule`, turning reported problems into session
    /// diagnostics.
    pub fn resolve_class_with(
        &self,
        fq_name: &FqName,
        rule: SearchRule,
    ) -> Result<Option<ClassId>, ResolveError> {
        let reporter = CollectingErrorReporter::new();
        let result = self.resolve_class_reporting(fq_name, rule, &reporter);
        if result.is_ok() {
            self.push_reports(reporter.take());
        }
        result
    }

    /// Resolve under `rule`, sending reported problems to `reporter`.
    ///
    /// Names already settled are answered under the read lock; only a miss
    /// runs a pass.
    pub fn resolve_class_reporting(
        &self,
        fq_name: &FqName,
        rule: SearchRule,
        reporter: &dyn ErrorReporter,
    ) -> Result<Option<ClassId>, ResolveError> {
        if let Some(settled) = self.state.read().settled_lookup(&self.interner, fq_name) {
            tracing::trace!(class = ?settled, "settled without a pass");
            return Ok(settled);
        }
        self.with_resolver(reporter, |r| r.resolve_class(fq_name, rule))
    }

    /// Resolve into a caller-owned task queue, which the caller performs.
    pub fn resolve_class_in(
        &self,
        fq_name: &FqName,
        rule: SearchRule,
        tasks: &mut PostponedTasks,
    ) -> Result<Option<ClassId>, ResolveError> {
        let reporter = CollectingErrorReporter::new();
        let result = self.run_pass(&reporter, tasks, |r| r.resolve_class(fq_name, rule));
        if result.is_ok() {
            self.push_reports(reporter.take());
        }
        result
    }

    /// Perform tasks collected by [`resolve_class_in`](Self::resolve_class_in).
    pub fn perform(&self, tasks: PostponedTasks) {
        tasks.perform(self.state.write().descriptors_mut());
    }

    pub fn resolve_annotations(
        &self,
        owner: AnnotationOwner<'_>,
    ) -> Result<Vec<AnnotationId>, ResolveError> {
        let reporter = CollectingErrorReporter::new();
        let result = self.with_resolver(&reporter, |r| r.resolve_annotations(owner));
        if result.is_ok() {
            self.push_reports(reporter.take());
        }
        result
    }

    /// Member scope of `class`, loading it on first request.
    pub fn class_members(&self, class: ClassId) -> Result<Members, ResolveError> {
        if let Some(members) = self.state.read().descriptors().class(class).members.loaded() {
            return Ok(members.clone());
        }
        let reporter = CollectingErrorReporter::new();
        let result = self.with_resolver(&reporter, |r| r.class_members(class));
        if result.is_ok() {
            self.push_reports(reporter.take());
        }
        result
    }

    /// A package is known once the class finder confirms it.
    pub fn resolve_package(&self, fq_name: &FqName) -> Option<PackageId> {
        if let Some(package) = self.state.read().descriptors().package_by_name(fq_name) {
            return Some(package);
        }
        if !self.providers.class_finder.package_exists(fq_name) {
            tracing::trace!(package = %fq_name.display(&*self.interner), "no such package");
            return None;
        }
        Some(
            self.state
                .write()
                .descriptors_mut()
                .ensure_package(fq_name, Origin::Foreign),
        )
    }

    // ========================================
    // Annotation probes
    // ========================================

    pub fn has_not_null_annotation(&self, key: &AnnotationOwnerKey, own: &[RawAnnotation]) -> bool {
        self.probe(key, own, AnnotationProbe::NotNull)
    }

    pub fn has_mutable_annotation(&self, key: &AnnotationOwnerKey, own: &[RawAnnotation]) -> bool {
        self.probe(key, own, AnnotationProbe::Mutable)
    }

    pub fn has_readonly_annotation(&self, key: &AnnotationOwnerKey, own: &[RawAnnotation]) -> bool {
        self.probe(key, own, AnnotationProbe::ReadOnly)
    }

    fn probe(&self, key: &AnnotationOwnerKey, own: &[RawAnnotation], probe: AnnotationProbe) -> bool {
        let marker = self.state.read().names().marker(probe).clone();
        marker_present(&self.providers, &self.config, key, own, &marker)
    }

    // ========================================
    // Passes
    // ========================================

    /// Run `pass` with its own task queue, flushed when the pass succeeds.
    pub fn with_resolver<T>(
        &self,
        reporter: &dyn ErrorReporter,
        pass: impl FnOnce(&mut Resolver<'_>) -> Result<T, ResolveError>,
    ) -> Result<T, ResolveError> {
        let mut tasks = PostponedTasks::new();
        let mut state = self.state.write();
        let value = self.run_locked(&mut state, reporter, &mut tasks, pass)?;
        tasks.perform(state.descriptors_mut());
        Ok(value)
    }

    fn run_pass<T>(
        &self,
        reporter: &dyn ErrorReporter,
        tasks: &mut PostponedTasks,
        pass: impl FnOnce(&mut Resolver<'_>) -> Result<T, ResolveError>,
    ) -> Result<T, ResolveError> {
        let mut state = self.state.write();
        self.run_locked(&mut state, reporter, tasks, pass)
    }

    /// Checkpoint, run, and roll back on error or panic.
    fn run_locked<T>(
        &self,
        state: &mut ResolverState,
        reporter: &dyn ErrorReporter,
        tasks: &mut PostponedTasks,
        pass: impl FnOnce(&mut Resolver<'_>) -> Result<T, ResolveError>,
    ) -> Result<T, ResolveError> {
        let checkpoint = state.checkpoint();
        let queued = tasks.len();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut resolver = Resolver::new(
                &mut *state,
                &self.providers,
                &self.interner,
                &self.config,
                reporter,
                &mut *tasks,
            );
            pass(&mut resolver)
        }));
        match outcome {
            Ok(Ok(value)) => {
                state.commit();
                Ok(value)
            }
            Ok(Err(err)) => {
                tracing::debug!(error = %err, "resolution pass failed, rolling back");
                state.rollback(checkpoint);
                tasks.truncate(queued);
                Err(err)
            }
            Err(payload) => {
                state.rollback(checkpoint);
                tasks.truncate(queued);
                panic::resume_unwind(payload)
            }
        }
    }

    fn push_reports(&self, reports: Vec<AbiVersionReport>) {
        if reports.is_empty() {
            return;
        }
        let mut state = self.state.write();
        for report in reports {
            let class = report.class.display(&*self.interner).to_string();
            state.push_diagnostic(incompatible_abi_version(&class, report.actual, report.expected));
        }
    }
}

impl std::fmt::Debug for ResolutionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionSession")
            .field("config", &self.config)
            .field("providers", &self.providers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
