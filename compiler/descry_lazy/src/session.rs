//! The lazy resolution session.
//!
//! Answers "resolve this syntax element" by running the handler of the
//! element's granule once and caching the resulting context.
//!
//! # Locking
//!
//! Granule handlers are serialized by the session's own lock, taken before
//! any pass over the resolver state. The lock is re-entrant so a handler
//! that asks for a granule already being resolved gets the session context
//! back instead of deadlocking.
//!
//! # Granule states
//!
//! ```text
//! Unvisited ──> Resolving ──> Resolved
//!                   │    └──> ResolvedWithDiagnostic
//!                   └───────> Unvisited   (fatal error or panic)
//! ```

use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use descry_descriptors::{ClassId, FunctionId};
use descry_diagnostic::incompatible_abi_version;
use descry_ir::FqName;
use descry_resolve::{
    CollectingErrorReporter, ResolutionSession, ResolveError, Resolver, SilentErrorReporter,
};
use parking_lot::ReentrantMutex;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::body::{BodyResolver, BodyScope, DeclarationsOnly};
use crate::cancel::CancellationFlag;
use crate::declarations::{
    complete_function, complete_property, complete_type_parameters, declare_file,
};
use crate::granule::find_granule;
use crate::syntax::{ElementId, FileId, NodeId, SyntaxTree};
use crate::trace::{BindingContext, Declaration, DelegatingTrace};
use crate::types::FileCx;

mod handlers;
mod lookup;

/// Where a granule is in its lifecycle.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum GranuleStatus {
    Unvisited,
    Resolving,
    Resolved,
    /// Resolved, and the handler reported at least one error.
    ResolvedWithDiagnostic,
}

enum GranuleState {
    Resolving,
    Resolved(Arc<BindingContext>),
    ResolvedWithDiagnostic(Arc<BindingContext>),
}

#[derive(Clone)]
struct SourceFile {
    tree: Arc<SyntaxTree>,
    package: FqName,
}

impl SourceFile {
    fn cx(&self, file: FileId) -> FileCx<'_> {
        FileCx {
            tree: &self.tree,
            file,
            package: &self.package,
        }
    }
}

#[derive(Default)]
struct LazyState {
    files: Vec<SourceFile>,
    /// Facts shared by every request: declarations and completed signatures.
    context: Arc<BindingContext>,
    granules: FxHashMap<ElementId, GranuleState>,
    /// Declarations whose signatures are resolved.
    completed: FxHashSet<ElementId>,
    resolved_bodies: FxHashSet<FunctionId>,
    /// Native classes declared directly in each package.
    package_classes: FxHashMap<FqName, Vec<ClassId>>,
}

pub struct LazyResolveSession {
    resolution: Arc<ResolutionSession>,
    body: Arc<dyn BodyResolver>,
    cancellation: CancellationFlag,
    state: ReentrantMutex<RefCell<LazyState>>,
}

impl LazyResolveSession {
    pub fn new(resolution: Arc<ResolutionSession>) -> Self {
        LazyResolveSession {
            resolution,
            body: Arc::new(DeclarationsOnly),
            cancellation: CancellationFlag::new(),
            state: ReentrantMutex::new(RefCell::new(LazyState::default())),
        }
    }

    #[must_use]
    pub fn with_body_resolver(mut self, body: Arc<dyn BodyResolver>) -> Self {
        self.body = body;
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, cancellation: CancellationFlag) -> Self {
        self.cancellation = cancellation;
        self
    }

    // ========================================
    // Accessors
    // ========================================

    pub fn resolution(&self) -> &ResolutionSession {
        &self.resolution
    }

    pub fn cancellation(&self) -> &CancellationFlag {
        &self.cancellation
    }

    /// Session-wide facts as of now.
    pub fn context(&self) -> Arc<BindingContext> {
        self.state.lock().borrow().context.clone()
    }

    pub fn tree(&self, file: FileId) -> Option<Arc<SyntaxTree>> {
        let guard = self.state.lock();
        let state = guard.borrow();
        state.files.get(file.index()).map(|source| source.tree.clone())
    }

    pub fn granule_status(&self, element: ElementId) -> GranuleStatus {
        let guard = self.state.lock();
        let state = guard.borrow();
        let Some(source) = state.files.get(element.file.index()) else {
            return GranuleStatus::Unvisited;
        };
        if !source.tree.contains(element.node) {
            return GranuleStatus::Unvisited;
        }
        let Some((node, _)) = find_granule(&source.tree, element.node) else {
            return GranuleStatus::Unvisited;
        };
        match state.granules.get(&ElementId::new(element.file, node)) {
            None => GranuleStatus::Unvisited,
            Some(GranuleState::Resolving) => GranuleStatus::Resolving,
            Some(GranuleState::Resolved(_)) => GranuleStatus::Resolved,
            Some(GranuleState::ResolvedWithDiagnostic(_)) => GranuleStatus::ResolvedWithDiagnostic,
        }
    }

    // ========================================
    // Files
    // ========================================

    /// Register a file and declare everything it declares.
    ///
    /// # Panics
    ///
    /// Panics if the session already holds `u32::MAX` files.
    #[tracing::instrument(level = "debug", skip_all, fields(file = tree.file_name()))]
    pub fn add_file(&self, tree: SyntaxTree) -> Result<FileId, ResolveError> {
        let guard = self.state.lock();
        let file = FileId::new(
            u32::try_from(guard.borrow().files.len())
                .unwrap_or_else(|_| panic!("lazy session exceeded u32::MAX files")),
        );
        let source = SourceFile {
            package: tree.package(),
            tree: Arc::new(tree),
        };
        let cx = source.cx(file);
        let declared = self
            .resolution
            .with_resolver(&SilentErrorReporter, |r| declare_file(r, cx))?;

        let mut state = guard.borrow_mut();
        let context = Arc::make_mut(&mut state.context);
        for (node, declaration) in declared.declarations {
            context.record_declaration(ElementId::new(file, node), declaration);
        }
        state
            .package_classes
            .entry(source.package.clone())
            .or_default()
            .extend(declared.top_level);
        state.files.push(source);
        Ok(file)
    }

    // ========================================
    // Resolution
    // ========================================

    /// Resolve the granule around `element` and return what it recorded.
    ///
    /// Outside every granule, only the enclosing declaration is resolved
    /// and the session context is returned.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(file = element.file.index(), node = element.node.raw())
    )]
    pub fn resolve_to_element(&self, element: ElementId) -> Result<Arc<BindingContext>, ResolveError> {
        let guard = self.state.lock();
        let state: &RefCell<LazyState> = &guard;
        let source = source_of(state, element)?;

        let Some((node, granule)) = find_granule(&source.tree, element.node) else {
            self.resolve_declaration(state, &source, element)?;
            return Ok(state.borrow().context.clone());
        };
        let key = ElementId::new(element.file, node);
        {
            let current = state.borrow();
            match current.granules.get(&key) {
                Some(GranuleState::Resolved(context) | GranuleState::ResolvedWithDiagnostic(context)) => {
                    tracing::trace!(?granule, "granule already resolved");
                    return Ok(context.clone());
                }
                Some(GranuleState::Resolving) => {
                    tracing::debug!(?granule, "granule is being resolved, returning session context");
                    return Ok(current.context.clone());
                }
                None => {}
            }
        }

        self.cancellation.check()?;
        let parent = {
            let mut current = state.borrow_mut();
            current.granules.insert(key, GranuleState::Resolving);
            current.context.clone()
        };
        let mut trace = DelegatingTrace::new(parent, "trace to resolve element");
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.run_granule(state, &source, key, granule, &mut trace)
        }));

        match outcome {
            Ok(Ok(())) => {
                let context = Arc::new(trace.into_context());
                let entry = if context.has_errors() {
                    GranuleState::ResolvedWithDiagnostic(context.clone())
                } else {
                    GranuleState::Resolved(context.clone())
                };
                state.borrow_mut().granules.insert(key, entry);
                tracing::debug!(?granule, diagnostics = context.diagnostics().len(), "granule resolved");
                Ok(context)
            }
            Ok(Err(err)) => {
                state.borrow_mut().granules.remove(&key);
                Err(err)
            }
            Err(payload) => {
                state.borrow_mut().granules.remove(&key);
                panic::resume_unwind(payload)
            }
        }
    }

    /// Descriptor of the declaration enclosing `element`, with its
    /// signature resolved. `None` for locals and file-level syntax.
    pub fn resolve_to_descriptor(&self, element: ElementId) -> Result<Option<Declaration>, ResolveError> {
        let guard = self.state.lock();
        let state: &RefCell<LazyState> = &guard;
        let source = source_of(state, element)?;
        self.resolve_declaration(state, &source, element)
    }

    /// Classes a dotted name may refer to, reading every package prefix of
    /// `fq_name` as a package and the rest as a class path.
    ///
    /// Matches are collected from the most specific package down to the
    /// root, so an ambiguous name yields every candidate.
    pub fn class_descriptors_by_fq_name(
        &self,
        fq_name: &FqName,
        include_objects: bool,
    ) -> Result<Vec<ClassId>, ResolveError> {
        let guard = self.state.lock();
        lookup::class_descriptors_by_fq_name(self, &guard, fq_name, include_objects)
    }

    // ========================================
    // Internals
    // ========================================

    fn resolve_declaration(
        &self,
        state: &RefCell<LazyState>,
        source: &SourceFile,
        element: ElementId,
    ) -> Result<Option<Declaration>, ResolveError> {
        let cx = source.cx(element.file);
        let parent = state.borrow().context.clone();
        let Some((node, declaration)) = declared_owner(cx, element.node, &parent) else {
            return Ok(None);
        };
        let target = cx.element(node);
        let mut trace = DelegatingTrace::new(parent, "trace to resolve declaration");
        match declaration {
            Declaration::Function(function) => self.complete(state, target, &mut trace, |r, t| {
                complete_function(r, cx, node, function, t)
            })?,
            Declaration::Property(property) => self.complete(state, target, &mut trace, |r, t| {
                complete_property(r, cx, node, property, t)
            })?,
            Declaration::TypeParameter(_) => {
                if let Some(owner) = cx.tree.parent(node) {
                    self.run_pass(&mut trace, |r, t| complete_type_parameters(r, cx, owner, t))?;
                }
            }
            Declaration::Class(_) => {
                self.run_pass(&mut trace, |r, t| complete_type_parameters(r, cx, node, t))?;
            }
            Declaration::Package(_) => {}
        }

        let facts = trace.into_context();
        if !facts.is_empty() {
            Arc::make_mut(&mut state.borrow_mut().context).merge(&facts);
        }
        Ok(Some(declaration))
    }

    /// Run `pass` once per declaration.
    fn complete(
        &self,
        state: &RefCell<LazyState>,
        declaration: ElementId,
        trace: &mut DelegatingTrace,
        pass: impl FnOnce(&mut Resolver<'_>, &mut DelegatingTrace) -> Result<(), ResolveError>,
    ) -> Result<(), ResolveError> {
        if state.borrow().completed.contains(&declaration) {
            return Ok(());
        }
        self.run_pass(trace, pass)?;
        state.borrow_mut().completed.insert(declaration);
        Ok(())
    }

    /// One resolver pass writing into `trace`. Incompatible binaries met on
    /// the way are reported there too.
    fn run_pass<T>(
        &self,
        trace: &mut DelegatingTrace,
        pass: impl FnOnce(&mut Resolver<'_>, &mut DelegatingTrace) -> Result<T, ResolveError>,
    ) -> Result<T, ResolveError> {
        let reporter = CollectingErrorReporter::new();
        let value = self.resolution.with_resolver(&reporter, |r| pass(r, &mut *trace))?;
        for report in reporter.take() {
            let class = report.class.display(self.resolution.interner()).to_string();
            trace.report(incompatible_abi_version(&class, report.actual, report.expected));
        }
        Ok(value)
    }

    fn scope<'a>(&'a self, cx: FileCx<'a>, node: NodeId) -> BodyScope<'a> {
        BodyScope {
            session: &self.resolution,
            tree: cx.tree,
            element: cx.element(node),
        }
    }
}

impl std::fmt::Debug for LazyResolveSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = self.state.lock();
        let state = guard.borrow();
        f.debug_struct("LazyResolveSession")
            .field("files", &state.files.len())
            .field("granules", &state.granules.len())
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish_non_exhaustive()
    }
}

fn source_of(state: &RefCell<LazyState>, element: ElementId) -> Result<SourceFile, ResolveError> {
    state
        .borrow()
        .files
        .get(element.file.index())
        .filter(|source| source.tree.contains(element.node))
        .cloned()
        .ok_or_else(|| ResolveError::UnknownElement {
            element: format!("{element:?}"),
        })
}

/// Nearest enclosing declaration that has a descriptor.
fn declared_owner(
    cx: FileCx<'_>,
    node: NodeId,
    context: &BindingContext,
) -> Option<(NodeId, Declaration)> {
    cx.tree
        .ancestors(node)
        .filter(|&ancestor| cx.tree.kind(ancestor).is_declaration())
        .find_map(|ancestor| {
            context
                .declaration(cx.element(ancestor))
                .map(|declaration| (ancestor, declaration))
        })
}
