//! Binding traces: fact tables recorded while resolving syntax.
//!
//! A [`BindingContext`] maps syntax elements to what they declare, what
//! they refer to and what type they denote, and keeps the diagnostics
//! produced while recording them. Contexts form a chain: a request's
//! context sees every fact of the session context it was created from.
//!
//! A [`DelegatingTrace`] is the writer. Each resolution request gets a
//! fresh one over the session context; when the request finishes the
//! trace is frozen into a context that callers can share.

use std::sync::Arc;

use descry_descriptors::{ClassId, FunctionId, PackageId, PropertyId, Type, TypeParamId};
use descry_diagnostic::Diagnostic;
use rustc_hash::FxHashMap;

use crate::syntax::ElementId;

/// What a declaration node introduces.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Declaration {
    Class(ClassId),
    Function(FunctionId),
    Property(PropertyId),
    TypeParameter(TypeParamId),
    Package(PackageId),
}

impl Declaration {
    pub fn class(self) -> Option<ClassId> {
        match self {
            Declaration::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn function(self) -> Option<FunctionId> {
        match self {
            Declaration::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn property(self) -> Option<PropertyId> {
        match self {
            Declaration::Property(property) => Some(property),
            _ => None,
        }
    }
}

/// What a reference node resolved to.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ReferenceTarget {
    Class(ClassId),
    Package(PackageId),
    TypeParameter(TypeParamId),
}

#[derive(Clone, Default, Debug)]
pub struct BindingContext {
    parent: Option<Arc<BindingContext>>,
    declarations: FxHashMap<ElementId, Declaration>,
    references: FxHashMap<ElementId, ReferenceTarget>,
    types: FxHashMap<ElementId, Type>,
    diagnostics: Vec<Diagnostic>,
}

impl BindingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty context over `parent`.
    pub fn with_parent(parent: Arc<BindingContext>) -> Self {
        BindingContext {
            parent: Some(parent),
            ..Self::default()
        }
    }

    // ========================================
    // Queries
    // ========================================

    pub fn declaration(&self, element: ElementId) -> Option<Declaration> {
        self.find(|cx| cx.declarations.get(&element).copied())
    }

    pub fn reference(&self, element: ElementId) -> Option<ReferenceTarget> {
        self.find(|cx| cx.references.get(&element).copied())
    }

    pub fn type_of(&self, element: ElementId) -> Option<&Type> {
        let mut cx = Some(self);
        while let Some(current) = cx {
            if let Some(ty) = current.types.get(&element) {
                return Some(ty);
            }
            cx = current.parent.as_deref();
        }
        None
    }

    /// Diagnostics recorded in this context, not its parents.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Whether this context recorded nothing of its own.
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
            && self.references.is_empty()
            && self.types.is_empty()
            && self.diagnostics.is_empty()
    }

    pub fn parent(&self) -> Option<&Arc<BindingContext>> {
        self.parent.as_ref()
    }

    fn find<T>(&self, probe: impl Fn(&BindingContext) -> Option<T>) -> Option<T> {
        let mut cx = Some(self);
        while let Some(current) = cx {
            if let Some(found) = probe(current) {
                return Some(found);
            }
            cx = current.parent.as_deref();
        }
        None
    }

    // ========================================
    // Recording
    // ========================================

    pub fn record_declaration(&mut self, element: ElementId, declaration: Declaration) {
        self.declarations.insert(element, declaration);
    }

    pub fn record_reference(&mut self, element: ElementId, target: ReferenceTarget) {
        self.references.insert(element, target);
    }

    pub fn record_type(&mut self, element: ElementId, ty: Type) {
        self.types.insert(element, ty);
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Copy the facts `other` recorded itself. Existing facts win.
    pub fn merge(&mut self, other: &BindingContext) {
        for (&element, &declaration) in &other.declarations {
            self.declarations.entry(element).or_insert(declaration);
        }
        for (&element, &target) in &other.references {
            self.references.entry(element).or_insert(target);
        }
        for (&element, ty) in &other.types {
            self.types.entry(element).or_insert_with(|| ty.clone());
        }
        self.diagnostics.extend(other.diagnostics.iter().cloned());
    }
}

/// Writer for one resolution request.
///
/// Reads fall through to the context the trace delegates to; writes stay
/// in the trace until [`into_context`](Self::into_context).
#[derive(Debug)]
pub struct DelegatingTrace {
    context: BindingContext,
    debug_name: &'static str,
}

impl DelegatingTrace {
    pub fn new(parent: Arc<BindingContext>, debug_name: &'static str) -> Self {
        DelegatingTrace {
            context: BindingContext::with_parent(parent),
            debug_name,
        }
    }

    pub fn debug_name(&self) -> &'static str {
        self.debug_name
    }

    /// Facts visible through this trace, own and delegated.
    pub fn context(&self) -> &BindingContext {
        &self.context
    }

    pub fn declaration(&self, element: ElementId) -> Option<Declaration> {
        self.context.declaration(element)
    }

    pub fn reference(&self, element: ElementId) -> Option<ReferenceTarget> {
        self.context.reference(element)
    }

    pub fn type_of(&self, element: ElementId) -> Option<&Type> {
        self.context.type_of(element)
    }

    pub fn record_declaration(&mut self, element: ElementId, declaration: Declaration) {
        self.context.record_declaration(element, declaration);
    }

    pub fn record_reference(&mut self, element: ElementId, target: ReferenceTarget) {
        self.context.record_reference(element, target);
    }

    pub fn record_type(&mut self, element: ElementId, ty: Type) {
        self.context.record_type(element, ty);
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        tracing::trace!(trace = self.debug_name, code = %diagnostic.code, "diagnostic recorded");
        self.context.report(diagnostic);
    }

    pub fn into_context(self) -> BindingContext {
        self.context
    }
}
