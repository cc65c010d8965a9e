//! Written type references to resolved types.
//!
//! A single-segment name is looked up, in order, among the type parameters
//! of enclosing declarations, the classes nested in enclosing classes, the
//! file's explicit imports, the file's own package and finally the
//! built-in `lang` package. Qualified names are tried as written, then
//! relative to the file's package.

use descry_descriptors::{BuiltIns, ClassId, Type, TypeParamId, TypeProjection};
use descry_diagnostic::{Diagnostic, ErrorCode};
use descry_ir::{FqName, Name};
use descry_resolve::{ResolveError, Resolver, SearchRule};

use crate::syntax::{ElementId, FileId, NodeId, NodeKind, SyntaxTree};
use crate::trace::{Declaration, DelegatingTrace, ReferenceTarget};

/// The file a reference is resolved in.
#[derive(Clone, Copy)]
pub(crate) struct FileCx<'a> {
    pub tree: &'a SyntaxTree,
    pub file: FileId,
    pub package: &'a FqName,
}

impl FileCx<'_> {
    pub fn element(&self, node: NodeId) -> ElementId {
        ElementId::new(self.file, node)
    }

    pub fn file_name(&self) -> &str {
        self.tree.file_name()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Classifier {
    Class(ClassId),
    TypeParameter(TypeParamId),
}

/// Resolve the type reference at `node`, recording its type and target.
///
/// An unresolved name is reported and becomes an error type, so the
/// declaration using it still gets a descriptor.
pub(crate) fn resolve_type_reference(
    r: &mut Resolver<'_>,
    cx: FileCx<'_>,
    node: NodeId,
    trace: &mut DelegatingTrace,
) -> Result<Type, ResolveError> {
    let element = cx.element(node);
    if let Some(ty) = trace.type_of(element) {
        return Ok(ty.clone());
    }
    let syntax = cx.tree.node(node);
    let Some(path) = syntax.path.as_ref() else {
        return Ok(Type::error("type reference without a name"));
    };

    let ty = match resolve_classifier(r, cx, node, path, trace)? {
        Some(Classifier::TypeParameter(parameter)) => {
            trace.record_reference(element, ReferenceTarget::TypeParameter(parameter));
            Type::parameter(parameter)
        }
        Some(Classifier::Class(class)) => {
            trace.record_reference(element, ReferenceTarget::Class(class));
            let mut arguments = Vec::new();
            for argument in cx.tree.children_of_kind(node, NodeKind::TypeReference) {
                let ty = resolve_type_reference(r, cx, argument, trace)?;
                arguments.push(TypeProjection::invariant(ty));
            }
            Type::generic(class, arguments)
        }
        None => {
            let rendered = path.display(r.interner()).to_string();
            trace.report(unresolved_reference(cx, node, &rendered));
            Type::error(format!("unresolved type `{rendered}`"))
        }
    };
    let ty = ty.with_nullability(syntax.nullable);
    trace.record_type(element, ty.clone());
    Ok(ty)
}

pub(crate) fn unresolved_reference(cx: FileCx<'_>, node: NodeId, rendered: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::E2001)
        .with_message(format!("unresolved reference `{rendered}`"))
        .with_label(cx.tree.node(node).span, "not found in scope")
        .with_file(cx.file_name())
}

/// Find the classifier `path` names when written at `from`.
pub(crate) fn resolve_classifier(
    r: &mut Resolver<'_>,
    cx: FileCx<'_>,
    from: NodeId,
    path: &FqName,
    trace: &DelegatingTrace,
) -> Result<Option<Classifier>, ResolveError> {
    let Some(first) = path.segments().first().copied() else {
        return Ok(None);
    };
    if path.len() == 1 {
        if let Some(parameter) = type_parameter_in_scope(cx, from, first, trace) {
            return Ok(Some(Classifier::TypeParameter(parameter)));
        }
        if let Some(class) = nested_in_scope(r, cx, from, first, trace) {
            return Ok(Some(Classifier::Class(class)));
        }
    }

    for candidate in candidates(r, cx, path) {
        if let Some(class) = r.resolve_class(&candidate, SearchRule::IncludeNative)? {
            return Ok(Some(Classifier::Class(class)));
        }
    }
    Ok(None)
}

/// Qualified names `path` may stand for, most specific first.
fn candidates(r: &Resolver<'_>, cx: FileCx<'_>, path: &FqName) -> Vec<FqName> {
    let segments = path.segments();
    let mut out = Vec::with_capacity(3);

    if let Some(import) = import_named(cx, segments[0]) {
        out.push(append(import, &segments[1..]));
    }
    if path.len() > 1 {
        out.push(path.clone());
    }
    out.push(append(cx.package.clone(), segments));
    if path.len() == 1 {
        let lang = r.interner().intern(BuiltIns::ROOT_PACKAGE);
        out.push(FqName::root().child(lang).child(segments[0]));
    }
    out
}

fn append(mut base: FqName, segments: &[Name]) -> FqName {
    for &segment in segments {
        base = base.child(segment);
    }
    base
}

fn import_named(cx: FileCx<'_>, name: Name) -> Option<FqName> {
    cx.tree
        .children_of_kind(cx.tree.root(), NodeKind::Import)
        .filter_map(|import| cx.tree.node(import).path.clone())
        .find(|path| path.short_name() == Some(name))
}

fn type_parameter_in_scope(
    cx: FileCx<'_>,
    from: NodeId,
    name: Name,
    trace: &DelegatingTrace,
) -> Option<TypeParamId> {
    cx.tree
        .ancestors(from)
        .filter(|&node| matches!(cx.tree.kind(node), NodeKind::Function) || cx.tree.kind(node).is_class_like())
        .flat_map(move |owner| cx.tree.children_of_kind(owner, NodeKind::TypeParameter))
        .filter(|&param| cx.tree.node(param).name == Some(name))
        .find_map(|param| match trace.declaration(cx.element(param)) {
            Some(Declaration::TypeParameter(id)) => Some(id),
            _ => None,
        })
}

fn nested_in_scope(
    r: &Resolver<'_>,
    cx: FileCx<'_>,
    from: NodeId,
    name: Name,
    trace: &DelegatingTrace,
) -> Option<ClassId> {
    cx.tree
        .ancestors(from)
        .filter(|&node| cx.tree.kind(node).is_class_like())
        .filter_map(|node| trace.declaration(cx.element(node)).and_then(Declaration::class))
        .find_map(|class| r.descriptors().nested_by_name(class, name))
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
