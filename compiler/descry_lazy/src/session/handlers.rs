//! One handler per granule kind.

use std::cell::RefCell;

use descry_descriptors::{AnnotationDescriptor, BuiltIns, ClassId, Origin, Type};
use descry_diagnostic::{Diagnostic, ErrorCode};
use descry_ir::FqName;
use descry_resolve::{ResolveError, Resolver, SearchRule};

use super::{LazyResolveSession, LazyState, SourceFile};
use crate::declarations::{complete_function, complete_property, complete_type_parameters};
use crate::granule::Granule;
use crate::syntax::{ElementId, NodeId, NodeKind};
use crate::trace::{Declaration, DelegatingTrace, ReferenceTarget};
use crate::types::{resolve_classifier, resolve_type_reference, Classifier, FileCx};

impl LazyResolveSession {
    pub(super) fn run_granule(
        &self,
        state: &RefCell<LazyState>,
        source: &SourceFile,
        key: ElementId,
        granule: Granule,
        trace: &mut DelegatingTrace,
    ) -> Result<(), ResolveError> {
        let cx = source.cx(key.file);
        let node = key.node;
        match granule {
            Granule::Function => self.resolve_function(state, cx, node, trace),
            Granule::ClassInitializer => {
                self.resolve_class_initializer(cx, node, trace);
                Ok(())
            }
            Granule::Property => self.resolve_property(state, cx, node, trace),
            Granule::DelegationSpecifierList => self.resolve_delegation_list(cx, node, trace),
            Granule::Import => self.resolve_import(cx, node, trace),
            Granule::AnnotationEntry => self.resolve_annotation_entry(cx, node, trace),
            Granule::TypeParameter | Granule::TypeConstraint => {
                self.resolve_type_parameter_owner(cx, node, trace)
            }
            Granule::PackageHeader => {
                self.resolve_package_header(cx, node, trace);
                Ok(())
            }
        }
    }

    fn resolve_function(
        &self,
        state: &RefCell<LazyState>,
        cx: FileCx<'_>,
        node: NodeId,
        trace: &mut DelegatingTrace,
    ) -> Result<(), ResolveError> {
        let Some(Declaration::Function(function)) = trace.declaration(cx.element(node)) else {
            return Ok(());
        };
        self.complete(state, cx.element(node), trace, |r, t| {
            complete_function(r, cx, node, function, t)
        })?;

        let has_body = cx
            .tree
            .children(node)
            .iter()
            .any(|&child| cx.tree.kind(child).is_body());
        if has_body && !state.borrow().resolved_bodies.contains(&function) {
            self.body
                .resolve_function_body(self.scope(cx, node), function, trace);
            state.borrow_mut().resolved_bodies.insert(function);
        }
        Ok(())
    }

    fn resolve_class_initializer(&self, cx: FileCx<'_>, node: NodeId, trace: &mut DelegatingTrace) {
        let Some((owner, class)) = declared_class_above(cx, node, trace) else {
            return;
        };
        self.body
            .resolve_anonymous_initializers(self.scope(cx, owner), class, trace);
    }

    fn resolve_property(
        &self,
        state: &RefCell<LazyState>,
        cx: FileCx<'_>,
        node: NodeId,
        trace: &mut DelegatingTrace,
    ) -> Result<(), ResolveError> {
        let Some(Declaration::Property(property)) = trace.declaration(cx.element(node)) else {
            return Ok(());
        };
        self.complete(state, cx.element(node), trace, |r, t| {
            complete_property(r, cx, node, property, t)
        })?;

        let scope = self.scope(cx, node);
        if cx.tree.child_of_kind(node, NodeKind::Expression).is_some() {
            self.body.resolve_property_initializer(scope, property, trace);
        }
        if cx.tree.child_of_kind(node, NodeKind::PropertyDelegate).is_some() {
            self.body.resolve_property_delegate(scope, property, trace);
        }
        if cx.tree.child_of_kind(node, NodeKind::PropertyAccessor).is_some() {
            self.body.resolve_property_accessors(scope, property, trace);
        }
        Ok(())
    }

    /// Supertypes of the owning class, then a check of the foreign members
    /// it inherits.
    fn resolve_delegation_list(
        &self,
        cx: FileCx<'_>,
        node: NodeId,
        trace: &mut DelegatingTrace,
    ) -> Result<(), ResolveError> {
        let Some((owner, class)) = declared_class_above(cx, node, trace) else {
            return Ok(());
        };
        let inherited = self.run_pass(trace, |r, t| {
            complete_type_parameters(r, cx, owner, t)?;
            resolve_supertypes(r, cx, node, class, t)
        })?;

        for superclass in inherited {
            let members = self.resolution.class_members(superclass)?;
            let problems: Vec<String> = {
                let state = self.resolution.read();
                members
                    .functions
                    .iter()
                    .flat_map(|&function| state.descriptors().function(function).signature_errors.clone())
                    .collect()
            };
            for problem in problems {
                trace.report(
                    Diagnostic::error(ErrorCode::E2005)
                        .with_message(problem)
                        .with_label(cx.tree.node(node).span, "inherited here")
                        .with_file(cx.file_name()),
                );
            }
        }

        self.body
            .resolve_delegation_specifier_list(self.scope(cx, owner), class, trace);
        Ok(())
    }

    fn resolve_import(
        &self,
        cx: FileCx<'_>,
        node: NodeId,
        trace: &mut DelegatingTrace,
    ) -> Result<(), ResolveError> {
        let element = cx.element(node);
        let Some(path) = cx.tree.node(node).path.clone() else {
            return Ok(());
        };
        let class = self.run_pass(trace, |r, _| r.resolve_class(&path, SearchRule::IncludeNative))?;
        if let Some(class) = class {
            trace.record_reference(element, ReferenceTarget::Class(class));
        } else if let Some(package) = self.resolution.resolve_package(&path) {
            trace.record_reference(element, ReferenceTarget::Package(package));
        } else {
            let rendered = self.render(&path);
            trace.report(
                Diagnostic::error(ErrorCode::E2002)
                    .with_message(format!("unresolved import `{rendered}`"))
                    .with_label(cx.tree.node(node).span, "no class or package with this name")
                    .with_file(cx.file_name()),
            );
        }
        Ok(())
    }

    /// Resolve the annotation class and attach an annotation to the
    /// declaration the entry sits on. Arguments are left to the body
    /// resolver.
    fn resolve_annotation_entry(
        &self,
        cx: FileCx<'_>,
        node: NodeId,
        trace: &mut DelegatingTrace,
    ) -> Result<(), ResolveError> {
        let element = cx.element(node);
        let Some(path) = cx.tree.node(node).path.clone() else {
            return Ok(());
        };
        let owner = cx
            .tree
            .parent(node)
            .and_then(|parent| trace.declaration(cx.element(parent)));

        let classifier = self.run_pass(trace, |r, t| resolve_classifier(r, cx, node, &path, t))?;
        let Some(Classifier::Class(class)) = classifier else {
            let rendered = self.render(&path);
            trace.report(
                Diagnostic::warning(ErrorCode::W2001)
                    .with_message(format!("annotation class `{rendered}` cannot be resolved"))
                    .with_label(cx.tree.node(node).span, "annotation ignored")
                    .with_file(cx.file_name()),
            );
            return Ok(());
        };
        trace.record_reference(element, ReferenceTarget::Class(class));

        self.run_pass(trace, |r, _| {
            let descriptors = r.descriptors_mut();
            let annotation = descriptors.alloc_annotation(AnnotationDescriptor {
                annotation_type: Some(Type::class(class)),
                arguments: Vec::new(),
            });
            match owner {
                Some(Declaration::Class(owner)) => {
                    descriptors.class_mut(owner).annotations.push(annotation);
                }
                Some(Declaration::Function(owner)) => {
                    descriptors.function_mut(owner).annotations.push(annotation);
                }
                Some(Declaration::Property(owner)) => {
                    descriptors.property_mut(owner).annotations.push(annotation);
                }
                _ => {}
            }
            Ok(())
        })
    }

    /// Bounds of every type parameter on the owner. A `where` constraint
    /// also records which parameter it constrains.
    fn resolve_type_parameter_owner(
        &self,
        cx: FileCx<'_>,
        node: NodeId,
        trace: &mut DelegatingTrace,
    ) -> Result<(), ResolveError> {
        let Some(owner) = cx.tree.parent(node) else {
            return Ok(());
        };
        self.run_pass(trace, |r, t| complete_type_parameters(r, cx, owner, t))?;

        if cx.tree.kind(node) == NodeKind::TypeConstraint {
            let name = cx.tree.node(node).name;
            let constrained = cx
                .tree
                .children_of_kind(owner, NodeKind::TypeParameter)
                .filter(|&parameter| name.is_some() && cx.tree.node(parameter).name == name)
                .find_map(|parameter| match trace.declaration(cx.element(parameter)) {
                    Some(Declaration::TypeParameter(id)) => Some(id),
                    _ => None,
                });
            if let Some(parameter) = constrained {
                trace.record_reference(cx.element(node), ReferenceTarget::TypeParameter(parameter));
            }
        }
        Ok(())
    }

    /// Record the package of the header and of each qualifier prefix.
    fn resolve_package_header(&self, cx: FileCx<'_>, node: NodeId, trace: &mut DelegatingTrace) {
        let Some(path) = cx.tree.node(node).path.clone() else {
            return;
        };
        match self.resolution.resolve_package(&path) {
            Some(package) => trace.record_reference(cx.element(node), ReferenceTarget::Package(package)),
            None => {
                let rendered = self.render(&path);
                trace.report(
                    Diagnostic::error(ErrorCode::E2004)
                        .with_message(format!("package `{rendered}` cannot be found"))
                        .with_label(cx.tree.node(node).span, "unknown package")
                        .with_file(cx.file_name()),
                );
                return;
            }
        }

        let qualifiers: Vec<NodeId> = cx
            .tree
            .children_of_kind(node, NodeKind::NameReference)
            .collect();
        for (len, qualifier) in (1..=path.len()).zip(qualifiers) {
            if let Some(package) = self.resolution.resolve_package(&path.prefix(len)) {
                trace.record_reference(cx.element(qualifier), ReferenceTarget::Package(package));
            }
        }
    }

    fn render(&self, path: &FqName) -> String {
        path.display(self.resolution.interner()).to_string()
    }
}

fn declared_class_above(
    cx: FileCx<'_>,
    node: NodeId,
    trace: &DelegatingTrace,
) -> Option<(NodeId, ClassId)> {
    let owner = cx.tree.parent(node)?;
    let class = trace.declaration(cx.element(owner))?.class()?;
    Some((owner, class))
}

/// Set the supertypes of `class` from its delegation specifiers. Returns
/// the superclasses whose members come from outside the compiler.
fn resolve_supertypes(
    r: &mut Resolver<'_>,
    cx: FileCx<'_>,
    list: NodeId,
    class: ClassId,
    trace: &mut DelegatingTrace,
) -> Result<Vec<ClassId>, ResolveError> {
    let references: Vec<NodeId> = cx
        .tree
        .children_of_kind(list, NodeKind::DelegationSpecifier)
        .filter_map(|specifier| cx.tree.child_of_kind(specifier, NodeKind::TypeReference))
        .collect();

    // An unresolved specifier keeps its slot as an error type.
    let mut supertypes = Vec::with_capacity(references.len());
    for reference in references {
        supertypes.push(resolve_type_reference(r, cx, reference, trace)?);
    }
    if supertypes.is_empty() {
        supertypes.push(BuiltIns::any_type());
    }

    let descriptors = r.descriptors();
    let inherited: Vec<ClassId> = supertypes
        .iter()
        .filter_map(Type::class_id)
        .filter(|&superclass| {
            matches!(
                descriptors.class(superclass).origin,
                Origin::Foreign | Origin::Compiled
            )
        })
        .collect();
    tracing::trace!(class = class.raw(), supertypes = supertypes.len(), "supertypes resolved");
    r.descriptors_mut().class_mut(class).supertypes = supertypes;
    Ok(inherited)
}
