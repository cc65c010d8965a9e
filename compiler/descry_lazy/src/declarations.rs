//! Descriptors for the compiler's own declarations.
//!
//! Declaring a file is shallow: every class, member and type parameter
//! gets a placeholder descriptor with `Origin::Native`, and classes are
//! registered in the resolver's native class index so foreign lookups see
//! them. Types in signatures and bounds are filled in later, by whichever
//! request needs them first.

use descry_descriptors::{
    BuiltIns, ClassDescriptor, ClassId, ClassKind, Container, FunctionDescriptor, FunctionId,
    MemberScope, Members, Modality, Origin, Owner, PropertyDescriptor, PropertyId, Type,
    TypeParamId, TypeParameterDescriptor, ValueParameterDescriptor, Variance, Visibility,
};
use descry_ir::{FqName, Name};
use descry_resolve::{ResolveError, Resolver};
use rustc_hash::FxHashMap;

use crate::syntax::{NodeId, NodeKind};
use crate::trace::{Declaration, DelegatingTrace};
use crate::types::{resolve_type_reference, FileCx};

/// Name given to declarations the parser could not name.
pub const NO_NAME: &str = "<no name provided>";

/// Declarations introduced by one file.
#[derive(Debug, Default)]
pub(crate) struct DeclaredFile {
    pub declarations: Vec<(NodeId, Declaration)>,
    /// Classes declared directly in the package.
    pub top_level: Vec<ClassId>,
}

/// Create placeholder descriptors for every member-level declaration.
///
/// Classes, functions and properties nested in bodies are locals and are
/// left to the body resolver.
#[tracing::instrument(level = "debug", skip_all, fields(file = cx.file_name()))]
pub(crate) fn declare_file(
    r: &mut Resolver<'_>,
    cx: FileCx<'_>,
) -> Result<DeclaredFile, ResolveError> {
    let package = r.ensure_package(cx.package);
    let mut out = DeclaredFile::default();
    if let Some(header) = cx.tree.child_of_kind(cx.tree.root(), NodeKind::PackageHeader) {
        out.declarations.push((header, Declaration::Package(package)));
    }

    let mut declared: FxHashMap<NodeId, Declaration> = FxHashMap::default();
    let mut class_names: FxHashMap<NodeId, FqName> = FxHashMap::default();

    for (id, node) in cx.tree.nodes() {
        let Some(parent) = node.parent else { continue };
        let parent_kind = cx.tree.kind(parent);
        let container = if parent_kind == NodeKind::File {
            Some(Container::Package(package))
        } else if parent_kind.is_class_like() {
            declared
                .get(&parent)
                .and_then(|declaration| declaration.class())
                .map(Container::Class)
        } else {
            None
        };
        let name = node
            .name
            .unwrap_or_else(|| r.interner().intern(NO_NAME));

        let declaration = match (node.kind, container) {
            (kind, Some(container)) if kind.is_class_like() => {
                let outer = class_names.get(&parent).unwrap_or(cx.package);
                let fq_name = outer.child(name);
                let class = declare_class(r, kind, name, fq_name.clone(), container);
                if let Container::Package(_) = container {
                    out.top_level.push(class);
                }
                class_names.insert(id, fq_name);
                Declaration::Class(class)
            }
            (NodeKind::Function, Some(container)) => {
                Declaration::Function(declare_function(r, name, container))
            }
            (NodeKind::Property, Some(container)) => {
                Declaration::Property(declare_property(r, name, container))
            }
            (NodeKind::TypeParameter, _) => match declared.get(&parent) {
                Some(Declaration::Class(class)) => {
                    Declaration::TypeParameter(declare_type_parameter(r, name, Owner::Class(*class)))
                }
                Some(Declaration::Function(function)) => Declaration::TypeParameter(
                    declare_type_parameter(r, name, Owner::Function(*function)),
                ),
                _ => continue,
            },
            _ => continue,
        };
        declared.insert(id, declaration);
        out.declarations.push((id, declaration));
    }

    tracing::debug!(
        declarations = out.declarations.len(),
        classes = class_names.len(),
        "file declared"
    );
    Ok(out)
}

fn declare_class(
    r: &mut Resolver<'_>,
    kind: NodeKind,
    name: Name,
    fq_name: FqName,
    container: Container,
) -> ClassId {
    let kind = match kind {
        NodeKind::Interface => ClassKind::Interface,
        NodeKind::Object => ClassKind::Object,
        _ => ClassKind::Class,
    };
    let mut descriptor =
        ClassDescriptor::new(name, fq_name.to_unsafe(), container, kind, Origin::Native)
            .with_members(Members::default());
    descriptor.supertypes = vec![BuiltIns::any_type()];
    let class = r.descriptors_mut().alloc_class(descriptor);
    if let Container::Class(outer) = container {
        r.descriptors_mut().add_nested(outer, class);
    }
    if !r.register_native_class(fq_name, class) {
        tracing::debug!(class = class.raw(), "native class name already bound, keeping the first");
    }
    class
}

fn declare_function(r: &mut Resolver<'_>, name: Name, container: Container) -> FunctionId {
    let function = r
        .descriptors_mut()
        .alloc_function(FunctionDescriptor::placeholder(name, container, Origin::Native));
    add_member(r, container, |members| members.functions.push(function));
    function
}

fn declare_property(r: &mut Resolver<'_>, name: Name, container: Container) -> PropertyId {
    let property = r.descriptors_mut().alloc_property(PropertyDescriptor {
        name,
        container,
        origin: Origin::Native,
        ty: Type::error("property type not yet resolved"),
        is_var: false,
        is_static: false,
        modality: Modality::Final,
        visibility: Visibility::Public,
        annotations: Vec::new(),
    });
    add_member(r, container, |members| members.properties.push(property));
    property
}

fn declare_type_parameter(r: &mut Resolver<'_>, name: Name, owner: Owner) -> TypeParamId {
    let descriptors = r.descriptors_mut();
    let index = match owner {
        Owner::Class(class) => descriptors.class(class).type_parameters.len(),
        Owner::Function(function) => descriptors.function(function).type_parameters.len(),
        _ => 0,
    };
    let parameter = descriptors.alloc_type_param(TypeParameterDescriptor::uninitialized(
        name,
        u32::try_from(index).unwrap_or(u32::MAX),
        owner,
        Variance::Invariant,
    ));
    match owner {
        Owner::Class(class) => descriptors.class_mut(class).type_parameters.push(parameter),
        Owner::Function(function) => descriptors
            .function_mut(function)
            .type_parameters
            .push(parameter),
        _ => {}
    }
    parameter
}

fn add_member(r: &mut Resolver<'_>, container: Container, add: impl FnOnce(&mut Members)) {
    if let Container::Class(class) = container {
        if let MemberScope::Loaded(members) = &mut r.descriptors_mut().class_mut(class).members {
            add(members);
        }
    }
}

// ========================================
// Completion
// ========================================

/// Fill in the bounds of the type parameters declared on `owner`.
///
/// Bounds come from the parameter itself and from `where` constraints on
/// the owner; a parameter without any is bounded by `lang.Any?`.
pub(crate) fn complete_type_parameters(
    r: &mut Resolver<'_>,
    cx: FileCx<'_>,
    owner: NodeId,
    trace: &mut DelegatingTrace,
) -> Result<(), ResolveError> {
    let constraints: Vec<NodeId> = cx
        .tree
        .children_of_kind(owner, NodeKind::TypeConstraint)
        .collect();
    let parameters: Vec<NodeId> = cx
        .tree
        .children_of_kind(owner, NodeKind::TypeParameter)
        .collect();

    for node in parameters {
        let Some(Declaration::TypeParameter(parameter)) = trace.declaration(cx.element(node)) else {
            continue;
        };
        if r.descriptors().type_param(parameter).initialized {
            continue;
        }
        let name = cx.tree.node(node).name;
        let bound_nodes: Vec<NodeId> = cx
            .tree
            .children_of_kind(node, NodeKind::TypeReference)
            .chain(
                constraints
                    .iter()
                    .filter(move |&&constraint| cx.tree.node(constraint).name == name)
                    .flat_map(move |&constraint| {
                        cx.tree.children_of_kind(constraint, NodeKind::TypeReference)
                    }),
            )
            .collect();

        let mut bounds = Vec::with_capacity(bound_nodes.len().max(1));
        for bound in bound_nodes {
            bounds.push(resolve_type_reference(r, cx, bound, trace)?);
        }
        if bounds.is_empty() {
            bounds.push(BuiltIns::nullable_any_type());
        }
        let descriptor = r.descriptors_mut().type_param_mut(parameter);
        descriptor.upper_bounds = bounds;
        descriptor.initialized = true;
    }
    Ok(())
}

/// Resolve parameter and return types of a declared function.
///
/// A function without a written return type returns `lang.Unit`.
pub(crate) fn complete_function(
    r: &mut Resolver<'_>,
    cx: FileCx<'_>,
    node: NodeId,
    function: FunctionId,
    trace: &mut DelegatingTrace,
) -> Result<(), ResolveError> {
    complete_type_parameters(r, cx, node, trace)?;

    let mut value_parameters = Vec::new();
    let parameters: Vec<NodeId> = cx
        .tree
        .children_of_kind(node, NodeKind::ValueParameter)
        .collect();
    for (index, parameter) in (0u32..).zip(parameters) {
        let name = cx
            .tree
            .node(parameter)
            .name
            .unwrap_or_else(|| r.interner().intern(NO_NAME));
        let ty = match cx.tree.child_of_kind(parameter, NodeKind::TypeReference) {
            Some(reference) => resolve_type_reference(r, cx, reference, trace)?,
            None => Type::error("parameter type missing"),
        };
        value_parameters.push(ValueParameterDescriptor::new(name, index, ty));
    }

    let return_type = match cx.tree.child_of_kind(node, NodeKind::TypeReference) {
        Some(reference) => resolve_type_reference(r, cx, reference, trace)?,
        None => Type::class(ClassId::UNIT),
    };

    let descriptor = r.descriptors_mut().function_mut(function);
    descriptor.value_parameters = value_parameters;
    descriptor.return_type = return_type;
    Ok(())
}

/// Resolve the written type of a declared property. Without one the type
/// stays an error until the body resolver infers it.
pub(crate) fn complete_property(
    r: &mut Resolver<'_>,
    cx: FileCx<'_>,
    node: NodeId,
    property: PropertyId,
    trace: &mut DelegatingTrace,
) -> Result<(), ResolveError> {
    let Some(reference) = cx.tree.child_of_kind(node, NodeKind::TypeReference) else {
        return Ok(());
    };
    let ty = resolve_type_reference(r, cx, reference, trace)?;
    r.descriptors_mut().property_mut(property).ty = ty;
    Ok(())
}
