//! Member scopes: functions, properties and constructors.
//!
//! Loaded on first request, not during class resolution. Enum statics and
//! enum constants are left to the class object; annotation element methods
//! become the parameters of a single synthesized constructor.

use descry_descriptors::{
    ClassId, ClassKind, ConstructorDescriptor, ConstructorId, Container, Descriptors,
    FunctionDescriptor, FunctionId, MemberScope, Members, Modality, Origin, Owner,
    PropertyDescriptor, PropertyId, ValueParameterDescriptor, Visibility,
};
use rustc_hash::FxHashSet;

use super::annotations::{self, AnnotationProbe};
use super::signatures::{self, CallableSyntax};
use super::transform::{transform_type, TypeVariableScope};
use super::{compiled, Resolver};
use crate::raw::{
    AnnotationOwner, AnnotationOwnerKey, MemberFlags, RawClass, RawConstructor, RawField,
    RawMethod,
};
use crate::signature::parse_field_signature;
use crate::stack::ensure_sufficient_stack;
use crate::ResolveError;

/// Load the member scope of `class` unless it is loaded or being loaded.
pub(crate) fn ensure_members(r: &mut Resolver<'_>, class: ClassId) -> Result<(), ResolveError> {
    if r.state.descriptors.class(class).members.is_loaded() {
        return Ok(());
    }
    if !r.state.loading_members.insert(class) {
        tracing::trace!(class = class.raw(), "member scope already loading");
        return Ok(());
    }
    let result = ensure_sufficient_stack(|| load_members(r, class));
    r.state.loading_members.remove(&class);
    let members = result?;
    tracing::debug!(
        class = class.raw(),
        functions = members.functions.len(),
        properties = members.properties.len(),
        constructors = members.constructors.len(),
        "member scope loaded"
    );
    r.state.descriptors.class_mut(class).members = MemberScope::Loaded(members);
    Ok(())
}

fn load_members(r: &mut Resolver<'_>, class: ClassId) -> Result<Members, ResolveError> {
    let members = if let Some(raw) = r.state.raw_classes.get(&class).cloned() {
        foreign_members(r, class, &raw)?
    } else if let Some(proto) = r.state.protos.get(&class).cloned() {
        compiled::load_members(r, class, &proto)?
    } else {
        return Ok(Members::default());
    };
    propagate_overrides(r, class, &members.functions)?;
    Ok(members)
}

fn foreign_members(
    r: &mut Resolver<'_>,
    class: ClassId,
    raw: &RawClass,
) -> Result<Members, ResolveError> {
    let (kind, modality) = {
        let descriptor = r.state.descriptors.class(class);
        (descriptor.kind, descriptor.modality)
    };
    let scope = TypeVariableScope::for_class(&r.state.descriptors, class);
    let mut members = Members::default();

    for method in &raw.methods {
        if kind == ClassKind::Enum && is_enum_static(r, method) {
            continue;
        }
        if kind == ClassKind::Annotation && !method.is_static() {
            continue;
        }
        members
            .functions
            .push(resolve_function(r, class, modality, raw, method, &scope)?);
    }

    for field in &raw.fields {
        if field.is_enum_constant() {
            continue;
        }
        members
            .properties
            .push(resolve_property(r, class, raw, field, &scope)?);
    }

    if kind == ClassKind::Annotation {
        members
            .constructors
            .push(annotation_constructor(r, class, raw, &scope)?);
    } else {
        for constructor in &raw.constructors {
            members
                .constructors
                .push(resolve_constructor(r, class, raw, constructor, &scope)?);
        }
        if raw.constructors.is_empty() && kind != ClassKind::Interface {
            members.constructors.push(default_constructor(r, class));
        }
    }
    Ok(members)
}

/// `values()` and `valueOf(String)` of an enum, which live on its class
/// object instead.
fn is_enum_static(r: &Resolver<'_>, method: &RawMethod) -> bool {
    let names = r.names();
    if !method.is_static() {
        return false;
    }
    match method.parameters.as_slice() {
        [] => method.name == names.values,
        [param] => {
            method.name == names.value_of
                && param.ty.class_name() == Some(&names.foreign_string)
        }
        _ => false,
    }
}

fn member_modality(flags: MemberFlags, owner: Modality) -> Modality {
    if flags.contains(MemberFlags::STATIC) {
        Modality::Final
    } else if flags.contains(MemberFlags::ABSTRACT) {
        Modality::Abstract
    } else if flags.contains(MemberFlags::FINAL) || owner == Modality::Final {
        Modality::Final
    } else {
        Modality::Open
    }
}

fn resolve_function(
    r: &mut Resolver<'_>,
    class: ClassId,
    owner_modality: Modality,
    raw: &RawClass,
    method: &RawMethod,
    scope: &TypeVariableScope,
) -> Result<FunctionId, ResolveError> {
    let id = r.state.descriptors.alloc_function(FunctionDescriptor::placeholder(
        method.name,
        Container::Class(class),
        Origin::Foreign,
    ));
    let callable = CallableSyntax {
        class: &raw.fq_name,
        name: method.name,
        parameters: &method.parameters,
        return_type: Some(&method.return_type),
        generic_signature: method.generic_signature.as_deref(),
        annotations: &method.annotations,
        is_varargs: method.flags.contains(MemberFlags::VARARGS),
    };
    let signature = signatures::resolve_method_signature(r, Owner::Function(id), &callable, scope)?;
    let key = callable.key();
    let annotations =
        annotations::resolve_annotations(r, AnnotationOwner::new(&key, &method.annotations))?;
    let value_parameters = annotate_parameters(r, &callable, signature.value_parameters)?;

    let function = r.state.descriptors.function_mut(id);
    function.modality = member_modality(method.flags, owner_modality);
    function.visibility = method.visibility;
    function.is_static = method.is_static();
    function.type_parameters = signature.type_parameters;
    function.receiver = signature.receiver;
    function.value_parameters = value_parameters;
    function.return_type = signature.return_type;
    function.annotations = annotations;
    function.signature_errors = signature.errors;
    Ok(id)
}

fn annotate_parameters(
    r: &mut Resolver<'_>,
    callable: &CallableSyntax<'_>,
    mut parameters: Vec<ValueParameterDescriptor>,
) -> Result<Vec<ValueParameterDescriptor>, ResolveError> {
    for (index, raw) in (0u32..).zip(callable.parameters) {
        if raw.annotations.is_empty() && !r.config.use_external_annotations {
            continue;
        }
        let key = AnnotationOwnerKey::Parameter {
            class: callable.class.clone(),
            method: callable.name,
            arity: signatures::arity_of(callable.parameters),
            index,
        };
        let annotations =
            annotations::resolve_annotations(r, AnnotationOwner::new(&key, &raw.annotations))?;
        if let Some(parameter) = parameters.get_mut(index as usize) {
            parameter.annotations = annotations;
        }
    }
    Ok(parameters)
}

fn resolve_property(
    r: &mut Resolver<'_>,
    class: ClassId,
    raw: &RawClass,
    field: &RawField,
    scope: &TypeVariableScope,
) -> Result<PropertyId, ResolveError> {
    let key = AnnotationOwnerKey::Field {
        class: raw.fq_name.clone(),
        name: field.name,
    };
    let raw_ty = match field.generic_signature.as_deref() {
        Some(text) => match parse_field_signature(r.interner, text) {
            Ok(ty) => ty,
            Err(err) => {
                tracing::debug!(error = %err, "malformed field signature, using erased type");
                field.ty.clone()
            }
        },
        None => field.ty.clone(),
    };
    let not_null = annotations::has_marker(r, &key, &field.annotations, AnnotationProbe::NotNull);
    let ty = transform_type(r, &raw_ty, scope, !not_null)?;
    let annotations =
        annotations::resolve_annotations(r, AnnotationOwner::new(&key, &field.annotations))?;

    Ok(r.state.descriptors.alloc_property(PropertyDescriptor {
        name: field.name,
        container: Container::Class(class),
        origin: Origin::Foreign,
        ty,
        is_var: !field.flags.contains(MemberFlags::FINAL),
        is_static: field.flags.contains(MemberFlags::STATIC),
        modality: Modality::Final,
        visibility: field.visibility,
        annotations,
    }))
}

fn resolve_constructor(
    r: &mut Resolver<'_>,
    class: ClassId,
    raw: &RawClass,
    constructor: &RawConstructor,
    scope: &TypeVariableScope,
) -> Result<ConstructorId, ResolveError> {
    let callable = CallableSyntax {
        class: &raw.fq_name,
        name: r.names().init,
        parameters: &constructor.parameters,
        return_type: None,
        generic_signature: constructor.generic_signature.as_deref(),
        annotations: &constructor.annotations,
        is_varargs: false,
    };
    let signature = signatures::resolve_method_signature(r, Owner::Class(class), &callable, scope)?;
    let key = callable.key();
    let annotations =
        annotations::resolve_annotations(r, AnnotationOwner::new(&key, &constructor.annotations))?;
    let value_parameters = annotate_parameters(r, &callable, signature.value_parameters)?;

    Ok(r.state.descriptors.alloc_constructor(ConstructorDescriptor {
        owner: class,
        value_parameters,
        visibility: constructor.visibility,
        is_primary: false,
        annotations,
    }))
}

fn default_constructor(r: &mut Resolver<'_>, class: ClassId) -> ConstructorId {
    let visibility = r.state.descriptors.class(class).visibility;
    r.state.descriptors.alloc_constructor(ConstructorDescriptor {
        owner: class,
        value_parameters: Vec::new(),
        visibility,
        is_primary: true,
        annotations: Vec::new(),
    })
}

/// The single constructor of an annotation class: one parameter per
/// element method, in declaration order.
fn annotation_constructor(
    r: &mut Resolver<'_>,
    class: ClassId,
    raw: &RawClass,
    scope: &TypeVariableScope,
) -> Result<ConstructorId, ResolveError> {
    let elements = raw.methods.iter().filter(|method| !method.is_static());
    let mut value_parameters = Vec::new();
    for (index, element) in (0u32..).zip(elements) {
        let ty = transform_type(r, &element.return_type, scope, false)?;
        let mut parameter = ValueParameterDescriptor::new(element.name, index, ty);
        parameter.declares_default = element.annotation_default.is_some();
        value_parameters.push(parameter);
    }
    Ok(r.state.descriptors.alloc_constructor(ConstructorDescriptor {
        owner: class,
        value_parameters,
        visibility: Visibility::Public,
        is_primary: true,
        annotations: Vec::new(),
    }))
}

/// Every class reachable through supertypes, nearest first.
pub(super) fn supertype_classes(descriptors: &Descriptors, class: ClassId) -> Vec<ClassId> {
    let mut seen = FxHashSet::default();
    seen.insert(class);
    let mut order = Vec::new();
    let mut next = 0;
    let mut queue = vec![class];
    while let Some(&current) = queue.get(next) {
        next += 1;
        for supertype in &descriptors.class(current).supertypes {
            if let Some(sup) = supertype.class_id() {
                if seen.insert(sup) {
                    order.push(sup);
                    queue.push(sup);
                }
            }
        }
    }
    order
}

/// Link functions to the supertype members they override, recording a
/// signature error when the return types disagree.
fn propagate_overrides(
    r: &mut Resolver<'_>,
    class: ClassId,
    functions: &[FunctionId],
) -> Result<(), ResolveError> {
    let supers = supertype_classes(&r.state.descriptors, class);
    for &sup in &supers {
        ensure_members(r, sup)?;
    }

    for &function in functions {
        let (name, arity, is_static, return_class) = {
            let f = r.state.descriptors.function(function);
            (f.name, f.arity(), f.is_static, f.return_type.class_id())
        };
        if is_static {
            continue;
        }
        let mut overridden = Vec::new();
        let mut errors = Vec::new();
        for &sup in &supers {
            let descriptors = &r.state.descriptors;
            for &candidate in descriptors.class(sup).functions() {
                let inherited = descriptors.function(candidate);
                if inherited.is_static || inherited.name != name || inherited.arity() != arity {
                    continue;
                }
                overridden.push(candidate);
                let (Some(own), Some(expected)) = (return_class, inherited.return_type.class_id())
                else {
                    continue;
                };
                if own != expected && !descriptors.is_subclass_of(own, expected) {
                    errors.push(format!(
                        "return type of `{}` does not match the declaration it overrides in `{}`",
                        r.interner.lookup(name),
                        r.render(&descriptors.class(sup).fq_name)
                    ));
                }
            }
        }
        let descriptor = r.state.descriptors.function_mut(function);
        descriptor.overridden = overridden;
        descriptor.signature_errors.extend(errors);
    }
    Ok(())
}
