//! Classes built from compiled metadata.
//!
//! Metadata is tried before raw declarations. A version other than the
//! expected one is reported once and the class falls back to its raw
//! declaration; a name table that does not decode is fatal.

use std::sync::Arc;

use descry_descriptors::{
    BuiltIns, ClassDescriptor, ClassId, ClassKind, ConstructorDescriptor, Container,
    FunctionDescriptor, Members, Origin, Owner, PropertyDescriptor, Type, TypeParamId,
    TypeParameterDescriptor, TypeProjection, ValueParameterDescriptor,
};
use descry_ir::{FqName, FqNameUnsafe, Name};

use super::transform::TypeVariableScope;
use super::{annotations, class, enum_class, sam, supertypes, Resolver, SearchRule};
use crate::raw::{
    AnnotationOwner, AnnotationOwnerKey, ClassProto, ProtoTypeArgument, ProtoTypeConstructor,
    ProtoType, ProtoTypeParameter, ProtoValueParameter,
};
use crate::ResolveError;

pub(crate) fn resolve_compiled(
    r: &mut Resolver<'_>,
    fq_name: &FqName,
    canonical: &FqNameUnsafe,
) -> Result<Option<ClassId>, ResolveError> {
    let providers = r.providers;
    let Some(reader) = providers.metadata.as_deref() else {
        return Ok(None);
    };
    if !r.config.prefer_compiled_metadata {
        return Ok(None);
    }
    let Some(binary) = reader.find_binary(fq_name) else {
        return Ok(None);
    };

    let outer = if binary.is_nested {
        fq_name.parent()
    } else {
        None
    };
    let container = class::resolve_container(r, fq_name, outer.as_ref())?;
    if let Some(class) = class::recheck_cache(r, canonical)? {
        return Ok(Some(class));
    }

    let Some(proto) = reader.read_class_metadata(&binary) else {
        tracing::debug!(path = %binary.path, "binary carries no metadata");
        return Ok(None);
    };
    let expected = r.config.expected_abi_version;
    if proto.abi_version != expected {
        tracing::debug!(
            actual = proto.abi_version,
            expected,
            "incompatible metadata version, falling back to raw declaration"
        );
        r.reporter()
            .report_incompatible_abi_version(fq_name, proto.abi_version, expected);
        return Ok(None);
    }

    let declared = qualified_name(r, &proto, proto.fq_name, fq_name)?;
    if declared != *fq_name {
        return Err(ResolveError::NameMismatch {
            requested: r.render(fq_name),
            found: r.render(&declared),
        });
    }
    build_compiled_class(r, fq_name, canonical, Arc::new(proto), container).map(Some)
}

fn build_compiled_class(
    r: &mut Resolver<'_>,
    fq_name: &FqName,
    canonical: &FqNameUnsafe,
    proto: Arc<ClassProto>,
    container: Container,
) -> Result<ClassId, ResolveError> {
    let name = fq_name.short_name().unwrap_or_default();
    let mut descriptor =
        ClassDescriptor::new(name, canonical.clone(), container, proto.kind, Origin::Compiled)
            .with_modality(proto.modality)
            .with_visibility(proto.visibility)
            .with_source_name(fq_name.clone());
    descriptor.is_inner = proto.is_inner;

    let id = r.state.descriptors.alloc_class(descriptor);
    r.cache_insert(canonical.clone(), id)?;
    if let Container::Class(parent) = container {
        r.state.descriptors.add_nested(parent, id);
    }
    r.state.protos.insert(id, Arc::clone(&proto));
    tracing::debug!(class = id.raw(), kind = ?proto.kind, "compiled class allocated");

    let outer = TypeVariableScope::for_class(&r.state.descriptors, id);
    let (_, scope) =
        type_parameters(r, fq_name, &proto, Owner::Class(id), &proto.type_parameters, &outer)?;

    let mut resolved = Vec::with_capacity(proto.supertypes.len());
    for supertype in &proto.supertypes {
        let ty = transform_proto_type(r, fq_name, &proto, supertype, &scope)?;
        if ty.is_error() {
            let text = describe(&proto, supertype);
            supertypes::report_unresolved(r, id, &text);
        }
        resolved.push(ty);
    }
    let resolved = supertypes::complete(id, proto.kind == ClassKind::Annotation, resolved);
    r.state.descriptors.class_mut(id).supertypes = resolved;

    let key = AnnotationOwnerKey::Class(fq_name.clone());
    let annotations =
        annotations::resolve_annotations(r, AnnotationOwner::new(&key, &proto.annotations))?;
    r.state.descriptors.class_mut(id).annotations = annotations;

    match proto.kind {
        ClassKind::Interface => sam::detect_single_abstract_method(r, id)?,
        ClassKind::Enum => {
            let entries = proto
                .enum_entries
                .iter()
                .map(|&index| simple_name(r, &proto, index, fq_name))
                .collect::<Result<Vec<_>, _>>()?;
            enum_class::synthesize_class_object(r, id, &entries)?;
        }
        _ => {}
    }
    Ok(id)
}

/// Functions, properties and constructors of a compiled class.
pub(crate) fn load_members(
    r: &mut Resolver<'_>,
    class: ClassId,
    proto: &ClassProto,
) -> Result<Members, ResolveError> {
    let owner_name = r
        .state
        .descriptors
        .class(class)
        .source_name
        .clone()
        .unwrap_or_else(FqName::root);
    let scope = TypeVariableScope::for_class(&r.state.descriptors, class);
    let mut members = Members::default();

    for function in &proto.functions {
        let name = simple_name(r, proto, function.name, &owner_name)?;
        let id = r.state.descriptors.alloc_function(FunctionDescriptor::placeholder(
            name,
            Container::Class(class),
            Origin::Compiled,
        ));
        let (type_parameters, scope) = type_parameters(
            r,
            &owner_name,
            proto,
            Owner::Function(id),
            &function.type_parameters,
            &scope,
        )?;
        let receiver = function
            .receiver
            .as_ref()
            .map(|receiver| transform_proto_type(r, &owner_name, proto, receiver, &scope))
            .transpose()?;
        let value_parameters =
            value_parameters(r, &owner_name, proto, &function.value_parameters, &scope)?;
        let return_type = transform_proto_type(r, &owner_name, proto, &function.return_type, &scope)?;

        let descriptor = r.state.descriptors.function_mut(id);
        descriptor.modality = function.modality;
        descriptor.visibility = function.visibility;
        descriptor.type_parameters = type_parameters;
        descriptor.receiver = receiver;
        descriptor.value_parameters = value_parameters;
        descriptor.return_type = return_type;
        members.functions.push(id);
    }

    for property in &proto.properties {
        let name = simple_name(r, proto, property.name, &owner_name)?;
        let ty = transform_proto_type(r, &owner_name, proto, &property.ty, &scope)?;
        members
            .properties
            .push(r.state.descriptors.alloc_property(PropertyDescriptor {
                name,
                container: Container::Class(class),
                origin: Origin::Compiled,
                ty,
                is_var: property.is_var,
                is_static: false,
                modality: property.modality,
                visibility: property.visibility,
                annotations: Vec::new(),
            }));
    }

    for constructor in &proto.constructors {
        let value_parameters =
            value_parameters(r, &owner_name, proto, &constructor.value_parameters, &scope)?;
        members
            .constructors
            .push(r.state.descriptors.alloc_constructor(ConstructorDescriptor {
                owner: class,
                value_parameters,
                visibility: constructor.visibility,
                is_primary: constructor.is_primary,
                annotations: Vec::new(),
            }));
    }
    Ok(members)
}

fn type_parameters(
    r: &mut Resolver<'_>,
    owner_name: &FqName,
    proto: &ClassProto,
    owner: Owner,
    params: &[ProtoTypeParameter],
    outer: &TypeVariableScope,
) -> Result<(Vec<TypeParamId>, TypeVariableScope), ResolveError> {
    let mut ids = Vec::with_capacity(params.len());
    let mut named = Vec::with_capacity(params.len());
    for (index, param) in (0u32..).zip(params) {
        let name = simple_name(r, proto, param.name, owner_name)?;
        let id = r
            .state
            .descriptors
            .alloc_type_param(TypeParameterDescriptor::uninitialized(
                name,
                index,
                owner,
                param.variance,
            ));
        ids.push(id);
        named.push((name, id));
    }
    if let Owner::Class(class) = owner {
        r.state.descriptors.class_mut(class).type_parameters = ids.clone();
    }
    let scope = outer.with_parameters(named);

    for (param, &id) in params.iter().zip(&ids) {
        let mut bounds = Vec::with_capacity(param.upper_bounds.len());
        for bound in &param.upper_bounds {
            bounds.push(transform_proto_type(r, owner_name, proto, bound, &scope)?);
        }
        if bounds.is_empty() {
            bounds.push(BuiltIns::nullable_any_type());
        }
        let descriptor = r.state.descriptors.type_param_mut(id);
        descriptor.upper_bounds = bounds;
        descriptor.initialized = true;
    }
    Ok((ids, scope))
}

fn value_parameters(
    r: &mut Resolver<'_>,
    owner_name: &FqName,
    proto: &ClassProto,
    params: &[ProtoValueParameter],
    scope: &TypeVariableScope,
) -> Result<Vec<ValueParameterDescriptor>, ResolveError> {
    let mut resolved = Vec::with_capacity(params.len());
    for (index, param) in (0u32..).zip(params) {
        let name = simple_name(r, proto, param.name, owner_name)?;
        let ty = transform_proto_type(r, owner_name, proto, &param.ty, scope)?;
        let mut descriptor = ValueParameterDescriptor::new(name, index, ty);
        descriptor.vararg_element = param
            .vararg_element
            .as_ref()
            .map(|element| transform_proto_type(r, owner_name, proto, element, scope))
            .transpose()?;
        descriptor.declares_default = param.declares_default;
        resolved.push(descriptor);
    }
    Ok(resolved)
}

fn transform_proto_type(
    r: &mut Resolver<'_>,
    owner_name: &FqName,
    proto: &ClassProto,
    ty: &ProtoType,
    scope: &TypeVariableScope,
) -> Result<Type, ResolveError> {
    let class = match ty.constructor {
        ProtoTypeConstructor::Parameter(index) => {
            let name = simple_name(r, proto, index, owner_name)?;
            return Ok(match scope.lookup(name) {
                Some(param) => Type::parameter(param).with_nullability(ty.nullable),
                None => Type::error(format!(
                    "unresolved type parameter `{}`",
                    r.interner.lookup(name)
                )),
            });
        }
        ProtoTypeConstructor::Class(index) => {
            let fq_name = qualified_name(r, proto, index, owner_name)?;
            let mapped = r.state.platform.map_class(&fq_name).map(|mapped| mapped.class);
            let resolved = match mapped {
                Some(class) => Some(class),
                None => class::resolve_class(r, &fq_name, SearchRule::IncludeNative)?,
            };
            match resolved {
                Some(class) => class,
                None => {
                    return Ok(Type::error(format!(
                        "unresolved class `{}`",
                        r.render(&fq_name)
                    )))
                }
            }
        }
    };

    let arity = r.state.descriptors.class(class).type_parameters.len();
    if ty.arguments.is_empty() {
        let projections = vec![TypeProjection::Star; arity];
        return Ok(Type::generic(class, projections).with_nullability(ty.nullable));
    }
    if ty.arguments.len() != arity {
        return Ok(Type::error(format!(
            "`{}` expects {arity} type arguments, found {}",
            r.render(&r.state.descriptors.class(class).fq_name),
            ty.arguments.len()
        )));
    }
    let mut projections = Vec::with_capacity(arity);
    for argument in &ty.arguments {
        projections.push(match argument {
            ProtoTypeArgument::Star => TypeProjection::Star,
            ProtoTypeArgument::Type { variance, ty } => TypeProjection::Type {
                variance: *variance,
                ty: transform_proto_type(r, owner_name, proto, ty, scope)?,
            },
        });
    }
    Ok(Type::generic(class, projections).with_nullability(ty.nullable))
}

fn simple_name(
    r: &Resolver<'_>,
    proto: &ClassProto,
    index: u32,
    owner_name: &FqName,
) -> Result<Name, ResolveError> {
    match proto.names.simple(index) {
        Some(text) => Ok(r.interner.intern(text)),
        None => Err(ResolveError::MalformedMetadata {
            name: r.render(owner_name),
            detail: format!("simple name index {index} out of range"),
        }),
    }
}

fn qualified_name(
    r: &Resolver<'_>,
    proto: &ClassProto,
    index: u32,
    owner_name: &FqName,
) -> Result<FqName, ResolveError> {
    let Some(segments) = proto.names.qualified(index) else {
        return Err(ResolveError::MalformedMetadata {
            name: r.render(owner_name),
            detail: format!("qualified name index {index} does not decode"),
        });
    };
    Ok(segments
        .into_iter()
        .fold(FqName::root(), |fq, segment| fq.child(r.interner.intern(segment))))
}

/// Supertype text for diagnostics, straight from the name table.
fn describe(proto: &ClassProto, ty: &ProtoType) -> String {
    match ty.constructor {
        ProtoTypeConstructor::Class(index) => proto
            .names
            .qualified(index)
            .map_or_else(|| format!("<qualified name {index}>"), |segments| segments.join(".")),
        ProtoTypeConstructor::Parameter(index) => proto
            .names
            .simple(index)
            .map_or_else(|| format!("<name {index}>"), str::to_owned),
    }
}
