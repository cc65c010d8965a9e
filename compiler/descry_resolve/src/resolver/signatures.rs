//! Type parameters and callable signatures.
//!
//! Type parameters are built in two phases. Every placeholder of a list is
//! allocated before any bound is resolved, so `<K, V extends K>` and
//! `<E extends Enum<E>>` bind to the placeholders instead of recursing.

use descry_descriptors::{
    BuiltIns, ClassId, MethodSignature, Owner, Type, TypeParamId, TypeParameterDescriptor,
    ValueParameterDescriptor, Variance,
};
use descry_diagnostic::{Diagnostic, ErrorCode};
use descry_ir::FqName;

use super::annotations::{self, AnnotationProbe};
use super::transform::{transform_type, TypeVariableScope};
use super::Resolver;
use crate::raw::{AnnotationOwnerKey, RawAnnotation, RawType, RawTypeParameter, RawValueParameter};
use crate::signature::{parse_method_signature, MethodSignatureSyntax};
use crate::ResolveError;

/// Allocate placeholders, then resolve bounds in a scope that sees them.
///
/// Returns the new parameters and `outer` extended with them.
pub(crate) fn resolve_type_parameters(
    r: &mut Resolver<'_>,
    owner: Owner,
    params: &[RawTypeParameter],
    outer: &TypeVariableScope,
) -> Result<(Vec<TypeParamId>, TypeVariableScope), ResolveError> {
    let ids = create_uninitialized(r, owner, params);
    let scope = outer.with_parameters(params.iter().map(|p| p.name).zip(ids.iter().copied()));
    initialize(r, params, &ids, &scope)?;
    Ok((ids, scope))
}

/// Type parameters of a class. The placeholders are attached to the class
/// before any bound is resolved, so `A<T extends A<T>>` sees the arity of `A`.
pub(crate) fn resolve_class_type_parameters(
    r: &mut Resolver<'_>,
    class: ClassId,
    params: &[RawTypeParameter],
    outer: &TypeVariableScope,
) -> Result<TypeVariableScope, ResolveError> {
    let ids = create_uninitialized(r, Owner::Class(class), params);
    r.state.descriptors.class_mut(class).type_parameters = ids.clone();
    let scope = outer.with_parameters(params.iter().map(|p| p.name).zip(ids.iter().copied()));
    initialize(r, params, &ids, &scope)?;
    Ok(scope)
}

fn create_uninitialized(
    r: &mut Resolver<'_>,
    owner: Owner,
    params: &[RawTypeParameter],
) -> Vec<TypeParamId> {
    (0u32..)
        .zip(params)
        .map(|(index, param)| {
            r.state
                .descriptors
                .alloc_type_param(TypeParameterDescriptor::uninitialized(
                    param.name,
                    index,
                    owner,
                    Variance::Invariant,
                ))
        })
        .collect()
}

fn initialize(
    r: &mut Resolver<'_>,
    params: &[RawTypeParameter],
    ids: &[TypeParamId],
    scope: &TypeVariableScope,
) -> Result<(), ResolveError> {
    for (param, &id) in params.iter().zip(ids) {
        let mut bounds = Vec::with_capacity(param.bounds.len());
        for bound in &param.bounds {
            if is_plain_object(r, bound) {
                continue;
            }
            bounds.push(transform_type(r, bound, scope, false)?);
        }
        if bounds.is_empty() {
            bounds.push(BuiltIns::nullable_any_type());
        }
        let descriptor = r.state.descriptors.type_param_mut(id);
        descriptor.upper_bounds = bounds;
        descriptor.initialized = true;
    }
    Ok(())
}

/// `java.lang.Object` without arguments, which adds nothing as a bound.
fn is_plain_object(r: &Resolver<'_>, ty: &RawType) -> bool {
    matches!(ty, RawType::Class { fq_name, arguments }
        if arguments.is_empty() && *fq_name == r.names().foreign_object)
}

/// A method or constructor as the signature resolver sees it.
pub(crate) struct CallableSyntax<'a> {
    /// Foreign class declaring the callable, for annotation lookups.
    pub class: &'a FqName,
    pub name: descry_ir::Name,
    pub parameters: &'a [RawValueParameter],
    /// `None` for constructors.
    pub return_type: Option<&'a RawType>,
    pub generic_signature: Option<&'a str>,
    pub annotations: &'a [RawAnnotation],
    pub is_varargs: bool,
}

impl CallableSyntax<'_> {
    fn parameter_key(&self, index: u32) -> AnnotationOwnerKey {
        AnnotationOwnerKey::Parameter {
            class: self.class.clone(),
            method: self.name,
            arity: arity_of(self.parameters),
            index,
        }
    }

    pub fn key(&self) -> AnnotationOwnerKey {
        AnnotationOwnerKey::Method {
            class: self.class.clone(),
            name: self.name,
            arity: arity_of(self.parameters),
        }
    }
}

pub(crate) fn arity_of(parameters: &[RawValueParameter]) -> u32 {
    u32::try_from(parameters.len()).unwrap_or(u32::MAX)
}

/// Resolve a callable signature. Problems are collected on the result and
/// the erased declaration is used instead of a faulty generic signature.
pub(crate) fn resolve_method_signature(
    r: &mut Resolver<'_>,
    owner: Owner,
    callable: &CallableSyntax<'_>,
    class_scope: &TypeVariableScope,
) -> Result<MethodSignature, ResolveError> {
    let mut errors = Vec::new();
    let syntax = parse_generic(r, callable, &mut errors);

    let (type_parameters, scope) = match &syntax {
        Some(syntax) => resolve_type_parameters(r, owner, &syntax.type_parameters, class_scope)?,
        None => (Vec::new(), class_scope.clone()),
    };

    let mut value_parameters = Vec::with_capacity(callable.parameters.len());
    let last = callable.parameters.len().checked_sub(1);
    for (index, param) in (0u32..).zip(callable.parameters) {
        let raw_ty = syntax
            .as_ref()
            .map_or(&param.ty, |syntax| &syntax.parameters[index as usize]);
        let key = callable.parameter_key(index);
        let not_null = annotations::has_marker(
            r,
            &key,
            &param.annotations,
            AnnotationProbe::NotNull,
        );
        let ty = transform_type(r, raw_ty, &scope, !not_null)?;
        let name = match param.name {
            Some(name) => name,
            None => r.interner.intern(&format!("p{index}")),
        };
        let mut descriptor = ValueParameterDescriptor::new(name, index, ty);
        if callable.is_varargs && Some(index as usize) == last {
            descriptor.vararg_element = descriptor
                .ty
                .arguments()
                .first()
                .and_then(|arg| arg.ty())
                .cloned();
        }
        value_parameters.push(descriptor);
    }

    let return_type = match callable.return_type {
        None => Type::class(ClassId::UNIT),
        Some(erased) => {
            let raw_ty = syntax.as_ref().map_or(erased, |syntax| &syntax.return_type);
            let key = callable.key();
            let not_null =
                annotations::has_marker(r, &key, callable.annotations, AnnotationProbe::NotNull);
            transform_type(r, raw_ty, &scope, !not_null)?
        }
    };

    Ok(MethodSignature {
        return_type,
        receiver: None,
        value_parameters,
        type_parameters,
        errors,
    })
}

/// Parse and sanity-check a generic signature, recording problems.
fn parse_generic(
    r: &mut Resolver<'_>,
    callable: &CallableSyntax<'_>,
    errors: &mut Vec<String>,
) -> Option<MethodSignatureSyntax> {
    let text = callable.generic_signature?;
    let syntax = match parse_method_signature(r.interner, text) {
        Ok(syntax) => syntax,
        Err(err) => {
            tracing::debug!(error = %err, "malformed method signature, using erased types");
            r.push_diagnostic(
                Diagnostic::error(ErrorCode::E1002)
                    .with_message(format!(
                        "malformed signature of `{}.{}`: {err}",
                        r.render(callable.class),
                        r.interner.lookup(callable.name)
                    )),
            );
            errors.push(err.to_string());
            return None;
        }
    };
    if syntax.parameters.len() != callable.parameters.len() {
        errors.push(format!(
            "parameter count mismatch: signature has {}, declaration has {}",
            syntax.parameters.len(),
            callable.parameters.len()
        ));
        return None;
    }
    Some(syntax)
}
