//! Supertype lists.

use descry_descriptors::{BuiltIns, ClassId, Type};
use descry_diagnostic::unresolved_supertype;

use super::transform::{transform_type, TypeVariableScope};
use super::Resolver;
use crate::raw::{RawClass, RawType};
use crate::signature::ClassSignature;
use crate::ResolveError;

/// Supertypes of a foreign class, from its generic signature when there is
/// one and from the erased list otherwise.
///
/// `java.lang.Object` is implied and dropped. An unresolved reference keeps
/// its slot as an error type and is reported.
pub(crate) fn resolve_supertypes(
    r: &mut Resolver<'_>,
    class: ClassId,
    raw: &RawClass,
    signature: Option<&ClassSignature>,
) -> Result<Vec<Type>, ResolveError> {
    let scope = TypeVariableScope::for_class(&r.state.descriptors, class);
    let references: Vec<RawType> = match signature {
        Some(signature) => signature.supertypes().cloned().collect(),
        None => raw.supertypes.iter().cloned().map(RawType::class).collect(),
    };

    let mut supertypes = Vec::with_capacity(references.len() + 1);
    for reference in &references {
        if reference.class_name() == Some(&r.names().foreign_object) {
            continue;
        }
        let ty = transform_type(r, reference, &scope, false)?;
        if ty.is_error() {
            let supertype = match reference {
                RawType::Class { fq_name, .. } => r.render(fq_name),
                other => format!("{other:?}"),
            };
            report_unresolved(r, class, &supertype);
        }
        supertypes.push(ty);
    }
    Ok(complete(class, raw.is_annotation(), supertypes))
}

/// Add the implied supertypes.
pub(super) fn complete(class: ClassId, is_annotation: bool, mut supertypes: Vec<Type>) -> Vec<Type> {
    if is_annotation
        && !supertypes
            .iter()
            .any(|ty| ty.class_id() == Some(ClassId::ANNOTATION))
    {
        supertypes.push(Type::class(ClassId::ANNOTATION));
    }
    if supertypes.is_empty() && class != ClassId::ANY {
        supertypes.push(BuiltIns::any_type());
    }
    supertypes
}

pub(super) fn report_unresolved(r: &mut Resolver<'_>, class: ClassId, supertype: &str) {
    let class_name = r.render(&r.state.descriptors.class(class).fq_name);
    tracing::debug!(class = %class_name, supertype, "unresolved supertype");
    r.push_diagnostic(unresolved_supertype(&class_name, supertype));
}
