//! Raw foreign types to descriptor types.

use descry_descriptors::{
    BuiltIns, ClassId, Container, Descriptors, Type, TypeParamId, TypeProjection, Variance,
};
use descry_ir::{FqName, Name};

use super::{class, Resolver, SearchRule};
use crate::raw::{RawType, RawTypeArgument};
use crate::ResolveError;

/// Type parameters visible at a point, innermost last.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeVariableScope {
    parameters: Vec<(Name, TypeParamId)>,
}

impl TypeVariableScope {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parameters of `class`, and of its outer classes while it is inner.
    pub fn for_class(descriptors: &Descriptors, class: ClassId) -> Self {
        let mut chain = vec![class];
        let mut current = descriptors.class(class);
        while current.is_inner {
            let Container::Class(outer) = current.container else {
                break;
            };
            chain.push(outer);
            current = descriptors.class(outer);
        }
        let mut scope = Self::default();
        for &class in chain.iter().rev() {
            for &param in &descriptors.class(class).type_parameters {
                scope.parameters.push((descriptors.type_param(param).name, param));
            }
        }
        scope
    }

    /// This scope with `parameters` nested inside it.
    #[must_use]
    pub fn with_parameters(&self, parameters: impl IntoIterator<Item = (Name, TypeParamId)>) -> Self {
        let mut scope = self.clone();
        scope.parameters.extend(parameters);
        scope
    }

    pub fn lookup(&self, name: Name) -> Option<TypeParamId> {
        self.parameters
            .iter()
            .rev()
            .find(|(param, _)| *param == name)
            .map(|&(_, id)| id)
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

/// Map a raw type. `nullable` applies to reference types only; primitives
/// and `void` are never nullable.
pub(crate) fn transform_type(
    r: &mut Resolver<'_>,
    raw: &RawType,
    scope: &TypeVariableScope,
    nullable: bool,
) -> Result<Type, ResolveError> {
    match raw {
        RawType::Primitive(primitive) => Ok(Type::class(primitive.class_id())),
        RawType::Void => Ok(Type::class(ClassId::UNIT)),
        RawType::Array(element) => {
            let element = transform_type(r, element, scope, nullable)?;
            Ok(BuiltIns::array_of(element).with_nullability(nullable))
        }
        RawType::TypeVariable(name) => Ok(match scope.lookup(*name) {
            Some(param) => Type::parameter(param).with_nullability(nullable),
            None => Type::error(format!(
                "unresolved type variable `{}`",
                r.interner.lookup(*name)
            )),
        }),
        RawType::Class { fq_name, arguments } => {
            class_type(r, fq_name, arguments, scope, nullable)
        }
    }
}

fn class_type(
    r: &mut Resolver<'_>,
    fq_name: &FqName,
    arguments: &[RawTypeArgument],
    scope: &TypeVariableScope,
    nullable: bool,
) -> Result<Type, ResolveError> {
    let class = match r.state.platform.map_class(fq_name) {
        Some(mapped) => mapped.class,
        None => match class::resolve_class(r, fq_name, SearchRule::IncludeNative)? {
            Some(class) => class,
            None => {
                return Ok(Type::error(format!(
                    "unresolved class `{}`",
                    r.render(fq_name)
                )))
            }
        },
    };

    let arity = r.state.descriptors.class(class).type_parameters.len();
    if arguments.is_empty() {
        // Raw use of a generic class.
        let projections = vec![TypeProjection::Star; arity];
        return Ok(Type::generic(class, projections).with_nullability(nullable));
    }
    if arguments.len() != arity {
        return Ok(Type::error(format!(
            "`{}` expects {arity} type arguments, found {}",
            r.render(fq_name),
            arguments.len()
        )));
    }

    let mut projections = Vec::with_capacity(arity);
    for argument in arguments {
        let projection = match argument {
            RawTypeArgument::Wildcard => TypeProjection::Star,
            RawTypeArgument::Type(ty) => TypeProjection::Type {
                variance: Variance::Invariant,
                ty: transform_type(r, ty, scope, nullable)?,
            },
            RawTypeArgument::Extends(ty) => TypeProjection::Type {
                variance: Variance::Out,
                ty: transform_type(r, ty, scope, nullable)?,
            },
            RawTypeArgument::Super(ty) => TypeProjection::Type {
                variance: Variance::In,
                ty: transform_type(r, ty, scope, nullable)?,
            },
        };
        projections.push(projection);
    }
    Ok(Type::generic(class, projections).with_nullability(nullable))
}
