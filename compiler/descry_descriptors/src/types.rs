//! Resolved types.
//!
//! A `Type` refers to descriptors by id, so a class can mention itself in its
//! own supertypes (`A : Base<A>`) while it is still being populated.

use crate::ids::{ClassId, TypeParamId};

/// Declaration-site or use-site variance.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Variance {
    #[default]
    Invariant,
    In,
    Out,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Type {
    Class {
        class: ClassId,
        arguments: Vec<TypeProjection>,
        nullable: bool,
    },
    Parameter {
        parameter: TypeParamId,
        nullable: bool,
    },
    /// Function type, used for single-abstract-method conversions.
    Function {
        receiver: Option<Box<Type>>,
        parameters: Vec<Type>,
        return_type: Box<Type>,
    },
    /// Placeholder for a reference that failed to resolve.
    Error { description: String },
}

impl Type {
    /// Non-null class type without arguments.
    pub fn class(class: ClassId) -> Type {
        Type::Class {
            class,
            arguments: Vec::new(),
            nullable: false,
        }
    }

    pub fn generic(class: ClassId, arguments: Vec<TypeProjection>) -> Type {
        Type::Class {
            class,
            arguments,
            nullable: false,
        }
    }

    pub fn parameter(parameter: TypeParamId) -> Type {
        Type::Parameter {
            parameter,
            nullable: false,
        }
    }

    pub fn error(description: impl Into<String>) -> Type {
        Type::Error {
            description: description.into(),
        }
    }

    /// Same type with the given nullability. Function and error types are
    /// returned unchanged.
    #[must_use]
    pub fn with_nullability(self, nullable: bool) -> Type {
        match self {
            Type::Class {
                class, arguments, ..
            } => Type::Class {
                class,
                arguments,
                nullable,
            },
            Type::Parameter { parameter, .. } => Type::Parameter {
                parameter,
                nullable,
            },
            other => other,
        }
    }

    #[must_use]
    pub fn nullable(self) -> Type {
        self.with_nullability(true)
    }

    pub fn is_nullable(&self) -> bool {
        matches!(
            self,
            Type::Class { nullable: true, .. } | Type::Parameter { nullable: true, .. }
        )
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error { .. })
    }

    /// Whether this type or any nested argument is an error placeholder.
    pub fn contains_error(&self) -> bool {
        match self {
            Type::Error { .. } => true,
            Type::Class { arguments, .. } => arguments.iter().any(|arg| match arg {
                TypeProjection::Star => false,
                TypeProjection::Type { ty, .. } => ty.contains_error(),
            }),
            Type::Parameter { .. } => false,
            Type::Function {
                receiver,
                parameters,
                return_type,
            } => {
                receiver.as_ref().is_some_and(|r| r.contains_error())
                    || parameters.iter().any(Type::contains_error)
                    || return_type.contains_error()
            }
        }
    }

    pub fn class_id(&self) -> Option<ClassId> {
        match self {
            Type::Class { class, .. } => Some(*class),
            _ => None,
        }
    }

    pub fn arguments(&self) -> &[TypeProjection] {
        match self {
            Type::Class { arguments, .. } => arguments,
            _ => &[],
        }
    }
}

/// A type argument.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeProjection {
    Star,
    Type { variance: Variance, ty: Type },
}

impl TypeProjection {
    pub fn invariant(ty: Type) -> TypeProjection {
        TypeProjection::Type {
            variance: Variance::Invariant,
            ty,
        }
    }

    pub fn ty(&self) -> Option<&Type> {
        match self {
            TypeProjection::Star => None,
            TypeProjection::Type { ty, .. } => Some(ty),
        }
    }
}
