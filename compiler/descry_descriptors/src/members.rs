//! Callable and property descriptors, type parameters and signatures.

use descry_ir::Name;

use crate::class::{Container, Modality, Origin, Visibility};
use crate::ids::{AnnotationId, ClassId, FunctionId, Owner, TypeParamId};
use crate::types::{Type, Variance};

/// One generic parameter.
///
/// Built in two phases: allocated with empty bounds and `initialized ==
/// false`, then bounds are filled once every sibling placeholder exists.
#[derive(Clone, Debug)]
pub struct TypeParameterDescriptor {
    pub name: Name,
    pub index: u32,
    pub owner: Owner,
    pub variance: Variance,
    pub upper_bounds: Vec<Type>,
    pub initialized: bool,
}

impl TypeParameterDescriptor {
    pub fn uninitialized(name: Name, index: u32, owner: Owner, variance: Variance) -> Self {
        TypeParameterDescriptor {
            name,
            index,
            owner,
            variance,
            upper_bounds: Vec::new(),
            initialized: false,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum FunctionKind {
    Declaration,
    /// Created by the resolver rather than read from a declaration.
    Synthesized,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueParameterDescriptor {
    pub name: Name,
    pub index: u32,
    pub ty: Type,
    /// Element type when the parameter is variadic.
    pub vararg_element: Option<Type>,
    pub declares_default: bool,
    pub annotations: Vec<AnnotationId>,
}

impl ValueParameterDescriptor {
    pub fn new(name: Name, index: u32, ty: Type) -> Self {
        ValueParameterDescriptor {
            name,
            index,
            ty,
            vararg_element: None,
            declares_default: false,
            annotations: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FunctionDescriptor {
    pub name: Name,
    pub container: Container,
    pub kind: FunctionKind,
    pub origin: Origin,
    pub modality: Modality,
    pub visibility: Visibility,
    pub is_static: bool,
    pub type_parameters: Vec<TypeParamId>,
    pub receiver: Option<Type>,
    pub value_parameters: Vec<ValueParameterDescriptor>,
    pub return_type: Type,
    pub annotations: Vec<AnnotationId>,
    /// Supertype members this function overrides.
    pub overridden: Vec<FunctionId>,
    /// Mismatches found while checking the foreign signature, as messages.
    pub signature_errors: Vec<String>,
}

impl FunctionDescriptor {
    /// Placeholder returning an error type; fields are filled after allocation
    /// so type parameters can name the function as their owner.
    pub fn placeholder(name: Name, container: Container, origin: Origin) -> Self {
        FunctionDescriptor {
            name,
            container,
            kind: FunctionKind::Declaration,
            origin,
            modality: Modality::Final,
            visibility: Visibility::Public,
            is_static: false,
            type_parameters: Vec::new(),
            receiver: None,
            value_parameters: Vec::new(),
            return_type: Type::error("return type not yet resolved"),
            annotations: Vec::new(),
            overridden: Vec::new(),
            signature_errors: Vec::new(),
        }
    }

    pub fn arity(&self) -> usize {
        self.value_parameters.len()
    }

    pub fn owner_class(&self) -> Option<ClassId> {
        match self.container {
            Container::Class(class) => Some(class),
            Container::Package(_) => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PropertyDescriptor {
    pub name: Name,
    pub container: Container,
    pub origin: Origin,
    pub ty: Type,
    pub is_var: bool,
    pub is_static: bool,
    pub modality: Modality,
    pub visibility: Visibility,
    pub annotations: Vec<AnnotationId>,
}

#[derive(Clone, Debug)]
pub struct ConstructorDescriptor {
    pub owner: ClassId,
    pub value_parameters: Vec<ValueParameterDescriptor>,
    pub visibility: Visibility,
    pub is_primary: bool,
    pub annotations: Vec<AnnotationId>,
}

/// A resolved callable signature, before it is attached to a function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodSignature {
    pub return_type: Type,
    pub receiver: Option<Type>,
    pub value_parameters: Vec<ValueParameterDescriptor>,
    pub type_parameters: Vec<TypeParamId>,
    pub errors: Vec<String>,
}
