//! Raw foreign declarations.
//!
//! The shape a [`ClassFinder`](crate::ClassFinder) hands to the resolver:
//! erased types, optional generic signatures, flags and annotations, with
//! no resolution applied. Builders exist so providers can assemble them
//! declaratively.

use descry_descriptors::{PrimitiveType, Visibility};
use descry_ir::{FqName, Name};

mod proto;

pub use proto::{
    ClassProto, LocatedBinary, NameTable, ProtoConstructor, ProtoFunction, ProtoProperty,
    ProtoType, ProtoTypeArgument, ProtoTypeConstructor, ProtoTypeParameter, ProtoValueParameter,
    QualifiedNameEntry,
};

bitflags::bitflags! {
    /// Class-level flags of a raw declaration.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    pub struct ClassFlags: u16 {
        const INTERFACE = 1 << 0;
        const ENUM = 1 << 1;
        const ANNOTATION = 1 << 2;
        const FINAL = 1 << 3;
        const ABSTRACT = 1 << 4;
        /// Nested class without an outer instance.
        const STATIC = 1 << 5;
        /// Foreign view the compiler generated for one of its own classes.
        const MIRROR = 1 << 6;
    }
}

bitflags::bitflags! {
    /// Member-level flags of a raw method or field.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    pub struct MemberFlags: u16 {
        const STATIC = 1 << 0;
        const ABSTRACT = 1 << 1;
        const FINAL = 1 << 2;
        const VARARGS = 1 << 3;
        const ENUM_CONSTANT = 1 << 4;
    }
}

/// A foreign type as written in a declaration.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RawType {
    Primitive(PrimitiveType),
    Void,
    Class {
        fq_name: FqName,
        arguments: Vec<RawTypeArgument>,
    },
    TypeVariable(Name),
    Array(Box<RawType>),
}

impl RawType {
    pub fn class(fq_name: FqName) -> RawType {
        RawType::Class {
            fq_name,
            arguments: Vec::new(),
        }
    }

    pub fn generic(fq_name: FqName, arguments: Vec<RawTypeArgument>) -> RawType {
        RawType::Class { fq_name, arguments }
    }

    pub fn array(element: RawType) -> RawType {
        RawType::Array(Box::new(element))
    }

    pub fn class_name(&self) -> Option<&FqName> {
        match self {
            RawType::Class { fq_name, .. } => Some(fq_name),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RawTypeArgument {
    Type(RawType),
    /// `? extends T`
    Extends(RawType),
    /// `? super T`
    Super(RawType),
    /// `?`
    Wildcard,
}

/// A generic parameter parsed from a signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawTypeParameter {
    pub name: Name,
    pub bounds: Vec<RawType>,
}

/// Constant argument of a raw annotation.
#[derive(Clone, Debug, PartialEq)]
pub enum RawConstant {
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Char(char),
    Float(f32),
    Double(f64),
    String(String),
    Enum { class: FqName, entry: Name },
    Array(Vec<RawConstant>),
    Annotation(Box<RawAnnotation>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct RawAnnotationArgument {
    /// `None` for the unnamed (`value`) argument.
    pub name: Option<Name>,
    /// `None` when the value is null or cannot be evaluated.
    pub value: Option<RawConstant>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RawAnnotation {
    /// `None` when the annotation's own name could not be determined.
    pub fq_name: Option<FqName>,
    pub arguments: Vec<RawAnnotationArgument>,
}

impl RawAnnotation {
    pub fn new(fq_name: FqName) -> Self {
        RawAnnotation {
            fq_name: Some(fq_name),
            arguments: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_argument(mut self, name: Option<Name>, value: RawConstant) -> Self {
        self.arguments.push(RawAnnotationArgument {
            name,
            value: Some(value),
        });
        self
    }

    #[must_use]
    pub fn with_null_argument(mut self, name: Option<Name>) -> Self {
        self.arguments.push(RawAnnotationArgument { name, value: None });
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RawValueParameter {
    pub name: Option<Name>,
    pub ty: RawType,
    pub annotations: Vec<RawAnnotation>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RawMethod {
    pub name: Name,
    pub flags: MemberFlags,
    pub visibility: Visibility,
    pub parameters: Vec<RawValueParameter>,
    /// Erased return type.
    pub return_type: RawType,
    pub generic_signature: Option<String>,
    pub annotations: Vec<RawAnnotation>,
    /// Default value of an annotation element.
    pub annotation_default: Option<RawConstant>,
}

impl RawMethod {
    pub fn new(name: Name, return_type: RawType) -> Self {
        RawMethod {
            name,
            flags: MemberFlags::empty(),
            visibility: Visibility::Public,
            parameters: Vec::new(),
            return_type,
            generic_signature: None,
            annotations: Vec::new(),
            annotation_default: None,
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: MemberFlags) -> Self {
        self.flags |= flags;
        self
    }

    #[must_use]
    pub fn with_parameter(mut self, name: Option<Name>, ty: RawType) -> Self {
        self.parameters.push(RawValueParameter {
            name,
            ty,
            annotations: Vec::new(),
        });
        self
    }

    #[must_use]
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.generic_signature = Some(signature.into());
        self
    }

    #[must_use]
    pub fn with_annotation(mut self, annotation: RawAnnotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    #[must_use]
    pub fn with_default(mut self, value: RawConstant) -> Self {
        self.annotation_default = Some(value);
        self
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(MemberFlags::STATIC)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RawField {
    pub name: Name,
    pub flags: MemberFlags,
    pub visibility: Visibility,
    pub ty: RawType,
    pub generic_signature: Option<String>,
    pub annotations: Vec<RawAnnotation>,
}

impl RawField {
    pub fn new(name: Name, ty: RawType) -> Self {
        RawField {
            name,
            flags: MemberFlags::empty(),
            visibility: Visibility::Public,
            ty,
            generic_signature: None,
            annotations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: MemberFlags) -> Self {
        self.flags |= flags;
        self
    }

    #[must_use]
    pub fn with_annotation(mut self, annotation: RawAnnotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn is_enum_constant(&self) -> bool {
        self.flags.contains(MemberFlags::ENUM_CONSTANT)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RawConstructor {
    pub visibility: Visibility,
    pub parameters: Vec<RawValueParameter>,
    pub generic_signature: Option<String>,
    pub annotations: Vec<RawAnnotation>,
}

impl RawConstructor {
    pub fn new() -> Self {
        RawConstructor {
            visibility: Visibility::Public,
            parameters: Vec::new(),
            generic_signature: None,
            annotations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_parameter(mut self, name: Option<Name>, ty: RawType) -> Self {
        self.parameters.push(RawValueParameter {
            name,
            ty,
            annotations: Vec::new(),
        });
        self
    }
}

impl Default for RawConstructor {
    fn default() -> Self {
        Self::new()
    }
}

/// A foreign class declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct RawClass {
    /// Name the declaration reports for itself.
    pub fq_name: FqName,
    pub flags: ClassFlags,
    pub visibility: Visibility,
    /// Containing class, for nested declarations.
    pub outer: Option<FqName>,
    pub generic_signature: Option<String>,
    /// Erased superclass followed by erased interfaces.
    pub supertypes: Vec<FqName>,
    pub methods: Vec<RawMethod>,
    pub fields: Vec<RawField>,
    pub constructors: Vec<RawConstructor>,
    pub annotations: Vec<RawAnnotation>,
}

impl RawClass {
    pub fn new(fq_name: FqName) -> Self {
        RawClass {
            fq_name,
            flags: ClassFlags::empty(),
            visibility: Visibility::Public,
            outer: None,
            generic_signature: None,
            supertypes: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            constructors: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// Simple name, the last segment of the reported name.
    pub fn name(&self) -> Name {
        self.fq_name.short_name().unwrap_or_default()
    }

    #[must_use]
    pub fn with_flags(mut self, flags: ClassFlags) -> Self {
        self.flags |= flags;
        self
    }

    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Mark as nested in `outer`.
    #[must_use]
    pub fn nested_in(mut self, outer: FqName) -> Self {
        self.outer = Some(outer);
        self
    }

    #[must_use]
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.generic_signature = Some(signature.into());
        self
    }

    #[must_use]
    pub fn with_supertype(mut self, supertype: FqName) -> Self {
        self.supertypes.push(supertype);
        self
    }

    #[must_use]
    pub fn with_method(mut self, method: RawMethod) -> Self {
        self.methods.push(method);
        self
    }

    #[must_use]
    pub fn with_field(mut self, field: RawField) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn with_constructor(mut self, constructor: RawConstructor) -> Self {
        self.constructors.push(constructor);
        self
    }

    #[must_use]
    pub fn with_annotation(mut self, annotation: RawAnnotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn is_interface(&self) -> bool {
        self.flags.contains(ClassFlags::INTERFACE) && !self.is_annotation()
    }

    pub fn is_enum(&self) -> bool {
        self.flags.contains(ClassFlags::ENUM)
    }

    pub fn is_annotation(&self) -> bool {
        self.flags.contains(ClassFlags::ANNOTATION)
    }

    pub fn is_nested(&self) -> bool {
        self.outer.is_some()
    }
}

/// Key under which the external annotation store files annotations.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AnnotationOwnerKey {
    Class(FqName),
    Method {
        class: FqName,
        name: Name,
        arity: u32,
    },
    Field {
        class: FqName,
        name: Name,
    },
    Parameter {
        class: FqName,
        method: Name,
        arity: u32,
        index: u32,
    },
}

/// A declaration whose annotations are being resolved.
#[derive(Clone, Copy, Debug)]
pub struct AnnotationOwner<'a> {
    pub key: &'a AnnotationOwnerKey,
    /// Annotations written on the declaration itself.
    pub annotations: &'a [RawAnnotation],
}

impl<'a> AnnotationOwner<'a> {
    pub fn new(key: &'a AnnotationOwnerKey, annotations: &'a [RawAnnotation]) -> Self {
        AnnotationOwner { key, annotations }
    }
}
