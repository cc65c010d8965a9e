//! Descry descriptors - the resolver's symbol model.
//!
//! Every resolved declaration lives in one [`Descriptors`] arena and is
//! referenced by a copyable 32-bit id. Two references to "the same
//! descriptor" are two equal ids; nothing is ever compared structurally to
//! establish identity.
//!
//! # Layout
//!
//! - [`ids`]: id handles (`ClassId`, `FunctionId`, ...)
//! - [`class`]: class descriptors and their member scopes
//! - [`members`]: functions, properties, constructors, type parameters
//! - [`annotation`]: annotation descriptors and constant values
//! - [`types`]: the `Type` tree referencing descriptors by id
//! - [`arena`]: storage with checkpoint/rollback
//! - [`builtins`]: the `lang` classes at fixed ids
//! - [`platform`]: host-platform names that alias built-ins

pub mod annotation;
pub mod arena;
pub mod builtins;
pub mod class;
pub mod ids;
pub mod members;
pub mod platform;
mod render;
pub mod types;

pub use annotation::{AnnotationArgument, AnnotationDescriptor, ConstantValue};
pub use arena::{Checkpoint, Descriptors, PackageDescriptor};
pub use builtins::{BuiltIns, PrimitiveType};
pub use class::{ClassDescriptor, ClassKind, Container, MemberScope, Members, Modality, Origin, Visibility};
pub use ids::{
    AnnotationId, ClassId, ConstructorId, FunctionId, Owner, PackageId, PropertyId, TypeParamId,
};
pub use members::{
    ConstructorDescriptor, FunctionDescriptor, FunctionKind, MethodSignature,
    PropertyDescriptor, TypeParameterDescriptor, ValueParameterDescriptor,
};
pub use platform::{MappedClass, PlatformClassMap};
pub use types::{Type, TypeProjection, Variance};

descry_ir::static_assert_size!(ClassId, 4);
descry_ir::static_assert_size!(Owner, 8);
