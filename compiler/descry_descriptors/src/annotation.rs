//! Annotation descriptors and compile-time constants.

use descry_ir::Name;

use crate::ids::{AnnotationId, ClassId};
use crate::types::Type;

/// One annotation occurrence.
///
/// Created without a type; the type is assigned by a postponed task once the
/// annotation class can be safely read.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnnotationDescriptor {
    pub annotation_type: Option<Type>,
    pub arguments: Vec<AnnotationArgument>,
}

impl AnnotationDescriptor {
    pub fn annotation_class(&self) -> Option<ClassId> {
        self.annotation_type.as_ref().and_then(Type::class_id)
    }

    pub fn argument(&self, parameter: Name) -> Option<&ConstantValue> {
        self.arguments
            .iter()
            .find(|arg| arg.parameter == parameter)
            .map(|arg| &arg.value)
    }
}

/// A bound argument: annotation constructor parameter and its value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnotationArgument {
    pub parameter: Name,
    pub index: u32,
    pub value: ConstantValue,
}

/// Compile-time constant. Floats are stored as bits so values hash.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConstantValue {
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Char(char),
    Float(u32),
    Double(u64),
    String(String),
    EnumEntry { class: ClassId, entry: Name },
    Array(Vec<ConstantValue>),
    Annotation(AnnotationId),
}

impl ConstantValue {
    pub fn float(value: f32) -> Self {
        ConstantValue::Float(value.to_bits())
    }

    pub fn double(value: f64) -> Self {
        ConstantValue::Double(value.to_bits())
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            ConstantValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConstantValue::String(s) => Some(s),
            _ => None,
        }
    }
}
