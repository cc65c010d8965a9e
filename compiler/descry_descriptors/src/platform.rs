//! Host-platform classes that alias built-ins.
//!
//! Foreign code sees `java.lang.Object`, `java.lang.Integer` and friends;
//! the resolver must hand out the built-in descriptors for them instead of
//! building foreign ones.

use descry_ir::{FqName, FqNameUnsafe, StringInterner};
use rustc_hash::FxHashMap;

use crate::builtins::PrimitiveType;
use crate::ids::ClassId;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct MappedClass {
    pub class: ClassId,
    /// Set for boxed primitive wrappers.
    pub boxed: Option<PrimitiveType>,
}

const CLASS_ALIASES: &[(&str, ClassId)] = &[
    ("java.lang.Object", ClassId::ANY),
    ("java.lang.String", ClassId::STRING),
    ("java.lang.CharSequence", ClassId::STRING),
    ("java.lang.Enum", ClassId::ENUM),
    ("java.lang.Comparable", ClassId::COMPARABLE),
    ("java.lang.Iterable", ClassId::ITERABLE),
    ("java.lang.Void", ClassId::UNIT),
    ("java.lang.annotation.Annotation", ClassId::ANNOTATION),
    ("java.util.List", ClassId::LIST),
    ("java.util.Map", ClassId::MAP),
    ("java.util.Map.Entry", ClassId::MAP_ENTRY),
];

const BOXED: &[(&str, PrimitiveType)] = &[
    ("java.lang.Boolean", PrimitiveType::Boolean),
    ("java.lang.Character", PrimitiveType::Char),
    ("java.lang.Byte", PrimitiveType::Byte),
    ("java.lang.Short", PrimitiveType::Short),
    ("java.lang.Integer", PrimitiveType::Int),
    ("java.lang.Long", PrimitiveType::Long),
    ("java.lang.Float", PrimitiveType::Float),
    ("java.lang.Double", PrimitiveType::Double),
];

const ANNOTATION_ALIASES: &[(&str, ClassId)] = &[("java.lang.Deprecated", ClassId::DEPRECATED)];

#[derive(Clone, Debug, Default)]
pub struct PlatformClassMap {
    classes: FxHashMap<FqName, MappedClass>,
    annotations: FxHashMap<FqName, ClassId>,
}

impl PlatformClassMap {
    pub fn new(interner: &StringInterner) -> Self {
        let mut map = PlatformClassMap::default();
        for (text, class) in CLASS_ALIASES {
            map.insert_class(interner, text, MappedClass { class: *class, boxed: None });
        }
        for (text, primitive) in BOXED {
            map.insert_class(
                interner,
                text,
                MappedClass {
                    class: primitive.class_id(),
                    boxed: Some(*primitive),
                },
            );
        }
        for (text, class) in ANNOTATION_ALIASES {
            if let Ok(fq) = FqName::parse(interner, text) {
                map.annotations.insert(fq, *class);
            }
        }
        map
    }

    fn insert_class(&mut self, interner: &StringInterner, text: &str, mapped: MappedClass) {
        if let Ok(fq) = FqName::parse(interner, text) {
            self.classes.insert(fq, mapped);
        }
    }

    /// Built-in that stands for a foreign class, if any.
    pub fn map_class(&self, fq_name: &FqNameUnsafe) -> Option<MappedClass> {
        self.classes.get(fq_name).copied()
    }

    /// Built-in annotation class that a foreign annotation aliases.
    pub fn map_annotation(&self, fq_name: &FqNameUnsafe) -> Option<ClassId> {
        self.annotations.get(fq_name).copied()
    }

    pub fn is_mapped(&self, fq_name: &FqNameUnsafe) -> bool {
        self.classes.contains_key(fq_name) || self.annotations.contains_key(fq_name)
    }
}
