//! Built-in classes of the `lang` root package.
//!
//! Installed once into a fresh arena, so every built-in has a fixed id and
//! checks like "is this `lang.Any`" are id comparisons.

use descry_ir::{FqName, FqNameUnsafe, Name, StringInterner};
use rustc_hash::FxHashMap;

use crate::annotation::{AnnotationArgument, AnnotationDescriptor, ConstantValue};
use crate::arena::Descriptors;
use crate::class::{
    ClassDescriptor, ClassKind, Container, MemberScope, Members, Modality, Origin, Visibility,
};
use crate::ids::{AnnotationId, ClassId, Owner, PackageId};
use crate::members::{
    ConstructorDescriptor, FunctionDescriptor, FunctionKind, PropertyDescriptor,
    TypeParameterDescriptor, ValueParameterDescriptor,
};
use crate::types::{Type, TypeProjection, Variance};

impl ClassId {
    pub const ANY: ClassId = ClassId::from_raw(0);
    pub const NOTHING: ClassId = ClassId::from_raw(1);
    pub const UNIT: ClassId = ClassId::from_raw(2);
    pub const BOOLEAN: ClassId = ClassId::from_raw(3);
    pub const CHAR: ClassId = ClassId::from_raw(4);
    pub const BYTE: ClassId = ClassId::from_raw(5);
    pub const SHORT: ClassId = ClassId::from_raw(6);
    pub const INT: ClassId = ClassId::from_raw(7);
    pub const LONG: ClassId = ClassId::from_raw(8);
    pub const FLOAT: ClassId = ClassId::from_raw(9);
    pub const DOUBLE: ClassId = ClassId::from_raw(10);
    pub const STRING: ClassId = ClassId::from_raw(11);
    pub const ARRAY: ClassId = ClassId::from_raw(12);
    pub const ENUM: ClassId = ClassId::from_raw(13);
    pub const ANNOTATION: ClassId = ClassId::from_raw(14);
    pub const COMPARABLE: ClassId = ClassId::from_raw(15);
    pub const ITERABLE: ClassId = ClassId::from_raw(16);
    pub const LIST: ClassId = ClassId::from_raw(17);
    pub const MAP: ClassId = ClassId::from_raw(18);
    pub const MAP_ENTRY: ClassId = ClassId::from_raw(19);
    pub const DEPRECATED: ClassId = ClassId::from_raw(20);
    pub const VOLATILE: ClassId = ClassId::from_raw(21);

    /// First id handed out after the built-ins.
    pub const FIRST_DYNAMIC: u32 = 22;

    #[inline]
    pub const fn is_builtin(self) -> bool {
        self.raw() < Self::FIRST_DYNAMIC
    }
}

/// Foreign primitive types.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum PrimitiveType {
    Boolean,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 8] = [
        PrimitiveType::Boolean,
        PrimitiveType::Char,
        PrimitiveType::Byte,
        PrimitiveType::Short,
        PrimitiveType::Int,
        PrimitiveType::Long,
        PrimitiveType::Float,
        PrimitiveType::Double,
    ];

    pub fn class_id(self) -> ClassId {
        match self {
            PrimitiveType::Boolean => ClassId::BOOLEAN,
            PrimitiveType::Char => ClassId::CHAR,
            PrimitiveType::Byte => ClassId::BYTE,
            PrimitiveType::Short => ClassId::SHORT,
            PrimitiveType::Int => ClassId::INT,
            PrimitiveType::Long => ClassId::LONG,
            PrimitiveType::Float => ClassId::FLOAT,
            PrimitiveType::Double => ClassId::DOUBLE,
        }
    }

    /// Base-type letter used in generic signatures.
    pub fn from_descriptor(letter: char) -> Option<PrimitiveType> {
        Some(match letter {
            'Z' => PrimitiveType::Boolean,
            'C' => PrimitiveType::Char,
            'B' => PrimitiveType::Byte,
            'S' => PrimitiveType::Short,
            'I' => PrimitiveType::Int,
            'J' => PrimitiveType::Long,
            'F' => PrimitiveType::Float,
            'D' => PrimitiveType::Double,
            _ => return None,
        })
    }

    /// Foreign keyword spelling (`int`, `boolean`, ...).
    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Char => "char",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }
}

struct BuiltinClass {
    id: ClassId,
    name: &'static str,
    kind: ClassKind,
    modality: Modality,
    type_params: &'static [(&'static str, Variance)],
    outer: Option<ClassId>,
}

const fn class(
    id: ClassId,
    name: &'static str,
    kind: ClassKind,
    modality: Modality,
) -> BuiltinClass {
    BuiltinClass {
        id,
        name,
        kind,
        modality,
        type_params: &[],
        outer: None,
    }
}

const fn generic(
    id: ClassId,
    name: &'static str,
    kind: ClassKind,
    type_params: &'static [(&'static str, Variance)],
) -> BuiltinClass {
    BuiltinClass {
        id,
        name,
        kind,
        modality: Modality::Abstract,
        type_params,
        outer: None,
    }
}

const BUILTIN_CLASSES: &[BuiltinClass] = &[
    class(ClassId::ANY, "Any", ClassKind::Class, Modality::Open),
    class(ClassId::NOTHING, "Nothing", ClassKind::Class, Modality::Final),
    class(ClassId::UNIT, "Unit", ClassKind::Object, Modality::Final),
    class(ClassId::BOOLEAN, "Boolean", ClassKind::Class, Modality::Final),
    class(ClassId::CHAR, "Char", ClassKind::Class, Modality::Final),
    class(ClassId::BYTE, "Byte", ClassKind::Class, Modality::Final),
    class(ClassId::SHORT, "Short", ClassKind::Class, Modality::Final),
    class(ClassId::INT, "Int", ClassKind::Class, Modality::Final),
    class(ClassId::LONG, "Long", ClassKind::Class, Modality::Final),
    class(ClassId::FLOAT, "Float", ClassKind::Class, Modality::Final),
    class(ClassId::DOUBLE, "Double", ClassKind::Class, Modality::Final),
    class(ClassId::STRING, "String", ClassKind::Class, Modality::Final),
    BuiltinClass {
        modality: Modality::Final,
        ..generic(ClassId::ARRAY, "Array", ClassKind::Class, &[("T", Variance::Invariant)])
    },
    generic(ClassId::ENUM, "Enum", ClassKind::Class, &[("E", Variance::Invariant)]),
    class(ClassId::ANNOTATION, "Annotation", ClassKind::Interface, Modality::Abstract),
    generic(ClassId::COMPARABLE, "Comparable", ClassKind::Interface, &[("T", Variance::In)]),
    generic(ClassId::ITERABLE, "Iterable", ClassKind::Interface, &[("T", Variance::Out)]),
    generic(ClassId::LIST, "List", ClassKind::Interface, &[("E", Variance::Out)]),
    generic(
        ClassId::MAP,
        "Map",
        ClassKind::Interface,
        &[("K", Variance::Invariant), ("V", Variance::Out)],
    ),
    BuiltinClass {
        outer: Some(ClassId::MAP),
        ..generic(
            ClassId::MAP_ENTRY,
            "Entry",
            ClassKind::Interface,
            &[("K", Variance::Out), ("V", Variance::Out)],
        )
    },
    class(ClassId::DEPRECATED, "deprecated", ClassKind::Annotation, Modality::Final),
    class(ClassId::VOLATILE, "volatile", ClassKind::Annotation, Modality::Final),
];

/// Handle to the installed built-ins.
#[derive(Clone, Debug)]
pub struct BuiltIns {
    package: PackageId,
    root: Name,
    top_level: FxHashMap<Name, ClassId>,
}

impl BuiltIns {
    /// Reserved root package of the built-ins.
    pub const ROOT_PACKAGE: &'static str = "lang";

    /// Install every built-in class into an empty arena.
    ///
    /// # Panics
    /// Panics if the arena already holds classes, since built-in ids are fixed.
    pub fn install(descriptors: &mut Descriptors, interner: &StringInterner) -> BuiltIns {
        assert_eq!(
            descriptors.class_count(),
            0,
            "built-ins must be installed into an empty arena"
        );
        let root = interner.intern(Self::ROOT_PACKAGE);
        let package_fq = FqName::root().child(root);
        let package = descriptors.ensure_package(&package_fq, Origin::BuiltIn);
        let mut top_level = FxHashMap::default();

        for builtin in BUILTIN_CLASSES {
            let name = interner.intern(builtin.name);
            let (container, fq_name) = match builtin.outer {
                None => (Container::Package(package), package_fq.child(name).to_unsafe()),
                Some(outer) => (
                    Container::Class(outer),
                    descriptors.class(outer).fq_name.child(name),
                ),
            };
            let descriptor = ClassDescriptor::new(name, fq_name, container, builtin.kind, Origin::BuiltIn)
                .with_modality(builtin.modality);
            let id = descriptors.alloc_class(descriptor);
            debug_assert_eq!(id, builtin.id, "built-in `{}` allocated out of order", builtin.name);

            let mut type_parameters = Vec::with_capacity(builtin.type_params.len());
            for (index, (param, variance)) in (0u32..).zip(builtin.type_params) {
                type_parameters.push(descriptors.alloc_type_param(
                    TypeParameterDescriptor::uninitialized(
                        interner.intern(param),
                        index,
                        Owner::Class(id),
                        *variance,
                    ),
                ));
            }
            descriptors.class_mut(id).type_parameters = type_parameters;

            match builtin.outer {
                None => {
                    top_level.insert(name, id);
                }
                Some(outer) => descriptors.add_nested(outer, id),
            }
        }

        for builtin in BUILTIN_CLASSES {
            initialize_type_parameters(descriptors, builtin.id);
            let supertypes = builtin_supertypes(descriptors, builtin);
            descriptors.class_mut(builtin.id).supertypes = supertypes;
            let members = builtin_members(descriptors, interner, builtin.id);
            descriptors.class_mut(builtin.id).members = MemberScope::Loaded(members);
        }

        tracing::debug!(count = BUILTIN_CLASSES.len(), "built-ins installed");
        BuiltIns {
            package,
            root,
            top_level,
        }
    }

    pub fn package(&self) -> PackageId {
        self.package
    }

    /// Whether `fq_name` is addressed through the built-in root package.
    pub fn is_builtin_name(&self, fq_name: &FqNameUnsafe) -> bool {
        fq_name.first_segment_is(self.root)
    }

    /// Navigate `lang.Outer.Inner...` through nested classifier scopes.
    pub fn lookup(&self, descriptors: &Descriptors, fq_name: &FqNameUnsafe) -> Option<ClassId> {
        let (first, rest) = fq_name.segments().split_first()?;
        if *first != self.root {
            return None;
        }
        let (top, nested) = rest.split_first()?;
        let mut current = *self.top_level.get(top)?;
        for &segment in nested {
            current = descriptors.nested_by_name(current, segment)?;
        }
        Some(current)
    }

    pub fn any_type() -> Type {
        Type::class(ClassId::ANY)
    }

    /// `lang.Any?`, the bound of an unconstrained type parameter.
    pub fn nullable_any_type() -> Type {
        Type::class(ClassId::ANY).nullable()
    }

    pub fn array_of(element: Type) -> Type {
        Type::generic(ClassId::ARRAY, vec![TypeProjection::invariant(element)])
    }

    /// A fresh `lang.deprecated(message)` occurrence.
    pub fn deprecated_annotation(
        descriptors: &mut Descriptors,
        interner: &StringInterner,
        message: &str,
    ) -> AnnotationId {
        descriptors.alloc_annotation(AnnotationDescriptor {
            annotation_type: Some(Type::class(ClassId::DEPRECATED)),
            arguments: vec![AnnotationArgument {
                parameter: interner.intern("message"),
                index: 0,
                value: ConstantValue::String(message.to_owned()),
            }],
        })
    }
}

fn initialize_type_parameters(descriptors: &mut Descriptors, class: ClassId) {
    for param in descriptors.class(class).type_parameters.clone() {
        let bound = if class == ClassId::ENUM {
            Type::generic(
                ClassId::ENUM,
                vec![TypeProjection::invariant(Type::parameter(param))],
            )
        } else {
            BuiltIns::nullable_any_type()
        };
        let descriptor = descriptors.type_param_mut(param);
        descriptor.upper_bounds = vec![bound];
        descriptor.initialized = true;
    }
}

fn builtin_supertypes(descriptors: &Descriptors, builtin: &BuiltinClass) -> Vec<Type> {
    let own_param = |i: usize| {
        TypeProjection::invariant(Type::parameter(
            descriptors.class(builtin.id).type_parameters[i],
        ))
    };
    match builtin.id {
        ClassId::ANY | ClassId::NOTHING => Vec::new(),
        ClassId::ENUM => vec![Type::generic(ClassId::COMPARABLE, vec![own_param(0)])],
        ClassId::LIST => vec![Type::generic(ClassId::ITERABLE, vec![own_param(0)])],
        ClassId::DEPRECATED | ClassId::VOLATILE => vec![Type::class(ClassId::ANNOTATION)],
        _ => vec![BuiltIns::any_type()],
    }
}

fn builtin_members(
    descriptors: &mut Descriptors,
    interner: &StringInterner,
    class: ClassId,
) -> Members {
    let container = Container::Class(class);
    let function = |descriptors: &mut Descriptors, name: &str, params: Vec<(&str, Type)>, ret: Type| {
        let mut descriptor =
            FunctionDescriptor::placeholder(interner.intern(name), container, Origin::BuiltIn);
        descriptor.kind = FunctionKind::Declaration;
        descriptor.modality = Modality::Open;
        descriptor.value_parameters = (0u32..)
            .zip(params)
            .map(|(index, (param, ty))| ValueParameterDescriptor::new(interner.intern(param), index, ty))
            .collect();
        descriptor.return_type = ret;
        descriptors.alloc_function(descriptor)
    };

    let mut members = Members::default();
    match class {
        ClassId::ANY => {
            members.functions = vec![
                function(
                    descriptors,
                    "equals",
                    vec![("other", BuiltIns::nullable_any_type())],
                    Type::class(ClassId::BOOLEAN),
                ),
                function(descriptors, "hashCode", Vec::new(), Type::class(ClassId::INT)),
                function(descriptors, "toString", Vec::new(), Type::class(ClassId::STRING)),
            ];
            members.constructors = vec![descriptors.alloc_constructor(ConstructorDescriptor {
                owner: class,
                value_parameters: Vec::new(),
                visibility: Visibility::Public,
                is_primary: true,
                annotations: Vec::new(),
            })];
        }
        ClassId::ENUM => {
            members.functions = vec![
                function(descriptors, "name", Vec::new(), Type::class(ClassId::STRING)),
                function(descriptors, "ordinal", Vec::new(), Type::class(ClassId::INT)),
            ];
        }
        ClassId::ARRAY => {
            members.properties = vec![descriptors.alloc_property(PropertyDescriptor {
                name: interner.intern("size"),
                container,
                origin: Origin::BuiltIn,
                ty: Type::class(ClassId::INT),
                is_var: false,
                is_static: false,
                modality: Modality::Final,
                visibility: Visibility::Public,
                annotations: Vec::new(),
            })];
        }
        ClassId::DEPRECATED | ClassId::VOLATILE => {
            let value_parameters = if class == ClassId::DEPRECATED {
                vec![ValueParameterDescriptor::new(
                    interner.intern("message"),
                    0,
                    Type::class(ClassId::STRING),
                )]
            } else {
                Vec::new()
            };
            members.constructors = vec![descriptors.alloc_constructor(ConstructorDescriptor {
                owner: class,
                value_parameters,
                visibility: Visibility::Public,
                is_primary: true,
                annotations: Vec::new(),
            })];
        }
        _ => {}
    }
    members
}
