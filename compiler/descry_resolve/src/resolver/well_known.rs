//! Pre-interned names the resolver compares against.

use descry_ir::{FqName, FqNameUnsafe, Name, StringInterner, CLASS_OBJECT_MARKER};

use super::annotations::AnnotationProbe;

/// Suffix of the helper classes generated for trait implementations.
pub(crate) const TRAIT_IMPL_SUFFIX: &str = "$$TImpl";

pub(crate) struct WellKnownNames {
    pub value: Name,
    pub values: Name,
    pub value_of: Name,
    pub equals: Name,
    pub hash_code: Name,
    pub to_string: Name,
    /// Name given to constructors in callable keys.
    pub init: Name,
    pub class_object_marker: Name,

    pub foreign_object: FqName,
    pub foreign_string: FqName,

    /// Markers read by dedicated probes, never turned into descriptors.
    pub not_null: FqName,
    pub mutable: FqName,
    pub readonly: FqName,
    denied_prefix: FqNameUnsafe,
    denied: [FqName; 5],
}

impl WellKnownNames {
    pub fn new(interner: &StringInterner) -> Self {
        let fq = |text: &str| {
            text.split('.')
                .fold(FqName::root(), |fq, segment| fq.child(interner.intern(segment)))
        };
        let not_null = fq("lang.internal.NotNull");
        let mutable = fq("lang.internal.Mutable");
        let readonly = fq("lang.internal.ReadOnly");
        WellKnownNames {
            value: interner.intern("value"),
            values: interner.intern("values"),
            value_of: interner.intern("valueOf"),
            equals: interner.intern("equals"),
            hash_code: interner.intern("hashCode"),
            to_string: interner.intern("toString"),
            init: interner.intern("<init>"),
            class_object_marker: interner.intern(CLASS_OBJECT_MARKER),
            foreign_object: fq("java.lang.Object"),
            foreign_string: fq("java.lang.String"),
            denied_prefix: fq("lang.runtime.typeinfo").to_unsafe(),
            denied: [
                not_null.clone(),
                mutable.clone(),
                readonly.clone(),
                fq("lang.internal.NativeClass"),
                fq("lang.internal.NativePackage"),
            ],
            not_null,
            mutable,
            readonly,
        }
    }

    /// Internal-only annotation types.
    pub fn is_denied(&self, fq_name: &FqNameUnsafe) -> bool {
        fq_name.starts_with(&self.denied_prefix)
            || self.denied.iter().any(|denied| denied == fq_name)
    }

    pub fn marker(&self, probe: AnnotationProbe) -> &FqName {
        match probe {
            AnnotationProbe::NotNull => &self.not_null,
            AnnotationProbe::Mutable => &self.mutable,
            AnnotationProbe::ReadOnly => &self.readonly,
        }
    }

    /// Universal object methods that never count as abstract.
    pub fn is_object_method(&self, name: Name, arity: usize) -> bool {
        (name == self.equals && arity == 1)
            || (name == self.hash_code && arity == 0)
            || (name == self.to_string && arity == 0)
    }

    /// Position of the first class-object marker that follows an owner.
    pub fn class_object_position(&self, fq_name: &FqNameUnsafe) -> Option<usize> {
        fq_name
            .segments()
            .iter()
            .skip(1)
            .position(|&segment| segment == self.class_object_marker)
            .map(|pos| pos + 1)
    }
}
