//! Class descriptors.

use descry_ir::{FqName, FqNameUnsafe, Name};

use crate::ids::{AnnotationId, ClassId, ConstructorId, FunctionId, PackageId, PropertyId, TypeParamId};
use crate::types::Type;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    EnumEntry,
    Annotation,
    Object,
    /// Synthetic companion scope, e.g. the holder of an enum's `values()`.
    ClassObject,
}

impl ClassKind {
    /// Kinds that are instantiated once and never constructed by callers.
    pub fn is_singleton(self) -> bool {
        matches!(
            self,
            ClassKind::Object | ClassKind::ClassObject | ClassKind::EnumEntry
        )
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Modality {
    Final,
    Open,
    Abstract,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Visibility {
    Public,
    Protected,
    Internal,
    Private,
    /// Foreign package-private visibility.
    Package,
}

/// Where a descriptor came from.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Origin {
    BuiltIn,
    /// Raw foreign declaration.
    Foreign,
    /// Serialized compiler metadata found in a binary.
    Compiled,
    /// The compiler's own source.
    Native,
    /// Created by the resolver (class objects, default constructors).
    Synthetic,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Container {
    Package(PackageId),
    Class(ClassId),
}

/// Members of a loaded scope.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct Members {
    pub functions: Vec<FunctionId>,
    pub properties: Vec<PropertyId>,
    pub constructors: Vec<ConstructorId>,
}

/// Member scope of a class, populated on first request.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum MemberScope {
    #[default]
    Unloaded,
    Loaded(Members),
}

impl MemberScope {
    pub fn loaded(&self) -> Option<&Members> {
        match self {
            MemberScope::Unloaded => None,
            MemberScope::Loaded(members) => Some(members),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, MemberScope::Loaded(_))
    }
}

/// A resolved class-like declaration.
#[derive(Clone, Debug)]
pub struct ClassDescriptor {
    pub name: Name,
    /// Canonical name, with class-object segments rewritten.
    pub fq_name: FqNameUnsafe,
    /// Name of the foreign declaration this was built from, if any.
    pub source_name: Option<FqName>,
    pub container: Container,
    pub kind: ClassKind,
    pub modality: Modality,
    pub visibility: Visibility,
    pub is_inner: bool,
    pub origin: Origin,
    pub type_parameters: Vec<TypeParamId>,
    pub supertypes: Vec<Type>,
    pub annotations: Vec<AnnotationId>,
    pub members: MemberScope,
    /// Nested classifiers materialized so far, in resolution order.
    pub nested: Vec<ClassId>,
    /// Function type of the single abstract method, for functional interfaces.
    pub sam_type: Option<Type>,
    pub class_object: Option<ClassId>,
}

impl ClassDescriptor {
    /// A descriptor with every populated field empty.
    pub fn new(
        name: Name,
        fq_name: FqNameUnsafe,
        container: Container,
        kind: ClassKind,
        origin: Origin,
    ) -> Self {
        ClassDescriptor {
            name,
            fq_name,
            source_name: None,
            container,
            kind,
            modality: match kind {
                ClassKind::Interface | ClassKind::Annotation => Modality::Abstract,
                _ => Modality::Final,
            },
            visibility: Visibility::Public,
            is_inner: false,
            origin,
            type_parameters: Vec::new(),
            supertypes: Vec::new(),
            annotations: Vec::new(),
            members: MemberScope::Unloaded,
            nested: Vec::new(),
            sam_type: None,
            class_object: None,
        }
    }

    #[must_use]
    pub fn with_modality(mut self, modality: Modality) -> Self {
        self.modality = modality;
        self
    }

    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    #[must_use]
    pub fn with_source_name(mut self, source_name: FqName) -> Self {
        self.source_name = Some(source_name);
        self
    }

    #[must_use]
    pub fn with_members(mut self, members: Members) -> Self {
        self.members = MemberScope::Loaded(members);
        self
    }

    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    pub fn functions(&self) -> &[FunctionId] {
        self.members
            .loaded()
            .map_or(&[], |members| members.functions.as_slice())
    }

    pub fn properties(&self) -> &[PropertyId] {
        self.members
            .loaded()
            .map_or(&[], |members| members.properties.as_slice())
    }

    pub fn constructors(&self) -> &[ConstructorId] {
        self.members
            .loaded()
            .map_or(&[], |members| members.constructors.as_slice())
    }
}
